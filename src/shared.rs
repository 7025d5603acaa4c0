//! Shared example definitions.
//!
//! A definition is visible from the scope it was declared in and everything
//! below it. World level definitions can additionally be limited to groups
//! whose metadata matches a set of criteria.

use std::{fmt, rc::Rc};

use crate::{
    declare::GroupBuilder,
    error::{Error, Result},
    filter::Criterion,
    id::NodeId,
    metadata::{Location, MetaValue, Metadata},
};

pub type SharedBody = Rc<dyn Fn(&mut GroupBuilder<'_>, &[MetaValue])>;

struct Definition {
    name: String,
    /// Declaring group, `None` for world level definitions.
    scope: Option<NodeId>,
    criteria: Vec<Criterion>,
    location: Location,
    body: SharedBody,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("criteria", &self.criteria)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct SharedExamples {
    definitions: Vec<Definition>,
}

impl SharedExamples {
    pub(crate) fn define(
        &mut self,
        name: impl Into<String>,
        scope: Option<NodeId>,
        criteria: Vec<Criterion>,
        location: Location,
        body: SharedBody,
    ) {
        self.definitions.push(Definition {
            name: name.into(),
            scope,
            criteria,
            location,
            body,
        });
    }

    /// Find the definition `from` sees under `name`.
    ///
    /// Scopes are searched from the including group outwards to the world.
    /// The first scope with a visible definition wins; two visible
    /// definitions in the same scope are an error.
    pub(crate) fn resolve(&self, name: &str, from: &Metadata) -> Result<SharedBody> {
        let mut scope = Some(from.id().clone());
        loop {
            let visible: Vec<&Definition> = self
                .definitions
                .iter()
                .filter(|d| d.name == name && d.scope == scope && from.matches_all(&d.criteria))
                .collect();
            match visible.as_slice() {
                [] => (),
                [definition] => return Ok(Rc::clone(&definition.body)),
                ambiguous => {
                    return Err(Error::AmbiguousSharedExamples {
                        name: name.to_string(),
                        scope: scope.map_or_else(|| "world".to_string(), |id| id.to_string()),
                        count: ambiguous.len(),
                    });
                }
            }
            let Some(id) = scope else { break };
            scope = id.parent();
        }
        Err(Error::UnknownSharedExamples {
            name: name.to_string(),
            from: from.id().clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }
}
