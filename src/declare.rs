//! Declaring groups, examples and hooks.
//!
//! A group's body runs synchronously against a [`GroupBuilder`] for the new
//! group. Everything the body declares is registered on that group, and the
//! group's metadata is fixed before the body starts.

use std::{borrow::Cow, panic, rc::Rc, sync::Arc};

use crate::{
    context::ExampleContext,
    error::Error,
    fault::StepResult,
    hooks::{DeclareHooks, HookRegistry},
    metadata::{Declaration, DeclaredMetadata, KeySet, Location, MetaValue, Metadata},
    node::{Example, ExampleFn, ExampleGroup, Node},
    shared::SharedExamples,
};

/// State shared by every builder of one top level declaration.
pub(crate) struct Session {
    pub shared: SharedExamples,
    pub non_inheritable: KeySet,
    /// File the top level group's ids point at.
    file: Arc<str>,
    /// Source file whose declarations are attributed to `file`.
    source: &'static str,
    including: Vec<String>,
    error: Option<Error>,
}

impl Session {
    pub fn new(
        shared: SharedExamples,
        non_inheritable: KeySet,
        file: Arc<str>,
        source: &'static str,
    ) -> Self {
        Self {
            shared,
            non_inheritable,
            file,
            source,
            including: Vec::new(),
            error: None,
        }
    }

    /// Declarations written elsewhere, such as shared examples from another
    /// file, keep their own location.
    fn locate(&self, caller: &'static panic::Location<'static>) -> Location {
        if caller.file() == self.source {
            Location::new(Arc::clone(&self.file), caller.line())
        } else {
            Location::from_caller(caller)
        }
    }

    /// Keep the first declaration error, later ones are usually fallout.
    fn fail(&mut self, error: Error) {
        tracing::debug!(%error, "declaration failed");
        self.error.get_or_insert(error);
    }

    pub fn finish(self) -> (SharedExamples, Option<Error>) {
        (self.shared, self.error)
    }
}

pub struct GroupBuilder<'d> {
    group: &'d mut ExampleGroup,
    session: &'d mut Session,
}

impl<'d> GroupBuilder<'d> {
    pub(crate) fn new(group: &'d mut ExampleGroup, session: &'d mut Session) -> Self {
        Self { group, session }
    }

    /// Metadata of the group being declared.
    pub fn metadata(&self) -> &Metadata {
        &self.group.metadata
    }

    fn declaration(
        &self,
        description: Cow<'static, str>,
        declared: DeclaredMetadata,
        location: Location,
    ) -> Metadata {
        let index = self.group.children.len() as u32 + 1;
        let declaration = Declaration {
            description,
            location,
            id: self.group.id().child(index),
            declared,
        };
        Metadata::build(
            Some(&self.group.metadata),
            declaration,
            &self.session.non_inheritable,
        )
    }

    fn add_group<F>(
        &mut self,
        description: Cow<'static, str>,
        declared: DeclaredMetadata,
        location: Location,
        body: F,
    ) where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        let mut group = ExampleGroup::new(self.declaration(description, declared, location));
        body(&mut GroupBuilder::new(&mut group, self.session));
        self.group.children.push(Node::Group(group));
    }

    fn add_example(
        &mut self,
        description: Cow<'static, str>,
        declared: DeclaredMetadata,
        location: Location,
        body: Option<ExampleFn>,
    ) {
        let metadata = self.declaration(description, declared, location);
        self.group
            .children
            .push(Node::Example(Example { metadata, body }));
    }

    #[track_caller]
    pub fn describe<F>(&mut self, description: impl Into<Cow<'static, str>>, body: F) -> &mut Self
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        self.describe_with(description, DeclaredMetadata::new(), body)
    }

    #[track_caller]
    pub fn describe_with<F>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        declared: DeclaredMetadata,
        body: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        let location = self.session.locate(panic::Location::caller());
        self.add_group(description.into(), declared, location, body);
        self
    }

    /// Alias of [`describe`](Self::describe).
    #[track_caller]
    pub fn context<F>(&mut self, description: impl Into<Cow<'static, str>>, body: F) -> &mut Self
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        self.describe_with(description, DeclaredMetadata::new(), body)
    }

    #[track_caller]
    pub fn context_with<F>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        declared: DeclaredMetadata,
        body: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        self.describe_with(description, declared, body)
    }

    #[track_caller]
    pub fn it<F, T>(&mut self, description: impl Into<Cow<'static, str>>, body: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        self.it_with(description, DeclaredMetadata::new(), body)
    }

    #[track_caller]
    pub fn it_with<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        declared: DeclaredMetadata,
        body: F,
    ) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        let location = self.session.locate(panic::Location::caller());
        self.add_example(
            description.into(),
            declared,
            location,
            Some(ExampleFn::from_boxed(body)),
        );
        self
    }

    /// Alias of [`it`](Self::it).
    #[track_caller]
    pub fn specify<F, T>(&mut self, description: impl Into<Cow<'static, str>>, body: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        self.it_with(description, DeclaredMetadata::new(), body)
    }

    /// An example without a body, reported as pending.
    #[track_caller]
    pub fn todo(&mut self, description: impl Into<Cow<'static, str>>) -> &mut Self {
        let location = self.session.locate(panic::Location::caller());
        self.add_example(description.into(), DeclaredMetadata::new(), location, None);
        self
    }

    /// Define shared examples visible to this group and everything below it.
    #[track_caller]
    pub fn shared_examples<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&mut GroupBuilder<'_>, &[MetaValue]) + 'static,
    {
        let location = self.session.locate(panic::Location::caller());
        let scope = Some(self.group.id().clone());
        self.session
            .shared
            .define(name, scope, Vec::new(), location, Rc::new(body));
        self
    }

    /// Replay shared examples into this group as if declared inline.
    pub fn include_examples(&mut self, name: &str, args: &[MetaValue]) -> &mut Self {
        if let Err(err) = self.include(name, args) {
            self.session.fail(err);
        }
        self
    }

    /// Replay shared examples into a nested `behaves like <name>` group.
    #[track_caller]
    pub fn it_behaves_like(&mut self, name: &str, args: &[MetaValue]) -> &mut Self {
        let location = self.session.locate(panic::Location::caller());
        self.add_group(
            format!("behaves like {name}").into(),
            DeclaredMetadata::new(),
            location,
            |g| {
                g.include_examples(name, args);
            },
        );
        self
    }

    fn include(&mut self, name: &str, args: &[MetaValue]) -> Result<(), Error> {
        if self.session.including.iter().any(|active| active == name) {
            let mut chain = self.session.including.clone();
            chain.push(name.to_string());
            return Err(Error::RecursiveSharedExamples {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }

        let body = self.session.shared.resolve(name, &self.group.metadata)?;
        self.session.including.push(name.to_string());
        body(self, args);
        self.session.including.pop();
        Ok(())
    }
}

impl DeclareHooks for GroupBuilder<'_> {
    fn hook_registry(&mut self) -> &mut HookRegistry {
        &mut self.group.hooks
    }
}
