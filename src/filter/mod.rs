//! Selecting the examples a run executes.
//!
//! Selection works on three inputs: inclusion criteria (every one must match),
//! exclusion criteria (none may match) and location selectors that directly
//! target nodes in a file. A selector overrides ordinary inclusion and
//! exclusion within its own file, only criteria marked absolute still apply.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    rc::Rc,
};

use crate::{
    id::NodeId,
    metadata::{MetaKey, MetaValue, Metadata},
    node::{ExampleGroup, Node},
    status::{LastStatus, StatusStore},
};

mod location;
pub use location::*;

/// A predicate over one metadata key.
#[derive(Clone)]
pub struct Criterion {
    key: MetaKey,
    expectation: Expectation,
    absolute: bool,
}

#[derive(Clone)]
pub enum Expectation {
    Value(MetaValue),
    Predicate(Rc<dyn Fn(&MetaValue) -> bool>),
}

impl Criterion {
    /// Matches when the key holds `value`, or a list containing it.
    pub fn new(key: impl Into<MetaKey>, value: impl Into<MetaValue>) -> Self {
        Self {
            key: key.into(),
            expectation: Expectation::Value(value.into()),
            absolute: false,
        }
    }

    /// Matches when the key is present and `predicate` accepts its value.
    pub fn predicate<F>(key: impl Into<MetaKey>, predicate: F) -> Self
    where
        F: Fn(&MetaValue) -> bool + 'static,
    {
        Self {
            key: key.into(),
            expectation: Expectation::Predicate(Rc::new(predicate)),
            absolute: false,
        }
    }

    /// An absolute exclusion removes nodes even when a location selector
    /// targets them and is checked against every enclosing group.
    pub fn absolute(self) -> Self {
        Self {
            absolute: true,
            ..self
        }
    }

    pub fn key(&self) -> &MetaKey {
        &self.key
    }

    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        let Some(value) = metadata.get(self.key.as_str()) else {
            return false;
        };
        match &self.expectation {
            Expectation::Value(expected) => match value {
                MetaValue::List(items) if !matches!(expected, MetaValue::List(_)) => {
                    items.contains(expected)
                }
                value => value == expected,
            },
            Expectation::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Criterion({self})")
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expectation {
            Expectation::Value(value) => write!(f, "{} => {value}", self.key),
            Expectation::Predicate(_) => write!(f, "{} => <predicate>", self.key),
        }
    }
}

/// Result of selecting examples for a run.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    selected: HashSet<NodeId>,
    groups: HashSet<NodeId>,
    /// Examples in the files handed to the run.
    pub total: usize,
    pub filtered_out: usize,
    /// Inclusion criteria were dropped because nothing matched them.
    pub fell_back: bool,
    pub message: Option<String>,
}

impl FilterOutcome {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, example: &NodeId) -> bool {
        self.selected.contains(example)
    }

    /// Whether any selected example lives below this group.
    pub fn is_active(&self, group: &NodeId) -> bool {
        self.groups.contains(group)
    }

    fn select(&mut self, example: &Metadata) {
        let mut group = example.parent_id().cloned();
        while let Some(id) = group {
            group = id.parent();
            if !self.groups.insert(id) {
                break;
            }
        }
        self.selected.insert(example.id().clone());
    }
}

/// Filtering by metadata criteria, locations and last known status.
#[derive(Debug, Clone, Copy)]
pub struct MetadataFilter<'c> {
    pub inclusions: &'c [Criterion],
    pub exclusions: &'c [Criterion],
    pub run_all_when_everything_filtered: bool,
    /// Restrict inclusion to examples that failed last time.
    pub only_failures: Option<&'c StatusStore>,
}

struct Candidate<'g> {
    metadata: &'g Metadata,
    located: bool,
    selected: bool,
    fallback: bool,
}

impl MetadataFilter<'_> {
    pub fn filter(&self, groups: &[ExampleGroup], files: &[FileSelection]) -> FilterOutcome {
        let wanted: HashSet<&str> = files.iter().map(|f| normalize_file(&f.file)).collect();
        let groups: Vec<&ExampleGroup> = groups
            .iter()
            .filter(|g| wanted.is_empty() || wanted.contains(normalize_file(g.id().file())))
            .collect();
        let targets = resolve_targets(&groups, files);

        let mut candidates = Vec::new();
        for group in &groups {
            self.visit(group, &targets, &mut Vec::new(), &mut candidates);
        }

        let mut outcome = FilterOutcome {
            total: candidates.len(),
            ..FilterOutcome::default()
        };
        for candidate in candidates.iter().filter(|c| c.selected) {
            outcome.select(candidate.metadata);
        }

        let located = candidates.iter().any(|c| c.located);
        let narrowed = !self.inclusions.is_empty() || self.only_failures.is_some() || located;
        if outcome.is_empty() && outcome.total > 0 {
            match self.run_all_when_everything_filtered && narrowed {
                true => {
                    for candidate in candidates.iter().filter(|c| c.fallback) {
                        outcome.select(candidate.metadata);
                    }
                    outcome.fell_back = true;
                    let inclusions = self
                        .describe_inclusions(located)
                        .unwrap_or_else(|| "the given locations".to_string());
                    outcome.message = Some(format!(
                        "No examples matched {inclusions}; running all examples instead"
                    ));
                    tracing::info!(
                        selected = outcome.len(),
                        "everything was filtered, ignoring inclusion filters"
                    );
                }
                false => {
                    outcome.message = Some(format!(
                        "All examples were filtered out by {}",
                        self.describe_filters(located)
                    ));
                }
            }
        }
        outcome.filtered_out = outcome.total - outcome.len();
        outcome
    }

    fn visit<'g>(
        &self,
        group: &'g ExampleGroup,
        targets: &HashMap<&str, HashSet<NodeId>>,
        chain: &mut Vec<&'g Metadata>,
        candidates: &mut Vec<Candidate<'g>>,
    ) {
        chain.push(group.metadata());
        for child in group.children() {
            match child {
                Node::Group(group) => self.visit(group, targets, chain, candidates),
                Node::Example(example) => {
                    candidates.push(self.classify(example.metadata(), chain, targets));
                }
            }
        }
        chain.pop();
    }

    fn classify<'g>(
        &self,
        example: &'g Metadata,
        chain: &[&'g Metadata],
        targets: &HashMap<&str, HashSet<NodeId>>,
    ) -> Candidate<'g> {
        let absolutely_excluded = chain
            .iter()
            .copied()
            .chain([example])
            .any(|m| self.exclusions.iter().any(|c| c.is_absolute() && c.matches(m)));
        let excluded = self
            .exclusions
            .iter()
            .any(|c| !c.is_absolute() && c.matches(example));
        let fallback = !absolutely_excluded && !excluded;

        if let Some(targets) = targets.get(normalize_file(example.id().file())) {
            let targeted = targets.iter().any(|target| target.contains(example.id()));
            return Candidate {
                metadata: example,
                located: true,
                selected: targeted && !absolutely_excluded,
                fallback,
            };
        }

        let included = example.matches_all(self.inclusions)
            && self.only_failures.is_none_or(|store| {
                store.status_for(example.id()) == LastStatus::Failed
            });
        Candidate {
            metadata: example,
            located: false,
            selected: included && fallback,
            fallback,
        }
    }

    /// `None` when nothing but exclusions narrowed the run.
    fn describe_inclusions(&self, located: bool) -> Option<String> {
        let mut parts: Vec<String> = self.inclusions.iter().map(|c| c.to_string()).collect();
        if self.only_failures.is_some() {
            parts.push("only failures".to_string());
        }
        match parts.is_empty() {
            true => located.then(|| "the given locations".to_string()),
            false => Some(format!("{{{}}}", parts.join(", "))),
        }
    }

    fn describe_filters(&self, located: bool) -> String {
        let exclusions: Vec<String> = self
            .exclusions
            .iter()
            .filter(|c| !c.is_absolute())
            .map(|c| c.to_string())
            .collect();
        match (self.describe_inclusions(located), exclusions.is_empty()) {
            (Some(inclusions), true) => inclusions,
            (Some(inclusions), false) => {
                format!("{inclusions} excluding {{{}}}", exclusions.join(", "))
            }
            (None, true) => "exclusion filters".to_string(),
            (None, false) => format!("exclusion filters {{{}}}", exclusions.join(", ")),
        }
    }
}

/// Turns the selectors of located files into the ids they target.
///
/// A line selector targets the declaration closest at or above that line.
/// When several share that line the innermost one wins.
fn resolve_targets<'f>(
    groups: &[&ExampleGroup],
    files: &'f [FileSelection],
) -> HashMap<&'f str, HashSet<NodeId>> {
    let mut targets: HashMap<&str, HashSet<NodeId>> = HashMap::new();
    for selection in files.iter().filter(|f| f.is_located()) {
        let file = normalize_file(&selection.file);
        let mut declared = Vec::new();
        for group in groups.iter().filter(|g| normalize_file(g.id().file()) == file) {
            group.walk(&mut |metadata| declared.push(metadata));
        }

        let resolved = targets.entry(file).or_default();
        for selector in &selection.selectors {
            match selector {
                LocationSelector::Id(id) => {
                    resolved.insert(id.clone());
                }
                LocationSelector::Line { line, .. } => {
                    let nearest = declared
                        .iter()
                        .filter(|m| normalize_file(&m.location().file) == file)
                        .filter(|m| m.location().line <= *line)
                        .max_by_key(|m| (m.location().line, m.id().depth()));
                    match nearest {
                        Some(metadata) => {
                            resolved.insert(metadata.id().clone());
                        }
                        None => tracing::debug!(%selector, "line selector matches no declaration"),
                    }
                }
            }
        }
    }
    targets
}
