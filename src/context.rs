use std::borrow::Cow;

use crate::{fault::Fault, metadata::Metadata};

/// State of a single example while its hooks and body execute.
///
/// Every `each` hook and the body receive the same context, so a hook can
/// look at what happened before it, e.g. an after hook checking
/// [`failure`](Self::failure).
#[derive(Debug)]
pub struct ExampleContext {
    metadata: Metadata,
    primary: Option<Fault>,
    secondary: Vec<Fault>,
    pending: Option<Cow<'static, str>>,
    not_run: Option<Fault>,
}

impl ExampleContext {
    pub(crate) fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            primary: None,
            secondary: Vec::new(),
            pending: None,
            not_run: None,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn description(&self) -> &str {
        self.metadata.description()
    }

    pub fn full_description(&self) -> &str {
        self.metadata.full_description()
    }

    /// Mark the rest of this example as expected to fail.
    ///
    /// If the example then faults it ends as pending, if it passes anyway
    /// the pending declaration itself is reported as a failure.
    pub fn pending(&mut self, reason: impl Into<Cow<'static, str>>) {
        self.pending = Some(reason.into());
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The first fault recorded for this example.
    pub fn failure(&self) -> Option<&Fault> {
        self.primary.as_ref()
    }

    pub fn has_failed(&self) -> bool {
        self.primary.is_some()
    }

    /// Record a fault. The first one becomes the failure cause, later ones
    /// are kept as secondary faults.
    pub(crate) fn record(&mut self, fault: Fault) {
        match self.primary {
            None => self.primary = Some(fault),
            Some(_) => self.secondary.push(fault),
        }
    }

    /// An around hook returned without running what it wraps.
    pub(crate) fn mark_not_run(&mut self, diagnostic: Fault) {
        self.not_run.get_or_insert(diagnostic);
    }

    pub(crate) fn finish(self) -> ExampleFaults {
        ExampleFaults {
            primary: self.primary,
            secondary: self.secondary,
            pending: self.pending,
            not_run: self.not_run,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ExampleFaults {
    pub primary: Option<Fault>,
    pub secondary: Vec<Fault>,
    pub pending: Option<Cow<'static, str>>,
    pub not_run: Option<Fault>,
}

/// What `before(:context)` and `after(:context)` hooks receive.
#[derive(Debug)]
pub struct GroupContext {
    metadata: Metadata,
}

impl GroupContext {
    pub(crate) fn new(metadata: Metadata) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn description(&self) -> &str {
        self.metadata.description()
    }
}
