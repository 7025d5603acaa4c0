//! The registry every declaration lands in and the entry point of a run.
//!
//! A [`World`] owns the declared group tree, the world level hooks and
//! shared examples, the run configuration and the last known status of each
//! example. There is no process wide instance: callers hold their world
//! explicitly and use a [`WorldStack`] when a run has to host another run.

use std::{
    borrow::Cow,
    collections::HashMap,
    mem,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    sync::Arc,
};

use crate::{
    config::Configuration,
    declare::{GroupBuilder, Session},
    error::{Error, Result},
    filter::{Criterion, FileSelection, normalize_file},
    hooks::{DeclareHooks, HookRegistry},
    id::NodeId,
    metadata::{Declaration, DeclaredMetadata, Location, MetaValue, Metadata},
    node::ExampleGroup,
    report::RunReport,
    reporter::Reporter,
    runner::{RunScope, Runner, StopSignal},
    shared::SharedExamples,
    status::{LastStatus, StatusStore},
};

#[derive(Debug, Default)]
pub struct World {
    config: Configuration,
    groups: Vec<ExampleGroup>,
    shared: SharedExamples,
    hooks: HookRegistry,
    statuses: StatusStore,
    /// Top level groups declared so far per file, for their ids.
    file_counters: HashMap<Arc<str>, u32>,
    stop: StopSignal,
}

impl World {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn configure(&mut self, config: Configuration) {
        self.config = config;
    }

    /// Top level groups in declaration order.
    pub fn groups(&self) -> &[ExampleGroup] {
        &self.groups
    }

    /// Hooks declared on the world itself.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn example_count(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.descendant_examples().len())
            .sum()
    }

    /// Declare a top level group in the caller's file.
    #[track_caller]
    pub fn describe<F>(&mut self, description: impl Into<Cow<'static, str>>, body: F) -> Result<()>
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
    ) -> Result<()>
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        let caller = panic::Location::caller();
        self.declare(Arc::from(caller.file()), caller, description.into(), declared, body)
    }

    /// Declare a top level group attributed to `file`.
    ///
    /// Useful when groups are generated rather than written in the file
    /// their ids should point at. Declarations made from the calling file
    /// are located in `file` as well, so line selectors work against it.
    #[track_caller]
    pub fn describe_in<F>(
        &mut self,
        file: &str,
        description: impl Into<Cow<'static, str>>,
        declared: DeclaredMetadata,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        let caller = panic::Location::caller();
        self.declare(Arc::from(normalize_file(file)), caller, description.into(), declared, body)
    }

    /// The group is only registered if its whole body declared cleanly.
    ///
    /// A panicking body still hands the world's shared examples back before
    /// the panic continues.
    fn declare<F>(
        &mut self,
        file: Arc<str>,
        caller: &'static panic::Location<'static>,
        description: Cow<'static, str>,
        declared: DeclaredMetadata,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut GroupBuilder<'_>),
    {
        let counter = self.file_counters.entry(Arc::clone(&file)).or_default();
        *counter += 1;
        let declaration = Declaration {
            description,
            location: Location::new(Arc::clone(&file), caller.line()),
            id: NodeId::top_level(Arc::clone(&file), *counter),
            declared,
        };
        let metadata = Metadata::build(None, declaration, &self.config.non_inheritable);
        let mut group = ExampleGroup::new(metadata);

        let mut session = Session::new(
            mem::take(&mut self.shared),
            self.config.non_inheritable.clone(),
            file,
            caller.file(),
        );
        let finished = panic::catch_unwind(AssertUnwindSafe(|| {
            body(&mut GroupBuilder::new(&mut group, &mut session))
        }));
        let (shared, error) = session.finish();
        self.shared = shared;
        if let Err(payload) = finished {
            tracing::debug!(group = %group.id(), "declaration body panicked");
            panic::resume_unwind(payload);
        }

        match error {
            Some(error) => {
                tracing::debug!(group = %group.id(), %error, "discarding group");
                Err(error)
            }
            None => {
                self.groups.push(group);
                Ok(())
            }
        }
    }

    /// Shared examples visible to every group.
    #[track_caller]
    pub fn shared_examples<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: Fn(&mut GroupBuilder<'_>, &[MetaValue]) + 'static,
    {
        self.shared_examples_where(name, Vec::new(), body)
    }

    /// Shared examples visible to groups whose metadata matches `criteria`.
    #[track_caller]
    pub fn shared_examples_where<F>(&mut self, name: impl Into<String>, criteria: Vec<Criterion>, body: F)
    where
        F: Fn(&mut GroupBuilder<'_>, &[MetaValue]) + 'static,
    {
        let location = Location::from_caller(panic::Location::caller());
        self.shared
            .define(name, None, criteria, location, Rc::new(body));
    }

    pub fn statuses(&self) -> &StatusStore {
        &self.statuses
    }

    /// Replace the last known statuses, usually with a store loaded from
    /// disk before an only-failures run.
    pub fn load_statuses(&mut self, statuses: StatusStore) {
        self.statuses = statuses;
    }

    pub fn status_for(&self, id: &NodeId) -> LastStatus {
        self.statuses.status_for(id)
    }

    /// A handle that stops the next or current run after the example
    /// executing at the time.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Drop every declaration and recorded status. Configuration and world
    /// level hooks stay.
    pub fn reset(&mut self) {
        self.groups.clear();
        self.shared = SharedExamples::default();
        self.statuses.clear();
        self.file_counters.clear();
        self.stop.reset();
    }

    /// Run the examples declared in `files`, every file if empty.
    ///
    /// Returns whether every selected example passed or was pending.
    pub fn run<R: Reporter>(&mut self, files: &[FileSelection], reporter: R) -> bool {
        self.run_report(files, reporter).success()
    }

    pub fn run_report<R: Reporter>(&mut self, files: &[FileSelection], reporter: R) -> RunReport {
        self.stop.reset();
        let scope = RunScope {
            groups: &self.groups,
            hooks: &self.hooks,
            config: &self.config,
            statuses: &self.statuses,
            stop: &self.stop,
        };
        let report = Runner::new(scope, reporter).run(files);
        self.statuses.record_outcomes(&report.outcomes);
        report
    }
}

impl DeclareHooks for World {
    fn hook_registry(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }
}

/// Worlds of nested runs.
///
/// The bottom world is never popped, so [`current`](Self::current) always
/// has something to return.
#[derive(Debug)]
pub struct WorldStack {
    worlds: Vec<World>,
}

impl Default for WorldStack {
    fn default() -> Self {
        Self::new(World::default())
    }
}

impl WorldStack {
    pub fn new(base: World) -> Self {
        Self { worlds: vec![base] }
    }

    pub fn depth(&self) -> usize {
        self.worlds.len()
    }

    pub fn push(&mut self, world: World) {
        self.worlds.push(world);
        tracing::debug!(depth = self.worlds.len(), "pushed world");
    }

    pub fn pop(&mut self) -> Result<World> {
        if self.worlds.len() <= 1 {
            return Err(Error::WorldStackUnderflow);
        }
        let world = self.worlds.pop().ok_or(Error::WorldStackUnderflow)?;
        tracing::debug!(depth = self.worlds.len(), "popped world");
        Ok(world)
    }

    pub fn current(&self) -> &World {
        &self.worlds[self.worlds.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut World {
        let top = self.worlds.len() - 1;
        &mut self.worlds[top]
    }

    /// Run `f` against a fresh world that inherits the current
    /// configuration. The outer world is current again once `f` returns or
    /// panics.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut World) -> T) -> T {
        let config = self.current().configuration().clone();
        self.push(World::new(config));
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(self.current_mut())));
        let _inner = self.pop();
        match result {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
