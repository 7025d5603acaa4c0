//! Running a world's examples.
//!
//! The runner walks the group tree depth first. Inside a group the child
//! groups run before the group's own examples, each set permuted by the
//! ordering strategy of its scope. Context hooks wrap the groups, each hooks
//! wrap the examples (see [`example`]).

use std::{
    mem,
    time::{Duration, Instant, SystemTime},
};

use crate::{
    capture::PanicCaptureGuard,
    config::Configuration,
    context::GroupContext,
    fault::{Fault, FaultOrigin},
    filter::{FileSelection, FilterOutcome, MetadataFilter},
    hooks::{Hook, HookCallback, HookPhase, HookRegistry},
    id::NodeId,
    metadata::{Declaration, DeclaredMetadata, KeySet, Location, Metadata},
    node::{Example, ExampleGroup},
    ordering::{OrderScope, random_seed},
    outcome::{ExampleOutcome, ExampleStatus},
    report::RunReport,
    reporter::Reporter,
    status::StatusStore,
};

mod example;
mod stop;

use example::{execute, guarded, scopes};
pub use stop::StopSignal;

/// What a run borrows from its world.
pub(crate) struct RunScope<'w> {
    pub groups: &'w [ExampleGroup],
    pub hooks: &'w HookRegistry,
    pub config: &'w Configuration,
    pub statuses: &'w StatusStore,
    pub stop: &'w StopSignal,
}

pub(crate) struct Runner<'w, R> {
    scope: RunScope<'w>,
    reporter: R,
    selection: FilterOutcome,
    seed: u64,
    outcomes: Vec<ExampleOutcome>,
    group_faults: Vec<(Option<NodeId>, Fault)>,
    failures: usize,
}

impl<'w, R: Reporter> Runner<'w, R> {
    pub fn new(scope: RunScope<'w>, reporter: R) -> Self {
        Self {
            scope,
            reporter,
            selection: FilterOutcome::default(),
            seed: 0,
            outcomes: Vec::new(),
            group_faults: Vec::new(),
            failures: 0,
        }
    }

    pub fn run(mut self, files: &[FileSelection]) -> RunReport {
        let _capture = PanicCaptureGuard::install();
        let started = Instant::now();
        let config = self.scope.config;

        let filter = MetadataFilter {
            inclusions: &config.inclusions,
            exclusions: &config.exclusions,
            run_all_when_everything_filtered: config.run_all_when_everything_filtered,
            only_failures: config.only_failures.then_some(self.scope.statuses),
        };
        self.selection = filter.filter(self.scope.groups, files);
        self.seed = config.seed.unwrap_or_else(random_seed);
        tracing::info!(
            examples = self.selection.len(),
            filtered_out = self.selection.filtered_out,
            seed = self.seed,
            files = files.len(),
            "run started"
        );

        self.reporter.run_started(self.selection.len());
        self.reporter.seed_used(self.seed);
        if let Some(message) = &self.selection.message {
            self.reporter.message(message);
        }

        self.run_suite();

        let stopped = self.scope.stop.is_requested();
        let report = RunReport {
            outcomes: self.outcomes,
            group_faults: self.group_faults,
            filter: self.selection,
            seed: self.seed,
            duration: started.elapsed(),
            stopped,
        };
        self.reporter.run_finished(&report.summary());
        tracing::info!(summary = %report.summary(), stopped, "run finished");
        report
    }

    /// Unfiltered world context hooks wrap the whole run.
    fn run_suite(&mut self) {
        let hooks = self.scope.hooks;
        let mut ctx = GroupContext::new(suite_metadata());

        let befores: Vec<&Hook> = hooks
            .context_hooks(HookPhase::Before)
            .filter(|hook| !hook.is_filtered())
            .collect();
        let failed = befores
            .iter()
            .find_map(|hook| call_context_hook(hook, &mut ctx).err());

        let mut groups: Vec<&ExampleGroup> = self
            .scope
            .groups
            .iter()
            .filter(|group| self.selection.is_active(group.id()))
            .collect();
        self.scope.config.ordering.get(OrderScope::Global).apply(
            &mut groups,
            |group| group.metadata(),
            self.seed,
            "",
        );
        match failed {
            Some(fault) => {
                let fault = fault.with_origin(FaultOrigin::BeforeContext(None));
                tracing::warn!(fault = %fault.message, "suite level before(:context) hook failed");
                for group in groups {
                    self.reporter.group_started(group.metadata());
                    self.fail_group(group, &fault);
                    self.reporter.group_finished(group.metadata());
                }
            }
            None => {
                for group in groups {
                    if self.should_stop() {
                        break;
                    }
                    self.run_group(group, &mut Vec::new());
                }
            }
        }

        let afters: Vec<&Hook> = hooks
            .context_hooks(HookPhase::After)
            .filter(|hook| !hook.is_filtered())
            .collect();
        for hook in afters.iter().rev() {
            if let Err(fault) = call_context_hook(hook, &mut ctx) {
                self.after_context_failed(None, fault);
            }
        }
    }

    fn run_group(&mut self, group: &'w ExampleGroup, ancestors: &mut Vec<&'w ExampleGroup>) {
        if self.should_stop() || !self.selection.is_active(group.id()) {
            return;
        }
        let metadata = group.metadata();
        tracing::trace!(group = %group.id(), "entering group");
        self.reporter.group_started(metadata);

        let mut ctx = GroupContext::new(metadata.clone());
        let failed = self
            .context_hooks(HookPhase::Before, group, ancestors)
            .into_iter()
            .find_map(|hook| call_context_hook(hook, &mut ctx).err());
        match failed {
            Some(fault) => {
                let fault = fault.with_origin(FaultOrigin::BeforeContext(Some(group.id().clone())));
                tracing::warn!(group = %group.id(), fault = %fault.message, "before(:context) hook failed");
                self.fail_group(group, &fault);
            }
            None => {
                ancestors.push(group);
                self.run_children(group, ancestors);
                ancestors.pop();
            }
        }

        let afters = self.context_hooks(HookPhase::After, group, ancestors);
        for hook in afters.into_iter().rev() {
            if let Err(fault) = call_context_hook(hook, &mut ctx) {
                self.after_context_failed(Some(group.id()), fault);
            }
        }

        tracing::trace!(group = %group.id(), "leaving group");
        self.reporter.group_finished(metadata);
    }

    /// `ancestors` ends with `group`.
    fn run_children(&mut self, group: &'w ExampleGroup, ancestors: &mut Vec<&'w ExampleGroup>) {
        for child in self.ordered_groups(group) {
            if self.should_stop() {
                return;
            }
            self.run_group(child, ancestors);
        }
        for example in self.ordered_examples(group) {
            if self.should_stop() {
                return;
            }
            self.run_example(example, ancestors);
        }
    }

    /// Active child groups of `group` in the order they run.
    fn ordered_groups(&self, group: &'w ExampleGroup) -> Vec<&'w ExampleGroup> {
        let mut groups: Vec<&'w ExampleGroup> = group
            .groups()
            .filter(|child| self.selection.is_active(child.id()))
            .collect();
        self.scope
            .config
            .ordering
            .for_children(group.metadata(), OrderScope::Context)
            .apply(
                &mut groups,
                |child| child.metadata(),
                self.seed,
                &format!("{}/groups", group.id()),
            );
        groups
    }

    /// Selected direct examples of `group` in the order they run.
    fn ordered_examples(&self, group: &'w ExampleGroup) -> Vec<&'w Example> {
        let mut examples: Vec<&'w Example> = group
            .examples()
            .filter(|example| self.selection.is_selected(example.id()))
            .collect();
        self.scope
            .config
            .ordering
            .for_children(group.metadata(), OrderScope::Example)
            .apply(
                &mut examples,
                |example| example.metadata(),
                self.seed,
                &format!("{}/examples", group.id()),
            );
        examples
    }

    fn run_example(&mut self, example: &'w Example, ancestors: &[&'w ExampleGroup]) {
        let metadata = example.metadata();
        self.reporter.example_started(metadata);

        let started_at = SystemTime::now();
        let started = Instant::now();
        let (status, secondary) = execute(example, &scopes(self.scope.hooks, ancestors));
        let outcome = outcome(metadata, status, secondary, started_at, started.elapsed());
        self.record(metadata, outcome);
    }

    /// Context hooks of `phase` that run for `group`.
    ///
    /// Filtered world hooks run for the outermost matching group only, the
    /// group's own hooks whenever their criteria match the group.
    fn context_hooks(
        &self,
        phase: HookPhase,
        group: &'w ExampleGroup,
        ancestors: &[&'w ExampleGroup],
    ) -> Vec<&'w Hook> {
        let world = self.scope.hooks;
        let outermost = |hook: &&Hook| {
            hook.is_filtered()
                && hook.applies_to(group.metadata())
                && !ancestors.iter().any(|a| hook.applies_to(a.metadata()))
        };
        world
            .context_hooks(phase)
            .filter(outermost)
            .chain(
                group
                    .hooks()
                    .context_hooks(phase)
                    .filter(|hook| hook.applies_to(group.metadata())),
            )
            .collect()
    }

    /// Record every selected example below `group` as failed without
    /// running it, walking the subtree the way a run would.
    fn fail_group(&mut self, group: &'w ExampleGroup, fault: &Fault) {
        for child in self.ordered_groups(group) {
            self.reporter.group_started(child.metadata());
            self.fail_group(child, fault);
            self.reporter.group_finished(child.metadata());
        }
        for example in self.ordered_examples(group) {
            let metadata = example.metadata();
            self.reporter.example_started(metadata);
            let status = ExampleStatus::Failed(fault.clone());
            let outcome = outcome(metadata, status, Vec::new(), SystemTime::now(), Duration::ZERO);
            self.record(metadata, outcome);
        }
    }

    /// An after(:context) hook faulted once its examples had finished.
    ///
    /// The fault is kept as a group fault and every good outcome below the
    /// group is turned into a failure with it.
    fn after_context_failed(&mut self, group: Option<&NodeId>, fault: Fault) {
        let fault = fault.with_origin(FaultOrigin::AfterContext(group.cloned()));
        let scope = group.map_or_else(|| "the suite".to_string(), |id| id.to_string());
        tracing::warn!(group = %scope, fault = %fault.message, "after(:context) hook failed");
        self.reporter.message(&format!(
            "An error occurred in an after(:context) hook of {scope}: {}",
            fault.message
        ));

        let mut escalated = 0;
        for outcome in &mut self.outcomes {
            let covered = group.is_none_or(|id| id.contains(&outcome.id));
            if !covered || outcome.is_bad() {
                continue;
            }
            let previous = mem::replace(&mut outcome.status, ExampleStatus::Failed(fault.clone()));
            if let Some(earlier) = previous.fault() {
                outcome.secondary.push(earlier.clone());
            }
            escalated += 1;
        }
        self.group_faults.push((group.cloned(), fault));
        self.count_failures(escalated);
    }

    fn record(&mut self, metadata: &Metadata, outcome: ExampleOutcome) {
        self.reporter.example_finished(metadata, &outcome);
        if outcome.is_bad() {
            self.count_failures(1);
        }
        self.outcomes.push(outcome);
    }

    /// Fail fast triggers once, on the failure that reaches the limit.
    fn count_failures(&mut self, count: usize) {
        let before = self.failures;
        self.failures += count;
        let Some(limit) = self.scope.config.fail_fast else {
            return;
        };
        if before < limit.get() && self.failures >= limit.get() {
            self.reporter.message(&format!(
                "Stopping after {} failed examples (fail fast)",
                self.failures
            ));
            self.scope.stop.request_stop();
        }
    }

    fn should_stop(&self) -> bool {
        self.scope.stop.is_requested()
    }
}

fn call_context_hook(hook: &Hook, ctx: &mut GroupContext) -> Result<(), Fault> {
    match &hook.callback {
        HookCallback::Context(callback) => guarded(|| callback(ctx)),
        HookCallback::Each(_) | HookCallback::Around(_) => Ok(()),
    }
}

fn outcome(
    metadata: &Metadata,
    status: ExampleStatus,
    secondary: Vec<Fault>,
    started_at: SystemTime,
    duration: Duration,
) -> ExampleOutcome {
    ExampleOutcome {
        id: metadata.id().clone(),
        full_description: metadata.full_description().to_string(),
        status,
        secondary,
        started_at,
        duration,
    }
}

/// Metadata handed to suite level context hooks.
fn suite_metadata() -> Metadata {
    let declaration = Declaration {
        description: "".into(),
        location: Location::new("", 0),
        id: NodeId::new("", Vec::new()),
        declared: DeclaredMetadata::new(),
    };
    Metadata::build(None, declaration, &KeySet::new())
}
