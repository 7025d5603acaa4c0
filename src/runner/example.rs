//! Running one example inside its hooks.

use std::{
    borrow::Cow,
    panic::{self, AssertUnwindSafe},
};

use crate::{
    capture::take_panic_location,
    context::{ExampleContext, ExampleFaults},
    fault::{Fault, FaultOrigin, StepResult},
    hooks::{EachHookFn, Hook, HookCallback, HookPhase, HookRegistry, Procedure},
    metadata::{MetaValue, keys},
    node::{Example, ExampleFn, ExampleGroup},
    outcome::ExampleStatus,
};

const NO_REASON: &str = "No reason given";
const NOT_IMPLEMENTED: &str = "Not yet implemented";

/// Call a body or hook, turning panics into faults.
pub(crate) fn guarded(f: impl FnOnce() -> StepResult) -> Result<(), Fault> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(StepResult(result)) => result,
        Err(payload) => Err(Fault::from_panic(payload, take_panic_location())),
    }
}

fn reason(value: &MetaValue) -> Cow<'static, str> {
    match value {
        MetaValue::Str(reason) => reason.clone(),
        MetaValue::Bool(true) => Cow::Borrowed(NO_REASON),
        other => Cow::Owned(other.to_string()),
    }
}

/// Execute `example`.
///
/// `scopes` are the hook registries from the outermost (world) to the
/// example's own group.
pub(super) fn execute(example: &Example, scopes: &[&HookRegistry]) -> (ExampleStatus, Vec<Fault>) {
    let metadata = example.metadata();
    if let Some(skip) = metadata.get(keys::SKIP).filter(|v| v.is_truthy()) {
        let status = ExampleStatus::Pending {
            reason: reason(skip),
            fault: None,
        };
        return (status, Vec::new());
    }
    let Some(body) = &example.body else {
        let status = ExampleStatus::Pending {
            reason: Cow::Borrowed(NOT_IMPLEMENTED),
            fault: None,
        };
        return (status, Vec::new());
    };

    let mut ctx = ExampleContext::new(metadata.clone());
    if let Some(pending) = metadata.get(keys::PENDING).filter(|v| v.is_truthy()) {
        ctx.pending(reason(pending));
    }

    let hooks = |phase: HookPhase| -> Vec<&Hook> {
        scopes
            .iter()
            .flat_map(|registry| registry.each_hooks(phase, metadata))
            .collect()
    };
    let befores: Vec<&EachHookFn> = hooks(HookPhase::Before).into_iter().filter_map(each_callback).collect();
    let afters: Vec<&EachHookFn> = hooks(HookPhase::After)
        .into_iter()
        .rev()
        .filter_map(each_callback)
        .collect();
    let arounds = hooks(HookPhase::Around);

    let mut core = |ctx: &mut ExampleContext| run_core(ctx, &befores, body, &afters);
    run_arounds(&arounds, &mut ctx, &mut core);
    conclude(ctx.finish())
}

fn each_callback(hook: &Hook) -> Option<&EachHookFn> {
    match &hook.callback {
        HookCallback::Each(callback) => Some(callback),
        _ => None,
    }
}

/// Before hooks, body, after hooks.
///
/// The first faulting before hook skips the remaining before hooks and the
/// body. After hooks always run.
fn run_core(ctx: &mut ExampleContext, befores: &[&EachHookFn], body: &ExampleFn, afters: &[&EachHookFn]) {
    let aborted = befores.iter().find_map(|hook| guarded(|| hook(ctx)).err());
    match aborted {
        Some(fault) => ctx.record(fault.with_origin(FaultOrigin::BeforeEach)),
        None => {
            if let Err(fault) = guarded(|| body.call(ctx)) {
                ctx.record(fault.with_origin(FaultOrigin::Body));
            }
        }
    }

    for hook in afters {
        if let Err(fault) = guarded(|| hook(ctx)) {
            ctx.record(fault.with_origin(FaultOrigin::AfterEach));
        }
    }
}

/// Wrap `core` in the around hooks, outermost first.
fn run_arounds(arounds: &[&Hook], ctx: &mut ExampleContext, core: &mut dyn FnMut(&mut ExampleContext)) {
    let Some((hook, inner)) = arounds.split_first() else {
        return core(ctx);
    };
    let HookCallback::Around(callback) = &hook.callback else {
        return run_arounds(inner, ctx, core);
    };

    let mut next = |ctx: &mut ExampleContext| run_arounds(inner, ctx, &mut *core);
    let mut procedure = Procedure::new(&mut next);
    let result = guarded(|| callback(ctx, &mut procedure));
    let calls = procedure.calls();

    match result {
        Err(fault) => ctx.record(fault.with_origin(FaultOrigin::Around)),
        Ok(()) if calls == 0 => ctx.mark_not_run(
            Fault::usage(format!(
                "around hook declared at {} never ran the example",
                hook.location()
            ))
            .with_origin(FaultOrigin::Around)
            .with_location(hook.location().clone()),
        ),
        Ok(()) => (),
    }
}

/// Exactly one terminal status per example. Faults after the first one are
/// handed back as secondary faults.
fn conclude(faults: ExampleFaults) -> (ExampleStatus, Vec<Fault>) {
    let ExampleFaults {
        primary,
        secondary,
        pending,
        not_run,
    } = faults;
    let status = match (pending, primary, not_run) {
        (Some(reason), Some(fault), _) => ExampleStatus::Pending {
            reason,
            fault: Some(fault),
        },
        (_, Some(fault), _) => ExampleStatus::Failed(fault),
        (_, None, Some(diagnostic)) => ExampleStatus::NotRun { diagnostic },
        (Some(reason), None, None) => ExampleStatus::PendingFixed { reason },
        (None, None, None) => ExampleStatus::Passed,
    };
    (status, secondary)
}

/// Hook registries applying to examples directly inside `ancestors.last()`.
pub(super) fn scopes<'w>(world: &'w HookRegistry, ancestors: &[&'w ExampleGroup]) -> Vec<&'w HookRegistry> {
    std::iter::once(world)
        .chain(ancestors.iter().map(|group| &group.hooks))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{capture::PanicCaptureGuard, fault::FaultKind, test_support::*};

    type Trace = Rc<RefCell<Vec<String>>>;

    fn push(trace: &Trace, entry: &str) {
        trace.borrow_mut().push(entry.to_string());
    }

    fn run_single(world: &crate::World) -> (ExampleStatus, Vec<Fault>) {
        let _capture = PanicCaptureGuard::install();
        let group = &world.groups()[0];
        let mut ancestors = vec![group];
        let mut current = group;
        while let Some(next) = current.groups().next() {
            ancestors.push(next);
            current = next;
        }
        let example = current.examples().next().expect("an example");
        execute(example, &scopes(world.hooks(), &ancestors))
    }

    #[test]
    fn hooks_nest_around_the_body() {
        let trace = Trace::default();
        let mut world = crate::World::default();
        let t = trace.clone();
        world.before_each(move |_| push(&t, "world before"));
        let t = trace.clone();
        world.after_each(move |_| push(&t, "world after"));
        let t = trace.clone();
        world
            .describe_in(FILE, "outer", meta!(), move |g| {
                let t1 = t.clone();
                g.before_each(move |_| push(&t1, "h1"));
                let t1 = t.clone();
                g.after_each(move |_| push(&t1, "g1"));
                let t1 = t.clone();
                g.around_each(move |ctx, inner| {
                    push(&t1, "around in");
                    inner.call(ctx);
                    push(&t1, "around out");
                });
                let t = t.clone();
                g.context("inner", move |g| {
                    let t1 = t.clone();
                    g.before_each(move |_| push(&t1, "h2"));
                    let t1 = t.clone();
                    g.after_each(move |_| push(&t1, "g2"));
                    let t1 = t.clone();
                    g.it("body", move |_| push(&t1, "B"));
                });
            })
            .unwrap();

        let (status, secondary) = run_single(&world);
        assert_eq!(status, ExampleStatus::Passed);
        assert!(secondary.is_empty());
        assert_eq!(
            *trace.borrow(),
            [
                "around in",
                "world before",
                "h1",
                "h2",
                "B",
                "g2",
                "g1",
                "world after",
                "around out"
            ]
        );
    }

    #[test]
    fn failing_before_hook_skips_body_but_not_after_hooks() {
        let trace = Trace::default();
        let mut world = crate::World::default();
        let t = trace.clone();
        world
            .describe_in(FILE, "g", meta!(), move |g| {
                let t1 = t.clone();
                g.before_each(move |_| -> Result<(), Fault> {
                    push(&t1, "first before");
                    Err(Fault::unexpected("no database"))
                });
                let t1 = t.clone();
                g.before_each(move |_| push(&t1, "second before"));
                let t1 = t.clone();
                g.after_each(move |_| -> Result<(), Fault> {
                    push(&t1, "after");
                    Err(Fault::unexpected("cleanup failed too"))
                });
                let t1 = t.clone();
                g.it("body", move |_| push(&t1, "B"));
            })
            .unwrap();

        let (status, secondary) = run_single(&world);
        assert_eq!(*trace.borrow(), ["first before", "after"]);
        let ExampleStatus::Failed(fault) = status else {
            panic!("expected failure, got {status:?}");
        };
        assert_eq!(fault.message, "no database");
        assert_eq!(fault.origin, FaultOrigin::BeforeEach);
        assert_eq!(secondary.len(), 1);
        assert_eq!(secondary[0].origin, FaultOrigin::AfterEach);
        assert_eq!(secondary[0].message, "cleanup failed too");
    }

    #[test]
    fn around_hook_must_call_exactly_once() {
        let mut world = crate::World::default();
        world
            .describe_in(FILE, "g", meta!(), |g| {
                g.around_each(|_, _| ());
                g.it("body", never_runs);
            })
            .unwrap();
        let (status, _) = run_single(&world);
        let ExampleStatus::NotRun { diagnostic } = status else {
            panic!("expected not run, got {status:?}");
        };
        assert_eq!(diagnostic.kind, FaultKind::Usage);

        let runs = Rc::new(RefCell::new(0));
        let mut world = crate::World::default();
        let counter = runs.clone();
        world
            .describe_in(FILE, "g", meta!(), move |g| {
                g.around_each(|ctx, inner| {
                    inner.call(ctx);
                    inner.call(ctx);
                });
                let counter = counter.clone();
                g.it("body", move |_| *counter.borrow_mut() += 1);
            })
            .unwrap();
        let (status, _) = run_single(&world);
        assert_eq!(*runs.borrow(), 1);
        let ExampleStatus::Failed(fault) = status else {
            panic!("expected failure, got {status:?}");
        };
        assert_eq!(fault.kind, FaultKind::Usage);
    }

    #[test]
    fn pending_examples() {
        let mut world = crate::World::default();
        world
            .describe_in(FILE, "g", meta! { pending: "known bug" }, |g| {
                g.it("still broken", |_| assert_eq!(1, 2));
            })
            .unwrap();
        let (status, _) = run_single(&world);
        assert!(matches!(
            status,
            ExampleStatus::Pending { ref reason, fault: Some(ref fault) }
                if reason == "known bug" && fault.is_assertion()
        ));

        let mut world = crate::World::default();
        world
            .describe_in(FILE, "g", meta!(), |g| {
                g.it("fixed meanwhile", |ctx| ctx.pending("was broken"));
            })
            .unwrap();
        let (status, _) = run_single(&world);
        assert_eq!(
            status,
            ExampleStatus::PendingFixed {
                reason: "was broken".into()
            }
        );

        let mut world = crate::World::default();
        world
            .describe_in(FILE, "g", meta!(), |g| {
                g.it_with("skipped", meta! { skip }, never_runs);
            })
            .unwrap();
        let (status, _) = run_single(&world);
        assert_eq!(
            status,
            ExampleStatus::Pending {
                reason: NO_REASON.into(),
                fault: None
            }
        );
    }
}
