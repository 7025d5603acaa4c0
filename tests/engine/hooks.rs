use std::{cell::Cell, rc::Rc};

use kispec::{FaultOrigin, prelude::*};
use pretty_assertions::assert_eq;

use crate::support::{FILE, Trace};

#[test]
fn each_hooks_nest_outer_to_inner() {
    let trace = Trace::default();
    let mut world = World::default();
    world
        .describe_in(FILE, "outer", meta!(), |g| {
            let t = trace.clone();
            g.before_each(move |_| t.push("h1"));
            let t = trace.clone();
            g.after_each(move |_| t.push("g1"));
            g.context("inner", |g| {
                let t = trace.clone();
                g.before_each(move |_| t.push("h2"));
                let t = trace.clone();
                g.after_each(move |_| t.push("g2"));
                let t = trace.clone();
                g.it("body", move |_| t.push("B"));
            });
        })
        .unwrap();

    assert!(world.run(&[], NoReporter));
    assert_eq!(trace.entries(), ["h1", "h2", "B", "g2", "g1"]);
}

#[test]
fn around_hooks_wrap_before_and_after_hooks() {
    let trace = Trace::default();
    let mut world = World::default();
    let t = trace.clone();
    world.around_each(move |ctx, example| {
        t.push("around in");
        example.call(ctx);
        t.push("around out");
    });
    world
        .describe_in(FILE, "g", meta!(), |g| {
            let t = trace.clone();
            g.before_each(move |_| t.push("before"));
            let t = trace.clone();
            g.after_each(move |_| t.push("after"));
            let t = trace.clone();
            g.it("body", move |_| t.push("body"));
        })
        .unwrap();

    assert!(world.run(&[], NoReporter));
    assert_eq!(
        trace.entries(),
        ["around in", "before", "body", "after", "around out"]
    );
}

#[test]
fn filtered_each_hooks_apply_to_matching_examples_only() {
    let trace = Trace::default();
    let mut world = World::default();
    let t = trace.clone();
    world.before_each_where(vec![Criterion::new("db", true)], move |ctx| {
        t.push(format!("connect for {}", ctx.description()))
    });
    world
        .describe_in(FILE, "g", meta!(), |g| {
            g.it_with("queries", meta! { db }, |_| ());
            g.it("computes", |_| ());
        })
        .unwrap();

    assert!(world.run(&[], NoReporter));
    assert_eq!(trace.entries(), ["connect for queries"]);
}

#[test]
fn failing_before_context_skips_every_body_in_the_group() {
    let counter = Rc::new(Cell::new(0));
    let mut world = World::default();
    world
        .describe_in(FILE, "needs a server", meta!(), |g| {
            g.before_context(|_| -> Result<(), Fault> { Err(Fault::unexpected("connection refused")) });
            for name in ["first", "second"] {
                let counter = counter.clone();
                g.it(name, move |_| counter.set(counter.get() + 1));
            }
        })
        .unwrap();
    world
        .describe_in(FILE, "sibling", meta!(), |g| {
            g.it("still runs", |_| ());
        })
        .unwrap();

    let report = world.run_report(&[], NoReporter);
    assert_eq!(counter.get(), 0);
    assert_eq!(report.failure_count(), 2);
    for outcome in report.outcomes.iter().filter(|o| o.is_bad()) {
        let fault = outcome.fault().unwrap();
        assert_eq!(fault.message, "connection refused");
        assert!(matches!(fault.origin, FaultOrigin::BeforeContext(Some(_))));
    }
    assert!(report.outcomes.last().unwrap().status.passed());
}

#[test]
fn context_hooks_run_once_per_group() {
    let trace = Trace::default();
    let mut world = World::default();
    world
        .describe_in(FILE, "g", meta!(), |g| {
            let t = trace.clone();
            g.before_context(move |ctx| t.push(format!("enter {}", ctx.description())));
            let t = trace.clone();
            g.after_context(move |ctx| t.push(format!("leave {}", ctx.description())));
            for name in ["one", "two"] {
                let t = trace.clone();
                g.it(name, move |_| t.push("example"));
            }
        })
        .unwrap();

    assert!(world.run(&[], NoReporter));
    assert_eq!(trace.entries(), ["enter g", "example", "example", "leave g"]);
}

#[test]
fn faults_in_after_hooks_do_not_hide_the_first_failure() {
    let mut world = World::default();
    world
        .describe_in(FILE, "g", meta!(), |g| {
            g.after_each(|_| -> Result<(), Fault> { Err(Fault::unexpected("cleanup")) });
            g.it("fails", |_| assert_eq!(2 + 2, 5));
        })
        .unwrap();

    let report = world.run_report(&[], NoReporter);
    let outcome = &report.outcomes[0];
    let fault = outcome.fault().unwrap();
    assert!(fault.is_assertion());
    assert_eq!(fault.origin, FaultOrigin::Body);
    assert_eq!(outcome.secondary.len(), 1);
    assert_eq!(outcome.secondary[0].message, "cleanup");
}
