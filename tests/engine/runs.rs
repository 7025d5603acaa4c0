use std::{fs, thread};

use kispec::{RunSummary, prelude::*};
use pretty_assertions::assert_eq;

use crate::support::{FILE, Trace};

#[test]
fn pending_examples_do_not_fail_the_run() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Cache", meta!(), |g| {
            g.it("hits", |_| ());
            g.todo("expires entries");
            g.it_with("evicts", meta! { pending: "not built yet" }, |_| assert_eq!(1, 2));
            g.it_with("shards", meta! { skip: "needs a cluster" }, |_| ());
        })
        .unwrap();

    let report = world.run_report(&[], NoReporter);
    assert!(report.success());
    assert_eq!(report.pending_count(), 3);
    assert_eq!(report.summary().to_string(), "4 examples, 0 failures, 3 pending");
}

#[test]
fn pending_example_that_passes_is_a_failure() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Cache", meta!(), |g| {
            g.it("was fixed", |ctx| {
                ctx.pending("flaky");
            });
        })
        .unwrap();
    let report = world.run_report(&[], NoReporter);
    assert!(!report.success());
    assert_eq!(
        report.outcomes[0].status,
        ExampleStatus::PendingFixed {
            reason: "flaky".into()
        }
    );
}

#[test]
fn events_arrive_in_order_over_a_channel() {
    let (reporter, events) = ChannelReporter::unbounded();
    let consumer = thread::spawn(move || events.iter().collect::<Vec<ReportEvent>>());

    let mut world = World::new(Configuration::default().with_seed(7));
    world
        .describe_in(FILE, "g", meta!(), |g| {
            g.it("passes", |_| ());
        })
        .unwrap();
    assert!(world.run(&[], reporter));

    let events = consumer.join().unwrap();
    let kinds: Vec<&str> = events
        .iter()
        .map(|event| match event {
            ReportEvent::RunStarted { .. } => "run started",
            ReportEvent::SeedUsed(_) => "seed",
            ReportEvent::GroupStarted { .. } => "group started",
            ReportEvent::GroupFinished { .. } => "group finished",
            ReportEvent::ExampleStarted { .. } => "example started",
            ReportEvent::ExampleFinished { .. } => "example finished",
            ReportEvent::Message(_) => "message",
            ReportEvent::RunFinished(_) => "run finished",
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "run started",
            "seed",
            "group started",
            "example started",
            "example finished",
            "group finished",
            "run finished",
        ]
    );
    assert_eq!(events[0], ReportEvent::RunStarted { count: 1 });
    assert_eq!(events[1], ReportEvent::SeedUsed(7));
    let ReportEvent::RunFinished(RunSummary { examples, failures, .. }) = events[6] else {
        panic!("expected the summary last");
    };
    assert_eq!((examples, failures), (1, 0));
}

#[test]
fn empty_selection_is_not_an_error() {
    let mut world = World::default();
    let mut log = EventLog::new();
    let report = world.run_report(&[], &mut log);
    assert!(report.success());
    assert_eq!(report.summary().examples, 0);
    assert!(log.messages().is_empty());
}

#[test]
fn suite_hooks_wrap_the_whole_run() {
    let trace = Trace::default();
    let mut world = World::default();
    let t = trace.clone();
    world.before_context(move |_| t.push("suite start"));
    let t = trace.clone();
    world.after_context(move |_| t.push("suite end"));
    world
        .describe_in(FILE, "g", meta!(), |g| {
            g.it("one", trace.recorder());
        })
        .unwrap();
    world
        .describe_in(FILE, "h", meta!(), |g| {
            g.it("two", trace.recorder());
        })
        .unwrap();

    assert!(world.run(&[], NoReporter));
    assert_eq!(trace.entries(), ["suite start", "g one", "h two", "suite end"]);
}

#[test]
fn nested_runs_keep_the_outer_world_intact() {
    let mut stack = WorldStack::default();
    stack
        .current_mut()
        .describe_in(FILE, "outer", meta!(), |g| {
            g.it("fails", |_| assert_eq!(1, 2));
        })
        .unwrap();

    let inner_success = stack.nested(|world| {
        world
            .describe_in(FILE, "engine under test", meta!(), |g| {
                g.it("passes", |_| ());
            })
            .unwrap();
        world.run(&[], NoReporter)
    });
    assert!(inner_success);

    let outer = stack.current_mut();
    assert_eq!(outer.groups().len(), 1);
    assert!(!outer.run(&[], NoReporter));
}

#[test]
fn configuration_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kispec.toml");
    fs::write(
        &path,
        r#"
            order = "random:99"
            fail_fast = 1

            [include]
            fast = true
        "#,
    )
    .unwrap();

    let config = Configuration::load(&path).unwrap();
    assert_eq!(config.seed(), Some(99));
    let trace = Trace::default();
    let mut world = World::new(config);
    world
        .describe_in(FILE, "g", meta!(), |g| {
            g.it_with("fast failure", meta! { fast }, |_| assert_eq!(1, 2));
            g.it_with("also fast", meta! { fast }, |_| assert_eq!(1, 2));
            g.it("slow", trace.recorder());
        })
        .unwrap();

    let report = world.run_report(&[], NoReporter);
    assert_eq!(report.seed, 99);
    assert!(report.stopped);
    assert_eq!(report.failure_count(), 1);
    assert!(trace.entries().is_empty());
}
