use kispec::{prelude::*, status::{LastStatus, StatusStore}};
use pretty_assertions::assert_eq;

use crate::support::{FILE, Trace, files, recorded_world};

fn tagged(config: Configuration, trace: &Trace) -> World {
    let mut world = World::new(config);
    world
        .describe_in(FILE, "Parser", meta!(), |g| {
            g.it_with("reads numbers", meta! { fast }, trace.recorder());
            g.it_with("reads strings", meta! { fast }, trace.recorder());
            g.it_with("reads huge files", meta! { slow }, trace.recorder());
            g.context_with("on windows", meta! { if: false }, |g| {
                g.it_with("handles CRLF", meta! { fast }, trace.recorder());
            });
        })
        .unwrap();
    world
}

#[test]
fn inclusion_runs_exactly_the_matching_examples() {
    let trace = Trace::default();
    let mut world = tagged(Configuration::default().with_tag("fast"), &trace);
    let report = world.run_report(&[], NoReporter);
    assert!(report.success());
    assert_eq!(trace.entries(), ["Parser reads numbers", "Parser reads strings"]);
    assert_eq!(report.filter.filtered_out, 2);
}

#[test]
fn exclusions_beat_inclusions() {
    let trace = Trace::default();
    let config = Configuration::default()
        .with_inclusion(Criterion::new("fast", true))
        .with_exclusion(Criterion::new("fast", true));
    let mut world = tagged(config, &trace);
    let mut log = EventLog::new();
    let report = world.run_report(&[], &mut log);

    assert!(trace.entries().is_empty());
    assert!(report.outcomes.is_empty());
    assert!(report.success());
    assert_eq!(log.messages().len(), 1);
    assert!(log.messages()[0].starts_with("All examples were filtered out"));
}

#[test]
fn run_all_when_everything_filtered() {
    let config = || Configuration::default().with_tag("focus");

    let trace = Trace::default();
    let mut strict = tagged(config(), &trace);
    let report = strict.run_report(&[], NoReporter);
    assert_eq!(report.outcomes.len(), 0);
    assert!(!report.filter.fell_back);

    let trace = Trace::default();
    let mut lenient = tagged(config().with_run_all_when_everything_filtered(true), &trace);
    let mut log = EventLog::new();
    let report = lenient.run_report(&[], &mut log);
    assert!(report.filter.fell_back);
    assert_eq!(
        trace.entries(),
        ["Parser reads numbers", "Parser reads strings", "Parser reads huge files"]
    );
    assert!(log.messages()[0].contains("running all examples instead"));
}

#[test]
fn scoped_ids_select_single_examples() {
    let trace = Trace::default();
    let mut world = tagged(Configuration::default(), &trace);
    let selection = files(&["tests/engine/sample.rs[1:3]"]);
    assert!(world.run(&selection, NoReporter));
    assert_eq!(trace.entries(), ["Parser reads huge files"]);
}

#[test]
fn locations_apply_only_within_their_own_file() {
    let trace = Trace::default();
    let mut world = World::new(Configuration::default().with_tag("fast"));
    world
        .describe_in("a.rs", "A", meta!(), |g| {
            g.it_with("slow one", meta! { slow }, trace.recorder());
            g.it_with("fast a", meta! { fast }, trace.recorder());
        })
        .unwrap();
    world
        .describe_in("b.rs", "B", meta!(), |g| {
            g.it_with("fast b", meta! { fast }, trace.recorder());
            g.it_with("slow b", meta! { slow }, trace.recorder());
        })
        .unwrap();

    assert!(world.run(&files(&["a.rs[1:1]", "b.rs"]), NoReporter));
    assert_eq!(trace.entries(), ["A slow one", "B fast b"]);
}

#[test]
fn group_ids_select_every_descendant() {
    let trace = Trace::default();
    let mut world = recorded_world(Configuration::default(), &trace);
    let selection = files(&["tests/engine/sample.rs[2:2]"]);
    assert!(world.run(&selection, NoReporter));
    assert_eq!(
        trace.entries(),
        ["beta nested n1", "beta nested n2", "beta nested n3"]
    );
}

#[test]
fn filtered_out_message_names_exclusions_without_locations() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Windows", meta! { if: false }, |g| {
            g.it("handles CRLF", |_| ());
        })
        .unwrap();
    let mut log = EventLog::new();
    assert!(world.run(&[], &mut log));
    assert_eq!(
        log.messages(),
        ["All examples were filtered out by exclusion filters"]
    );
}

#[test]
fn rerun_ids_reproduce_failures() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Math", meta!(), |g| {
            g.it("adds", |_| assert_eq!(1 + 1, 2));
            g.it("e1", |_| assert_eq!(1 + 1, 3));
            g.context("nested", |g| {
                g.it("e2", |_| -> Result<(), Fault> { Err(Fault::assertion("nope")) });
            });
        })
        .unwrap();

    let report = world.run_report(&[], NoReporter);
    let rerun: Vec<String> = report.rerun_ids().iter().map(ToString::to_string).collect();
    assert_eq!(rerun, ["tests/engine/sample.rs[1:2]", "tests/engine/sample.rs[1:3:1]"]);

    let selection = files(&["tests/engine/sample.rs[1:2,1:3:1]"]);
    let rerun_report = world.run_report(&selection, NoReporter);
    let rerun_ran: Vec<&str> = rerun_report
        .outcomes
        .iter()
        .map(|o| o.full_description.as_str())
        .collect();
    assert_eq!(rerun_ran, ["Math nested e2", "Math e1"]);
}

#[test]
fn only_failures_uses_the_status_store() {
    let trace = Trace::default();
    let mut world = tagged(Configuration::default().with_only_failures(true), &trace);
    let mut store = StatusStore::new();
    store.record("tests/engine/sample.rs[1:1]".parse().unwrap(), LastStatus::Passed);
    store.record("tests/engine/sample.rs[1:2]".parse().unwrap(), LastStatus::Failed);
    world.load_statuses(store);

    assert!(world.run(&[], NoReporter));
    assert_eq!(trace.entries(), ["Parser reads strings"]);
    assert_eq!(
        world.status_for(&"tests/engine/sample.rs[1:2]".parse().unwrap()),
        LastStatus::Passed
    );
}
