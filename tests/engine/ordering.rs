use kispec::{ordering::OrderScope, prelude::*};
use pretty_assertions::assert_eq;

use crate::support::{FILE, Trace, recorded_world};

fn traversal(config: Configuration) -> (Vec<String>, u64) {
    let trace = Trace::default();
    let mut world = recorded_world(config, &trace);
    let mut log = EventLog::new();
    assert!(world.run(&[], &mut log));
    (trace.entries(), log.seed().expect("seed reported"))
}

#[test]
fn defined_order_is_declaration_order() {
    let (order, _) = traversal(Configuration::default());
    assert_eq!(
        order,
        [
            "alpha a1",
            "alpha a2",
            "alpha a3",
            "alpha a4",
            "beta nested n1",
            "beta nested n2",
            "beta nested n3",
            "beta b1",
            "beta b2",
        ]
    );
}

#[test]
fn same_seed_same_traversal() {
    let config = || Configuration::default().with_order(Order::Random).with_seed(123);
    let (first, seed) = traversal(config());
    let (second, _) = traversal(config());
    assert_eq!(seed, 123);
    assert_eq!(first, second);

    let mut sorted = first.clone();
    sorted.sort();
    let (defined, _) = traversal(Configuration::default());
    let mut expected = defined.clone();
    expected.sort();
    assert_eq!(sorted, expected);
}

#[test]
fn different_seeds_usually_differ() {
    let orders: Vec<Vec<String>> = (1..=5)
        .map(|seed| {
            let config = Configuration::default().with_order(Order::Random).with_seed(seed);
            traversal(config).0
        })
        .collect();
    assert!(orders.windows(2).any(|pair| pair[0] != pair[1]));
}

#[test]
fn a_generated_seed_is_still_reported() {
    let config = Configuration::default().with_order(Order::Random);
    let (_, seed) = traversal(config);
    let trace = Trace::default();
    let mut world = recorded_world(Configuration::default().with_order(Order::Random).with_seed(seed), &trace);
    let report = world.run_report(&[], NoReporter);
    assert_eq!(report.seed, seed);
}

#[test]
fn scoped_and_named_strategies() {
    let reversed = Order::custom(|a, b| b.description().cmp(a.description()));
    let config = Configuration::default()
        .with_scoped_order(OrderScope::Global, reversed.clone())
        .with_named_order("reversed", reversed);

    let trace = Trace::default();
    let mut world = World::new(config);
    world
        .describe_in(FILE, "first", meta! { order: "reversed" }, |g| {
            g.it("a", trace.recorder());
            g.it("b", trace.recorder());
        })
        .unwrap();
    world
        .describe_in(FILE, "second", meta!(), |g| {
            g.it("a", trace.recorder());
            g.it("b", trace.recorder());
        })
        .unwrap();

    assert!(world.run(&[], NoReporter));
    assert_eq!(trace.entries(), ["second a", "second b", "first b", "first a"]);
}
