use kispec::{Error, prelude::*};
use pretty_assertions::assert_eq;

use crate::support::FILE;

#[test]
fn metadata_is_inherited_and_overridden() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Account", meta! { db, owner: "billing" }, |g| {
            g.context_with("when frozen", meta! { owner: "risk" }, |g| {
                g.it_with("rejects deposits", meta! { slow }, |_| ());
            });
            g.it("opens", |_| ());
        })
        .unwrap();

    let group = &world.groups()[0];
    let frozen = group.groups().next().unwrap();
    let rejects = frozen.examples().next().unwrap().metadata();
    assert_eq!(rejects.get("db"), Some(&MetaValue::from(true)));
    assert_eq!(rejects.get("owner").and_then(MetaValue::as_str), Some("risk"));
    assert_eq!(rejects.get("slow"), Some(&MetaValue::from(true)));
    assert!(rejects.declared_locally("slow"));
    assert!(!rejects.declared_locally("db"));
    assert_eq!(rejects.full_description(), "Account when frozen rejects deposits");

    let opens = group.examples().next().unwrap().metadata();
    assert_eq!(opens.get("owner").and_then(MetaValue::as_str), Some("billing"));
    assert_eq!(opens.get("slow"), None);
}

#[test]
fn conditional_markers_are_not_inherited() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Platform", meta! { unless: true }, |g| {
            g.it("inherits nothing conditional", |_| ());
        })
        .unwrap();
    let example = world.groups()[0].examples().next().unwrap();
    assert_eq!(example.metadata().get("unless"), None);
}

#[test]
fn method_style_descriptions_join_without_space() {
    let mut world = World::default();
    world
        .describe_in(FILE, "Stack", meta!(), |g| {
            g.describe("#push", |g| {
                g.it("grows", |_| ());
            });
            g.describe(".new", |g| {
                g.it("is empty", |_| ());
            });
        })
        .unwrap();
    let names: Vec<&str> = world.groups()[0]
        .descendant_examples()
        .into_iter()
        .map(|e| e.full_description())
        .collect();
    assert_eq!(names, ["Stack#push grows", "Stack.new is empty"]);
}

#[test]
fn ids_are_stable_paths() {
    let mut world = World::default();
    world
        .describe_in(FILE, "first", meta!(), |g| {
            g.it("one", |_| ());
            g.context("inner", |g| {
                g.it("two", |_| ());
            });
        })
        .unwrap();
    world.describe_in(FILE, "second", meta!(), |_| ()).unwrap();

    let ids: Vec<String> = world.groups()[0]
        .descendant_examples()
        .into_iter()
        .map(|e| e.id().to_string())
        .collect();
    assert_eq!(ids, ["tests/engine/sample.rs[1:1]", "tests/engine/sample.rs[1:2:1]"]);
    assert_eq!(world.groups()[1].id().to_string(), "tests/engine/sample.rs[2]");

    let id: NodeId = "tests/engine/sample.rs[1:2:1]".parse().unwrap();
    let found = world.groups()[0].find(&id).unwrap();
    assert_eq!(found.metadata().description(), "two");
}

#[test]
fn shared_examples_scoped_by_metadata() {
    let mut world = World::default();
    world.shared_examples_where("a persisted model", vec![Criterion::new("db", true)], |g, _| {
        g.it("saves", |_| ());
    });
    world
        .describe_in(FILE, "User", meta! { db }, |g| {
            g.it_behaves_like("a persisted model", &[]);
        })
        .unwrap();
    let outside = world.describe_in(FILE, "Point", meta!(), |g| {
        g.it_behaves_like("a persisted model", &[]);
    });

    assert!(matches!(outside, Err(Error::UnknownSharedExamples { .. })));
    assert_eq!(world.groups().len(), 1);
    let names: Vec<&str> = world.groups()[0]
        .descendant_examples()
        .into_iter()
        .map(|e| e.full_description())
        .collect();
    assert_eq!(names, ["User behaves like a persisted model saves"]);
}
