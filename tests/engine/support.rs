use std::{cell::RefCell, rc::Rc};

use kispec::prelude::*;

pub const FILE: &str = "tests/engine/sample.rs";

/// Shared, append-only record of what ran.
#[derive(Debug, Default, Clone)]
pub struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// An example body that records its full description.
    pub fn recorder(&self) -> impl Fn(&mut ExampleContext) + 'static {
        let trace = self.clone();
        move |ctx| trace.push(ctx.full_description())
    }
}

pub fn files(raw: &[&str]) -> Vec<FileSelection> {
    raw.iter()
        .map(|raw| raw.parse().expect("valid file selection"))
        .collect()
}

/// Two groups of three examples each, with a nested group in the second.
pub fn recorded_world(config: Configuration, trace: &Trace) -> World {
    let mut world = World::new(config);
    world
        .describe_in(FILE, "alpha", meta!(), |g| {
            for name in ["a1", "a2", "a3", "a4"] {
                g.it(name, trace.recorder());
            }
        })
        .expect("declares");
    world
        .describe_in(FILE, "beta", meta!(), |g| {
            g.it("b1", trace.recorder());
            g.context("nested", |g| {
                for name in ["n1", "n2", "n3"] {
                    g.it(name, trace.recorder());
                }
            });
            g.it("b2", trace.recorder());
        })
        .expect("declares");
    world
}
