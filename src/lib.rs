//! An RSpec style test engine.
//!
//! Examples are declared into a tree of groups on a [`World`]. Every node
//! carries metadata inherited from its enclosing groups, which drives
//! filtering, ordering and which hooks wrap an example. A run selects the
//! examples to execute, orders them (reproducibly, given a seed), wraps each
//! one in its hooks and hands the results to a [`Reporter`].
//!
//! ```
//! use kispec::prelude::*;
//!
//! let mut world = World::default();
//! world
//!     .describe("Vec", |g| {
//!         g.before_each(|_| ());
//!         g.it("starts empty", |_| assert!(Vec::<u8>::new().is_empty()));
//!         g.context("with an element", |g| {
//!             g.it_with("has length one", meta! { fast }, |_| assert_eq!(vec![1].len(), 1));
//!         });
//!     })
//!     .unwrap();
//!
//! assert!(world.run(&[], NoReporter));
//! ```

pub mod config;
pub mod context;
pub mod filter;
pub mod hooks;
pub mod metadata;
pub mod ordering;
pub mod outcome;
pub mod reporter;
pub mod status;

mod capture;
pub use capture::PanicCaptureGuard;

mod declare;
pub use declare::GroupBuilder;

mod error;
pub use error::*;

mod fault;
pub use fault::*;

mod id;
pub use id::NodeId;

mod node;
pub use node::*;

mod report;
pub use report::*;

mod runner;
pub use runner::StopSignal;

mod shared;
pub use shared::{SharedBody, SharedExamples};

mod whatever;
pub use whatever::*;

mod world;
pub use world::*;

pub use config::Configuration;
pub use reporter::Reporter;

/// Everything needed to declare and run examples.
pub mod prelude {
    pub use crate::{
        Fault, FaultKind, GroupBuilder, NodeId, StopSignal, World, WorldStack,
        config::Configuration,
        context::{ExampleContext, GroupContext},
        filter::{Criterion, FileSelection},
        hooks::{DeclareHooks, Procedure},
        meta,
        metadata::{DeclaredMetadata, MetaValue, Metadata},
        ordering::Order,
        outcome::ExampleStatus,
        reporter::{ChannelReporter, EventLog, NoReporter, ReportEvent, Reporter},
    };
}

#[cfg(test)]
mod test_support;
