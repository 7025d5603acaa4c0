//! Errors of the engine's own API.
//!
//! Faults raised by examples and hooks are never reported through [`Error`];
//! they are captured as [`Fault`](crate::fault::Fault) values inside outcomes.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::id::NodeId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// More than one shared example definition with this name is visible at
    /// the same scope level for the including group.
    #[error("ambiguous shared examples {name:?}: {count} definitions match at scope {scope}")]
    AmbiguousSharedExamples {
        name: String,
        scope: String,
        count: usize,
    },

    #[error("could not find shared examples {name:?} from {from}")]
    UnknownSharedExamples { name: String, from: NodeId },

    #[error("shared examples {name:?} include themselves (via {chain})")]
    RecursiveSharedExamples { name: String, chain: String },

    #[error("world stack is empty, nothing to pop")]
    WorldStackUnderflow,

    #[error("invalid example id: {0:?}")]
    InvalidId(String),

    #[error("invalid location selector: {0:?}")]
    InvalidLocation(String),

    #[error("unknown ordering strategy {0:?}")]
    UnknownOrdering(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to parse example status records: {0}")]
    StatusStore(#[from] serde_json::Error),
}
