pub(crate) use crate::{
    meta,
    metadata::{Declaration, KeySet, Location, Metadata},
    prelude::*,
    status::{LastStatus, StatusStore},
};

pub const FILE: &str = "support.rs";

/// Metadata of a top level node `FILE[1]` without a parent.
pub fn metadata(description: &'static str, declared: DeclaredMetadata) -> Metadata {
    metadata_at(description, &[1], declared)
}

pub fn metadata_at(description: &str, path: &[u32], declared: DeclaredMetadata) -> Metadata {
    let declaration = Declaration {
        description: description.to_string().into(),
        location: Location::new(FILE, path.len() as u32),
        id: NodeId::new(FILE, path.to_vec()),
        declared,
    };
    Metadata::build(None, declaration, &KeySet::new())
}

/// The exclusions a default configuration starts with.
pub fn default_exclusions() -> Vec<Criterion> {
    Configuration::default().exclusions().to_vec()
}

/// Example body for examples that must be skipped.
pub fn never_runs(_: &mut ExampleContext) {
    panic!("this example must not run");
}

macro_rules! nonzero {
    (0) => {
        compile_error!("0 is zero")
    };

    ($value:literal) => {
        std::convert::TryFrom::try_from($value).unwrap()
    };
}

pub(crate) use nonzero;
