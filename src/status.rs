//! Last known example statuses.
//!
//! The store is read from and exported to an external JSON file of
//! `{example_id, status}` records. Writing that file is up to the caller.

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    id::NodeId,
    outcome::{ExampleOutcome, ExampleStatus},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastStatus {
    #[default]
    Unknown,
    Passed,
    Failed,
    Pending,
}

impl From<&ExampleStatus> for LastStatus {
    fn from(status: &ExampleStatus) -> Self {
        match status {
            ExampleStatus::Passed => LastStatus::Passed,
            ExampleStatus::Pending { .. } => LastStatus::Pending,
            ExampleStatus::Failed(_)
            | ExampleStatus::PendingFixed { .. }
            | ExampleStatus::NotRun { .. } => LastStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub example_id: NodeId,
    pub status: LastStatus,
}

#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    statuses: HashMap<NodeId, LastStatus>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<StatusRecord> = serde_json::from_str(json)?;
        Ok(records.into_iter().collect())
    }

    /// Load a store, treating a missing file as empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(Error::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn status_for(&self, id: &NodeId) -> LastStatus {
        self.statuses.get(id).copied().unwrap_or_default()
    }

    pub fn record(&mut self, id: NodeId, status: LastStatus) {
        self.statuses.insert(id, status);
    }

    pub fn record_outcomes<'o>(&mut self, outcomes: impl IntoIterator<Item = &'o ExampleOutcome>) {
        for outcome in outcomes {
            self.record(outcome.id.clone(), (&outcome.status).into());
        }
    }

    pub fn failed_ids(&self) -> Vec<NodeId> {
        let mut failed: Vec<NodeId> = self
            .statuses
            .iter()
            .filter(|(_, status)| **status == LastStatus::Failed)
            .map(|(id, _)| id.clone())
            .collect();
        failed.sort();
        failed
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn clear(&mut self) {
        self.statuses.clear();
    }

    /// Records sorted by id, ready for the external writer.
    pub fn records(&self) -> Vec<StatusRecord> {
        let mut records: Vec<StatusRecord> = self
            .statuses
            .iter()
            .map(|(id, status)| StatusRecord {
                example_id: id.clone(),
                status: *status,
            })
            .collect();
        records.sort_by(|a, b| a.example_id.cmp(&b.example_id));
        records
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records())?)
    }
}

impl FromIterator<StatusRecord> for StatusStore {
    fn from_iter<I: IntoIterator<Item = StatusRecord>>(iter: I) -> Self {
        Self {
            statuses: iter
                .into_iter()
                .map(|record| (record.example_id, record.status))
                .collect(),
        }
    }
}
