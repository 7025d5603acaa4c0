use std::{
    borrow::Cow,
    time::{Duration, SystemTime},
};

use crate::{fault::Fault, id::NodeId};

/// The recorded result of one example.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ExampleOutcome {
    pub id: NodeId,
    pub full_description: String,
    pub status: ExampleStatus,
    /// Faults raised after the first one, e.g. by an after hook following
    /// a failing body.
    pub secondary: Vec<Fault>,
    pub started_at: SystemTime,
    pub duration: Duration,
}

impl ExampleOutcome {
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    pub fn is_bad(&self) -> bool {
        self.status.is_bad()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.status.fault()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExampleStatus {
    /// An around hook never ran the example.
    NotRun { diagnostic: Fault },
    Passed,
    Failed(Fault),
    /// Expected to fail. `fault` is what it failed with, `None` if it was
    /// skipped without running.
    Pending {
        reason: Cow<'static, str>,
        fault: Option<Fault>,
    },
    /// Declared pending but passed.
    PendingFixed { reason: Cow<'static, str> },
}

impl ExampleStatus {
    pub fn is_good(&self) -> bool {
        matches!(self, ExampleStatus::Passed | ExampleStatus::Pending { .. })
    }

    pub fn is_bad(&self) -> bool {
        !self.is_good()
    }

    pub fn passed(&self) -> bool {
        matches!(self, ExampleStatus::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self, ExampleStatus::Failed(_))
    }

    pub fn pending(&self) -> bool {
        matches!(self, ExampleStatus::Pending { .. })
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ExampleStatus::NotRun { diagnostic } => Some(diagnostic),
            ExampleStatus::Failed(fault) => Some(fault),
            ExampleStatus::Pending { fault, .. } => fault.as_ref(),
            ExampleStatus::Passed | ExampleStatus::PendingFixed { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExampleStatus::NotRun { .. } => "not run",
            ExampleStatus::Passed => "passed",
            ExampleStatus::Failed(_) => "failed",
            ExampleStatus::Pending { .. } => "pending",
            ExampleStatus::PendingFixed { .. } => "pending fixed",
        }
    }
}
