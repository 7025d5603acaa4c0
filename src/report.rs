use std::{fmt, time::Duration};

use crate::{fault::Fault, filter::FilterOutcome, id::NodeId, outcome::ExampleOutcome};

/// Everything a run produced.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RunReport {
    /// Outcomes in execution order.
    pub outcomes: Vec<ExampleOutcome>,
    /// Faults raised by context hooks after their examples finished. The
    /// group id is `None` for run wide hooks.
    pub group_faults: Vec<(Option<NodeId>, Fault)>,
    pub filter: FilterOutcome,
    pub seed: u64,
    pub duration: Duration,
    /// The run ended early on request or because of fail fast.
    pub stopped: bool,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.group_faults.is_empty() && self.outcomes.iter().all(ExampleOutcome::is_good)
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_bad()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.pending()).count()
    }

    /// The smallest set of ids that reruns every failure.
    pub fn rerun_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .outcomes
            .iter()
            .filter(|o| o.is_bad())
            .map(|o| o.id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn outcome(&self, id: &NodeId) -> Option<&ExampleOutcome> {
        self.outcomes.iter().find(|o| &o.id == id)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            examples: self.outcomes.len(),
            failures: self.failure_count(),
            pending: self.pending_count(),
            errors_outside_examples: self.group_faults.len(),
            seed: self.seed,
            duration: self.duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub examples: usize,
    pub failures: usize,
    pub pending: usize,
    pub errors_outside_examples: usize,
    pub seed: u64,
    pub duration: Duration,
}

fn plural(count: usize, word: &str) -> String {
    match count {
        1 => format!("{count} {word}"),
        _ => format!("{count} {word}s"),
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            plural(self.examples, "example"),
            plural(self.failures, "failure")
        )?;
        if self.pending > 0 {
            write!(f, ", {} pending", self.pending)?;
        }
        if self.errors_outside_examples > 0 {
            write!(
                f,
                ", {} occurred outside of examples",
                plural(self.errors_outside_examples, "error")
            )?;
        }
        Ok(())
    }
}
