use crate::{
    id::NodeId,
    metadata::Metadata,
    outcome::{ExampleOutcome, ExampleStatus},
    report::RunSummary,
    reporter::Reporter,
};

/// Owned copy of a reporter notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    RunStarted { count: usize },
    SeedUsed(u64),
    GroupStarted { id: NodeId, description: String },
    GroupFinished { id: NodeId },
    ExampleStarted { id: NodeId, full_description: String },
    ExampleFinished { id: NodeId, status: ExampleStatus },
    Message(String),
    RunFinished(RunSummary),
}

impl ReportEvent {
    pub(crate) fn group_started(group: &Metadata) -> Self {
        Self::GroupStarted {
            id: group.id().clone(),
            description: group.description().to_string(),
        }
    }

    pub(crate) fn example_started(example: &Metadata) -> Self {
        Self::ExampleStarted {
            id: example.id().clone(),
            full_description: example.full_description().to_string(),
        }
    }

    pub(crate) fn example_finished(outcome: &ExampleOutcome) -> Self {
        Self::ExampleFinished {
            id: outcome.id.clone(),
            status: outcome.status.clone(),
        }
    }
}

/// Records every event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<ReportEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full descriptions of the examples in the order they started.
    pub fn started_examples(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::ExampleStarted {
                    full_description, ..
                } => Some(full_description.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Message(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn seed(&self) -> Option<u64> {
        self.events.iter().find_map(|event| match event {
            ReportEvent::SeedUsed(seed) => Some(*seed),
            _ => None,
        })
    }
}

impl Reporter for EventLog {
    fn run_started(&mut self, count: usize) {
        self.events.push(ReportEvent::RunStarted { count });
    }

    fn seed_used(&mut self, seed: u64) {
        self.events.push(ReportEvent::SeedUsed(seed));
    }

    fn group_started(&mut self, group: &Metadata) {
        self.events.push(ReportEvent::group_started(group));
    }

    fn group_finished(&mut self, group: &Metadata) {
        self.events.push(ReportEvent::GroupFinished {
            id: group.id().clone(),
        });
    }

    fn example_started(&mut self, example: &Metadata) {
        self.events.push(ReportEvent::example_started(example));
    }

    fn example_finished(&mut self, _: &Metadata, outcome: &ExampleOutcome) {
        self.events.push(ReportEvent::example_finished(outcome));
    }

    fn message(&mut self, message: &str) {
        self.events.push(ReportEvent::Message(message.to_string()));
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.events.push(ReportEvent::RunFinished(*summary));
    }
}
