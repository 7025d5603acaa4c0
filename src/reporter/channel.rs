use crossbeam_channel::{Receiver, Sender};

use crate::{
    metadata::Metadata,
    outcome::ExampleOutcome,
    report::RunSummary,
    reporter::{ReportEvent, Reporter},
};

/// Forwards events to another thread.
///
/// The run itself stays on the calling thread; a consumer on the other end
/// of the channel can render while examples execute. Events are dropped
/// once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<ReportEvent>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<ReportEvent>) -> Self {
        Self { tx }
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<ReportEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    pub fn unbounded() -> (Self, Receiver<ReportEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: ReportEvent) {
        let _ = self.tx.send(event);
    }
}

impl Reporter for ChannelReporter {
    fn run_started(&mut self, count: usize) {
        self.send(ReportEvent::RunStarted { count });
    }

    fn seed_used(&mut self, seed: u64) {
        self.send(ReportEvent::SeedUsed(seed));
    }

    fn group_started(&mut self, group: &Metadata) {
        self.send(ReportEvent::group_started(group));
    }

    fn group_finished(&mut self, group: &Metadata) {
        self.send(ReportEvent::GroupFinished {
            id: group.id().clone(),
        });
    }

    fn example_started(&mut self, example: &Metadata) {
        self.send(ReportEvent::example_started(example));
    }

    fn example_finished(&mut self, _: &Metadata, outcome: &ExampleOutcome) {
        self.send(ReportEvent::example_finished(outcome));
    }

    fn message(&mut self, message: &str) {
        self.send(ReportEvent::Message(message.to_string()));
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.send(ReportEvent::RunFinished(*summary));
    }
}
