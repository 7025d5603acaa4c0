//! Notifications emitted while a run progresses.
//!
//! Rendering is left to the consumer. A [`Reporter`] receives events in the
//! order they happen; every method has a no-op default so implementations
//! only override what they care about.

use crate::{metadata::Metadata, outcome::ExampleOutcome, report::RunSummary};

mod channel;
mod log;
mod no;

pub use channel::ChannelReporter;
pub use log::{EventLog, ReportEvent};
pub use no::NoReporter;

pub trait Reporter {
    /// `count` is the number of examples selected to run.
    fn run_started(&mut self, count: usize) {
        let _ = count;
    }

    fn seed_used(&mut self, seed: u64) {
        let _ = seed;
    }

    fn group_started(&mut self, group: &Metadata) {
        let _ = group;
    }

    fn group_finished(&mut self, group: &Metadata) {
        let _ = group;
    }

    fn example_started(&mut self, example: &Metadata) {
        let _ = example;
    }

    fn example_finished(&mut self, example: &Metadata, outcome: &ExampleOutcome) {
        let _ = (example, outcome);
    }

    fn message(&mut self, message: &str) {
        let _ = message;
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        let _ = summary;
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn run_started(&mut self, count: usize) {
        (**self).run_started(count)
    }

    fn seed_used(&mut self, seed: u64) {
        (**self).seed_used(seed)
    }

    fn group_started(&mut self, group: &Metadata) {
        (**self).group_started(group)
    }

    fn group_finished(&mut self, group: &Metadata) {
        (**self).group_finished(group)
    }

    fn example_started(&mut self, example: &Metadata) {
        (**self).example_started(example)
    }

    fn example_finished(&mut self, example: &Metadata, outcome: &ExampleOutcome) {
        (**self).example_finished(example, outcome)
    }

    fn message(&mut self, message: &str) {
        (**self).message(message)
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        (**self).run_finished(summary)
    }
}
