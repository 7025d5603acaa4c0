use crate::reporter::Reporter;

/// A reporter that discards every event.
///
/// Useful when only the returned [`RunReport`](crate::RunReport) matters, or
/// when an outer system renders results on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReporter;

impl Reporter for NoReporter {}
