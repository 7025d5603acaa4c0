use std::{any::Any, error::Error as StdError, fmt};

use crate::{id::NodeId, metadata::Location};

/// What went wrong in a body or hook.
///
/// A fault is data, not a Rust error: it is stored in the outcome of the
/// example it happened in and never escapes a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub origin: FaultOrigin,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The example explicitly signaled a mismatch.
    Assertion,
    /// Any other error or panic.
    Unexpected,
    /// The engine was driven incorrectly, e.g. an around hook that did not
    /// run its example exactly once.
    Usage,
}

/// Where a fault was raised.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FaultOrigin {
    #[default]
    Body,
    BeforeEach,
    AfterEach,
    Around,
    BeforeContext(Option<NodeId>),
    AfterContext(Option<NodeId>),
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: FaultOrigin::Body,
            location: None,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Assertion, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Unexpected, message)
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Usage, message)
    }

    pub fn with_origin(self, origin: FaultOrigin) -> Self {
        Self { origin, ..self }
    }

    pub fn with_location(self, location: Location) -> Self {
        Self {
            location: Some(location),
            ..self
        }
    }

    pub fn is_assertion(&self) -> bool {
        self.kind == FaultKind::Assertion
    }

    /// Build a fault from a caught panic.
    ///
    /// Panics raised by the `assert*!` family carry a message starting with
    /// `assertion` and count as assertion failures.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send + 'static>, location: Option<Location>) -> Self {
        let message = payload_as_string(payload);
        let kind = match message.starts_with("assertion") {
            true => FaultKind::Assertion,
            false => FaultKind::Unexpected,
        };
        Self {
            kind,
            message,
            origin: FaultOrigin::Body,
            location,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FaultKind::Assertion => write!(f, "assertion failed: {}", self.message)?,
            FaultKind::Unexpected => write!(f, "{}", self.message)?,
            FaultKind::Usage => write!(f, "usage error: {}", self.message)?,
        }
        if let Some(location) = &self.location {
            write!(f, " (at {location})")?;
        }
        Ok(())
    }
}

impl<E: StdError + 'static> From<E> for Fault {
    fn from(err: E) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Fault::unexpected(message)
    }
}

/// Convert a panic payload into a string.
///
/// This matches the common payload types produced by `panic!` (`&'static str` and `String`).
/// Other payload types are formatted as a generic placeholder.
pub fn payload_as_string(payload: Box<dyn Any + Send + 'static>) -> String {
    payload
        .downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|payload| payload.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}

/// The return value of an example body or hook.
///
/// Bodies may return `()` or any `Result<(), E>` whose error converts into a
/// [`Fault`]. Returning [`Fault::assertion`] signals a mismatch, any other
/// error is an unexpected fault.
#[derive(Debug)]
pub struct StepResult(pub Result<(), Fault>);

impl From<()> for StepResult {
    fn from(_: ()) -> Self {
        Self(Ok(()))
    }
}

impl<E: Into<Fault>> From<Result<(), E>> for StepResult {
    fn from(v: Result<(), E>) -> Self {
        StepResult(v.map_err(Into::into))
    }
}
