//! Outcome of best-effort directory mirroring.
//!
//! Mirror steps never fail the mutation they follow. Their failures are logged
//! and collected here so callers can tell "core mutation succeeded" apart from
//! "mirror sync succeeded".

use tracing::warn;

use crate::directory::DirectoryError;

/// One mirror step that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
    /// Short description of the step, e.g. `"grant role"`.
    pub step: &'static str,
    pub error: DirectoryError,
}

/// Failures of the best-effort steps of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    failures: Vec<MirrorFailure>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a mirror step, keeping its value on success.
    pub fn record<T>(&mut self, step: &'static str, result: Result<T, DirectoryError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(step, error = %error, "Directory mirror sync failed");
                self.failures.push(MirrorFailure { step, error });
                None
            }
        }
    }

    /// Whether every mirror step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[MirrorFailure] {
        &self.failures
    }

    /// Append the failures of another report.
    pub fn merge(&mut self, other: SyncReport) {
        self.failures.extend(other.failures);
    }
}

/// A successful mutation together with its mirror sync outcome.
#[derive(Debug, Clone)]
pub struct Synced<T> {
    pub value: T,
    pub sync: SyncReport,
}

impl<T> Synced<T> {
    pub fn new(value: T, sync: SyncReport) -> Self {
        Self { value, sync }
    }
}
