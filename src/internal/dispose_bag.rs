//! Internal disposal list with LIFO execution.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::key::Key;
use crate::observer::Observers;
use crate::registration::{AnyArc, CloseHook};
use crate::traits::{Closing, TeardownProbe};

/// A cached instance recorded for cleanup.
pub(crate) struct DisposalEntry {
    pub(crate) key: Key,
    pub(crate) instance: AnyArc,
    pub(crate) hook: Option<CloseHook>,
    pub(crate) probe: Option<TeardownProbe>,
}

impl DisposalEntry {
    /// Starts cleanup: the explicit hook if declared, else the first
    /// conventional cleanup method the instance implements.
    fn start(&self) -> Option<Closing> {
        match (&self.hook, self.probe) {
            (Some(hook), _) => Some(hook(self.instance.clone())),
            (None, Some(probe)) => probe(&self.instance),
            (None, None) => None,
        }
    }
}

/// Disposal entries in creation order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<DisposalEntry>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, entry: DisposalEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Moves every entry out, leaving the bag empty.
    pub(crate) fn take(&mut self) -> Vec<DisposalEntry> {
        std::mem::take(&mut self.entries)
    }
}

/// Runs cleanup for `entries` in reverse order.
///
/// A failing or panicking cleanup is recorded and the pass continues with the
/// next entry.
pub(crate) async fn run_reverse(entries: Vec<DisposalEntry>, observers: &Observers) -> ShutdownReport {
    let mut report = ShutdownReport::default();

    for entry in entries.into_iter().rev() {
        let outcome: Result<bool, String> = match std::panic::catch_unwind(AssertUnwindSafe(|| entry.start())) {
            Err(payload) => Err(panic_message(payload)),
            Ok(None) => Ok(false),
            Ok(Some(Closing::Done(result))) => result.map(|_| true).map_err(|e| e.to_string()),
            Ok(Some(Closing::Pending(future))) => match AssertUnwindSafe(future).catch_unwind().await {
                Ok(result) => result.map(|_| true).map_err(|e| e.to_string()),
                Err(payload) => Err(panic_message(payload)),
            },
        };

        match outcome {
            Ok(true) => report.disposed += 1,
            Ok(false) => report.skipped += 1,
            Err(message) => {
                tracing::warn!(key = %entry.key, error = %message, "cleanup failed; continuing shutdown");
                observers.disposal_failed(&entry.key, &message);
                report.failures.push(DisposalFailure {
                    key: entry.key.to_string(),
                    message,
                });
            }
        }
    }

    report
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Outcome of a disposal pass.
///
/// Shutdown never fails; individual cleanup failures are collected here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Entries whose cleanup ran successfully
    pub disposed: usize,
    /// Entries without any cleanup to run
    pub skipped: usize,
    /// Entries whose cleanup returned an error or panicked, in execution order
    pub failures: Vec<DisposalFailure>,
}

impl ShutdownReport {
    /// True when no cleanup failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of entries processed.
    pub fn total(&self) -> usize {
        self.disposed + self.skipped + self.failures.len()
    }
}

/// A cleanup failure swallowed during shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalFailure {
    /// Diagnostic name of the instance's key
    pub key: String,
    /// Rendered error or panic message
    pub message: String,
}

impl fmt::Display for DisposalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}
