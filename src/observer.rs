//! Diagnostic observers for container events.
//!
//! This module provides hooks for observing resolution and disposal, for
//! timing, tracing and post-mortem analysis of a container's behavior.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for container events.
///
/// Every method has an empty default, so an observer only implements what it
/// cares about. Observer calls are made synchronously on the resolving thread;
/// keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, single, Container, ContainerOptions, DiObserver, Key, Resolver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     built: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn resolved(&self, _key: &Key, _duration: Duration) {
///         self.built.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let container = Container::with_options(ContainerOptions::new().observer(observer.clone()));
/// container.load(module![single::<u32>().factory(|_| Ok(7u32))]).unwrap();
///
/// container.get::<u32>().unwrap();
/// container.get::<u32>().unwrap(); // cache hit, not observed
/// assert_eq!(observer.built.load(Ordering::SeqCst), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before an instance is built (not on cache hits).
    fn resolving(&self, key: &Key) {
        let _ = key;
    }

    /// Called after an instance was built successfully.
    fn resolved(&self, key: &Key, duration: Duration) {
        let _ = (key, duration);
    }

    /// Called when building an instance failed.
    fn resolution_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }

    /// Called when a cleanup hook failed or panicked during shutdown.
    fn disposal_failed(&self, key: &Key, message: &str) {
        let _ = (key, message);
    }
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }

    pub(crate) fn disposal_failed(&self, key: &Key, message: &str) {
        for observer in &self.observers {
            observer.disposal_failed(key, message);
        }
    }
}

/// Built-in observer that forwards every event to `tracing`.
///
/// Resolutions are emitted at `debug`, failures at `warn`.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, ContainerOptions, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::with_options(
///     ContainerOptions::new().observer(Arc::new(LoggingObserver::with_prefix("app"))),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-ioc".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::debug!(prefix = %self.prefix, %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, %key, ?duration, "resolved");
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, %key, %error, "resolution failed");
    }

    fn disposal_failed(&self, key: &Key, message: &str) {
        tracing::warn!(prefix = %self.prefix, %key, message, "disposal failed");
    }
}
