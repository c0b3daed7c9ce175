//! Error types for the container.

use std::fmt;

/// Boxed error returned by user factories and cleanup hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Container errors
///
/// Represents the failures that can surface from registration (`load`,
/// `override_provider`) and resolution (`get`, `get_async`, `make`, ...).
/// Cleanup failures during shutdown are never returned as a `DiError`; they are
/// collected into a [`ShutdownReport`](crate::ShutdownReport) instead.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, Resolver};
///
/// let container = Container::new();
/// match container.get::<String>() {
///     Err(DiError::MissingProvider(key)) => {
///         assert_eq!(key, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_ioc::DiError;
///
/// let circular = DiError::Circular {
///     path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
/// };
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DiError {
    /// A provider is already registered for this key and the override policy forbids replacing it
    #[error("Provider already registered for {0} (enable allow_override with the lastWins strategy to replace it)")]
    OverrideConflict(String),
    /// No provider is registered and the key cannot be constructed ad hoc
    #[error("No provider registered for {0}")]
    MissingProvider(String),
    /// Resolution revisited a key that is still being built (includes path)
    #[error("Circular dependency: {}", path.join(" -> "))]
    Circular {
        /// Keys from the first visit of the repeated key to its second visit.
        path: Vec<String>,
    },
    /// Synchronous resolution reached an asynchronous construction step
    #[error("Provider for {0} is asynchronous; resolve it with get_async instead")]
    SyncAgainstAsync(String),
    /// Provider declares no construction mode or inconsistent ones
    #[error("Invalid provider for {key}: {reason}")]
    InvalidProvider {
        /// Diagnostic name of the offending key.
        key: String,
        /// What is wrong with the declaration.
        reason: String,
    },
    /// Instance stored under a key is not of the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A user factory or constructor failed
    #[error("Construction of {key} failed: {source}")]
    Factory {
        /// Diagnostic name of the key being built.
        key: String,
        /// Error raised by the factory.
        #[source]
        source: BoxError,
    },
}

impl DiError {
    pub(crate) fn invalid(key: impl fmt::Display, reason: impl Into<String>) -> Self {
        DiError::InvalidProvider {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Wraps an arbitrary error raised while building `key`.
    pub fn factory(key: impl fmt::Display, source: impl Into<BoxError>) -> Self {
        DiError::Factory {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// Result type for container operations
///
/// A convenience alias for `Result<T, DiError>` used throughout ferrous-ioc.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{DiError, DiResult};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::MissingProvider("some_service".to_string()))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
