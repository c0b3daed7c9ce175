//! Cleanup protocol for instances held by the container.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::Future;

use crate::error::BoxError;

/// Outcome of starting a cleanup step.
///
/// A cleanup either finished while it was invoked ([`Closing::Done`]) or
/// returned a future the disposal pass awaits ([`Closing::Pending`]).
pub enum Closing {
    /// Cleanup already ran
    Done(Result<(), BoxError>),
    /// Cleanup finishes when the future resolves
    Pending(BoxFuture<'static, Result<(), BoxError>>),
}

impl Closing {
    /// Cleanup completed successfully.
    pub fn ok() -> Self {
        Closing::Done(Ok(()))
    }

    /// Cleanup completed with the given result.
    pub fn done<E: Into<BoxError>>(result: Result<(), E>) -> Self {
        Closing::Done(result.map_err(Into::into))
    }

    /// Cleanup completes asynchronously.
    pub fn pending<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Closing::Pending(Box::pin(async move { future.await.map_err(Into::into) }))
    }
}

impl std::fmt::Debug for Closing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Closing::Done(r) => f.debug_tuple("Done").field(&r.as_ref().map_err(|e| e.to_string())).finish(),
            Closing::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Conventional cleanup methods probed during shutdown.
///
/// When a provider declares no explicit cleanup hook, the disposal pass asks
/// the instance for `dispose`, then `close`, then `destroy`, and runs the
/// first one that returns `Some`. Methods left at their default report that
/// they are not implemented.
///
/// Every [`Injectable`](crate::Injectable) type is probed automatically; for
/// value and factory providers call
/// [`ProviderBuilder::teardown`](crate::ProviderBuilder::teardown).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Closing, Teardown};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Pool {
///     open: AtomicBool,
/// }
///
/// impl Teardown for Pool {
///     fn close(self: Arc<Self>) -> Option<Closing> {
///         self.open.store(false, Ordering::SeqCst);
///         Some(Closing::ok())
///     }
/// }
/// ```
pub trait Teardown: Send + Sync + 'static {
    /// Preferred cleanup entry point.
    fn dispose(self: Arc<Self>) -> Option<Closing> {
        None
    }

    /// Probed when `dispose` is not implemented.
    fn close(self: Arc<Self>) -> Option<Closing> {
        None
    }

    /// Probed last.
    fn destroy(self: Arc<Self>) -> Option<Closing> {
        None
    }
}

/// Runs the first implemented cleanup method in preference order.
pub(crate) fn probe_teardown<T: Teardown>(instance: Arc<T>) -> Option<Closing> {
    instance
        .clone()
        .dispose()
        .or_else(|| instance.clone().close())
        .or_else(|| instance.destroy())
}
