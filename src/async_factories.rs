//! Async factory support.
//!
//! This module provides the [`AsyncFactory`] trait for instances that require
//! asynchronous initialization such as connection pools, handshakes or
//! authentication flows.

use async_trait::async_trait;

use crate::error::DiResult;
use crate::provider::ResolutionContext;

/// Trait for factories that create instances asynchronously.
///
/// Register one with
/// [`ProviderBuilder::async_factory_with`](crate::ProviderBuilder::async_factory_with).
/// Closures returning futures can use
/// [`async_factory`](crate::ProviderBuilder::async_factory) instead.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, single, AsyncFactory, Container, DiResult, ResolutionContext, Resolver};
/// use async_trait::async_trait;
///
/// struct DatabasePool {
///     connection_string: String,
/// }
///
/// struct DbPoolFactory {
///     connection_string: String,
/// }
///
/// #[async_trait]
/// impl AsyncFactory<DatabasePool> for DbPoolFactory {
///     async fn create(&self, _ctx: ResolutionContext) -> DiResult<DatabasePool> {
///         tokio::time::sleep(std::time::Duration::from_millis(1)).await;
///         Ok(DatabasePool {
///             connection_string: self.connection_string.clone(),
///         })
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container = Container::new();
/// container.load(module![
///     single::<DatabasePool>().async_factory_with(DbPoolFactory {
///         connection_string: "postgres://localhost".to_string(),
///     }),
/// ]).unwrap();
///
/// let pool = container.get_async::<DatabasePool>().await.unwrap();
/// assert_eq!(pool.connection_string, "postgres://localhost");
/// # }
/// ```
#[async_trait]
pub trait AsyncFactory<T: Send + Sync + 'static>: Send + Sync {
    /// Creates a new instance.
    ///
    /// The context resolves other instances from the container that is
    /// building this one.
    async fn create(&self, ctx: ResolutionContext) -> DiResult<T>;
}
