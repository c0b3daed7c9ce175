//! Resolution context handed to factories.

use futures::future::BoxFuture;

use crate::error::DiResult;
use crate::internal::ChainId;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::Container;

/// Context passed to factory functions for resolving dependencies.
///
/// The context is bound to the container that is building the instance and
/// to the request that asked for it, so nested lookups share its caches and
/// its cycle detection. It is cheap to
/// clone and owns what it needs, which lets asynchronous factories move it
/// into the future they return.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, single, Container, Resolver};
/// use std::sync::Arc;
///
/// struct Conn { url: String }
/// struct Db { conn: Arc<Conn> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container = Container::new();
/// container.load(module![
///     single::<Conn>().async_factory(|_ctx| async { Ok(Conn { url: "mem://".into() }) }),
///     single::<Db>().async_factory(|ctx| async move {
///         Ok(Db { conn: ctx.get_async::<Conn>().await? })
///     }),
/// ]).unwrap();
///
/// let db = container.get_async::<Db>().await.unwrap();
/// assert_eq!(db.conn.url, "mem://");
/// # }
/// ```
#[derive(Clone)]
pub struct ResolutionContext {
    container: Container,
    chain: ChainId,
}

impl ResolutionContext {
    pub(crate) fn new(container: Container, chain: ChainId) -> Self {
        Self { container, chain }
    }

    /// Container the instance is being built in.
    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl ResolverCore for ResolutionContext {
    fn resolve(&self, key: &Key) -> DiResult<AnyArc> {
        self.container.resolve_key(key, self.chain)
    }

    fn resolve_async(&self, key: &Key) -> BoxFuture<'static, DiResult<AnyArc>> {
        self.container.clone().resolve_owned(key.clone(), self.chain)
    }
}

impl std::fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext").finish_non_exhaustive()
    }
}
