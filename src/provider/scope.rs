//! Scoped resolution and lifecycle management.

use futures::future::BoxFuture;

use crate::collection::Module;
use crate::error::DiResult;
use crate::internal::ShutdownReport;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::Container;

/// Handle over a child container for request- or operation-scoped lifetimes.
///
/// # Lifetime Behavior
///
/// - **Single**: cached in the container that registered the provider, so
///   a single registered in this scope stays private to it
/// - **Scoped**: built once in this scope and cached here
/// - **Factory**: built fresh on every request
///
/// Call [`end`](Self::end) to run cleanup for the scoped instances this scope
/// created. Ending a scope never touches its parent or its siblings.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, scoped, Container, Resolver};
/// use std::sync::Arc;
///
/// struct RequestId(u32);
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container = Container::new();
/// container.load(module![
///     scoped::<RequestId>()
///         .factory(|_| Ok(RequestId(7)))
///         .on_close(|req: Arc<RequestId>| {
///             assert_eq!(req.0, 7);
///             Ok::<_, std::io::Error>(())
///         }),
/// ]).unwrap();
///
/// let scope = container.begin_scope();
/// let a = scope.get::<RequestId>().unwrap();
/// let b = scope.get::<RequestId>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let report = scope.end().await;
/// assert_eq!(report.disposed, 1);
/// # }
/// ```
pub struct Scope {
    container: Container,
    ended: bool,
}

impl Scope {
    pub(crate) fn new(container: Container) -> Self {
        Self {
            container,
            ended: false,
        }
    }

    /// Child container backing this scope.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Registers providers local to this scope.
    ///
    /// Local providers shadow the parent's providers for the same key.
    pub fn load(&self, module: Module) -> DiResult<()> {
        self.container.load(module)
    }

    /// Begins a nested scope whose parent is this scope.
    pub fn begin_scope(&self) -> Scope {
        self.container.begin_scope()
    }

    /// Number of instances recorded for cleanup in this scope.
    pub fn disposal_len(&self) -> usize {
        self.container.disposal_len()
    }

    /// Ends the scope: runs cleanup for its instances in reverse creation
    /// order and clears its cache.
    pub async fn end(mut self) -> ShutdownReport {
        let report = self.container.shutdown().await;
        self.ended = true;
        report
    }
}

impl ResolverCore for Scope {
    fn resolve(&self, key: &Key) -> DiResult<AnyArc> {
        self.container.resolve(key)
    }

    fn resolve_async(&self, key: &Key) -> BoxFuture<'static, DiResult<AnyArc>> {
        self.container.resolve_async(key)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.ended {
            let pending = self.container.disposal_len();
            if pending > 0 {
                tracing::warn!(pending, "scope dropped without end(); cleanup skipped");
            }
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("container", &self.container)
            .field("ended", &self.ended)
            .finish()
    }
}
