//! Provider scope kinds.

use std::fmt;

/// Scope kinds controlling instance caching behavior
///
/// Defines how instances built by a provider are cached, shared and disposed.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{module, single, scoped, factory, Container, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let container = Container::new();
/// container.load(module![
///     // Single: one instance for the whole container tree
///     single::<Database>().value(Database { url: "postgres://localhost".to_string() }),
///     // Scoped: one instance per scope
///     scoped::<Repository>().factory(|ctx| {
///         let db = ctx.get::<Database>()?;
///         Ok(Repository { db_url: db.url.clone() })
///     }),
///     // Factory: new instance every time
///     factory::<RequestModel>().factory(|_| Ok(RequestModel { id: 12345 })),
/// ]).unwrap();
///
/// let db1 = container.get::<Database>().unwrap();
/// let scope1 = container.begin_scope();
/// let db2 = scope1.get::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let repo1a = scope1.get::<Repository>().unwrap();
/// let repo1b = scope1.get::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = container.begin_scope();
/// let repo2 = scope2.get::<Repository>().unwrap();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// let model1 = scope1.get::<RequestModel>().unwrap();
/// let model2 = scope1.get::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Single instance shared by every container that sees the provider
    ///
    /// Built on first request from any scope and cached in the container
    /// that registered the provider, normally the root. Disposed when that
    /// container shuts down.
    Single,
    /// Single instance per scope, cached for the scope's lifetime
    ///
    /// Built once per scope on first request and stored in that scope's local
    /// cache. Disposed when the scope ends.
    Scoped,
    /// New instance per resolution, never cached
    ///
    /// The caller owns the instance; the container never records it for
    /// disposal.
    Factory,
}

impl ScopeKind {
    /// True for kinds whose instances are cached and recorded for disposal.
    pub fn is_cached(self) -> bool {
        !matches!(self, ScopeKind::Factory)
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScopeKind::Single => "single",
            ScopeKind::Scoped => "scoped",
            ScopeKind::Factory => "factory",
        })
    }
}
