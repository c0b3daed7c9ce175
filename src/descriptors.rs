//! Provider descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::ScopeKind;
use crate::registration::{ConstructionMode, Provider};

/// Provider descriptor for introspection and diagnostics
///
/// A snapshot of a registered provider's declaration, returned by
/// [`Container::descriptors`](crate::Container::descriptors).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{module, scoped, single, ConstructionMode, Container, ScopeKind};
///
/// struct Database { url: String }
///
/// let container = Container::new();
/// container.load(module![
///     single::<Database>().value(Database { url: "postgres://localhost".to_string() }),
///     scoped::<u32>().named("request_id").factory(|_| Ok(1u32)),
/// ]).unwrap();
///
/// let descriptors = container.descriptors();
/// let db = descriptors.iter().find(|d| d.type_name().contains("Database")).unwrap();
/// assert_eq!(db.kind, ScopeKind::Single);
/// assert_eq!(db.mode, ConstructionMode::Value);
/// assert!(!db.is_qualified());
///
/// let request_id = descriptors.iter().find(|d| d.is_qualified()).unwrap();
/// assert_eq!(request_id.type_name(), "u32");
/// assert_eq!(request_id.kind, ScopeKind::Scoped);
/// ```
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Registration key
    pub key: Key,
    /// Caching behavior
    pub kind: ScopeKind,
    /// Construction mode
    pub mode: ConstructionMode,
    /// Explicit dependency keys, for class providers that declare them
    pub deps: Option<Vec<Key>>,
    /// Whether an explicit cleanup hook is declared
    pub has_close_hook: bool,
    /// Nesting depth of the container holding the registration (0 = root)
    pub scope_depth: usize,
}

impl ProviderDescriptor {
    pub(crate) fn from_provider(provider: &Provider, scope_depth: usize) -> Self {
        Self {
            key: provider.key().clone(),
            kind: provider.kind(),
            mode: provider.mode(),
            deps: provider.deps().map(<[Key]>::to_vec),
            has_close_hook: provider.has_close_hook(),
            scope_depth,
        }
    }

    /// Type name of the registered key.
    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }

    /// True if the key carries a qualifier.
    pub fn is_qualified(&self) -> bool {
        self.key.qualifier().is_some()
    }
}
