//! Provider declarations and the registry that stores them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::Future;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::ScopeKind;
use crate::provider::ResolutionContext;
use crate::traits::{ClassRecipe, Closing, TeardownProbe};

/// Type-erased shared instance, as stored in caches and disposal lists.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

pub(crate) type FactoryFn = Arc<dyn Fn(&ResolutionContext) -> DiResult<Built> + Send + Sync>;
pub(crate) type CloseHook = Arc<dyn Fn(AnyArc) -> Closing + Send + Sync>;

/// Result of invoking a factory.
///
/// Synchronous factories always produce [`Built::Ready`]. A factory may also
/// hand back a future ([`Built::Deferred`]); synchronous resolution then fails
/// with `SyncAgainstAsync` while asynchronous resolution awaits it.
pub enum Built {
    /// Instance is available now
    Ready(AnyArc),
    /// Instance becomes available when the future resolves
    Deferred(BoxFuture<'static, DiResult<AnyArc>>),
}

impl Built {
    /// Wraps a finished instance.
    pub fn ready<T: Send + Sync + 'static>(value: T) -> Self {
        Built::Ready(Arc::new(value))
    }

    /// Wraps a pending instance.
    pub fn deferred<T, F>(future: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Future<Output = DiResult<T>> + Send + 'static,
    {
        Built::Deferred(Box::pin(async move { future.await.map(|v| Arc::new(v) as AnyArc) }))
    }

    /// True if awaiting is required.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Built::Deferred(_))
    }
}

impl fmt::Debug for Built {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Built::Ready(_) => f.write_str("Ready(..)"),
            Built::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// How a provider produces its instance.
#[derive(Clone)]
pub(crate) enum Construction {
    /// Pre-built instance, returned as-is
    Value(AnyArc),
    /// User function receiving the resolution context
    Factory(FactoryFn),
    /// Constructor invoked with resolved dependencies
    Class(ClassRecipe),
}

/// Public tag for a provider's construction mode, used by descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionMode {
    /// Pre-built value
    Value,
    /// Factory function
    Factory,
    /// Injectable constructor
    Class,
}

impl fmt::Display for ConstructionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstructionMode::Value => "value",
            ConstructionMode::Factory => "factory",
            ConstructionMode::Class => "class",
        })
    }
}

/// A validated provider declaration.
///
/// Built with [`single`](crate::single), [`scoped`](crate::scoped) or
/// [`factory`](crate::factory) and registered through a
/// [`Module`](crate::Module) or
/// [`Container::override_provider`](crate::Container::override_provider).
#[derive(Clone)]
pub struct Provider {
    pub(crate) key: Key,
    pub(crate) kind: ScopeKind,
    pub(crate) construction: Construction,
    pub(crate) deps: Option<Vec<Key>>,
    pub(crate) on_close: Option<CloseHook>,
    pub(crate) teardown: Option<TeardownProbe>,
}

impl Provider {
    /// Provider used when an unregistered key carries its own constructor.
    ///
    /// Ad hoc instances use the factory scope kind, so they are neither cached
    /// nor recorded for disposal.
    pub(crate) fn ad_hoc(key: &Key) -> DiResult<Self> {
        let recipe = key
            .recipe()
            .ok_or_else(|| DiError::MissingProvider(key.to_string()))?;
        Ok(Self {
            key: key.clone(),
            kind: ScopeKind::Factory,
            construction: Construction::Class(recipe),
            deps: None,
            on_close: None,
            teardown: None,
        })
    }

    /// Single-scoped provider wrapping a ready instance.
    pub(crate) fn value_of(key: Key, value: AnyArc, teardown: Option<TeardownProbe>) -> Self {
        Self {
            key,
            kind: ScopeKind::Single,
            construction: Construction::Value(value),
            deps: None,
            on_close: None,
            teardown,
        }
    }

    /// Key this provider is registered under.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Caching behavior.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Construction mode tag.
    pub fn mode(&self) -> ConstructionMode {
        match self.construction {
            Construction::Value(_) => ConstructionMode::Value,
            Construction::Factory(_) => ConstructionMode::Factory,
            Construction::Class(_) => ConstructionMode::Class,
        }
    }

    /// Explicitly declared dependencies, for class providers.
    pub fn deps(&self) -> Option<&[Key]> {
        self.deps.as_deref()
    }

    /// True when an explicit cleanup hook was declared.
    pub fn has_close_hook(&self) -> bool {
        self.on_close.is_some()
    }

    /// Probe used when no explicit hook is declared.
    ///
    /// Class providers always probe their type for conventional cleanup
    /// methods; other modes only when opted in.
    pub(crate) fn teardown_probe(&self) -> Option<TeardownProbe> {
        match (&self.construction, self.teardown) {
            (_, Some(probe)) => Some(probe),
            (Construction::Class(recipe), None) => Some(recipe.teardown),
            _ => None,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("mode", &self.mode())
            .field("deps", &self.deps)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// Provider registry keyed by [`Key`], remembering registration order.
#[derive(Default)]
pub(crate) struct Registry {
    providers: Map<Key, Provider>,
    order: Vec<Key>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `provider`, failing on duplicates unless `replace` is set.
    ///
    /// Returns the replaced provider, if any.
    pub(crate) fn insert(&mut self, provider: Provider, replace: bool) -> DiResult<Option<Provider>> {
        if !replace && self.providers.contains_key(&provider.key) {
            return Err(DiError::OverrideConflict(provider.key.to_string()));
        }
        Ok(self.insert_replacing(provider))
    }

    /// Registers `provider`, replacing any existing entry for its key.
    pub(crate) fn insert_replacing(&mut self, provider: Provider) -> Option<Provider> {
        let key = provider.key.clone();
        let previous = self.providers.insert(key.clone(), provider);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Provider> {
        self.providers.get(key)
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.providers.contains_key(key)
    }

    /// Providers in first-registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.order.iter().filter_map(|key| self.providers.get(key))
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.providers.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(key: Key, v: u32) -> Provider {
        Provider::value_of(key, Arc::new(v), None)
    }

    #[test]
    fn duplicate_insert_conflicts_without_replace() {
        let mut registry = Registry::new();
        registry.insert(value(Key::of::<u32>(), 1), false).unwrap();
        let err = registry.insert(value(Key::of::<u32>(), 2), false).unwrap_err();
        assert!(matches!(err, DiError::OverrideConflict(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn replace_keeps_original_position() {
        let mut registry = Registry::new();
        registry.insert(value(Key::of::<u32>(), 1), false).unwrap();
        registry.insert(value(Key::named::<u32>("b"), 2), false).unwrap();
        let previous = registry.insert(value(Key::of::<u32>(), 3), true).unwrap();
        assert!(previous.is_some());

        let keys: Vec<String> = registry.iter().map(|p| p.key().to_string()).collect();
        assert_eq!(keys, vec!["u32".to_string(), "u32[b]".to_string()]);
    }

    #[test]
    fn ad_hoc_requires_a_constructor() {
        let err = Provider::ad_hoc(&Key::of::<u32>()).unwrap_err();
        assert!(matches!(err, DiError::MissingProvider(_)));
    }
}
