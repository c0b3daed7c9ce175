//! Container module.
//!
//! This module contains the [`Container`] type: provider registry, scope-aware
//! caches, cycle detection, synchronous and asynchronous construction, and
//! disposal bookkeeping.

use std::collections::hash_map::Entry;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;

use crate::collection::{IntoProvider, Module};
use crate::config::ContainerOptions;
use crate::descriptors::ProviderDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::{run_reverse, ChainId, DisposalEntry, DisposeBag, Entered, InFlight, ShutdownReport};
use crate::key::{Key, Qualifier};
use crate::lifetime::ScopeKind;
use crate::registration::{AnyArc, Built, Construction, Map, Provider, Registry};
use crate::traits::{Args, ResolverCore};

pub mod context;
pub mod scope;
pub use context::ResolutionContext;
pub use scope::Scope;

/// The stateful resolver.
///
/// A `Container` holds a provider registry, a cache for single instances of
/// the providers it registered, a local cache for scoped instances, and the
/// disposal list of instances it cached. Scopes are child containers chained
/// to a parent; they read providers through the parent chain, and a single
/// instance is shared by every container that sees its provider.
///
/// The container is cheap to clone (it uses `Arc` internally) and can be
/// shared across threads. Locks are never held while user code runs.
/// Cycle detection follows each top-level request through its nested
/// lookups, including lookups a factory makes through another handle on the
/// same thread or task. Builds of a cached key never overlap: a concurrent
/// request waits for the build in progress and shares its instance.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{keys, module, factory, single, Args, Container, DiResult, Injectable, Resolver};
/// use std::sync::Arc;
///
/// struct Repo;
/// impl Injectable for Repo {
///     fn construct(_: &mut Args) -> DiResult<Self> { Ok(Repo) }
/// }
///
/// struct Service { repo: Arc<Repo> }
/// impl Injectable for Service {
///     fn construct(args: &mut Args) -> DiResult<Self> {
///         Ok(Service { repo: args.take()? })
///     }
/// }
///
/// struct Presenter { service: Arc<Service> }
/// impl Injectable for Presenter {
///     fn construct(args: &mut Args) -> DiResult<Self> {
///         Ok(Presenter { service: args.take()? })
///     }
/// }
///
/// let container = Container::new();
/// container.load(module![
///     single::<Repo>().class(),
///     single::<Service>().class().deps(keys![Repo]),
///     factory::<Presenter>().class().deps(keys![Service]),
/// ]).unwrap();
///
/// let a = container.get::<Presenter>().unwrap();
/// let b = container.get::<Presenter>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.service, &b.service));
/// assert!(Arc::ptr_eq(&a.service.repo, &container.get::<Repo>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    id: u64,
    options: ContainerOptions,
    parent: Option<Container>,
    depth: usize,
    registry: Mutex<Registry>,
    singletons: Mutex<Map<Key, AnyArc>>,
    scoped: Mutex<Map<Key, AnyArc>>,
    in_flight: InFlight,
    disposals: Mutex<DisposeBag>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty root container with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates an empty root container.
    pub fn with_options(options: ContainerOptions) -> Self {
        Self::build(options, None)
    }

    fn build(options: ContainerOptions, parent: Option<Container>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let depth = parent.as_ref().map_or(0, |p| p.inner.depth + 1);
        let in_flight = parent.as_ref().map(|p| p.inner.in_flight.clone()).unwrap_or_default();
        Self {
            inner: Arc::new(ContainerInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                options,
                parent,
                depth,
                registry: Mutex::new(Registry::new()),
                singletons: Mutex::new(Map::default()),
                scoped: Mutex::new(Map::default()),
                in_flight,
                disposals: Mutex::new(DisposeBag::default()),
            }),
        }
    }

    /// Child container sharing this container's options and, through the
    /// parent chain, its providers and their single instances.
    pub(crate) fn child(&self) -> Container {
        Self::build(self.inner.options.clone(), Some(self.clone()))
    }

    /// Options this container was created with.
    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// True for a root container (not a scope).
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Parent container, for scopes.
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    fn root(&self) -> &Container {
        let mut current = self;
        while let Some(parent) = &current.inner.parent {
            current = parent;
        }
        current
    }

    /// True if both handles refer to the same container.
    pub fn same_container(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ----- Registry -----

    /// Registers every provider of `module`.
    ///
    /// The whole module is checked before anything is registered: a shape
    /// error or a duplicate key under a policy that forbids replacement
    /// leaves the registry untouched. Under the `LastWins` policy a
    /// replacement also evicts this container's cached instance for the key.
    pub fn load(&self, module: Module) -> DiResult<()> {
        let providers = module.into_providers()?;
        let replace = self.inner.options.permits_replacement();
        let count = providers.len();

        let replaced = {
            let mut registry = self.inner.registry.lock();
            if !replace {
                let mut seen = HashSet::with_capacity(providers.len());
                for provider in &providers {
                    if registry.contains(&provider.key) || !seen.insert(&provider.key) {
                        return Err(DiError::OverrideConflict(provider.key.to_string()));
                    }
                }
            }
            let mut replaced = Vec::new();
            for provider in providers {
                let key = provider.key.clone();
                if registry.insert(provider, replace)?.is_some() {
                    replaced.push(key);
                }
            }
            replaced
        };

        for key in &replaced {
            tracing::warn!(%key, "provider replaced (lastWins)");
            self.evict(key);
        }
        tracing::debug!(providers = count, replaced = replaced.len(), scope_depth = self.inner.depth, "module loaded");
        Ok(())
    }

    /// Registers a single provider under the container's override policy.
    pub fn set_provider(&self, provider: impl IntoProvider) -> DiResult<()> {
        let provider = provider.into_provider()?;
        let key = provider.key.clone();
        let replace = self.inner.options.permits_replacement();
        let previous = self.inner.registry.lock().insert(provider, replace)?;
        if previous.is_some() {
            tracing::warn!(%key, "provider replaced (lastWins)");
            self.evict(&key);
        } else {
            tracing::debug!(%key, "provider registered");
        }
        Ok(())
    }

    /// Provider for `key`: local registration first, then the parent chain.
    pub fn get_provider(&self, key: &Key) -> Option<Provider> {
        self.locate(key).map(|(provider, _)| provider)
    }

    /// Provider for `key` together with the container that registered it.
    fn locate(&self, key: &Key) -> Option<(Provider, &Container)> {
        let mut current = Some(self);
        while let Some(container) = current {
            if let Some(provider) = container.inner.registry.lock().get(key) {
                return Some((provider.clone(), container));
            }
            current = container.inner.parent.as_ref();
        }
        None
    }

    /// True if a provider for `key` is visible from this container.
    pub fn is_registered(&self, key: &Key) -> bool {
        let mut current = Some(self);
        while let Some(container) = current {
            if container.inner.registry.lock().contains(key) {
                return true;
            }
            current = container.inner.parent.as_ref();
        }
        false
    }

    /// Keys visible from this container: local registrations first, then
    /// the parents'. Shadowed keys are listed once.
    pub fn keys(&self) -> Vec<Key> {
        self.descriptors().into_iter().map(|d| d.key).collect()
    }

    /// Descriptors of every provider visible from this container, in the
    /// same order as [`keys`](Self::keys).
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut current = Some(self);
        while let Some(container) = current {
            let registry = container.inner.registry.lock();
            for provider in registry.iter() {
                if seen.insert(provider.key.clone()) {
                    out.push(ProviderDescriptor::from_provider(provider, container.inner.depth));
                }
            }
            drop(registry);
            current = container.inner.parent.as_ref();
        }
        out
    }

    /// Registers `value` as a single provider at the root and seeds it into
    /// the root singleton cache.
    ///
    /// Any existing provider or cached instance for the key is replaced,
    /// regardless of the override policy. The value is owned by the caller
    /// and is not recorded for disposal.
    ///
    /// ```
    /// use ferrous_ioc::{module, single, Container, Resolver};
    ///
    /// let container = Container::new();
    /// container.load(module![single::<String>().value("real".to_string())]).unwrap();
    /// container.get::<String>().unwrap();
    ///
    /// container.override_value("fake".to_string(), None);
    /// assert_eq!(container.get::<String>().unwrap().as_str(), "fake");
    /// ```
    pub fn override_value<T: Send + Sync + 'static>(&self, value: T, qualifier: Option<Qualifier>) {
        let key = Key::of::<T>().with_optional_qualifier(qualifier);
        let instance: AnyArc = Arc::new(value);
        let root = self.root();

        root.inner
            .registry
            .lock()
            .insert_replacing(Provider::value_of(key.clone(), instance.clone(), None));
        root.inner.scoped.lock().remove(&key);
        root.inner.singletons.lock().insert(key.clone(), instance);
        tracing::warn!(%key, "value override installed");
    }

    /// Replaces the provider for its key at the root, whatever its scope kind.
    ///
    /// The root's cached instance for the key is evicted so the next request
    /// builds from the new provider. Scopes that already cached a scoped
    /// instance keep it until they end. Shape errors are reported.
    pub fn override_provider(&self, provider: impl IntoProvider) -> DiResult<()> {
        let provider = provider.into_provider()?;
        let key = provider.key.clone();
        let kind = provider.kind;
        let root = self.root();

        root.inner.registry.lock().insert_replacing(provider);
        root.evict(&key);
        tracing::warn!(%key, %kind, "provider override installed");
        Ok(())
    }

    fn evict(&self, key: &Key) {
        self.inner.singletons.lock().remove(key);
        self.inner.scoped.lock().remove(key);
    }

    // ----- Scopes & lifecycle -----

    /// Begins a child scope.
    ///
    /// The scope starts with an empty registry, empty caches and an empty
    /// disposal list, and inherits this container's options.
    pub fn begin_scope(&self) -> Scope {
        let scope = Scope::new(self.child());
        tracing::debug!(scope_depth = self.inner.depth + 1, "scope started");
        scope
    }

    /// Number of instances recorded for cleanup in this container.
    pub fn disposal_len(&self) -> usize {
        self.inner.disposals.lock().len()
    }

    /// Runs cleanup for every recorded instance in reverse creation order,
    /// then clears the disposal list and this container's caches.
    ///
    /// Individual cleanup failures never abort the pass; they are logged and
    /// returned in the report. Registrations are kept.
    pub async fn shutdown(&self) -> ShutdownReport {
        let entries = self.inner.disposals.lock().take();
        let pending = entries.len();
        let report = run_reverse(entries, &self.inner.options.observers).await;

        self.inner.singletons.lock().clear();
        self.inner.scoped.lock().clear();

        if report.is_clean() {
            tracing::debug!(entries = pending, disposed = report.disposed, scope_depth = self.inner.depth, "container shut down");
        } else {
            tracing::warn!(
                entries = pending,
                failures = report.failures.len(),
                scope_depth = self.inner.depth,
                "container shut down with cleanup failures"
            );
        }
        report
    }

    /// Hard-clears the container: registrations, caches and the disposal list.
    ///
    /// No cleanup runs; use [`shutdown`](Self::shutdown) first to release
    /// resources.
    pub fn reset(&self) {
        let dropped = self.inner.disposals.lock().take().len();
        self.inner.registry.lock().clear();
        self.inner.singletons.lock().clear();
        self.inner.scoped.lock().clear();
        if dropped > 0 {
            tracing::warn!(dropped, "container reset with instances still awaiting cleanup");
        } else {
            tracing::debug!("container reset");
        }
    }

    // ----- Resolution -----

    fn context(&self, chain: ChainId) -> ResolutionContext {
        ResolutionContext::new(self.clone(), chain)
    }

    /// Provider for `key` and the container whose caches hold its instances:
    /// the registering container for single providers, this one otherwise.
    fn provider_for(&self, key: &Key) -> DiResult<(Provider, Container)> {
        match self.locate(key) {
            Some((provider, registrar)) => {
                let owner = match provider.kind {
                    ScopeKind::Single => registrar.clone(),
                    _ => self.clone(),
                };
                Ok((provider, owner))
            }
            None => {
                let provider = Provider::ad_hoc(key)?;
                tracing::debug!(%key, "no provider registered; constructing ad hoc");
                Ok((provider, self.clone()))
            }
        }
    }

    fn cached(&self, provider: &Provider) -> Option<AnyArc> {
        let cache = match provider.kind {
            ScopeKind::Single => &self.inner.singletons,
            ScopeKind::Scoped => &self.inner.scoped,
            ScopeKind::Factory => return None,
        };
        let hit = cache.lock().get(&provider.key).cloned();
        hit
    }

    /// Dependency keys of a class provider: the explicit list, else the
    /// metadata source's answer, else none.
    fn class_deps(&self, provider: &Provider) -> Vec<Key> {
        if let Some(deps) = &provider.deps {
            return deps.clone();
        }
        self.inner
            .options
            .metadata
            .as_ref()
            .and_then(|source| source.param_types(&provider.key))
            .unwrap_or_default()
    }

    pub(crate) fn resolve_key(&self, key: &Key, chain: ChainId) -> DiResult<AnyArc> {
        let _current = chain.make_current();
        loop {
            let (provider, owner) = self.provider_for(key)?;
            if let Some(hit) = owner.cached(&provider) {
                tracing::trace!(%key, "cache hit");
                return Ok(hit);
            }

            let slot = (owner.inner.id, key.clone());
            let depth_limit = self.inner.options.depth_limit();
            let guard = match self.inner.in_flight.enter(chain, slot, provider.kind.is_cached(), false, depth_limit)? {
                Entered::Build(guard) => guard,
                Entered::Wait(waiter) => {
                    tracing::trace!(%key, "waiting for concurrent build");
                    waiter.wait_blocking();
                    continue;
                }
            };

            let started = Instant::now();
            self.inner.options.observers.resolving(key);
            let built = self.build_sync(&provider, chain);
            let result = self.finish(&provider, &owner, built, started);
            drop(guard);
            return result;
        }
    }

    fn build_sync(&self, provider: &Provider, chain: ChainId) -> DiResult<AnyArc> {
        match &provider.construction {
            Construction::Value(value) => Ok(value.clone()),
            Construction::Factory(factory) => match factory(&self.context(chain))? {
                Built::Ready(instance) => Ok(instance),
                Built::Deferred(_) => Err(DiError::SyncAgainstAsync(provider.key.to_string())),
            },
            Construction::Class(recipe) => {
                let deps = self.class_deps(provider);
                let mut resolved = Vec::with_capacity(deps.len());
                for dep in deps {
                    let instance = self.resolve_key(&dep, chain)?;
                    resolved.push((dep, instance));
                }
                (recipe.build)(&mut Args::new(&provider.key, resolved))
            }
        }
    }

    pub(crate) fn resolve_owned(self, key: Key, chain: ChainId) -> BoxFuture<'static, DiResult<AnyArc>> {
        let resolution = async move {
            loop {
                let (provider, owner) = self.provider_for(&key)?;
                if let Some(hit) = owner.cached(&provider) {
                    tracing::trace!(%key, "cache hit");
                    return Ok(hit);
                }

                let slot = (owner.inner.id, key.clone());
                let depth_limit = self.inner.options.depth_limit();
                let guard = match self.inner.in_flight.enter(chain, slot, provider.kind.is_cached(), true, depth_limit)? {
                    Entered::Build(guard) => guard,
                    Entered::Wait(waiter) => {
                        tracing::trace!(%key, "waiting for concurrent build");
                        waiter.wait().await;
                        continue;
                    }
                };

                let started = Instant::now();
                self.inner.options.observers.resolving(&key);
                let built = self.build_async(&provider, chain).await;
                let result = self.finish(&provider, &owner, built, started);
                drop(guard);
                return result;
            }
        }
        .boxed();
        chain.bind(resolution).boxed()
    }

    async fn build_async(&self, provider: &Provider, chain: ChainId) -> DiResult<AnyArc> {
        match &provider.construction {
            Construction::Value(value) => Ok(value.clone()),
            Construction::Factory(factory) => {
                let built = factory(&self.context(chain))?;
                match built {
                    Built::Ready(instance) => Ok(instance),
                    Built::Deferred(pending) => pending.await,
                }
            }
            Construction::Class(recipe) => {
                let deps = self.class_deps(provider);
                let mut resolved = Vec::with_capacity(deps.len());
                for dep in deps {
                    let instance = self.clone().resolve_owned(dep.clone(), chain).await?;
                    resolved.push((dep, instance));
                }
                (recipe.build)(&mut Args::new(&provider.key, resolved))
            }
        }
    }

    fn finish(&self, provider: &Provider, owner: &Container, built: DiResult<AnyArc>, started: Instant) -> DiResult<AnyArc> {
        let observers = &self.inner.options.observers;
        match built {
            Ok(instance) => {
                let elapsed = started.elapsed();
                tracing::debug!(key = %provider.key, kind = %provider.kind, ?elapsed, "instance built");
                observers.resolved(&provider.key, elapsed);
                Ok(owner.store(provider, instance))
            }
            Err(err) => {
                tracing::debug!(key = %provider.key, error = %err, "resolution failed");
                observers.resolution_failed(&provider.key, &err);
                Err(err)
            }
        }
    }

    /// Caches `instance` in this container according to the provider's
    /// scope kind and records it for disposal. An instance seeded for the key
    /// meanwhile (by `override_value`) wins and `instance` is discarded.
    fn store(&self, provider: &Provider, instance: AnyArc) -> AnyArc {
        let cache = match provider.kind {
            ScopeKind::Factory => return instance,
            ScopeKind::Single => &self.inner.singletons,
            ScopeKind::Scoped => &self.inner.scoped,
        };

        let (value, fresh) = match cache.lock().entry(provider.key.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => (slot.insert(instance).clone(), true),
        };

        if fresh {
            self.inner.disposals.lock().push(DisposalEntry {
                key: provider.key.clone(),
                instance: value.clone(),
                hook: provider.on_close.clone(),
                probe: provider.teardown_probe(),
            });
        }
        value
    }
}

impl ResolverCore for Container {
    fn resolve(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_key(key, ChainId::current_or_next())
    }

    fn resolve_async(&self, key: &Key) -> BoxFuture<'static, DiResult<AnyArc>> {
        self.clone().resolve_owned(key.clone(), ChainId::current_or_next())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("scope_depth", &self.inner.depth)
            .field("providers", &self.inner.registry.lock().len())
            .field("singletons", &self.inner.singletons.lock().len())
            .field("scoped", &self.inner.scoped.lock().len())
            .field("disposals", &self.inner.disposals.lock().len())
            .field("options", &self.inner.options)
            .finish()
    }
}
