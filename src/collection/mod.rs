//! Provider declaration module.
//!
//! This module contains the typed [`ProviderBuilder`] and the `single`,
//! `scoped` and `factory` entry points used to declare providers before they
//! are grouped into [`Module`]s and loaded into a container.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::Future;

use crate::async_factories::AsyncFactory;
use crate::error::{BoxError, DiError, DiResult};
use crate::key::{Key, Qualifier};
use crate::lifetime::ScopeKind;
use crate::provider::ResolutionContext;
use crate::registration::{AnyArc, Built, CloseHook, Construction, Provider};
use crate::traits::{teardown_erased, ClassRecipe, Closing, Injectable, Teardown, TeardownProbe};

pub mod module_system;
pub use module_system::*;

/// Starts a provider declaration whose instance is shared by the whole container tree.
pub fn single<T: Send + Sync + 'static>() -> ProviderBuilder<T> {
    ProviderBuilder::new(ScopeKind::Single)
}

/// Starts a provider declaration whose instance is cached per scope.
pub fn scoped<T: Send + Sync + 'static>() -> ProviderBuilder<T> {
    ProviderBuilder::new(ScopeKind::Scoped)
}

/// Starts a provider declaration that builds a new instance on every request.
pub fn factory<T: Send + Sync + 'static>() -> ProviderBuilder<T> {
    ProviderBuilder::new(ScopeKind::Factory)
}

/// Typed, fluent provider declaration.
///
/// Exactly one construction mode must be chosen: [`value`](Self::value),
/// one of the factory methods, or [`class`](Self::class). Shape errors are
/// reported by [`build`](Self::build), which [`Module`] calls for you; a module
/// holding an invalid declaration fails when it is loaded.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{single, DiError};
///
/// // No construction mode
/// let err = single::<String>().build().unwrap_err();
/// assert!(matches!(err, DiError::InvalidProvider { .. }));
///
/// // Two construction modes
/// let err = single::<String>()
///     .value("a".to_string())
///     .factory(|_| Ok("b".to_string()))
///     .build()
///     .unwrap_err();
/// assert!(matches!(err, DiError::InvalidProvider { .. }));
///
/// let provider = single::<String>().named("greeting").value("hi".to_string()).build().unwrap();
/// assert_eq!(provider.key().to_string(), "alloc::string::String[greeting]");
/// ```
pub struct ProviderBuilder<T> {
    key: Key,
    kind: ScopeKind,
    modes: Vec<Construction>,
    deps: Option<Vec<Key>>,
    on_close: Option<CloseHook>,
    teardown: Option<TeardownProbe>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ProviderBuilder<T> {
    fn new(kind: ScopeKind) -> Self {
        Self {
            key: Key::of::<T>(),
            kind,
            modes: Vec::new(),
            deps: None,
            on_close: None,
            teardown: None,
            _marker: PhantomData,
        }
    }

    /// Qualifies the provider with a name.
    pub fn named(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.qualified(Qualifier::Named(name.into()))
    }

    /// Qualifies the provider with a name or a [`Token`](crate::Token).
    pub fn qualified(mut self, qualifier: impl Into<Qualifier>) -> Self {
        self.key = self.key.with_qualifier(qualifier.into());
        self
    }

    /// Provides a pre-built instance.
    pub fn value(mut self, value: T) -> Self {
        self.modes.push(Construction::Value(Arc::new(value)));
        self
    }

    /// Provides the instance through a synchronous factory.
    ///
    /// The factory receives a [`ResolutionContext`] bound to the requesting
    /// container, so nested lookups share its caches and cycle detection.
    pub fn factory<F>(self, factory: F) -> Self
    where
        F: Fn(&ResolutionContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.deferrable_factory(move |ctx| factory(ctx).map(|value| Built::Ready(Arc::new(value) as AnyArc)))
    }

    /// Provides the instance through an asynchronous factory.
    ///
    /// Only [`get_async`](crate::Resolver::get_async) can resolve such a
    /// provider; synchronous resolution fails with `SyncAgainstAsync`.
    ///
    /// ```rust
    /// use ferrous_ioc::{module, single, Container, DiError, Resolver};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let container = Container::new();
    /// container.load(module![
    ///     single::<u64>().async_factory(|_ctx| async { Ok(42u64) }),
    /// ]).unwrap();
    ///
    /// assert!(matches!(container.get::<u64>(), Err(DiError::SyncAgainstAsync(_))));
    /// assert_eq!(*container.get_async::<u64>().await.unwrap(), 42);
    /// # }
    /// ```
    pub fn async_factory<F, Fut>(self, factory: F) -> Self
    where
        F: Fn(ResolutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.deferrable_factory(move |ctx| Ok(Built::deferred(factory(ctx.clone()))))
    }

    /// Provides the instance through an [`AsyncFactory`] object.
    pub fn async_factory_with<A>(self, factory: A) -> Self
    where
        A: AsyncFactory<T> + 'static,
    {
        let factory = Arc::new(factory);
        self.deferrable_factory(move |ctx| {
            let factory = factory.clone();
            let ctx = ctx.clone();
            Ok(Built::deferred(async move { factory.create(ctx).await }))
        })
    }

    /// Provides the instance through a factory that decides per call whether
    /// the result is ready or deferred.
    pub fn deferrable_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ResolutionContext) -> DiResult<Built> + Send + Sync + 'static,
    {
        self.modes.push(Construction::Factory(Arc::new(factory)));
        self
    }

    /// Declares the dependency keys passed to the constructor, in order.
    ///
    /// Only valid together with [`class`](Self::class). An explicit list
    /// bypasses any [`MetadataSource`](crate::MetadataSource).
    pub fn deps(mut self, deps: impl IntoIterator<Item = Key>) -> Self {
        self.deps = Some(deps.into_iter().collect());
        self
    }

    /// Registers a synchronous cleanup hook, run at shutdown.
    ///
    /// An explicit hook replaces the conventional `dispose`/`close`/`destroy`
    /// probing for this provider.
    pub fn on_close<F, E>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.on_close = Some(Arc::new(move |instance: AnyArc| match instance.downcast::<T>() {
            Ok(typed) => Closing::done(hook(typed)),
            Err(_) => Closing::ok(),
        }));
        self
    }

    /// Registers an asynchronous cleanup hook, awaited at shutdown.
    pub fn on_close_async<F, Fut, E>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.on_close = Some(Arc::new(move |instance: AnyArc| match instance.downcast::<T>() {
            Ok(typed) => Closing::pending(hook(typed)),
            Err(_) => Closing::ok(),
        }));
        self
    }

    /// Validates the declaration and produces a [`Provider`].
    pub fn build(self) -> DiResult<Provider> {
        let mut modes = self.modes;
        let construction = match modes.len() {
            0 => {
                return Err(DiError::invalid(
                    &self.key,
                    "no construction mode declared (expected value, factory or class)",
                ))
            }
            1 => modes.remove(0),
            n => {
                return Err(DiError::invalid(
                    &self.key,
                    format!("{n} construction modes declared, exactly one is allowed"),
                ))
            }
        };
        if self.deps.is_some() && !matches!(construction, Construction::Class(_)) {
            return Err(DiError::invalid(
                &self.key,
                "explicit dependencies are only valid for class providers",
            ));
        }
        Ok(Provider {
            key: self.key,
            kind: self.kind,
            construction,
            deps: self.deps,
            on_close: self.on_close,
            teardown: self.teardown,
        })
    }
}

impl<T: Injectable> ProviderBuilder<T> {
    /// Constructs the instance through [`Injectable::construct`].
    ///
    /// Cleanup methods declared on the type are probed at shutdown unless an
    /// explicit hook is set.
    pub fn class(mut self) -> Self {
        self.modes.push(Construction::Class(ClassRecipe::of::<T>()));
        self
    }
}

impl<T: Teardown> ProviderBuilder<T> {
    /// Probes the instance's [`Teardown`] methods at shutdown.
    ///
    /// Value and factory providers need this to opt into conventional cleanup;
    /// class providers get it automatically.
    pub fn teardown(mut self) -> Self {
        self.teardown = Some(teardown_erased::<T>);
        self
    }
}

impl<T> std::fmt::Debug for ProviderBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBuilder")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("modes", &self.modes.len())
            .field("deps", &self.deps)
            .finish()
    }
}

/// Anything that can be turned into a validated [`Provider`].
pub trait IntoProvider {
    /// Performs the conversion, reporting shape errors.
    fn into_provider(self) -> DiResult<Provider>;
}

impl IntoProvider for Provider {
    fn into_provider(self) -> DiResult<Provider> {
        Ok(self)
    }
}

impl<T: Send + Sync + 'static> IntoProvider for ProviderBuilder<T> {
    fn into_provider(self) -> DiResult<Provider> {
        self.build()
    }
}

impl<P: IntoProvider> IntoProvider for DiResult<P> {
    fn into_provider(self) -> DiResult<Provider> {
        self.and_then(IntoProvider::into_provider)
    }
}
