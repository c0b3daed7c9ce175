//! Module system for grouping provider declarations.
//!
//! A [`Module`] is an ordered list of providers with no identity of its own.
//! Merging modules concatenates their lists; duplicate keys are only detected
//! when the merged module is loaded into a container, where the override
//! policy decides between a conflict and a replacement.

use crate::collection::IntoProvider;
use crate::error::{DiError, DiResult};
use crate::registration::Provider;

/// An ordered collection of providers.
///
/// # Example
///
/// ```rust
/// use ferrous_ioc::{modules, single, Container, Module, Resolver};
///
/// let config = Module::new().provide(single::<u16>().named("port").value(8080u16));
/// let app = Module::new().provide(single::<String>().factory(|ctx| {
///     Ok(format!("listening on {}", ctx.get_named::<u16>("port")?))
/// }));
///
/// let container = Container::new();
/// container.load(modules([config, app])).unwrap();
/// assert_eq!(container.get::<String>().unwrap().as_str(), "listening on 8080");
/// ```
#[derive(Default)]
pub struct Module {
    providers: Vec<Provider>,
    errors: Vec<DiError>,
}

impl Module {
    /// Creates an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider, builder style.
    pub fn provide(mut self, provider: impl IntoProvider) -> Self {
        self.add(provider);
        self
    }

    /// Appends a provider in place.
    ///
    /// Shape errors are kept and reported when the module is loaded.
    pub fn add(&mut self, provider: impl IntoProvider) -> &mut Self {
        match provider.into_provider() {
            Ok(provider) => self.providers.push(provider),
            Err(err) => self.errors.push(err),
        }
        self
    }

    /// Appends every provider of `other` after this module's providers.
    pub fn merge(mut self, other: Module) -> Self {
        self.providers.extend(other.providers);
        self.errors.extend(other.errors);
        self
    }

    /// Lets a [`ProviderModule`] add its providers to this module.
    pub fn add_module<M: ProviderModule>(mut self, module: M) -> Self {
        module.register(&mut self);
        self
    }

    /// Providers in declaration order.
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Number of valid providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True if the module declares no valid providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Consumes the module, returning the first recorded shape error if any.
    pub fn into_providers(self) -> DiResult<Vec<Provider>> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.providers),
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("providers", &self.providers)
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl<P: IntoProvider> FromIterator<P> for Module {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut module = Module::new();
        for provider in iter {
            module.add(provider);
        }
        module
    }
}

impl<P: IntoProvider> Extend<P> for Module {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for provider in iter {
            self.add(provider);
        }
    }
}

/// A reusable unit that contributes providers to a [`Module`].
///
/// ```rust
/// use ferrous_ioc::{single, Module, ProviderModule};
///
/// struct DatabaseModule {
///     url: &'static str,
/// }
///
/// impl ProviderModule for DatabaseModule {
///     fn register(self, module: &mut Module) {
///         module.add(single::<String>().named("db_url").value(self.url.to_string()));
///     }
/// }
///
/// let module = Module::new().add_module(DatabaseModule { url: "postgres://localhost" });
/// assert_eq!(module.len(), 1);
/// ```
pub trait ProviderModule {
    /// Adds this unit's providers to `module`.
    fn register(self, module: &mut Module);
}

/// Builds a module from providers of a single type.
///
/// Use the [`module!`](crate::module!) macro to mix builders of different
/// types.
pub fn module<P: IntoProvider>(providers: impl IntoIterator<Item = P>) -> Module {
    providers.into_iter().collect()
}

/// Concatenates modules, preserving order.
pub fn modules(modules: impl IntoIterator<Item = Module>) -> Module {
    modules.into_iter().fold(Module::new(), Module::merge)
}

/// Builds a [`Module`] from a list of providers or builders.
///
/// ```rust
/// use ferrous_ioc::{module, factory, single};
///
/// let m = module![
///     single::<u8>().value(1),
///     factory::<String>().factory(|_| Ok(String::new())),
/// ];
/// assert_eq!(m.len(), 2);
/// ```
#[macro_export]
macro_rules! module {
    ($($provider:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut module = $crate::Module::new();
        $( module.add($provider); )*
        module
    }};
}
