//! Optional reflection metadata for class providers.
//!
//! When a class provider declares no explicit dependencies, the container asks
//! its [`MetadataSource`] (if one was installed) for the constructor's
//! parameter keys. Without a source, or when the source knows nothing about
//! the type, the class is constructed with no arguments.

use std::any::TypeId;

use crate::key::Key;
use crate::registration::Map;

/// Looks up constructor parameter keys for a type.
///
/// Implemented for closures, so a simple lookup function is enough:
///
/// ```
/// use ferrous_ioc::{ContainerOptions, Key};
///
/// let options = ContainerOptions::new().metadata(|key: &Key| {
///     (key.type_name() == "u64").then(|| vec![Key::of::<u32>()])
/// });
/// ```
pub trait MetadataSource: Send + Sync {
    /// Ordered parameter keys for `key`'s constructor, or `None` if unknown.
    fn param_types(&self, key: &Key) -> Option<Vec<Key>>;
}

impl<F> MetadataSource for F
where
    F: Fn(&Key) -> Option<Vec<Key>> + Send + Sync,
{
    fn param_types(&self, key: &Key) -> Option<Vec<Key>> {
        self(key)
    }
}

/// Table of constructor parameter lists, keyed by type.
///
/// Qualifiers on the requested key are ignored; a declaration applies to every
/// provider of the type.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{keys, module, single, Args, Container, ContainerOptions, DiResult, Injectable, Resolver, TypeMetadata};
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
/// let metadata = TypeMetadata::new().with::<Service>(keys![Repo]);
/// let container = Container::with_options(ContainerOptions::new().metadata(metadata));
/// container.load(module![
///     single::<Repo>().class(),
///     single::<Service>().class(),
/// ]).unwrap();
///
/// let service = container.get::<Service>().unwrap();
/// assert!(Arc::ptr_eq(&service.repo, &container.get::<Repo>().unwrap()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeMetadata {
    params: Map<TypeId, Vec<Key>>,
}

impl TypeMetadata {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the parameter keys of `T`'s constructor.
    pub fn declare<T: 'static>(&mut self, params: impl IntoIterator<Item = Key>) -> &mut Self {
        self.params.insert(TypeId::of::<T>(), params.into_iter().collect());
        self
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with<T: 'static>(mut self, params: impl IntoIterator<Item = Key>) -> Self {
        self.declare::<T>(params);
        self
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl MetadataSource for TypeMetadata {
    fn param_types(&self, key: &Key) -> Option<Vec<Key>> {
        self.params.get(&key.type_id()).cloned()
    }
}
