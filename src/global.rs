//! The process-wide container and its convenience functions.
//!
//! Everything here is a thin wrapper over a [`Container`] held in a global
//! slot. Applications that pass containers explicitly never need this module.

use std::borrow::Cow;
use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::collection::Module;
use crate::config::ContainerOptions;
use crate::error::DiResult;
use crate::internal::ShutdownReport;
use crate::key::Qualifier;
use crate::provider::{Container, Scope};
use crate::traits::Resolver;

// Created empty on first access; replaced by `start_di` and `reset_di`.
static GLOBAL_CONTAINER: Lazy<RwLock<Container>> = Lazy::new(|| RwLock::new(Container::new()));

/// Handle to the current process-wide container.
pub fn container() -> Container {
    GLOBAL_CONTAINER.read().clone()
}

/// (Re)initializes the process-wide container from `module` and `options`.
///
/// On error the previous container stays in place. On success the previous
/// container is replaced without running its cleanup; call
/// [`shutdown_di`] first if it holds resources.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{global, modules, module, single, ContainerOptions};
///
/// let db = module![single::<u16>().named("port").value(5432u16)];
/// let app = module![single::<String>().value("app".to_string())];
///
/// global::start_di(modules([db, app]), ContainerOptions::default()).unwrap();
/// assert_eq!(*global::inject_named::<u16>("port").unwrap(), 5432);
/// global::reset_di();
/// ```
pub fn start_di(module: Module, options: ContainerOptions) -> DiResult<Container> {
    let fresh = Container::with_options(options);
    fresh.load(module)?;
    *GLOBAL_CONTAINER.write() = fresh.clone();
    tracing::info!(providers = fresh.keys().len(), "process-wide container started");
    Ok(fresh)
}

/// Resolves `T` from the process-wide container.
pub fn inject<T: Send + Sync + 'static>() -> DiResult<Arc<T>> {
    container().get::<T>()
}

/// Resolves the provider for `T` registered under `name`.
pub fn inject_named<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>) -> DiResult<Arc<T>> {
    container().get_named::<T>(name)
}

/// Resolves the provider for `T` registered under `qualifier`.
pub fn inject_qualified<T: Send + Sync + 'static>(qualifier: impl Into<Qualifier>) -> DiResult<Arc<T>> {
    container().get_qualified::<T>(qualifier)
}

/// Resolves `T` asynchronously from the process-wide container.
pub fn inject_async<T: Send + Sync + 'static>() -> BoxFuture<'static, DiResult<Arc<T>>> {
    container().get_async::<T>()
}

/// Asynchronous counterpart of [`inject_named`].
pub fn inject_named_async<T: Send + Sync + 'static>(
    name: impl Into<Cow<'static, str>>,
) -> BoxFuture<'static, DiResult<Arc<T>>> {
    container().get_named_async::<T>(name)
}

/// Begins a scope over the process-wide container.
pub fn begin_scope() -> Scope {
    container().begin_scope()
}

/// Installs a value override in the process-wide container.
///
/// See [`Container::override_value`].
pub fn override_value<T: Send + Sync + 'static>(value: T, qualifier: Option<Qualifier>) {
    container().override_value(value, qualifier)
}

/// Runs cleanup for the process-wide container's instances.
///
/// Registrations stay in place; the next request rebuilds instances.
pub async fn shutdown_di() -> ShutdownReport {
    container().shutdown().await
}

/// Hard-clears the process-wide container and replaces it with an empty one
/// using default options. No cleanup runs.
pub fn reset_di() {
    let previous = std::mem::take(&mut *GLOBAL_CONTAINER.write());
    previous.reset();
    tracing::debug!("process-wide container reset");
}
