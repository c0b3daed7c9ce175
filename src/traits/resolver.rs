//! Resolver traits for instance resolution.

use std::any::type_name;
use std::borrow::Cow;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::error::{DiError, DiResult};
use crate::key::{Key, Qualifier};
use crate::registration::AnyArc;
use crate::traits::Injectable;

/// Core resolver trait for object-safe resolution.
///
/// Implemented by [`Container`](crate::Container),
/// [`Scope`](crate::Scope) and [`ResolutionContext`](crate::ResolutionContext).
/// Both methods work on type-erased instances; most callers should use the
/// typed methods of [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves `key` synchronously.
    ///
    /// Fails with `SyncAgainstAsync` when any step of the construction chain
    /// is asynchronous.
    fn resolve(&self, key: &Key) -> DiResult<AnyArc>;

    /// Resolves `key`, awaiting asynchronous construction steps.
    ///
    /// The returned future owns everything it needs and may be moved to
    /// another task.
    fn resolve_async(&self, key: &Key) -> BoxFuture<'static, DiResult<AnyArc>>;
}

/// Typed resolution on top of [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, single, Container, Resolver};
///
/// let container = Container::new();
/// container.load(module![
///     single::<u16>().named("port").value(8080u16),
///     single::<String>().factory(|ctx| {
///         let port = ctx.get_named::<u16>("port")?;
///         Ok(format!("localhost:{port}"))
///     }),
/// ]).unwrap();
///
/// assert_eq!(container.get::<String>().unwrap().as_str(), "localhost:8080");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the unqualified provider for `T`.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_by::<T>(&Key::of::<T>())
    }

    /// Resolves the provider for `T` registered under `name`.
    fn get_named<T: Send + Sync + 'static>(&self, name: impl Into<Cow<'static, str>>) -> DiResult<Arc<T>> {
        self.get_by::<T>(&Key::named::<T>(name))
    }

    /// Resolves the provider for `T` registered under `qualifier`.
    fn get_qualified<T: Send + Sync + 'static>(&self, qualifier: impl Into<Qualifier>) -> DiResult<Arc<T>> {
        self.get_by::<T>(&Key::qualified::<T>(qualifier))
    }

    /// Resolves an arbitrary key and downcasts the instance to `T`.
    fn get_by<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast(self.resolve(key)?)
    }

    /// Resolves `T`, constructing it directly when nothing is registered.
    ///
    /// A registered provider still wins; the fallback instance is neither
    /// cached nor recorded for disposal.
    ///
    /// ```
    /// use ferrous_ioc::{Args, Container, DiResult, Injectable, Resolver};
    ///
    /// struct Clock;
    /// impl Injectable for Clock {
    ///     fn construct(_: &mut Args) -> DiResult<Self> { Ok(Clock) }
    /// }
    ///
    /// let container = Container::new();
    /// assert!(container.get::<Clock>().is_err());
    /// assert!(container.make::<Clock>().is_ok());
    /// ```
    fn make<T: Injectable>(&self) -> DiResult<Arc<T>> {
        self.get_by::<T>(&Key::class::<T>())
    }

    /// Resolves a required instance, panicking if resolution fails.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error message when `T` cannot be resolved.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        match self.get::<T>() {
            Ok(value) => value,
            Err(err) => panic!("Failed to resolve {}: {}", type_name::<T>(), err),
        }
    }

    /// Asynchronous counterpart of [`get`](Self::get).
    fn get_async<T: Send + Sync + 'static>(&self) -> BoxFuture<'static, DiResult<Arc<T>>> {
        self.get_by_async::<T>(&Key::of::<T>())
    }

    /// Asynchronous counterpart of [`get_named`](Self::get_named).
    fn get_named_async<T: Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> BoxFuture<'static, DiResult<Arc<T>>> {
        self.get_by_async::<T>(&Key::named::<T>(name))
    }

    /// Asynchronous counterpart of [`get_qualified`](Self::get_qualified).
    fn get_qualified_async<T: Send + Sync + 'static>(
        &self,
        qualifier: impl Into<Qualifier>,
    ) -> BoxFuture<'static, DiResult<Arc<T>>> {
        self.get_by_async::<T>(&Key::qualified::<T>(qualifier))
    }

    /// Asynchronous counterpart of [`get_by`](Self::get_by).
    fn get_by_async<T: Send + Sync + 'static>(&self, key: &Key) -> BoxFuture<'static, DiResult<Arc<T>>> {
        self.resolve_async(key)
            .map(|resolved| resolved.and_then(downcast::<T>))
            .boxed()
    }

    /// Asynchronous counterpart of [`make`](Self::make).
    fn make_async<T: Injectable>(&self) -> BoxFuture<'static, DiResult<Arc<T>>> {
        self.get_by_async::<T>(&Key::class::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn downcast<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(type_name::<T>()))
}
