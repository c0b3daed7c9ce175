//! Class-style construction: types the container can build from resolved arguments.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::dispose::{probe_teardown, Closing, Teardown};

/// A type the container can construct from an ordered list of dependencies.
///
/// This is the container's notion of a "class": `construct` plays the role of
/// the constructor, and [`Args`] hands it the dependency instances in the order
/// they were declared (either explicitly on the provider with
/// [`deps`](crate::ProviderBuilder::deps), or through a
/// [`MetadataSource`](crate::MetadataSource)).
///
/// The `dispose`/`close`/`destroy` methods form the conventional cleanup
/// protocol probed at shutdown (see [`Teardown`]); leave them at their
/// defaults when there is nothing to release.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, single, keys, Args, Container, DiResult, Injectable, Resolver};
/// use std::sync::Arc;
///
/// struct Repo;
/// impl Injectable for Repo {
///     fn construct(_args: &mut Args) -> DiResult<Self> {
///         Ok(Repo)
///     }
/// }
///
/// struct Service {
///     repo: Arc<Repo>,
/// }
/// impl Injectable for Service {
///     fn construct(args: &mut Args) -> DiResult<Self> {
///         Ok(Service { repo: args.take()? })
///     }
/// }
///
/// let container = Container::new();
/// container.load(module![
///     single::<Repo>().class(),
///     single::<Service>().class().deps(keys![Repo]),
/// ]).unwrap();
///
/// let service = container.get::<Service>().unwrap();
/// assert!(Arc::ptr_eq(&service.repo, &container.get::<Repo>().unwrap()));
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Builds the instance from resolved constructor arguments.
    fn construct(args: &mut Args) -> DiResult<Self>;

    /// Preferred cleanup entry point.
    fn dispose(self: Arc<Self>) -> Option<Closing> {
        None
    }

    /// Probed when `dispose` is not implemented.
    fn close(self: Arc<Self>) -> Option<Closing> {
        None
    }

    /// Probed last.
    fn destroy(self: Arc<Self>) -> Option<Closing> {
        None
    }
}

impl<T: Injectable> Teardown for T {
    fn dispose(self: Arc<Self>) -> Option<Closing> {
        <T as Injectable>::dispose(self)
    }

    fn close(self: Arc<Self>) -> Option<Closing> {
        <T as Injectable>::close(self)
    }

    fn destroy(self: Arc<Self>) -> Option<Closing> {
        <T as Injectable>::destroy(self)
    }
}

/// Resolved constructor arguments, consumed in declaration order.
pub struct Args {
    target: Key,
    values: std::vec::IntoIter<(Key, AnyArc)>,
    position: usize,
}

impl Args {
    pub(crate) fn new(target: &Key, resolved: Vec<(Key, AnyArc)>) -> Self {
        Self {
            target: target.clone(),
            values: resolved.into_iter(),
            position: 0,
        }
    }

    /// Takes the next argument as `Arc<T>`.
    ///
    /// Fails with `InvalidProvider` when the declared dependency list is
    /// shorter than what the constructor consumes, and with `TypeMismatch` when
    /// the argument at this position is not a `T`.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        let index = self.position;
        let (key, value) = self.values.next().ok_or_else(|| {
            DiError::invalid(
                &self.target,
                format!(
                    "constructor asked for argument #{} ({}) but only {} dependencies were declared",
                    index,
                    std::any::type_name::<T>(),
                    index
                ),
            )
        })?;
        self.position += 1;
        value.downcast::<T>().map_err(|_| {
            tracing::debug!(target_key = %self.target, argument = %key, index, "constructor argument type mismatch");
            DiError::TypeMismatch(std::any::type_name::<T>())
        })
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Key of the instance being constructed.
    pub fn target(&self) -> &Key {
        &self.target
    }
}

pub(crate) type BuildFn = fn(&mut Args) -> DiResult<AnyArc>;
pub(crate) type TeardownProbe = fn(&AnyArc) -> Option<Closing>;

/// Type-erased constructor reference for an [`Injectable`] type.
#[derive(Clone, Copy)]
pub(crate) struct ClassRecipe {
    pub(crate) build: BuildFn,
    pub(crate) teardown: TeardownProbe,
}

impl ClassRecipe {
    pub(crate) fn of<T: Injectable>() -> Self {
        Self {
            build: build_erased::<T>,
            teardown: teardown_erased::<T>,
        }
    }
}

fn build_erased<T: Injectable>(args: &mut Args) -> DiResult<AnyArc> {
    Ok(Arc::new(T::construct(args)?) as AnyArc)
}

pub(crate) fn teardown_erased<T: Teardown>(instance: &AnyArc) -> Option<Closing> {
    let typed = instance.clone().downcast::<T>().ok()?;
    probe_teardown(typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        left: Arc<u8>,
        right: Arc<String>,
    }

    impl Injectable for Pair {
        fn construct(args: &mut Args) -> DiResult<Self> {
            Ok(Pair {
                left: args.take()?,
                right: args.take()?,
            })
        }
    }

    fn resolved() -> Vec<(Key, AnyArc)> {
        vec![
            (Key::of::<u8>(), Arc::new(7u8) as AnyArc),
            (Key::of::<String>(), Arc::new("x".to_string()) as AnyArc),
        ]
    }

    #[test]
    fn arguments_are_taken_in_order() {
        let mut args = Args::new(&Key::of::<Pair>(), resolved());
        let pair = Pair::construct(&mut args).unwrap();
        assert_eq!(*pair.left, 7);
        assert_eq!(pair.right.as_str(), "x");
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn missing_argument_is_an_invalid_provider() {
        let mut args = Args::new(&Key::of::<Pair>(), resolved()[..1].to_vec());
        let err = Pair::construct(&mut args).err().unwrap();
        assert!(matches!(err, DiError::InvalidProvider { .. }), "{err}");
    }

    #[test]
    fn wrong_argument_type_is_a_mismatch() {
        let mut args = Args::new(&Key::of::<Pair>(), resolved());
        let err = args.take::<String>().err().unwrap();
        assert!(matches!(err, DiError::TypeMismatch(_)));
    }

    #[test]
    fn injectable_without_cleanup_probes_to_none() {
        let recipe = ClassRecipe::of::<Pair>();
        let mut args = Args::new(&Key::of::<Pair>(), resolved());
        let built = (recipe.build)(&mut args).unwrap();
        assert!((recipe.teardown)(&built).is_none());
    }
}
