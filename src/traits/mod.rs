//! Core traits for the container.

mod dispose;
mod injectable;
mod resolver;

pub use dispose::{Closing, Teardown};
pub use injectable::{Args, Injectable};
pub use resolver::{Resolver, ResolverCore};

pub(crate) use injectable::{teardown_erased, ClassRecipe, TeardownProbe};
