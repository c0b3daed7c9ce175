//! # ferrous-ioc
//!
//! A small object-lifecycle container: declare how instances are built
//! (pre-built values, factories, or constructor-style "classes"), resolve them
//! by type and optional qualifier, and release held resources on shutdown.
//!
//! ## Features
//!
//! - **Scope kinds**: `single` (one per container tree), `scoped` (one per
//!   scope), `factory` (new on every request)
//! - **Composite keys**: `TypeId` plus an optional name or token qualifier
//! - **Circular dependency detection**: fails eagerly with the offending path
//! - **Sync and async construction**: async factories are awaited by
//!   `get_async`; synchronous `get` reports them instead of blocking
//! - **Ordered cleanup**: explicit hooks or conventional `dispose`/`close`/
//!   `destroy` methods, run in reverse creation order, tolerant of failures
//! - **Explicit container**: the process-wide wrapper in [`global`] is optional
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{module, single, factory, Container, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container.load(module![
//!     single::<Database>().value(Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     }),
//!     factory::<UserService>().factory(|ctx| Ok(UserService { db: ctx.get::<Database>()? })),
//! ]).unwrap();
//!
//! let user_service = container.get::<UserService>().unwrap();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Qualifiers
//!
//! ```rust
//! use ferrous_ioc::{module, single, Container, Resolver, Token};
//!
//! let replica = Token::new("replica");
//!
//! let container = Container::new();
//! container.load(module![
//!     single::<String>().named("primary").value("db-1".to_string()),
//!     single::<String>().qualified(replica).value("db-2".to_string()),
//! ]).unwrap();
//!
//! assert_eq!(container.get_named::<String>("primary").unwrap().as_str(), "db-1");
//! assert_eq!(container.get_qualified::<String>(replica).unwrap().as_str(), "db-2");
//! assert!(container.get::<String>().is_err());
//! ```
//!
//! ## Cleanup
//!
//! ```rust
//! use ferrous_ioc::{module, single, Args, Closing, Container, DiResult, Injectable, Resolver};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! static CLOSED: AtomicBool = AtomicBool::new(false);
//!
//! struct Pool;
//! impl Injectable for Pool {
//!     fn construct(_: &mut Args) -> DiResult<Self> { Ok(Pool) }
//!
//!     fn close(self: Arc<Self>) -> Option<Closing> {
//!         CLOSED.store(true, Ordering::SeqCst);
//!         Some(Closing::ok())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let container = Container::new();
//! container.load(module![single::<Pool>().class()]).unwrap();
//! container.get::<Pool>().unwrap();
//!
//! let report = container.shutdown().await;
//! assert!(report.is_clean());
//! assert!(CLOSED.load(Ordering::SeqCst));
//! # }
//! ```

pub mod async_factories;
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod global;
pub mod key;
pub mod lifetime;
pub mod metadata;
pub mod observer;
pub mod provider;
pub mod traits;

mod internal;
mod registration;

pub use async_factories::AsyncFactory;
pub use collection::{factory, module, modules, scoped, single, IntoProvider, Module, ProviderBuilder, ProviderModule};
#[cfg(feature = "config")]
pub use config::OptionsSpec;
pub use config::{ConfigError, ContainerOptions, OverrideStrategy};
pub use descriptors::ProviderDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use internal::{DisposalFailure, ShutdownReport};
pub use key::{Key, Qualifier, Token};
pub use lifetime::ScopeKind;
pub use metadata::{MetadataSource, TypeMetadata};
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{Container, ResolutionContext, Scope};
pub use registration::{AnyArc, Built, ConstructionMode, Provider};
pub use traits::{Args, Closing, Injectable, Resolver, ResolverCore, Teardown};
