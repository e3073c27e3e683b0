//! Token DI is a dependency injection container keyed by tokens.
//!
//! Token DI consists of the following components:
//!
//! 1. Token - the declaration of a dependency, optionally with a default value
//! 2. Solution - binds a token either to a value ([`Implementation`]) or a factory ([`Injectable`])
//! 3. Injector - a builder collecting the dependencies of injectables and consumers
//! 4. Consumer - a terminal user of dependencies, run once via [`Container::consume`]
//! 5. Provider - a solution plus its resolve strategy (stateful or stateless)
//! 6. Container - resolves tokens lazily, caches stateful instances, forks child containers
//!    and disposes them again
//! 7. Scope - makes a container the current one for a callback, see [`run_in_scope`]
//!    and [`use_injection`]
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use token_di::{container, inject, provide, token, Dependencies};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct Users {
//!     database: Rc<Database>,
//! }
//!
//! let database = token::<Database>("Database");
//! let users = token::<Users>("Users");
//!
//! let users_impl = inject(Dependencies::new().add("database", &database))
//!     .implements(&users, |ctx| Ok(Users { database: ctx.get("database")? }));
//! let database_impl = token_di::factory(&database, || {
//!     Ok(Database { url: "sqlite::memory:".to_string() })
//! });
//!
//! let ioc = container([provide::stateful(database_impl), provide::stateful(users_impl)]).unwrap();
//!
//! let first = ioc.request(&users).unwrap();
//! let second = ioc.request(&users).unwrap();
//! assert!(Rc::ptr_eq(&first, &second));
//! assert_eq!(first.database.url, "sqlite::memory:");
//!
//! ioc.dispose().unwrap();
//! assert!(ioc.request(&users).is_err());
//! ```

pub mod config;
pub mod consumer;
pub mod container;
mod dependency_graph;
pub mod errors;
pub mod inject;
pub mod injectable;
pub mod provider;
mod registry;
pub mod scope;
pub mod token;
pub mod types;

pub use config::{ContainerOptions, ParentFallback};
pub use consumer::{consumer, dynamic_consumer, Consumer};
pub use container::{container, Container};
pub use errors::ContainerError;
pub use inject::{inject, Dependencies, InjectionContext, Injector};
pub use injectable::{dynamic_injectable, factory, injectable, Injectable, InjectableSolution};
pub use provider::{provide, provider, Provider, ResolveStrategy, Solution};
pub use scope::{current_container, run_in_scope, use_injection};
pub use token::{
    container_token, implementation, token, token_with_default, AnyToken, Implementation, Token,
};
pub use types::{DynError, Instance, TokenKey};
