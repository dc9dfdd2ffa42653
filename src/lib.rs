//! Todo CRUD service.
//!
//! A single `/todo` endpoint maps HTTP method and query string onto four
//! storage operations over one record type:
//!
//! ```text
//! POST   /todo          {"name","age","data"}        -> 200 {"id": N}
//! GET    /todo                                       -> 200 [todo, ...]
//! GET    /todo?id=N                                  -> 200 todo | 404
//! PUT    /todo          {"id","name","age","data"}   -> 200 | 404
//! DELETE /todo?id=N                                  -> 204 | 404
//! ```
//!
//! Storage is either a PostgreSQL `todos` table or an in-process map, both
//! behind [`repository::TodoRepository`].
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`todo`]: Record types and id generation
//! - [`repository`]: Storage trait and its PostgreSQL/in-memory backends
//! - [`api`]: HTTP handlers and router
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod todo;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
