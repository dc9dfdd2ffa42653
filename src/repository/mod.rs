//! Todo storage.
//!
//! Provides [`TodoRepository`] implementations for:
//! - PostgreSQL (durable, [`PgTodoRepository`])
//! - In-memory (ephemeral, [`InMemoryTodoRepository`])
//!
//! Both variants share one failure contract: a missing id is
//! [`RepositoryError::NotFound`] for reads, updates and deletes alike.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::todo::{NewTodo, Todo, TodoId};

pub use memory::InMemoryTodoRepository;
pub use postgres::PgTodoRepository;

/// Convenient Result type alias for repository operations.
pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Storage contract for todo records.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Store a new record under a freshly assigned id.
    async fn create(&self, todo: NewTodo) -> RepoResult<Todo>;

    /// All records, ordered by id. An empty store yields an empty vec.
    async fn get_all(&self) -> RepoResult<Vec<Todo>>;

    /// The record with `id`.
    async fn get_by_id(&self, id: TodoId) -> RepoResult<Todo>;

    /// Replace the record whose id matches `todo.id` in full.
    async fn update(&self, todo: &Todo) -> RepoResult<()>;

    /// Remove the record with `id`.
    async fn delete(&self, id: TodoId) -> RepoResult<()>;

    /// Check the backend is reachable.
    async fn ping(&self) -> RepoResult<()>;

    /// Short backend name for logs and readiness output.
    fn backend_name(&self) -> &'static str;
}
