//! PostgreSQL todo storage.
//!
//! Expects an existing table:
//!
//! ```sql
//! CREATE TABLE todos (id BIGINT PRIMARY KEY, name TEXT, age BIGINT, data TEXT);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use super::{RepoResult, TodoRepository};
use crate::error::RepositoryError;
use crate::todo::{IdGenerator, NewTodo, Todo, TodoId};

const INSERT_TODO: &str = "INSERT INTO todos (id, name, age, data) VALUES ($1, $2, $3, $4)";
const SELECT_ALL: &str = "SELECT id, name, age, data FROM todos ORDER BY id";
const SELECT_BY_ID: &str = "SELECT id, name, age, data FROM todos WHERE id = $1";
const UPDATE_BY_ID: &str = "UPDATE todos SET name = $2, age = $3, data = $4 WHERE id = $1";
const DELETE_BY_ID: &str = "DELETE FROM todos WHERE id = $1";
const MAX_ID: &str = "SELECT COALESCE(MAX(id), 0) FROM todos";

/// Table-backed todo store.
#[derive(Debug, Clone)]
pub struct PgTodoRepository {
    pool: PgPool,
    ids: Arc<IdGenerator>,
}

impl PgTodoRepository {
    /// Open a pool, verify the connection and seed id generation past the
    /// largest stored id.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let repository = Self::with_pool(pool).await?;
        repository.ping().await?;
        info!("Connected to the database");

        Ok(repository)
    }

    /// Wrap an existing pool.
    pub async fn with_pool(pool: PgPool) -> RepoResult<Self> {
        let max_id: i64 = sqlx::query_scalar(MAX_ID).fetch_one(&pool).await?;
        debug!(max_id, "seeding todo id generator");

        Ok(Self {
            pool,
            ids: Arc::new(IdGenerator::starting_after(max_id)),
        })
    }

    /// Number of stored records.
    pub async fn count(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    #[instrument(skip(self, todo))]
    async fn create(&self, todo: NewTodo) -> RepoResult<Todo> {
        let id = self.ids.next_id().ok_or(RepositoryError::IdsExhausted)?;
        let todo = todo.with_id(id);

        sqlx::query(INSERT_TODO)
            .bind(todo.id)
            .bind(&todo.name)
            .bind(todo.age)
            .bind(&todo.data)
            .execute(&self.pool)
            .await?;

        debug!(id = todo.id, "todo inserted");
        Ok(todo)
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> RepoResult<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(todos)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: TodoId) -> RepoResult<Todo> {
        sqlx::query_as::<_, Todo>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    #[instrument(skip(self, todo), fields(id = todo.id))]
    async fn update(&self, todo: &Todo) -> RepoResult<()> {
        let result = sqlx::query(UPDATE_BY_ID)
            .bind(todo.id)
            .bind(&todo.name)
            .bind(todo.age)
            .bind(&todo.data)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(todo.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: TodoId) -> RepoResult<()> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
