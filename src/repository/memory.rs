//! In-memory todo storage. Data is lost when the process exits.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use super::{RepoResult, TodoRepository};
use crate::error::RepositoryError;
use crate::todo::{IdGenerator, NewTodo, Todo, TodoId};

/// Map-backed todo store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<DashMap<TodoId, Todo>>,
    ids: Arc<IdGenerator>,
}

impl InMemoryTodoRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that draws ids from `ids`.
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            todos: Arc::default(),
            ids: Arc::new(ids),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    #[instrument(skip(self, todo))]
    async fn create(&self, todo: NewTodo) -> RepoResult<Todo> {
        let id = self.ids.next_id().ok_or(RepositoryError::IdsExhausted)?;
        let todo = todo.with_id(id);
        self.todos.insert(todo.id, todo.clone());
        debug!(id = todo.id, "todo stored in memory");
        Ok(todo)
    }

    async fn get_all(&self) -> RepoResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self.todos.iter().map(|entry| entry.value().clone()).collect();
        todos.sort_by_key(|todo| todo.id);
        Ok(todos)
    }

    async fn get_by_id(&self, id: TodoId) -> RepoResult<Todo> {
        self.todos
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(RepositoryError::NotFound(id))
    }

    #[instrument(skip(self, todo), fields(id = todo.id))]
    async fn update(&self, todo: &Todo) -> RepoResult<()> {
        match self.todos.entry(todo.id) {
            Entry::Occupied(mut entry) => {
                entry.insert(todo.clone());
                Ok(())
            }
            Entry::Vacant(_) => Err(RepositoryError::NotFound(todo.id)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: TodoId) -> RepoResult<()> {
        self.todos
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    fn milk() -> NewTodo {
        NewTodo::new("buy milk", 0, "urgent")
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = InMemoryTodoRepository::new();

        let created = store.create(milk()).await.unwrap();
        assert!(created.id > 0);

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "buy milk");
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let store = InMemoryTodoRepository::new();

        let first = store.create(milk()).await.unwrap();
        let second = store.create(milk()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn create_fails_once_ids_are_exhausted() {
        let store = InMemoryTodoRepository::with_ids(IdGenerator::starting_after(i64::MAX - 1));

        let last = store.create(milk()).await.unwrap();
        assert_eq!(last.id, i64::MAX);

        let err = assert_err!(store.create(milk()).await);
        assert!(matches!(err, RepositoryError::IdsExhausted));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id(i64::MAX).await.unwrap(), last);
    }

    #[tokio::test]
    async fn get_all_on_empty_store_is_empty() {
        let store = InMemoryTodoRepository::new();
        assert_eq!(store.get_all().await.unwrap(), Vec::<Todo>::new());
    }

    #[tokio::test]
    async fn get_all_orders_by_id() {
        let store = InMemoryTodoRepository::new();
        for n in 0..5 {
            store.create(NewTodo::new(format!("todo {n}"), n, "")).await.unwrap();
        }

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryTodoRepository::new();
        let err = store.get_by_id(123).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(123)));
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = InMemoryTodoRepository::new();
        let created = store.create(milk()).await.unwrap();

        let replacement = NewTodo::new("buy bread", 2, "").with_id(created.id);
        assert_ok!(store.update(&replacement).await);

        assert_eq!(store.get_by_id(created.id).await.unwrap(), replacement);
    }

    #[tokio::test]
    async fn update_missing_is_not_found_and_does_not_insert() {
        let store = InMemoryTodoRepository::new();

        let ghost = milk().with_id(77);
        let err = assert_err!(store.update(&ghost).await);

        assert!(matches!(err, RepositoryError::NotFound(77)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = InMemoryTodoRepository::new();
        let created = store.create(milk()).await.unwrap();

        assert_ok!(store.delete(created.id).await);
        assert!(store.get_by_id(created.id).await.is_err());
    }

    #[tokio::test]
    async fn delete_missing_leaves_store_unchanged() {
        let store = InMemoryTodoRepository::new();
        store.create(milk()).await.unwrap();

        let err = store.delete(1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(1)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = InMemoryTodoRepository::new();
        let clone = store.clone();

        let created = store.create(milk()).await.unwrap();
        assert!(clone.get_by_id(created.id).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_are_all_stored() {
        let store = InMemoryTodoRepository::new();

        let tasks: Vec<_> = (0..100)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move { store.create(NewTodo::new("t", n, "")).await })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 100);
        assert_eq!(store.get_all().await.unwrap().len(), 100);
    }
}
