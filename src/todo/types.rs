//! Todo record and request/response payloads.

use serde::{Deserialize, Serialize};

/// Server-assigned todo identifier.
pub type TodoId = i64;

/// A stored todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    /// Unique id, assigned at creation and never changed.
    pub id: TodoId,
    /// Name.
    pub name: String,
    /// Age.
    pub age: i64,
    /// Free-form data.
    pub data: String,
}

/// Todo fields before the server assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    /// Name.
    pub name: String,
    /// Age.
    pub age: i64,
    /// Free-form data.
    pub data: String,
}

impl NewTodo {
    /// Create new todo fields.
    pub fn new(name: impl Into<String>, age: i64, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            data: data.into(),
        }
    }

    /// Attach an id, producing a full record.
    pub fn with_id(self, id: TodoId) -> Todo {
        Todo {
            id,
            name: self.name,
            age: self.age,
            data: self.data,
        }
    }
}

/// Body of POST and PUT requests.
///
/// Every field is optional on the wire; absent fields take their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TodoPayload {
    /// Target id. Ignored on create, required on update.
    pub id: Option<TodoId>,
    /// Name.
    pub name: String,
    /// Age.
    pub age: i64,
    /// Free-form data.
    pub data: String,
}

impl TodoPayload {
    /// Drop any client-supplied id.
    pub fn into_new_todo(self) -> NewTodo {
        NewTodo {
            name: self.name,
            age: self.age,
            data: self.data,
        }
    }

    /// Full replacement record, if the payload names a target id.
    pub fn into_todo(self) -> Option<Todo> {
        let id = self.id?;
        Some(self.into_new_todo().with_id(id))
    }
}

/// Response body of a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Assigned id.
    pub id: TodoId,
}
