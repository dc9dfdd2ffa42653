//! Todo record types and id generation.
//!
//! This module handles:
//! - The stored [`Todo`] record and its wire payloads
//! - Server-side id assignment

pub mod id;
pub mod types;

pub use id::IdGenerator;
pub use types::{CreatedResponse, NewTodo, Todo, TodoId, TodoPayload};
