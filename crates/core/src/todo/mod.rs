//! Todo items and the business rules around them.
//!
//! This module provides:
//! - Creating, listing, updating and deleting a user's todos
//! - Ownership checks on every mutation
//! - Upload URL generation and attachment association

mod error;
mod memory;
mod service;
mod types;

pub use error::TodoError;
pub use memory::MemoryTodoRepository;
pub use service::{AttachmentStorage, TodoRepository, TodoService};
pub use types::{CreateTodoInput, TodoItem, TodoUpdate, UploadUrl};
