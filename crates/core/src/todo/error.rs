//! Todo error types.

use thiserror::Error;

use todo_shared::AppError;
use todo_shared::types::TodoId;

use crate::storage::StorageError;

/// Todo operation errors.
#[derive(Debug, Error)]
pub enum TodoError {
    /// No todo with this id exists.
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    /// The todo exists but belongs to someone else.
    #[error("user {user_id} is not allowed to modify todo {todo_id}")]
    Forbidden {
        /// The caller.
        user_id: String,
        /// The todo the caller tried to touch.
        todo_id: TodoId,
    },

    /// Missing or invalid input fields.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Blob store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Item store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl TodoError {
    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(user_id: impl Into<String>, todo_id: TodoId) -> Self {
        Self::Forbidden {
            user_id: user_id.into(),
            todo_id,
        }
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<validator::ValidationErrors> for TodoError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_) => Self::NotFound(err.to_string()),
            TodoError::Forbidden { .. } => Self::Forbidden(err.to_string()),
            TodoError::Validation(msg) => Self::BadRequest(msg),
            TodoError::Storage(e) => Self::ExternalService(e.to_string()),
            TodoError::Repository(msg) => Self::Database(msg),
        }
    }
}
