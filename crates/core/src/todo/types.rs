//! Todo types and data structures.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use todo_shared::types::{AttachmentId, TodoId};

/// A todo item owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Owner identity (the token subject).
    pub user_id: String,
    /// Unique identifier, generated at creation.
    pub todo_id: TodoId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Short label.
    pub name: String,
    /// Due date as supplied by the user.
    pub due_date: String,
    /// Completion flag.
    pub done: bool,
    /// Retrieval URL of the attached file, if any.
    pub attachment_url: Option<String>,
}

impl TodoItem {
    /// Creates a fresh, not-done item without attachment.
    #[must_use]
    pub fn new(user_id: impl Into<String>, input: CreateTodoInput) -> Self {
        Self {
            user_id: user_id.into(),
            todo_id: TodoId::new(),
            created_at: Utc::now().trunc_subsecs(6),
            name: input.name,
            due_date: input.due_date,
            done: false,
            attachment_url: None,
        }
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: &TodoUpdate) {
        if let Some(name) = &update.name {
            self.name.clone_from(name);
        }
        if let Some(due_date) = &update.due_date {
            self.due_date.clone_from(due_date);
        }
        if let Some(done) = update.done {
            self.done = done;
        }
    }
}

/// Input for creating a todo.
#[derive(Debug, Clone, Validate)]
pub struct CreateTodoInput {
    /// Short label.
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    /// Due date.
    #[validate(custom(function = "not_blank"))]
    pub due_date: String,
}

/// Partial update of a todo's mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct TodoUpdate {
    /// New label.
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    /// New due date.
    #[validate(custom(function = "not_blank"))]
    pub due_date: Option<String>,
    /// New completion flag.
    pub done: Option<bool>,
}

impl TodoUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.due_date.is_none() && self.done.is_none()
    }
}

/// Result of requesting an attachment upload URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    /// Attachment the URL uploads to.
    pub attachment_id: AttachmentId,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method the upload must use.
    pub upload_method: String,
    /// Headers the upload request must carry.
    pub upload_headers: HashMap<String, String>,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}
