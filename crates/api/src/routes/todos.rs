//! Todo routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use todo_core::todo::{CreateTodoInput, TodoItem, TodoUpdate, UploadUrl};
use todo_shared::AppError;
use todo_shared::types::TodoId;

/// Creates the todo routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{todo_id}", patch(update_todo).delete(delete_todo))
        .route("/todos/{todo_id}/attachment", post(generate_upload_url))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a todo.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    /// Short label.
    pub name: String,
    /// Due date.
    pub due_date: String,
}

/// Request body for updating a todo. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    /// New label.
    #[serde(default)]
    pub name: Option<String>,
    /// New due date.
    #[serde(default)]
    pub due_date: Option<String>,
    /// New completion flag.
    #[serde(default)]
    pub done: Option<bool>,
}

impl From<CreateTodoRequest> for CreateTodoInput {
    fn from(req: CreateTodoRequest) -> Self {
        Self {
            name: req.name,
            due_date: req.due_date,
        }
    }
}

impl From<UpdateTodoRequest> for TodoUpdate {
    fn from(req: UpdateTodoRequest) -> Self {
        Self {
            name: req.name,
            due_date: req.due_date,
            done: req.done,
        }
    }
}

/// A path id that is not a UUID cannot name an existing todo.
fn parse_todo_id(raw: &str) -> Result<TodoId, ApiError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("todo not found: {raw}")).into())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/todos`
async fn list_todos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TodoItem>>, ApiError> {
    let items = state.todos.list_todos(auth.user_id()).await?;
    Ok(Json(items))
}

/// POST `/todos`
async fn create_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoItem>), ApiError> {
    let Json(req) = body?;

    let item = state.todos.create_todo(auth.user_id(), req.into()).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH `/todos/{todo_id}`
async fn update_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(todo_id): Path<String>,
    body: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let todo_id = parse_todo_id(&todo_id)?;
    let Json(req) = body?;

    state
        .todos
        .update_todo(auth.user_id(), todo_id, req.into())
        .await?;

    Ok(StatusCode::OK)
}

/// DELETE `/todos/{todo_id}`
async fn delete_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let todo_id = parse_todo_id(&todo_id)?;

    state.todos.delete_todo(auth.user_id(), todo_id).await?;

    Ok(StatusCode::OK)
}

/// POST `/todos/{todo_id}/attachment`
///
/// Issues an upload URL for a fresh attachment and points the todo at it.
async fn generate_upload_url(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(todo_id): Path<String>,
) -> Result<Json<UploadUrl>, ApiError> {
    let todo_id = parse_todo_id(&todo_id)?;

    let upload = state
        .todos
        .generate_upload_url(auth.user_id(), todo_id)
        .await?;

    info!(
        user_id = auth.user_id(),
        todo_id = %todo_id,
        attachment_id = %upload.attachment_id,
        "Upload URL issued"
    );
    Ok(Json(upload))
}
