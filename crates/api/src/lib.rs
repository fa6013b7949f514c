//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for todos
//! - Bearer token authentication middleware
//! - Central error to response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use todo_core::todo::TodoService;
use todo_shared::TokenVerifier;
use todo_shared::config::ClientConfig;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Todo business logic with its injected gateways.
    pub todos: TodoService,
    /// Bearer token verifier.
    pub token_verifier: Arc<TokenVerifier>,
    /// Front-end configuration, if one is served.
    pub client_config: Option<Arc<ClientConfig>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("todos", &self.todos)
            .field("token_verifier", &self.token_verifier)
            .field("client_config", &self.client_config)
            .finish()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
