//! Front-end configuration endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::{AppState, error::ApiError};
use todo_shared::AppError;

/// Auth settings the front-end needs to start a login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAuthConfig {
    /// Auth provider domain.
    pub domain: Option<String>,
    /// Application client id.
    pub client_id: String,
    /// Redirect target after login.
    pub callback_url: String,
}

/// Client configuration response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    /// Base URL of this API.
    pub api_endpoint: String,
    /// Auth settings.
    pub auth: ClientAuthConfig,
}

async fn client_config(
    State(state): State<AppState>,
) -> Result<Json<ClientConfigResponse>, ApiError> {
    let config = state
        .client_config
        .as_deref()
        .ok_or_else(|| AppError::NotFound("client configuration".to_string()))?;

    Ok(Json(ClientConfigResponse {
        api_endpoint: config.api_endpoint.clone(),
        auth: ClientAuthConfig {
            domain: config.auth_domain.clone(),
            client_id: config.client_id.clone(),
            callback_url: config.callback_url.clone(),
        },
    }))
}

/// Creates client configuration routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/client-config", get(client_config))
}
