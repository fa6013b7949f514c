//! Todo API Server
//!
//! Main entry point for the todo backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::{AppState, create_router};
use todo_core::storage::{StorageConfig, StorageService};
use todo_core::todo::{MemoryTodoRepository, TodoRepository, TodoService};
use todo_db::{DbTodoRepository, connect};
use todo_shared::{AppConfig, TokenVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Item store
    let repo: Arc<dyn TodoRepository> = if config.database.url.is_some() {
        let db = connect(&config.database).await?;
        info!("Connected to database");
        Arc::new(DbTodoRepository::new(db))
    } else {
        warn!("No database url configured, todos are kept in memory");
        Arc::new(MemoryTodoRepository::new())
    };

    // Blob store
    let storage = StorageService::from_config(StorageConfig::from_settings(&config.storage))
        .context("failed to initialise attachment storage")?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Attachment storage configured"
    );

    // Token verification
    let verifier_config = config.auth.verifier_config();
    info!(jwks_url = %verifier_config.jwks_url, "Verifying tokens against key set");
    let token_verifier = TokenVerifier::new(verifier_config);

    // Create application state
    let state = AppState {
        todos: TodoService::new(repo, Arc::new(storage)),
        token_verifier: Arc::new(token_verifier),
        client_config: config.client.map(Arc::new),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
