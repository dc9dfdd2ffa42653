//! Utility functions.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::error::{Result, ServiceError};
use crate::repository::{InMemoryTodoRepository, PgTodoRepository, TodoRepository};

/// Build the repository selected by the configuration.
pub async fn build_repository(config: &Config) -> Result<Arc<dyn TodoRepository>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory todo storage");
            Ok(Arc::new(InMemoryTodoRepository::new()))
        }
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                ServiceError::InvalidConfig("DATABASE_URL is required".to_string())
            })?;
            let repository = PgTodoRepository::connect(url, config.database_max_connections).await?;
            Ok(Arc::new(repository))
        }
    }
}

/// Resolve when the process receives Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
