//! CLI subcommands.

pub mod migrate;
pub mod orders;

use eglys_storefront::config::{ConfigError, StorefrontConfig};
use eglys_storefront::db::{self, RepositoryError};
use sqlx::PgPool;

/// Errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),
}

/// Connect to the database named by the environment.
async fn connect() -> Result<PgPool, CommandError> {
    let config = StorefrontConfig::from_env()?;
    let url = config.require_database_url()?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(url).await?)
}
