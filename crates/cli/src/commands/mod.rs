//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use fieldops_api::services::{AuthError, ShopError};

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, distributor, team_member")]
    InvalidRole(String),

    /// User creation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Shop creation failed.
    #[error("{0}")]
    Shop(#[from] ShopError),

    /// Seed file could not be read.
    #[error("Cannot read {0}: {1}")]
    SeedFile(String, std::io::Error),

    /// Seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    SeedFormat(#[from] serde_yaml::Error),
}

/// Connect to the database named by `FIELDOPS_DATABASE_URL` (or `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("FIELDOPS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("FIELDOPS_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(fieldops_api::db::create_pool(&database_url).await?)
}

/// The password for new users, from `FIELDOPS_NEW_USER_PASSWORD`.
///
/// Never taken from the command line so it stays out of shell history.
pub fn new_user_password() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("FIELDOPS_NEW_USER_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("FIELDOPS_NEW_USER_PASSWORD"))
}
