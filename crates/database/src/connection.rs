use crate::error::DbError;
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::env;
use std::path::Path;

/// Opens a connection to the SQLite file at `path`.
///
/// The file is created if it does not exist yet, so pointing this at a fresh
/// path and then querying yields an empty result rather than an I/O error.
pub async fn connect_to_database(path: impl AsRef<Path>) -> Result<SqliteConnection, DbError> {
    let path = path.as_ref();
    let conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await?;

    tracing::debug!(path = %path.display(), "Opened SQLite connection");
    Ok(conn)
}

/// Opens a connection to the database named by `DATABASE_URL`.
///
/// This reads the `.env` file if one is present, then falls back to the
/// process environment.
pub async fn connect_from_env() -> Result<SqliteConnection, DbError> {
    // A missing .env file is fine; the variable may already be exported.
    if let Err(e) = dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_e| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let conn = SqliteConnection::connect(&database_url).await?;
    tracing::debug!("Opened SQLite connection from DATABASE_URL");
    Ok(conn)
}
