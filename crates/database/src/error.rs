use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("No database connection given.")]
    NoConnection,

    #[error("Database driver error: {0}")]
    DriverError(#[from] sqlx::Error),
}
