use thiserror::Error as TError;
#[derive(TError, Debug)]
pub enum DatabaseError {
    /// Connection, timeout, protocol errors
    #[error("Database connection error")]
    Connection(#[from] sqlx::Error),

    #[error("Database migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Pool lifecycle
    #[error("Database pool not initialized")]
    PoolNotInitialized,

    #[error("Database pool already initialized")]
    PoolAlreadyInitialized,

    // -------- Domain-level (safe to bubble up) --------
    /// Used internally; API should normalize response
    #[error("Database entity not found: {0}")]
    NotFound(anyhow::Error),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// A stored row could not be mapped back to its model
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}
