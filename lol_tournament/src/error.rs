//! Error types for the store and service layers.

use std::fmt;
use std::time::Duration;

use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::models::TournamentId;

/// Errors raised by the entity store
#[derive(Debug, Error)]
pub enum DbError {
    /// A unique constraint (team or tournament name) was violated
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key constraint was violated (missing parent or restricted delete)
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// Operation timed out
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Any other database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => return DbError::UniqueViolation { constraint },
                ErrorKind::ForeignKeyViolation => {
                    return DbError::ForeignKeyViolation { constraint };
                }
                _ => {}
            }
        }
        DbError::Database(err)
    }
}

/// Result type for store operations
pub type DbResult<T> = Result<T, DbError>;

/// Entity kinds, used to label not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Team,
    Tournament,
    Match,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Team => write!(f, "Team"),
            EntityKind::Tournament => write!(f, "Tournament"),
            EntityKind::Match => write!(f, "Match"),
        }
    }
}

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input, or path/body id mismatch
    #[error("{0}")]
    Invalid(String),

    /// Referenced entity does not exist
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: EntityKind, id: i32 },

    /// Tournament has no winner yet
    #[error("No winner has been determined yet for tournament {0}")]
    NoWinner(TournamentId),

    /// Duplicate unique field, or entity still referenced
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store failure
    #[error(transparent)]
    Store(#[from] DbError),
}

impl ServiceError {
    /// Shorthand for a not-found error
    pub fn not_found(entity: EntityKind, id: i32) -> Self {
        ServiceError::NotFound { entity, id }
    }

    /// Get a client-safe error message that doesn't leak database details
    pub fn client_message(&self) -> String {
        match self {
            ServiceError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
