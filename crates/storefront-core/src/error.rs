//! Domain-level error types.

use thiserror::Error;

use crate::ports::{AuthError, CacheError};

/// Domain errors - business logic failures surfaced to the request boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not enough items in stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: i64,
        available: i64,
    },

    #[error("Total amount does not match: expected {expected}, got {actual}")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => DomainError::not_found("Record", "unknown"),
            RepoError::Constraint(msg) => DomainError::Conflict(msg),
            RepoError::Connection(msg) | RepoError::Query(msg) => DomainError::Internal(msg),
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::HashingError(msg) | AuthError::Signing(msg) => DomainError::Internal(msg),
            _ => DomainError::InvalidCredential,
        }
    }
}

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

/// Result alias used by the services.
pub type DomainResult<T> = Result<T, DomainError>;
