//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Name, email or password missing from a registration.
    #[error("Please enter all required fields")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] fieldops_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// User already exists.
    #[error("User already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No bearer token on a protected request.
    #[error("Not authorized, no token")]
    MissingToken,

    /// Bearer token malformed, badly signed, expired, or for a deleted user.
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be produced.
    #[error("token signing error: {0}")]
    TokenSigning(String),
}
