//! Authentication ports: token signing and password hashing.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Which flow a bearer credential was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Email of the user the token was issued to.
    pub subject: String,
    pub kind: TokenKind,
    pub issued_at: i64,
    pub exp: i64,
}

/// A freshly signed token and the instant it stops verifying.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies self-contained bearer credentials.
///
/// Implementations are stateless: nothing here touches storage.
pub trait TokenService: Send + Sync {
    /// Sign a token for `subject`, expiring after [`TokenService::ttl`] for `kind`.
    fn sign(&self, subject: &str, kind: TokenKind) -> Result<SignedToken, AuthError>;

    /// Check signature, algorithm, issuer and expiry, and decode the claims.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of tokens of the given kind.
    fn ttl(&self, kind: TokenKind) -> TimeDelta;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}
