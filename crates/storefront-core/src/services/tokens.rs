//! Token lifecycle: issue, verify, revoke and refresh bearer credentials.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{RefreshToken, RefreshTokenStatus};
use crate::error::{DomainError, DomainResult};
use crate::ports::{RefreshTokenRepository, SignedToken, TokenClaims, TokenKind, TokenService};
use crate::services::mask_email;

/// Access/refresh pair handed back to a client.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

/// Combines the stateless signer with the refresh token store.
///
/// Access tokens are only ever verified. Refresh tokens are additionally
/// persisted so they can be revoked before they expire.
pub struct TokenManager {
    signer: Arc<dyn TokenService>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl TokenManager {
    pub fn new(
        signer: Arc<dyn TokenService>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Self {
        Self {
            signer,
            refresh_tokens,
        }
    }

    pub fn issue_access_token(&self, subject: &str) -> DomainResult<SignedToken> {
        Ok(self.signer.sign(subject, TokenKind::Access)?)
    }

    /// Sign a refresh token and persist its record.
    pub async fn issue_refresh_token(&self, subject: &str) -> DomainResult<SignedToken> {
        let signed = self.signer.sign(subject, TokenKind::Refresh)?;
        self.refresh_tokens
            .insert(RefreshToken::new(
                subject.to_string(),
                signed.token.clone(),
                signed.expires_at,
            ))
            .await?;

        tracing::debug!(user = %mask_email(subject), "Refresh token stored");
        Ok(signed)
    }

    /// Issue a fresh access token and a new persisted refresh token.
    pub async fn issue_pair(&self, subject: &str) -> DomainResult<TokenPair> {
        let access = self.issue_access_token(subject)?;
        let refresh = self.issue_refresh_token(subject).await?;
        Ok(self.pair(access, refresh.token))
    }

    /// Any signature, format, issuer or expiry failure is `InvalidCredential`.
    pub fn verify_token(&self, token: &str) -> DomainResult<TokenClaims> {
        self.signer.validate_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            DomainError::InvalidCredential
        })
    }

    /// Verify a token and require it to be an access token. Returns the subject.
    pub fn verify_access_token(&self, token: &str) -> DomainResult<String> {
        let claims = self.verify_token(token)?;
        if claims.kind != TokenKind::Access {
            tracing::debug!("Refresh token presented as access token");
            return Err(DomainError::InvalidCredential);
        }
        Ok(claims.subject)
    }

    /// Flag the subject's stored refresh tokens as revoked.
    ///
    /// Access tokens already handed out keep verifying until they expire.
    pub async fn revoke_refresh_token(&self, subject: &str) -> DomainResult<u64> {
        let revoked = self.refresh_tokens.revoke_all(subject).await?;
        tracing::info!(user = %mask_email(subject), revoked, "Refresh tokens revoked");
        Ok(revoked)
    }

    pub async fn refresh_token_status(&self, subject: &str) -> DomainResult<RefreshTokenStatus> {
        Ok(self.stored_refresh_token(subject).await?.status())
    }

    /// New access token for `subject`, reusing the stored refresh token value.
    pub async fn refresh(&self, subject: &str) -> DomainResult<TokenPair> {
        let stored = self.stored_refresh_token(subject).await?;
        match stored.status() {
            RefreshTokenStatus::Active => {}
            status => {
                tracing::info!(user = %mask_email(subject), ?status, "Refresh refused");
                return Err(DomainError::InvalidCredential);
            }
        }

        let access = self.issue_access_token(subject)?;
        Ok(self.pair(access, stored.token))
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.signer.ttl(TokenKind::Access).num_seconds()
    }

    async fn stored_refresh_token(&self, subject: &str) -> DomainResult<RefreshToken> {
        self.refresh_tokens
            .find_latest(subject)
            .await?
            .ok_or_else(|| DomainError::not_found("Refresh token", subject))
    }

    fn pair(&self, access: SignedToken, refresh_token: String) -> TokenPair {
        TokenPair {
            access_token: access.token,
            refresh_token,
            token_type: "bearer",
            expires_in: self.access_ttl_seconds(),
        }
    }
}
