//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use storefront_core::ports::{AuthError, SignedToken, TokenClaims, TokenKind, TokenService};

const DEV_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// One of the HMAC algorithms (HS256, HS384, HS512).
    pub algorithm: Algorithm,
    pub issuer: String,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            algorithm: Algorithm::HS256,
            issuer: "storefront-api".to_string(),
            access_ttl: TimeDelta::minutes(30),
            refresh_ttl: TimeDelta::days(7),
        }
    }
}

impl JwtConfig {
    /// Load configuration from environment variables.
    ///
    /// A missing `JWT_SECRET` is fatal when `RUST_ENV` is `production`/`prod`,
    /// and falls back to a development secret otherwise.
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();

        let is_production = std::env::var("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if is_production => {
                tracing::error!("SECURITY: JWT_SECRET is not set in production");
                return Err(AuthError::Signing("JWT_SECRET must be set".to_string()));
            }
            _ => {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
                defaults.secret
            }
        };

        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(name) => parse_hmac_algorithm(&name)?,
            Err(_) => defaults.algorithm,
        };

        Ok(Self {
            secret,
            algorithm,
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            access_ttl: ttl_from_env("ACCESS_TOKEN_TTL_MINUTES", TimeDelta::try_minutes)?
                .unwrap_or(defaults.access_ttl),
            refresh_ttl: ttl_from_env("REFRESH_TOKEN_TTL_DAYS", TimeDelta::try_days)?
                .unwrap_or(defaults.refresh_ttl),
        })
    }
}

fn ttl_from_env(
    var: &str,
    unit: fn(i64) -> Option<TimeDelta>,
) -> Result<Option<TimeDelta>, AuthError> {
    match std::env::var(var).ok().and_then(|s| s.parse().ok()) {
        Some(amount) => parse_ttl(var, amount, unit).map(Some),
        None => Ok(None),
    }
}

fn parse_ttl(
    var: &str,
    amount: i64,
    unit: fn(i64) -> Option<TimeDelta>,
) -> Result<TimeDelta, AuthError> {
    unit(amount).ok_or_else(|| AuthError::Signing(format!("{} is out of range: {}", var, amount)))
}

fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, AuthError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::Signing(format!(
            "Unsupported JWT algorithm: {}",
            other
        ))),
    }
}

/// Internal JWT claims structure for serialization.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user email
    typ: TokenKind,
    exp: i64,    // expiration timestamp
    iat: i64,    // issued at
    iss: String, // issuer
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self::new(JwtConfig::from_env()?))
    }
}

impl TokenService for JwtTokenService {
    fn sign(&self, subject: &str, kind: TokenKind) -> Result<SignedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl(kind);

        let claims = Claims {
            sub: subject.to_string(),
            typ: kind,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(SignedToken { token, expires_at })
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(TokenClaims {
            subject: token_data.claims.sub,
            kind: token_data.claims.typ,
            issued_at: token_data.claims.iat,
            exp: token_data.claims.exp,
        })
    }

    fn ttl(&self, kind: TokenKind) -> TimeDelta {
        match kind {
            TokenKind::Access => self.config.access_ttl,
            TokenKind::Refresh => self.config.refresh_ttl,
        }
    }
}
