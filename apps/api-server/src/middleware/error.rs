//! Error handling - RFC 7807 compliant responses.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use storefront_core::DomainError;
use storefront_shared::ErrorResponse;

/// Handler error wrapping a domain failure or a malformed request.
#[derive(Debug)]
pub enum AppError {
    Domain(DomainError),
    /// Request that cannot be mapped onto a domain call (unknown role name, bad sort key).
    BadInput(String),
    MissingAuth,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Domain(err) => write!(f, "{}", err),
            AppError::BadInput(msg) => write!(f, "Bad input: {}", msg),
            AppError::MissingAuth => write!(f, "Missing bearer token"),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::Domain(err)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(err) => match err {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::InvalidCredential => StatusCode::UNAUTHORIZED,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::InsufficientStock { .. } | DomainError::AmountMismatch { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingAuth => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::Domain(DomainError::Internal(detail)) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Domain(DomainError::InvalidCredential) => {
                ErrorResponse::unauthorized("Could not validate credentials")
            }
            AppError::Domain(err) => {
                let status = self.status_code();
                ErrorResponse::new(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Error"),
                )
                .with_detail(err.to_string())
            }
            AppError::BadInput(detail) => ErrorResponse::unprocessable(detail),
            AppError::MissingAuth => ErrorResponse::unauthorized(
                "Please provide a valid Bearer token in the Authorization header.",
            ),
        };

        let mut response = HttpResponse::build(self.status_code());
        if self.status_code() == StatusCode::UNAUTHORIZED {
            response.insert_header(("WWW-Authenticate", "Bearer"));
        }
        response.json(error)
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: DomainError) -> u16 {
        AppError::from(err).status_code().as_u16()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(status(DomainError::not_found("User", "a@x.com")), 404);
        assert_eq!(status(DomainError::Forbidden("no".into())), 403);
        assert_eq!(status(DomainError::InvalidCredential), 401);
        assert_eq!(status(DomainError::Conflict("dup".into())), 409);
        assert_eq!(status(DomainError::Validation("bad".into())), 422);
        assert_eq!(
            status(DomainError::InsufficientStock {
                item: "Laptop".into(),
                requested: 3,
                available: 1,
            }),
            400
        );
        assert_eq!(
            status(DomainError::AmountMismatch {
                expected: 10,
                actual: 9,
            }),
            400
        );
        assert_eq!(status(DomainError::Internal("db down".into())), 500);
    }

    #[actix_web::test]
    async fn test_internal_error_body_is_generic() {
        let response = AppError::from(DomainError::Internal("password=hunter2".into()))
            .error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("Internal Server Error"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = AppError::MissingAuth.error_response();
        assert_eq!(response.headers().get("WWW-Authenticate").unwrap(), "Bearer");
    }
}
