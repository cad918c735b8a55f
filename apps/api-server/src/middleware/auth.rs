//! Bearer authentication extractor.

use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use storefront_core::DomainError;
use storefront_core::domain::User;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// The active user behind the request's access token.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(user: BearerUser) -> impl Responder {
///     format!("Hello, {}!", user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerUser(pub User);

impl Deref for BearerUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AppError::MissingAuth)?
        .to_str()
        .map_err(|_| AppError::MissingAuth)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(AppError::MissingAuth),
    }
}

impl FromRequest for BearerUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                tracing::error!("AppState not found in app data");
                AppError::Domain(DomainError::Internal("Server configuration error".to_string()))
            })?;
            let user = state.accounts.authenticate(&token?).await?;
            Ok(BearerUser(user))
        })
    }
}
