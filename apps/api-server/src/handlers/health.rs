//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub database: &'static str,
    /// Messages waiting for the next drain.
    pub queued_messages: usize,
    pub logins_succeeded: u64,
}

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = database_status(&state).await;

    let response = HealthResponse {
        status: if database == "down" { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
        queued_messages: state.broker.pending().await,
        logins_succeeded: state.login_metrics.succeeded(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(feature = "postgres")]
async fn database_status(state: &AppState) -> &'static str {
    match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => "up",
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                "down"
            }
        },
        None => "in-memory",
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_status(_state: &AppState) -> &'static str {
    "in-memory"
}
