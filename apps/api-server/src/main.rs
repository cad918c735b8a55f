//! # Storefront API Server
//!
//! Actix-web HTTP server plus the broker drain loop.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use background::Scheduler;
use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Starting Storefront API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;

    let mut scheduler = Scheduler::new(config.scheduler.clone()).await?;
    if scheduler.is_enabled() {
        let broker = state.broker.clone();
        scheduler
            .add_repeated("broker-drain", config.broker.drain_interval, move || {
                let broker = broker.clone();
                async move {
                    broker.drain().await;
                }
            })
            .await?;
    }
    scheduler.start().await?;

    let server_state = state.clone();
    // Returns once SIGINT/SIGTERM has stopped the workers.
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(server_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .shutdown_timeout(30)
    .run()
    .await?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
    }

    let report = state.broker.drain().await;
    tracing::info!(
        messages = report.messages,
        failures = report.failures,
        "Final broker drain complete"
    );
    Ok(())
}
