//! # Murmur API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[cfg(feature = "rate-limit")]
use middleware::rate_limit::RateLimitMiddleware;
#[cfg(feature = "rate-limit")]
use murmur_infra::InMemoryRateLimiter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Starting Murmur API Server");

    let state = AppState::new(&config).await;

    #[cfg(feature = "rate-limit")]
    let limiter = std::sync::Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()));

    #[cfg(feature = "scheduler")]
    let scheduler = {
        let maintenance = background::Maintenance {
            live: state.live.clone(),
            jobs: state.jobs.clone(),
            #[cfg(feature = "rate-limit")]
            limiter: limiter.clone(),
        };
        match background::start(maintenance).await {
            Ok(scheduler) => Some(scheduler),
            Err(e) => {
                tracing::error!(error = %e, "Maintenance scheduler unavailable");
                None
            }
        }
    };

    let server_state = state.clone();
    HttpServer::new(move || {
        let app = App::new();
        #[cfg(feature = "rate-limit")]
        let app = app.wrap(RateLimitMiddleware::new(limiter.clone()));
        app.wrap(TracingLogger::default())
            .app_data(web::Data::new(server_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not stop cleanly");
        }
    }

    tracing::info!(live_users = state.live.users(), "Server stopped");
    Ok(())
}
