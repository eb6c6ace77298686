//! # Blog Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod session;
mod state;
mod telemetry;
mod views;

use config::AppConfig;
use session::SessionMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!("Starting Blog Server on {}:{}", config.host, config.port);

    let state = AppState::new(&config).await;
    let session_config = config.session.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(SessionMiddleware::new(
                state.sessions.clone(),
                session_config.clone(),
            ))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
