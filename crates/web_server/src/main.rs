//! Main entry point for the campsite availability server.
//! This crate wires the availability engine to its REST API endpoints.

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use availability_engine::{AvailabilityEngine, EngineConfig};
use web_handlers::*;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting campsite availability server...");

    let config = EngineConfig::from_env();
    if config.ridb_api_key.is_none() {
        log::warn!("🔑 RECREATION_GOV_API_KEY not set, RIDB requests may be rejected");
    }
    log::info!(
        "🔧 Detail fetch cap {}, request timeout {}s",
        config.detail_fetch_cap,
        config.request_timeout.as_secs()
    );

    let engine = AvailabilityEngine::with_rec_gov(config)
        .context("failed to build recreation.gov client")?;
    let engine = web::Data::new(engine);

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    log::info!("🌐 Server will be available at: http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .wrap(Logger::default())
            .service(web::scope("/api").route(
                "/availability/{campground_id}",
                web::get().to(get_availability),
            ))
            .route("/health", web::get().to(health))
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run()
    .await
    .context("server error")
}
