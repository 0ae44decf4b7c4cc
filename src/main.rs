use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod error;
mod metrics;
mod notifications;
mod store;
mod utils;

use config::Config;
use notifications::{LogMailer, NotificationActor};
use store::{CommerceStore, MemoryStore, PgStore, SeedData};
use utils::PayloadCipher;

const DB_MAX_CONNECTIONS: u32 = 10;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,corporate_orders=debug"))
        )
        .init();

    tracing::info!("🚀 Starting corporate orders service");

    let config = Config::load()?;

    // === 1. Storage ===
    let store: Arc<dyn CommerceStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to PostgreSQL...");
            Arc::new(PgStore::connect(url, DB_MAX_CONNECTIONS).await?)
        }
        None => {
            let seed = match &config.seed_path {
                Some(path) => {
                    tracing::info!(path = %path.display(), "Loading seed data");
                    SeedData::load(path)?
                }
                None => SeedData::default(),
            };
            tracing::warn!(
                accounts = seed.accounts.len(),
                products = seed.products.len(),
                "DATABASE_URL not set, using in-memory store"
            );
            Arc::new(MemoryStore::from_seed(seed))
        }
    };

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());
    let metrics_registry = Arc::new(metrics.registry().clone());

    // === 3. Notification actor (mailer behind a circuit breaker) ===
    let notifier = NotificationActor::new(Arc::new(LogMailer), config.mailer_breaker(), metrics.clone()).start();

    // === 4. Shared application state ===
    let cipher = config.payload_secret.as_deref().map(PayloadCipher::from_secret);
    if cipher.is_some() {
        tracing::info!("🔒 Sealed payloads enabled");
    }

    let state = web::Data::new(api::AppState::new(
        store,
        notifier,
        metrics,
        config.bulk_order_settings(),
        cipher,
        config.max_upload_bytes,
    ));

    // === 5. HTTP servers ===
    tracing::info!(
        host = %config.http_host,
        port = config.http_port,
        commit_mode = ?config.commit_mode,
        "Starting API server"
    );

    let api_server = HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind((config.http_host.as_str(), config.http_port))?
        .run();

    let metrics_server = metrics::start_metrics_server(metrics_registry, config.http_host.clone(), config.metrics_port);

    futures_util::future::try_join(api_server, metrics_server).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
