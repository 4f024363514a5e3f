use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod hydration;
mod metrics;
mod store;
mod utils;

use config::AppConfig;
use domain::{OrderSearch, Page};
use hydration::{OrderHydrator, Strategy};
use store::{InMemoryStore, PgStore, Store};
use utils::RetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, overridable with RUST_LOG
    // Example: RUST_LOG=shop_orders=trace cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shop_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order read-model service");

    let config = AppConfig::from_env()?;

    // === 1. Store ===
    let store: Arc<dyn Store> = match &config.database {
        Some(database) => {
            tracing::info!("Connecting to PostgreSQL...");
            Arc::new(PgStore::connect_with_retry(database, RetryConfig::default()).await?)
        }
        None => {
            tracing::info!("📦 DATABASE_URL not set, serving the in-memory demo dataset");
            Arc::new(InMemoryStore::demo())
        }
    };

    // === 2. Metrics + hydrator ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    let hydrator = OrderHydrator::new(store).with_metrics(metrics.clone());

    // === 3. Strategy comparison ===
    let page = Page::new(0, config.hydration.default_page_limit)?;
    compare_strategies(&hydrator, page).await;

    // === 4. HTTP ===
    let state = api::AppState {
        hydrator,
        settings: config.hydration.clone(),
    };
    api::start_server(&config.http, state, metrics).await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

/// Run every strategy over the first page of orders and log what each cost
async fn compare_strategies(hydrator: &OrderHydrator, page: Page) {
    tracing::info!(
        backend = hydrator.backend(),
        limit = page.limit,
        "📊 Comparing hydration strategies"
    );

    let search = OrderSearch::all();
    for strategy in Strategy::ALL {
        match hydrator.fetch_with_stats(&search, Some(page), strategy).await {
            Ok(hydrated) => tracing::info!(
                strategy = %strategy,
                orders = hydrated.summaries.len(),
                round_trips = hydrated.round_trips,
                "Strategy comparison"
            ),
            Err(e) => tracing::warn!(
                strategy = %strategy,
                error = %e,
                "Strategy comparison failed"
            ),
        }
    }
}
