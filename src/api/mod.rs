// ============================================================================
// HTTP Adapter
// ============================================================================
//
// GET /api/orders         full order summaries, ?strategy= picks the strategy
// GET /api/simple-orders  order headers only
// GET /health
// GET /metrics
//
// Query parameters: memberName, status, offset, limit, strategy.
// Responses wrap the list as {"data": [...], "count": n}.
//
// ============================================================================

mod errors;
mod handlers;

use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use crate::config::HttpSettings;
use crate::metrics::{health_handler, metrics_handler, Metrics};

pub use errors::ApiError;
pub use handlers::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/orders", web::get().to(handlers::list_orders))
        .route("/api/simple-orders", web::get().to(handlers::list_simple_orders))
        .route("/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler));
}

pub async fn start_server(
    http: &HttpSettings,
    state: AppState,
    metrics: Arc<Metrics>,
) -> std::io::Result<()> {
    tracing::info!("🌐 Serving orders on http://{}:{}/api/orders", http.host, http.port);

    let state = web::Data::new(state);
    let metrics = web::Data::new(metrics);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(metrics.clone())
            .configure(configure)
    })
    .bind((http.host.as_str(), http.port))?
    .run()
    .await
}
