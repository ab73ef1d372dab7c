/// Operational endpoints outside `/api`
use crate::metrics::serve_metrics;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use std::time::Instant;

/// Pings the store
pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION"),
            "latency_ms": start.elapsed().as_millis() as u64,
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "error": format!("document store unreachable: {}", e),
                "service": "blog-service"
            }))
        }
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_summary))
        .route("/health/live", web::get().to(liveness_check))
        .route("/metrics", web::get().to(serve_metrics));
}
