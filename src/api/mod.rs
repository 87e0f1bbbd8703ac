// src/api/mod.rs

// The HTTP surface: one POST endpoint per capability, each taking
// `{"domain": "..."}` and answering with that capability's report.

pub mod errors;
pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/scan/subdomains", post(handlers::scan_subdomains))
        .route("/scan/dns", post(handlers::scan_dns))
        .route("/scan/urls", post(handlers::scan_urls))
        .route("/scan/technologies", post(handlers::scan_technologies))
        .route("/scan/ports", post(handlers::scan_ports))
        .route("/scan/sensitive-files", post(handlers::scan_sensitive_files))
        .route("/scan/full", post(handlers::scan_full))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
