// src/api/handlers.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::errors::{AppError, AppResult};
use crate::app::AppState;
use crate::core::models::{
    DnsReport, FullReport, PortsReport, SensitiveFilesReport, SubdomainsReport, Target,
    TechnologiesReport, UrlsReport,
};
use crate::core::scanner::dns_scanner::run_dns_scan;
use crate::core::scanner::files_scanner::run_sensitive_files_scan;
use crate::core::scanner::fingerprint_scanner::run_fingerprint_scan;
use crate::core::scanner::port_scanner::run_port_scan;
use crate::core::scanner::run_full_scan;
use crate::core::scanner::subdomain_scanner::run_subdomain_scan;
use crate::core::scanner::url_scanner::run_url_scan;

/// Body of every scan endpoint.
#[derive(Debug, Deserialize)]
pub struct DomainRequest {
    pub domain: String,
}

impl DomainRequest {
    /// The domain is passed on verbatim; only blank input is refused.
    fn into_target(self) -> AppResult<Target> {
        if self.domain.trim().is_empty() {
            return Err(AppError::bad_request("domain must not be empty"));
        }
        Ok(Target::new(self.domain))
    }
}

fn target_from(payload: Result<Json<DomainRequest>, JsonRejection>) -> AppResult<Target> {
    let Json(request) = payload?;
    let target = request.into_target()?;
    info!(target = %target, "Scan requested.");
    Ok(target)
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn scan_subdomains(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<SubdomainsReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_subdomain_scan(state.scanner(), &target).await))
}

pub async fn scan_dns(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<DnsReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_dns_scan(state.scanner(), &target).await))
}

pub async fn scan_urls(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<UrlsReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_url_scan(state.scanner(), &target).await))
}

pub async fn scan_technologies(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<TechnologiesReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_fingerprint_scan(state.scanner(), &target).await))
}

pub async fn scan_ports(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<PortsReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_port_scan(state.scanner(), &target).await))
}

pub async fn scan_sensitive_files(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<SensitiveFilesReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_sensitive_files_scan(state.scanner(), &target).await))
}

pub async fn scan_full(
    State(state): State<AppState>,
    payload: Result<Json<DomainRequest>, JsonRejection>,
) -> AppResult<Json<FullReport>> {
    let target = target_from(payload)?;
    Ok(Json(run_full_scan(state.scanner(), &target).await))
}
