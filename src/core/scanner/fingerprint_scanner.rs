// src/core/scanner/fingerprint_scanner.rs

use tracing::{debug, info};

use crate::core::aggregator;
use crate::core::knowledge_base::match_signatures;
use crate::core::models::{ProbeFailure, Target, TechnologiesReport};
use crate::core::scanner::{ScanContext, transport};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, SERVER};

/// Runs a technology fingerprinting scan against the target.
///
/// It sends one HTTP GET request to the target root. On a 200 response, the
/// `Server` header (if any) is reported as `"Server: <value>"`, followed by
/// every body signature that matches, in signature-table order. Repeated
/// detections of the same technology are kept.
///
/// # Arguments
/// * `ctx` - The shared scan context.
/// * `target` - The domain to fingerprint.
///
/// # Returns
/// A `TechnologiesReport`; empty when the root page is unreachable or not a 200.
pub async fn run_fingerprint_scan(ctx: &ScanContext, target: &Target) -> TechnologiesReport {
    info!(target = %target, "Starting fingerprint scan.");

    let client = ctx.http().clone();
    let root = target.base_url(&ctx.config().http_scheme);
    let batch = ctx
        .orchestrator("technologies", ctx.config().http_timeout)
        .run(vec![root], move |url| {
            let client = client.clone();
            async move { fingerprint_page(&client, url).await }
        })
        .await;

    let report = aggregator::technologies(batch);
    info!(count = %report.technologies.len(), "Fingerprint scan finished.");
    report
}

async fn fingerprint_page(client: &reqwest::Client, url: String) -> Result<Vec<String>, ProbeFailure> {
    let response = transport::get(client, &url).await?;
    if response.status() != StatusCode::OK {
        return Err(ProbeFailure::NonMatchingResponse);
    }

    let mut technologies = Vec::new();
    if let Some(server) = server_header(response.headers()) {
        debug!(server = %server, "Server header found.");
        technologies.push(format!("Server: {}", server));
    }

    let body = transport::read_body(response).await?;
    debug!(bytes = %body.len(), "Applying body signatures.");
    technologies.extend(match_signatures(&body).into_iter().map(String::from));
    Ok(technologies)
}

/// The `Server` header value, if present and non-empty. Non-UTF-8 values are
/// decoded lossily rather than dropped.
fn server_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(SERVER)?;
    let text = match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    (!text.is_empty()).then_some(text)
}
