// src/core/scanner/url_scanner.rs

use tracing::{debug, info};

use crate::core::aggregator;
use crate::core::crawl::extract_page;
use crate::core::models::{PageExtract, ProbeFailure, Target, UrlsReport};
use crate::core::scanner::{ScanContext, transport};
use reqwest::StatusCode;

/// Collects in-scope URLs and input parameters from the target's root page.
///
/// Only the root page is fetched; discovered links are reported, not followed.
pub async fn run_url_scan(ctx: &ScanContext, target: &Target) -> UrlsReport {
    info!(target = %target, "Starting URL scan.");

    let client = ctx.http().clone();
    let domain = target.domain().to_string();
    let root = target.base_url(&ctx.config().http_scheme);
    let batch = ctx
        .orchestrator("urls", ctx.config().http_timeout)
        .run(vec![root], move |url| {
            let client = client.clone();
            let domain = domain.clone();
            async move { fetch_and_extract(&client, url, &domain).await }
        })
        .await;

    let report = aggregator::crawl(batch);
    info!(
        urls = %report.urls.len(),
        parameters = %report.parameters.len(),
        "URL scan finished."
    );
    report
}

/// Fetches one page and runs the extractor over it. Anything but a 200 yields
/// no extraction at all.
async fn fetch_and_extract(
    client: &reqwest::Client,
    url: String,
    domain: &str,
) -> Result<PageExtract, ProbeFailure> {
    let response = transport::get(client, &url).await?;
    if response.status() != StatusCode::OK {
        debug!(url = %url, status = %response.status(), "Skipping extraction for non-200 page.");
        return Err(ProbeFailure::NonMatchingResponse);
    }
    let body = transport::read_body(response).await?;
    Ok(extract_page(&body, &url, domain))
}
