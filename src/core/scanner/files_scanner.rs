// src/core/scanner/files_scanner.rs

use tracing::{debug, info};

use crate::core::aggregator;
use crate::core::knowledge_base::SENSITIVE_PATHS;
use crate::core::models::{ProbeFailure, SensitiveFile, SensitiveFilesReport, Target};
use crate::core::scanner::{ScanContext, transport};

/// Checks whether commonly exposed files and directories are reachable.
///
/// A path counts as found when the (post-redirect) status is below 400, so
/// redirects to a login page and auth challenges are reported too.
///
/// # Arguments
/// * `ctx` - The shared scan context.
/// * `target` - The domain whose web root is probed.
///
/// # Returns
/// The reachable paths, in the order their probes completed.
pub async fn run_sensitive_files_scan(ctx: &ScanContext, target: &Target) -> SensitiveFilesReport {
    run_sensitive_files_scan_with(ctx, target, SENSITIVE_PATHS).await
}

/// Same as [`run_sensitive_files_scan`] for an explicit list of paths.
pub async fn run_sensitive_files_scan_with(
    ctx: &ScanContext,
    target: &Target,
    paths: &[&'static str],
) -> SensitiveFilesReport {
    info!(target = %target, paths = paths.len(), "Starting sensitive files scan.");

    let client = ctx.http().clone();
    let base_url = target.base_url(&ctx.config().http_scheme);
    let batch = ctx
        .orchestrator("sensitive-files", ctx.config().http_timeout)
        .run(paths.to_vec(), move |path| {
            let client = client.clone();
            let url = format!("{}/{}", base_url, path);
            async move { probe_path(&client, path, url).await }
        })
        .await;

    let report = aggregator::sensitive_files(batch);
    info!(found = %report.sensitive_files.len(), "Sensitive files scan finished.");
    report
}

async fn probe_path(client: &reqwest::Client, path: &str, url: String) -> Result<SensitiveFile, ProbeFailure> {
    let response = transport::get(client, &url).await?;
    let status = response.status().as_u16();
    if status < 400 {
        debug!(path, status, "Sensitive path reachable.");
        Ok(SensitiveFile {
            path: path.to_string(),
            status,
            url,
        })
    } else {
        Err(ProbeFailure::NonMatchingResponse)
    }
}
