// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares the per-capability scanners and the context they share.
pub mod dns_scanner;
pub mod files_scanner;
pub mod fingerprint_scanner;
pub mod port_scanner;
pub mod subdomain_scanner;
pub mod transport;
pub mod url_scanner;

use crate::config::ScanConfig;
use crate::core::models::{FullReport, Target};
use crate::core::orchestrator::Orchestrator;
use crate::errors::ScanError;
use hickory_resolver::TokioAsyncResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use self::dns_scanner::run_dns_scan;
use self::files_scanner::run_sensitive_files_scan;
use self::fingerprint_scanner::run_fingerprint_scan;
use self::port_scanner::run_port_scan;
use self::subdomain_scanner::run_subdomain_scan;
use self::url_scanner::run_url_scan;

/// Everything a capability needs to run: configuration, the shared HTTP
/// connection pool, the shared resolver and the process shutdown token.
///
/// Cloning is cheap; the client and resolver are reference counted internally.
#[derive(Clone)]
pub struct ScanContext {
    config: Arc<ScanConfig>,
    http: reqwest::Client,
    resolver: TokioAsyncResolver,
    shutdown: CancellationToken,
}

impl ScanContext {
    /// Builds the shared HTTP client and DNS resolver.
    ///
    /// # Errors
    /// Returns `ScanError::HttpClient` if the TLS backend cannot be initialised.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let http = transport::build_http_client(&config)?;
        let resolver = transport::build_resolver(&config);
        Ok(Self {
            config: Arc::new(config),
            http,
            resolver,
            shutdown: CancellationToken::new(),
        })
    }

    /// Cancelling `shutdown` makes every running batch return its partial result.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn resolver(&self) -> &TokioAsyncResolver {
        &self.resolver
    }

    /// A fresh orchestrator for one batch, bound to the shutdown token.
    pub fn orchestrator(&self, label: &'static str, per_probe_timeout: Duration) -> Orchestrator {
        Orchestrator::new(label, per_probe_timeout, self.config.max_concurrency)
            .with_cancellation(self.shutdown.child_token())
    }
}

/// Executes all six capabilities in parallel and combines their reports.
///
/// Each capability still runs its own bounded batch; `tokio::join!` only
/// overlaps the batches. Like every capability, this never fails: unreachable
/// targets produce empty sections.
///
/// # Arguments
///
/// * `ctx` - The shared scan context.
/// * `target` - The domain to be scanned (e.g., "example.com").
pub async fn run_full_scan(ctx: &ScanContext, target: &Target) -> FullReport {
    info!(target = %target, "Starting full scan.");

    let (subdomains, dns, urls, technologies, ports, sensitive_files) = tokio::join!(
        run_subdomain_scan(ctx, target),
        run_dns_scan(ctx, target),
        run_url_scan(ctx, target),
        run_fingerprint_scan(ctx, target),
        run_port_scan(ctx, target),
        run_sensitive_files_scan(ctx, target)
    );

    info!(target = %target, "Full scan finished.");
    FullReport {
        subdomains,
        dns,
        urls,
        technologies,
        ports,
        sensitive_files,
    }
}
