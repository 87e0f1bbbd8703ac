// src/core/scanner/subdomain_scanner.rs

use tracing::{debug, info};

use crate::core::aggregator;
use crate::core::knowledge_base::SUBDOMAIN_LABELS;
use crate::core::models::{ProbeFailure, ResolvedHost, SubdomainsReport, Target};
use crate::core::scanner::{ScanContext, transport};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::proto::rr::RecordType;

/// Enumerates common subdomains of the target by resolving their `A` records.
///
/// # Arguments
/// * `ctx` - The shared scan context.
/// * `target` - The parent domain (e.g., "example.com").
///
/// # Returns
/// The full hostnames that resolved, in wordlist order.
pub async fn run_subdomain_scan(ctx: &ScanContext, target: &Target) -> SubdomainsReport {
    run_subdomain_scan_with(ctx, target, SUBDOMAIN_LABELS).await
}

/// Same as [`run_subdomain_scan`] with a caller-provided label list.
pub async fn run_subdomain_scan_with(
    ctx: &ScanContext,
    target: &Target,
    labels: &[&'static str],
) -> SubdomainsReport {
    info!(target = %target, labels = labels.len(), "Starting subdomain scan.");

    let resolver = ctx.resolver().clone();
    let parent = target.clone();
    let batch = ctx
        .orchestrator("subdomains", ctx.config().dns_timeout)
        .run(labels.to_vec(), move |label| {
            let resolver = resolver.clone();
            let hostname = parent.subdomain(label);
            async move { resolve_host(&resolver, hostname).await }
        })
        .await;

    let report = aggregator::subdomains(batch);
    info!(found = %report.subdomains.len(), "Subdomain scan finished.");
    report
}

/// Resolves one hostname. Every kind of miss is a resolution error.
///
/// The query name is fully qualified, so a miss is never retried under the
/// host's search domains.
async fn resolve_host(resolver: &TokioAsyncResolver, hostname: String) -> Result<ResolvedHost, ProbeFailure> {
    let query = transport::fully_qualified(&hostname);
    match resolver.lookup(query.as_str(), RecordType::A).await {
        Ok(lookup) => {
            let addresses: Vec<String> = lookup
                .iter()
                .filter_map(|rdata| rdata.as_a())
                .map(|a| a.to_string())
                .collect();
            if addresses.is_empty() {
                debug!(hostname = %hostname, "Lookup returned no A records.");
                return Err(ProbeFailure::ResolutionError);
            }
            debug!(hostname = %hostname, count = addresses.len(), "Subdomain resolved.");
            Ok(ResolvedHost { hostname, addresses })
        }
        Err(e) => {
            debug!(hostname = %hostname, error = %e, "Subdomain did not resolve.");
            Err(ProbeFailure::ResolutionError)
        }
    }
}
