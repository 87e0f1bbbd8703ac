// src/core/scanner/dns_scanner.rs

use tracing::{debug, info, warn};

use crate::core::aggregator;
use crate::core::knowledge_base::dns_record_kinds;
use crate::core::models::{DnsReport, ProbeFailure, RecordKind, Target};
use crate::core::scanner::{ScanContext, transport};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::RecordType;

impl From<RecordKind> for RecordType {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::A => RecordType::A,
            RecordKind::AAAA => RecordType::AAAA,
            RecordKind::MX => RecordType::MX,
            RecordKind::NS => RecordType::NS,
            RecordKind::TXT => RecordType::TXT,
        }
    }
}

/// Queries the standard record types (A, AAAA, MX, NS, TXT) for the target.
///
/// Each record type is an independent probe. A failed lookup does not affect
/// the others; its type simply maps to an empty list in the report.
///
/// # Arguments
/// * `ctx` - The shared scan context.
/// * `target` - The domain name to be queried.
///
/// # Returns
/// A `DnsReport` with one entry per record type.
pub async fn run_dns_scan(ctx: &ScanContext, target: &Target) -> DnsReport {
    run_dns_scan_with(ctx, target, &dns_record_kinds()).await
}

/// Same as [`run_dns_scan`] for an explicit list of record types.
pub async fn run_dns_scan_with(ctx: &ScanContext, target: &Target, kinds: &[RecordKind]) -> DnsReport {
    info!(target = %target, "Starting DNS scan.");

    let resolver = ctx.resolver().clone();
    let domain = target.domain().to_string();
    let batch = ctx
        .orchestrator("dns", ctx.config().dns_timeout)
        .run(kinds.to_vec(), move |kind| {
            let resolver = resolver.clone();
            let domain = domain.clone();
            async move { lookup_records(&resolver, &domain, kind).await }
        })
        .await;

    debug!("All DNS lookups completed, building report.");
    let report = aggregator::dns_records(kinds, batch);
    let populated = report.dns_records.values().filter(|v| !v.is_empty()).count();
    info!(populated, "DNS scan finished.");
    report
}

/// Looks up one record type for `domain`.
/// A name with no records of this type is a successful, empty answer.
async fn lookup_records(
    resolver: &TokioAsyncResolver,
    domain: &str,
    kind: RecordKind,
) -> Result<Vec<String>, ProbeFailure> {
    debug!(domain, record = %kind, "Looking up records.");
    let query = transport::fully_qualified(domain);
    match resolver.lookup(query.as_str(), kind.into()).await {
        Ok(lookup) => {
            let records: Vec<String> = lookup
                .iter()
                .filter(|rdata| rdata.record_type() == RecordType::from(kind))
                .map(|rdata| rdata.to_string())
                .collect();
            debug!(domain, record = %kind, count = records.len(), "Records found.");
            Ok(records)
        }
        Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
            debug!(domain, record = %kind, "No records of this type.");
            Ok(Vec::new())
        }
        Err(e) => {
            warn!(domain, record = %kind, error = %e, "DNS lookup failed.");
            Err(ProbeFailure::ResolutionError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::test_support::local_context;

    #[test]
    fn record_kinds_map_to_wire_types() {
        assert_eq!(RecordType::from(RecordKind::AAAA), RecordType::AAAA);
        assert_eq!(RecordType::from(RecordKind::TXT), RecordType::TXT);
    }

    #[tokio::test]
    async fn unresolvable_domain_keeps_every_key_and_is_stable() {
        let ctx = local_context();
        let target = Target::new("vanguard-recon-test.invalid");

        let first = run_dns_scan(&ctx, &target).await;
        let second = run_dns_scan(&ctx, &target).await;

        assert_eq!(first.dns_records.len(), 5);
        assert!(first.dns_records.values().all(|values| values.is_empty()));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn requested_subset_is_reported_exactly() {
        let ctx = local_context();
        let target = Target::new("vanguard-recon-test.invalid");

        let report = run_dns_scan_with(&ctx, &target, &[RecordKind::A, RecordKind::MX]).await;
        let keys: Vec<RecordKind> = report.dns_records.keys().copied().collect();
        assert_eq!(keys, vec![RecordKind::A, RecordKind::MX]);
    }
}
