// src/core/aggregator.rs

//! Per-capability reduction of a finished batch into its report shape.
//!
//! Failures are dropped here; what survives is put into the capability's
//! canonical order.

use crate::core::models::{
    DnsReport, OpenPort, PageExtract, PortsReport, RecordKind, ResolvedHost, SensitiveFile,
    SensitiveFilesReport, SubdomainsReport, TechnologiesReport, UrlsReport,
};
use crate::core::orchestrator::{BatchResult, ProbeRecord};

/// Successful payloads, reordered to match the probe set.
fn successes_in_probe_order<P, T>(batch: BatchResult<P, T>) -> Vec<T> {
    let mut records: Vec<ProbeRecord<P, T>> = batch.into_records();
    records.sort_by_key(|r| r.index);
    records.into_iter().filter_map(|r| r.outcome.into_success()).collect()
}

/// Successful payloads in the order the probes completed.
fn successes_in_arrival_order<P, T>(batch: BatchResult<P, T>) -> Vec<T> {
    batch
        .into_records()
        .into_iter()
        .filter_map(|r| r.outcome.into_success())
        .collect()
}

/// Resolved hostnames, in probe-set order.
pub fn subdomains<P>(batch: BatchResult<P, ResolvedHost>) -> SubdomainsReport {
    SubdomainsReport {
        subdomains: successes_in_probe_order(batch)
            .into_iter()
            .map(|host| host.hostname)
            .collect(),
    }
}

/// Record values keyed by type. Every requested type is present, with an empty
/// list when its lookup failed or returned nothing.
pub fn dns_records(requested: &[RecordKind], batch: BatchResult<RecordKind, Vec<String>>) -> DnsReport {
    let mut report = DnsReport::default();
    for kind in requested {
        report.dns_records.entry(*kind).or_default();
    }
    for record in batch.into_records() {
        if let Some(values) = record.outcome.into_success() {
            report.dns_records.entry(record.parameter).or_default().extend(values);
        }
    }
    report
}

/// Open ports sorted ascending by port number.
pub fn open_ports<P>(batch: BatchResult<P, OpenPort>) -> PortsReport {
    let mut ports = successes_in_arrival_order(batch);
    ports.sort_by_key(|p| p.port);
    PortsReport { ports }
}

/// Reachable paths in arrival order.
pub fn sensitive_files<P>(batch: BatchResult<P, SensitiveFile>) -> SensitiveFilesReport {
    SensitiveFilesReport {
        sensitive_files: successes_in_arrival_order(batch),
    }
}

/// Deduplicated URLs plus every parameter in extraction order.
pub fn crawl<P>(batch: BatchResult<P, PageExtract>) -> UrlsReport {
    let mut report = UrlsReport::default();
    for page in successes_in_probe_order(batch) {
        report.urls.extend(page.urls);
        report.parameters.extend(page.parameters);
    }
    report
}

/// Technology names in detection order, duplicates kept.
pub fn technologies<P>(batch: BatchResult<P, Vec<String>>) -> TechnologiesReport {
    TechnologiesReport {
        technologies: successes_in_probe_order(batch).into_iter().flatten().collect(),
    }
}
