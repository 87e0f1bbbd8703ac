// src/core/scanner/port_scanner.rs

use tracing::{debug, info};

use crate::core::aggregator;
use crate::core::knowledge_base::{common_ports, service_name};
use crate::core::models::{OpenPort, PortState, PortsReport, ProbeFailure, Target};
use crate::core::scanner::ScanContext;
use crate::core::scanner::transport::classify_io_error;
use tokio::net::TcpStream;

/// TCP connect scan of the common-port list.
///
/// Only open ports are reported; refused, filtered and unreachable ports are
/// dropped by the aggregator.
pub async fn run_port_scan(ctx: &ScanContext, target: &Target) -> PortsReport {
    run_port_scan_with(ctx, target, &common_ports()).await
}

/// Same as [`run_port_scan`] for an explicit list of ports.
pub async fn run_port_scan_with(ctx: &ScanContext, target: &Target, ports: &[u16]) -> PortsReport {
    info!(target = %target, ports = ports.len(), "Starting port scan.");

    let host = target.domain().to_string();
    let batch = ctx
        .orchestrator("ports", ctx.config().port_timeout)
        .run(ports.to_vec(), move |port| probe_port(host.clone(), port))
        .await;

    let report = aggregator::open_ports(batch);
    info!(open = %report.ports.len(), "Port scan finished.");
    report
}

async fn probe_port(host: String, port: u16) -> Result<OpenPort, ProbeFailure> {
    match TcpStream::connect((host.as_str(), port)).await {
        Ok(_stream) => {
            debug!(port, "Port open.");
            Ok(OpenPort {
                port,
                service: service_name(port).to_string(),
                state: PortState::Open,
            })
        }
        Err(e) => {
            debug!(port, error = %e, "Port not reachable.");
            Err(classify_io_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::test_support::local_context;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn open_ports_are_reported_sorted() {
        let mut listeners = Vec::new();
        for _ in 0..3 {
            listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
        }
        let mut open: Vec<u16> = listeners.iter().map(|l| l.local_addr().unwrap().port()).collect();
        let closed = closed_port().await;

        // Probe in reverse so arrival order differs from port order.
        let mut probe_set = open.clone();
        probe_set.reverse();
        probe_set.push(closed);

        let ctx = local_context();
        let report = run_port_scan_with(&ctx, &Target::new("127.0.0.1"), &probe_set).await;

        open.sort_unstable();
        let found: Vec<u16> = report.ports.iter().map(|p| p.port).collect();
        assert_eq!(found, open);
        assert!(report.ports.iter().all(|p| p.state == PortState::Open));
    }

    #[tokio::test]
    async fn refused_connection_is_classified() {
        let port = closed_port().await;
        let failure = probe_port("127.0.0.1".to_string(), port).await.unwrap_err();
        assert_eq!(failure, ProbeFailure::ConnectionRefused);
    }

    #[tokio::test]
    async fn known_port_carries_its_service_name() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let open = probe_port("127.0.0.1".to_string(), port).await.unwrap();
        assert_eq!(open.service, service_name(port));
    }

    #[tokio::test]
    async fn unreachable_host_reports_no_ports() {
        let ctx = local_context();
        let report = run_port_scan(&ctx, &Target::new("vanguard-recon-test.invalid")).await;
        assert!(report.ports.is_empty());
    }
}
