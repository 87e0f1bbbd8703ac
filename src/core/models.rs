// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

// --- Target ---

/// The single domain a scan is pointed at.
///
/// The value is used verbatim to build probe addresses (`{label}.{domain}`,
/// `(domain, port)`, `{scheme}://{domain}/{path}`). Validation happens at the
/// request boundary, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    domain: String,
}

impl Target {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into() }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Root URL of the target for the given scheme, e.g. `https://example.com`.
    pub fn base_url(&self, scheme: &str) -> String {
        format!("{}://{}", scheme, self.domain)
    }

    /// Fully qualified name for a subdomain label, e.g. `www.example.com`.
    pub fn subdomain(&self, label: &str) -> String {
        format!("{}.{}", label, self.domain)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

// --- Probe Outcomes ---

/// Why a single probe did not produce a usable result.
///
/// `Cancelled` and `Panicked` are only ever produced by the orchestrator itself;
/// probe implementations classify their own errors into the other variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailure {
    #[error("probe timed out")]
    Timeout,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("connection error")]
    ConnectionError,
    #[error("response did not match")]
    NonMatchingResponse,
    #[error("name resolution failed")]
    ResolutionError,
    #[error("batch cancelled before the probe finished")]
    Cancelled,
    #[error("probe task panicked")]
    Panicked,
}

/// The tagged result of exactly one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ProbeOutcome<T> {
    Success(T),
    Failure(ProbeFailure),
}

impl<T> ProbeOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<ProbeFailure> {
        match self {
            ProbeOutcome::Success(_) => None,
            ProbeOutcome::Failure(reason) => Some(*reason),
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            ProbeOutcome::Success(value) => Some(value),
            ProbeOutcome::Failure(_) => None,
        }
    }
}

impl<T> From<Result<T, ProbeFailure>> for ProbeOutcome<T> {
    fn from(result: Result<T, ProbeFailure>) -> Self {
        match result {
            Ok(value) => ProbeOutcome::Success(value),
            Err(reason) => ProbeOutcome::Failure(reason),
        }
    }
}

// --- DNS Models ---

/// DNS record types queried by the DNS capability.
///
/// Variant order is the serialized key order of the `dns_records` map.
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
pub enum RecordKind {
    A,
    AAAA,
    MX,
    NS,
    TXT,
}

/// A subdomain label that resolved, with the addresses it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHost {
    pub hostname: String,
    pub addresses: Vec<String>,
}

// --- Port Models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
}

/// An open TCP port. Closed or filtered ports are never reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
    pub state: PortState,
}

// --- Sensitive File Models ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveFile {
    pub path: String,
    pub status: u16,
    pub url: String,
}

// --- Crawl Models ---

/// One discovered input of the target's web surface.
///
/// Query-string parameters carry an example value; form fields carry the
/// input type and the form's HTTP method instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    FormField {
        url: String,
        parameter: String,
        #[serde(rename = "type")]
        input_type: String,
        method: String,
    },
    Query {
        url: String,
        parameter: String,
        example_value: String,
    },
}

impl Parameter {
    pub fn url(&self) -> &str {
        match self {
            Parameter::Query { url, .. } | Parameter::FormField { url, .. } => url,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Parameter::Query { parameter, .. } | Parameter::FormField { parameter, .. } => parameter,
        }
    }
}

/// Everything the crawl extractor pulled out of a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExtract {
    pub urls: Vec<String>,
    pub parameters: Vec<Parameter>,
}

// --- Capability Reports ---
// Each report serializes to the JSON object returned by its endpoint.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainsReport {
    pub subdomains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsReport {
    pub dns_records: BTreeMap<RecordKind, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlsReport {
    pub urls: BTreeSet<String>,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologiesReport {
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortsReport {
    pub ports: Vec<OpenPort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveFilesReport {
    pub sensitive_files: Vec<SensitiveFile>,
}

// --- Full Report ---

/// All six capabilities combined; the fields flatten into one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullReport {
    #[serde(flatten)]
    pub subdomains: SubdomainsReport,
    #[serde(flatten)]
    pub dns: DnsReport,
    #[serde(flatten)]
    pub urls: UrlsReport,
    #[serde(flatten)]
    pub technologies: TechnologiesReport,
    #[serde(flatten)]
    pub ports: PortsReport,
    #[serde(flatten)]
    pub sensitive_files: SensitiveFilesReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn target_builds_probe_addresses_verbatim() {
        let target = Target::new("Example.COM");
        assert_eq!(target.subdomain("www"), "www.Example.COM");
        assert_eq!(target.base_url("https"), "https://Example.COM");
    }

    #[test]
    fn outcome_serializes_as_tagged_value() {
        let ok: ProbeOutcome<u16> = ProbeOutcome::Success(443);
        let failed: ProbeOutcome<u16> = ProbeOutcome::Failure(ProbeFailure::ConnectionRefused);
        assert_eq!(serde_json::to_value(ok).unwrap(), json!({"status": "success", "value": 443}));
        assert_eq!(
            serde_json::to_value(failed).unwrap(),
            json!({"status": "failure", "value": "connection_refused"})
        );
    }

    #[test]
    fn parameters_serialize_in_their_original_shapes() {
        let query = Parameter::Query {
            url: "https://ex.com/login?next=/home".into(),
            parameter: "next".into(),
            example_value: "/home".into(),
        };
        let field = Parameter::FormField {
            url: "https://ex.com/login".into(),
            parameter: "user".into(),
            input_type: "text".into(),
            method: "POST".into(),
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"url": "https://ex.com/login?next=/home", "parameter": "next", "example_value": "/home"})
        );
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"url": "https://ex.com/login", "parameter": "user", "type": "text", "method": "POST"})
        );
    }

    #[test]
    fn dns_report_keys_follow_record_order() {
        let mut report = DnsReport::default();
        report.dns_records.insert(RecordKind::TXT, vec![]);
        report.dns_records.insert(RecordKind::A, vec!["93.184.216.34".into()]);
        report.dns_records.insert(RecordKind::MX, vec![]);
        let text = serde_json::to_string(&report).unwrap();
        assert_eq!(text, r#"{"dns_records":{"A":["93.184.216.34"],"MX":[],"TXT":[]}}"#);
    }

    #[test]
    fn full_report_flattens_capability_keys() {
        let value = serde_json::to_value(FullReport::default()).unwrap();
        for key in ["subdomains", "dns_records", "urls", "parameters", "technologies", "ports", "sensitive_files"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }
}
