//! Static, read-only probe sets for every capability.
//! Each capability enumerates its parameters from here, so extending a scan is a
//! matter of editing a table rather than touching probe logic.

use crate::core::models::RecordKind;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use strum::IntoEnumIterator;
use tracing::error;

/// Subdomain labels tried against the target, in reporting order.
pub static SUBDOMAIN_LABELS: &[&str] = &["www", "mail", "ftp", "admin", "blog", "dev", "api"];

/// Paths that commonly leak configuration, source or directory listings.
pub static SENSITIVE_PATHS: &[&str] = &[
    ".git/config",
    ".env",
    "robots.txt",
    "sitemap.xml",
    "wp-config.php",
    "config.php",
    "admin/",
    "backup/",
    ".htaccess",
    "phpinfo.php",
];

/// A well-known TCP port and the service conventionally bound to it.
pub struct PortService {
    pub port: u16,
    /// IANA service name, as listed in `/etc/services`.
    pub service: &'static str,
}

/// The common-port probe set.
static COMMON_PORTS: &[PortService] = &[
    PortService { port: 21, service: "ftp" },
    PortService { port: 22, service: "ssh" },
    PortService { port: 23, service: "telnet" },
    PortService { port: 25, service: "smtp" },
    PortService { port: 53, service: "domain" },
    PortService { port: 80, service: "http" },
    PortService { port: 110, service: "pop3" },
    PortService { port: 143, service: "imap" },
    PortService { port: 443, service: "https" },
    PortService { port: 465, service: "submissions" },
    PortService { port: 587, service: "submission" },
    PortService { port: 993, service: "imaps" },
    PortService { port: 995, service: "pop3s" },
    PortService { port: 3306, service: "mysql" },
    PortService { port: 3389, service: "ms-wbt-server" },
    PortService { port: 5432, service: "postgresql" },
    PortService { port: 8080, service: "http-alt" },
];

/// Service name reported for ports missing from the table.
pub const UNKNOWN_SERVICE: &str = "unknown";

pub fn common_ports() -> Vec<u16> {
    COMMON_PORTS.iter().map(|p| p.port).collect()
}

/// Best guess at the service listening on `port`.
pub fn service_name(port: u16) -> &'static str {
    COMMON_PORTS
        .iter()
        .find(|p| p.port == port)
        .map(|p| p.service)
        .unwrap_or(UNKNOWN_SERVICE)
}

/// Every record type the DNS capability asks for, in reporting order.
pub fn dns_record_kinds() -> Vec<RecordKind> {
    RecordKind::iter().collect()
}

/// A technology and the literal text whose presence in a page body reveals it.
pub struct TechSignature {
    pub name: &'static str,
    pub needle: &'static str,
}

/// Body signatures, checked in this order; every hit is reported.
pub static TECH_SIGNATURES: &[TechSignature] = &[
    TechSignature { name: "React", needle: "react" },
    TechSignature { name: "Angular", needle: "angular" },
    TechSignature { name: "Vue.js", needle: "vue" },
    TechSignature { name: "jQuery", needle: "jquery" },
    TechSignature { name: "Bootstrap", needle: "bootstrap" },
    TechSignature { name: "WordPress", needle: "wp-content" },
    TechSignature { name: "PHP", needle: "php" },
    TechSignature { name: "ASP.NET", needle: "asp.net" },
    TechSignature { name: "nginx", needle: "nginx" },
    TechSignature { name: "Apache", needle: "apache" },
];

/// Case-insensitive literal matchers compiled once from [`TECH_SIGNATURES`].
static SIGNATURE_MATCHERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    TECH_SIGNATURES
        .iter()
        .filter_map(|sig| {
            match RegexBuilder::new(&regex::escape(sig.needle))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Some((sig.name, re)),
                Err(e) => {
                    error!(tech = sig.name, error = %e, "Invalid technology signature skipped.");
                    None
                }
            }
        })
        .collect()
});

/// Names of every signature found in `body`, in table order.
pub fn match_signatures(body: &str) -> Vec<&'static str> {
    SIGNATURE_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(body))
        .map(|(name, _)| *name)
        .collect()
}
