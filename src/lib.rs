// src/lib.rs

//! Single-target reconnaissance: subdomains, DNS records, open ports,
//! reachable sensitive files, crawled URLs/parameters and technologies,
//! each gathered by a bounded, timeout-gated batch of independent probes.

pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod errors;
pub mod logging;
