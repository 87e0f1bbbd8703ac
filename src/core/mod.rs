// src/core/mod.rs

// The `core` module holds everything that talks to the target: the probe
// orchestration engine, the per-capability scanners and the data they produce.
// Nothing in here knows about HTTP routing.

/// Data structures shared across the crate: targets, probe outcomes and the
/// per-capability report shapes.
pub mod models;

/// Bounded, timeout-gated execution of probe sets.
pub mod orchestrator;

/// Reduction of finished batches into report shapes.
pub mod aggregator;

/// Link and form extraction from a fetched page.
pub mod crawl;

/// Static probe sets: wordlists, port table, technology signatures.
pub mod knowledge_base;

/// One scanner per capability, plus the context they share.
pub mod scanner;
