// src/app.rs

use crate::core::scanner::ScanContext;

/// State shared by every request handler.
///
/// Holds the one scan context for the process, so the HTTP connection pool and
/// resolver cache are reused across requests. Nothing target-specific lives here.
#[derive(Clone)]
pub struct AppState {
    scanner: ScanContext,
}

impl AppState {
    pub fn new(scanner: ScanContext) -> Self {
        Self { scanner }
    }

    pub fn scanner(&self) -> &ScanContext {
        &self.scanner
    }
}
