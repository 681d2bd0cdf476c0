//! Structured diagnostics hook.
//!
//! The core records lifecycle events — mode transitions, configuration
//! recovery, link failures, report outcomes — through a single
//! `record(level, message)` call. Where those records end up (serial,
//! flash, portal page) is the collaborator's business; the crate ships a
//! bounded in-memory ring and a plain log forwarder.

use log::{error, info, warn};

pub const DIAG_RING_CAP: usize = 32;
pub const DIAG_MSG_CAP: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Info,
    Warn,
    Error,
}

/// Sink for structured diagnostic records. The core only ever calls
/// `record`; it has no dependency on the storage format.
pub trait DiagnosticsPort {
    fn record(&mut self, level: DiagLevel, message: &str);
}

#[derive(Debug, Clone)]
pub struct DiagEntry {
    pub level: DiagLevel,
    pub message: heapless::String<DIAG_MSG_CAP>,
}

/// Bounded circular diagnostic buffer: when full, the oldest entry is
/// evicted. Messages longer than the slot are truncated.
#[derive(Default)]
pub struct DiagnosticBuffer {
    entries: heapless::Deque<DiagEntry, DIAG_RING_CAP>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl DiagnosticsPort for DiagnosticBuffer {
    fn record(&mut self, level: DiagLevel, message: &str) {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let msg = crate::config::bounded::<DIAG_MSG_CAP>(message);
        // push_back cannot fail after the is_full check above.
        self.entries.push_back(DiagEntry { level, message: msg }).ok();
    }
}

/// Forwards diagnostic records straight to the logger.
pub struct LogDiagnostics;

impl DiagnosticsPort for LogDiagnostics {
    fn record(&mut self, level: DiagLevel, message: &str) {
        match level {
            DiagLevel::Info => info!("diag: {message}"),
            DiagLevel::Warn => warn!("diag: {message}"),
            DiagLevel::Error => error!("diag: {message}"),
        }
    }
}
