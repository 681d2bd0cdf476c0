//! Unified error types for the firmware.
//!
//! Every subsystem's error converts into one `Error` enum so the top
//! level handles failures uniformly. All variants are `Copy`; none of
//! them is fatal — the runtime's only recovery action is a mode
//! fallback, and the device keeps polling and retrying indefinitely.

use core::fmt;

use crate::net::LinkError;
use crate::report::ReportError;
use crate::sensor::SensorError;
use crate::store::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent storage failed (recovered locally via defaults).
    Storage(StorageError),
    /// Temperature probe failure.
    Sensor(SensorError),
    /// Connectivity failure (recovered by falling back offline).
    Link(LinkError),
    /// Reporting exchange failure (recovered by falling back offline).
    Report(ReportError),
    /// Peripheral or adapter initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Report(e) => write!(f, "report: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<ReportError> for Error {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
