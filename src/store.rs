//! Persistent configuration store.
//!
//! Wraps a [`StoragePort`] (NVS on the device, in-memory on the host) with
//! the whole-record load/save discipline: every save rewrites the complete
//! fixed layout so the stored record is always self-consistent, and a
//! record that fails the magic check is recovered by re-persisting factory
//! defaults rather than surfacing an error.

use core::fmt;

use log::{info, warn};

use crate::config::{DeviceConfig, RECORD_LEN};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// No record has ever been written at the reserved offset.
    NotFound,
    /// The backing storage could not be read or written.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "record not found"),
            Self::IoError => write!(f, "storage I/O error"),
        }
    }
}

/// Whole-record access to the reserved configuration slot.
///
/// Implementations MUST write the record atomically — no partial layouts
/// on power loss. ESP-IDF NVS blob commits guarantee this natively; the
/// in-memory simulation achieves it trivially.
pub trait StoragePort {
    /// Read the full record into `buf`.
    fn read_record(&self, buf: &mut [u8; RECORD_LEN]) -> Result<(), StorageError>;

    /// Overwrite the full record.
    fn write_record(&mut self, record: &[u8; RECORD_LEN]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Config store
// ───────────────────────────────────────────────────────────────

/// Load/save/recover operations over the persisted configuration record.
pub struct ConfigStore;

impl ConfigStore {
    /// Read and decode the stored record. Does not validate — the magic
    /// check is the caller's responsibility via [`DeviceConfig::is_valid`].
    pub fn load(store: &dyn StoragePort) -> Result<DeviceConfig, StorageError> {
        let mut buf = [0u8; RECORD_LEN];
        store.read_record(&mut buf)?;
        Ok(DeviceConfig::decode(&buf))
    }

    /// Persist the full record. Always rewrites every field.
    pub fn save(store: &mut dyn StoragePort, config: &DeviceConfig) -> Result<(), StorageError> {
        store.write_record(&config.encode())
    }

    /// Construct factory defaults and persist them. A failed write is
    /// logged but not fatal: the device keeps running on the in-memory
    /// defaults and retries persistence on the next settings change.
    pub fn reset_to_defaults(store: &mut dyn StoragePort) -> DeviceConfig {
        let config = DeviceConfig::defaults();
        if let Err(e) = Self::save(store, &config) {
            warn!("store: failed to persist factory defaults ({e})");
        }
        info!("store: configuration reset to factory defaults");
        config
    }

    /// Boot-time entry point: load the record, fall back to factory
    /// defaults when it is unreadable or its signature does not match.
    /// Returns the config and whether recovery happened.
    pub fn load_or_reset(store: &mut dyn StoragePort) -> (DeviceConfig, bool) {
        match Self::load(store) {
            Ok(config) if config.is_valid() => {
                info!(
                    "store: configuration loaded (ssid set: {}, setpoint {:.1}°C)",
                    config.has_credentials(),
                    config.setpoint_c
                );
                (config, false)
            }
            Ok(_) => {
                warn!("store: signature mismatch, recovering with defaults");
                (Self::reset_to_defaults(store), true)
            }
            Err(e) => {
                warn!("store: record unreadable ({e}), recovering with defaults");
                (Self::reset_to_defaults(store), true)
            }
        }
    }
}
