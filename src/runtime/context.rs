//! Shared mutable state threaded through every runtime operation.
//!
//! `RuntimeContext` is the single struct the tick handlers read from and
//! write to: current mode, configuration, the named periodic timers, the
//! scan bookkeeping, and the latest reading. Keeping it in one explicit
//! object (instead of process-wide globals) preserves the
//! single-writer/single-reader property while making every dependency
//! visible and testable.

use crate::clock::{Millis, Periodic};
use crate::config::DeviceConfig;
use crate::net::ScanResults;

/// How often a temperature cycle is started.
pub const TEMP_CHECK_PERIOD_MS: u32 = 10_000;
/// How often a provisioning-mode network scan is started.
pub const WIFI_SCAN_PERIOD_MS: u32 = 15_000;
/// How often the offline runtime retries the station connect.
pub const RETRY_PERIOD_MS: u32 = 30_000;
/// Grace period after the last portal interaction before a retry may
/// yank the access point away from the user.
pub const USER_GRACE_MS: u32 = 60_000;

/// Process-wide run mode. Exactly one value, owned by the runtime,
/// mutated only by its transition functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Provisioning: local access point + portal, local threshold control.
    Offline,
    /// Connected: reporting to the remote peer, which owns actuation.
    Online,
}

pub struct RuntimeContext {
    pub mode: Mode,
    pub config: DeviceConfig,

    // Named periodic gates. Each is owned here and consulted by exactly
    // one duty per tick.
    pub temp_check: Periodic,
    pub wifi_scan: Periodic,
    pub retry: Periodic,

    /// Timestamp of the last serviced portal request.
    pub last_user_action: Millis,

    /// Portal-requested pin to provisioning mode.
    pub force_offline: bool,

    /// Whether an asynchronous scan is outstanding.
    pub scan_in_flight: bool,

    /// Results of the most recent completed scan (overwritten each time).
    pub networks: ScanResults,

    /// Most recent confirmed temperature, if any.
    pub last_temperature_c: Option<f32>,

    /// Probe discovery result from init.
    pub sensor_present: bool,
}

impl RuntimeContext {
    pub fn new(config: DeviceConfig, now: Millis) -> Self {
        Self {
            mode: Mode::Offline,
            config,
            temp_check: Periodic::new(now, TEMP_CHECK_PERIOD_MS),
            wifi_scan: Periodic::new(now, WIFI_SCAN_PERIOD_MS),
            retry: Periodic::new(now, RETRY_PERIOD_MS),
            last_user_action: now,
            force_offline: false,
            scan_in_flight: false,
            networks: ScanResults::new(),
            last_temperature_c: None,
            sensor_present: false,
        }
    }

    /// Re-arm every periodic gate (mode transition side effect).
    pub fn reset_timers(&mut self, now: Millis) {
        self.temp_check.reset(now);
        self.wifi_scan.reset(now);
        self.retry.reset(now);
    }

    pub fn has_credentials(&self) -> bool {
        self.config.has_credentials()
    }
}
