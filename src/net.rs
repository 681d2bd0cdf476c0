//! Connectivity manager: provisioning access point vs. station link.
//!
//! The radio lives in one of two arrangements:
//!
//! - **Provisioning** — combined AP+STA mode with a fixed-identity local
//!   access point, so the configuration portal is reachable while the
//!   radio can still scan for nearby networks.
//! - **Station** — pure client mode, AP torn down, connected to the
//!   configured network for reporting.
//!
//! Scanning is modelled as a pollable operation: `start_scan` kicks it
//! off and `scan_complete` is checked on later ticks, so the control loop
//! is never blocked by it. The only blocking wait in the firmware is
//! [`wait_for_link`], which spins cooperatively (yielding each iteration)
//! until the link comes up, the driver reports a terminal failure, or the
//! timeout gate fires.

use core::fmt;

use log::info;
use serde::Serialize;

use crate::clock::{elapsed, ClockPort};

/// Identity of the local provisioning access point.
pub const AP_SSID: &str = "kosi-setup";

/// Upper bound on retained scan results.
pub const MAX_NETWORKS: usize = 16;

/// Bound on the station connect spin-wait.
pub const CONNECT_TIMEOUT_MS: u32 = 20_000;

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The radio driver rejected the mode change or command.
    RadioUnavailable,
    /// Credentials were malformed (empty SSID, oversized passphrase).
    InvalidCredentials,
    /// The driver reported a terminal connect failure.
    ConnectFailed,
    /// The link did not come up within the allotted window.
    Timeout,
    /// A scan could not be started.
    ScanFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RadioUnavailable => write!(f, "radio unavailable"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Timeout => write!(f, "connect timed out"),
            Self::ScanFailed => write!(f, "scan failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Idle,
    Connecting,
    Connected,
    /// Terminal: the driver gave up (bad passphrase, AP gone).
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionKind {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    Wpa3Psk,
    Unknown,
}

/// One network seen by a scan. Ephemeral: the list is overwritten by the
/// next scan and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredNetwork {
    pub ssid: heapless::String<32>,
    pub encryption: EncryptionKind,
    pub rssi_dbm: i8,
    pub channel: u8,
    pub hidden: bool,
}

pub type ScanResults = heapless::Vec<DiscoveredNetwork, MAX_NETWORKS>;

/// Radio driver boundary.
pub trait RadioPort {
    /// AP+STA mode with the fixed provisioning identity up.
    fn enter_provisioning(&mut self) -> Result<(), LinkError>;

    /// Pure station mode; tears the access point down.
    fn enter_station(&mut self) -> Result<(), LinkError>;

    /// Begin connecting with the given credentials. Non-blocking; progress
    /// is observed through `link_status`.
    fn begin_connect(&mut self, ssid: &str, passphrase: &str) -> Result<(), LinkError>;

    fn link_status(&mut self) -> LinkStatus;

    /// Drop the station link (and any in-progress attempt).
    fn disconnect(&mut self);

    /// Start an asynchronous scan. At most one in flight.
    fn start_scan(&mut self) -> Result<(), LinkError>;

    /// Poll for scan completion; `Some` exactly once per finished scan.
    fn scan_complete(&mut self) -> Option<ScanResults>;

    /// Cooperative yield used inside the connect spin-wait so the
    /// watchdog and driver tasks keep running.
    fn yield_now(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Connect wait
// ───────────────────────────────────────────────────────────────

/// Spin until the link reports connected or terminally failed, yielding
/// on every iteration. This blocks the rest of the control loop by
/// design — it runs only inside the OFFLINE→ONLINE transition — but it
/// never spins unconditionally: the timeout gate bounds it even when the
/// driver reports `Connecting` forever.
pub fn wait_for_link(
    radio: &mut dyn RadioPort,
    clock: &dyn ClockPort,
    timeout_ms: u32,
) -> Result<(), LinkError> {
    let started = clock.now_ms();
    loop {
        match radio.link_status() {
            LinkStatus::Connected => {
                info!("net: link up");
                return Ok(());
            }
            LinkStatus::Failed => {
                radio.disconnect();
                return Err(LinkError::ConnectFailed);
            }
            LinkStatus::Idle | LinkStatus::Connecting => {}
        }
        if elapsed(started, clock.now_ms(), timeout_ms) {
            radio.disconnect();
            return Err(LinkError::Timeout);
        }
        radio.yield_now();
    }
}
