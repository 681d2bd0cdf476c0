//! Boundary to the local configuration portal.
//!
//! The portal itself — HTTP server, HTML form — is an external
//! collaborator; the core only drains its pending requests once per
//! offline tick and exposes the data the portal needs (the
//! discovered-network list, via [`crate::runtime::Runtime`]). Requests
//! are plain data so the core stays testable without any server running.

use serde::Deserialize;

use crate::config::{PASSPHRASE_CAP, REPORT_URL_CAP, SSID_CAP};

/// A partial settings change from the portal form. Every field is
/// optional and applied independently; each applied field re-persists
/// the full configuration record immediately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub ssid: Option<heapless::String<SSID_CAP>>,
    pub passphrase: Option<heapless::String<PASSPHRASE_CAP>>,
    pub report_url: Option<heapless::String<REPORT_URL_CAP>>,
    pub setpoint_c: Option<f32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.ssid.is_none()
            && self.passphrase.is_none()
            && self.report_url.is_none()
            && self.setpoint_c.is_none()
    }
}

/// One user action serviced from the portal.
#[derive(Debug, Clone)]
pub enum PortalRequest {
    Apply(SettingsUpdate),
    FactoryReset,
    /// Pin the device in provisioning mode (or release it again).
    StayOffline(bool),
}

/// Collaborator boundary. `service` pumps the portal's pending work and
/// yields at most one request per call; the runtime drains it in a loop
/// each offline tick.
pub trait PortalPort {
    fn start(&mut self);
    fn stop(&mut self);
    fn service(&mut self) -> Option<PortalRequest>;
}

/// Queue-backed portal seam.
///
/// The web server collaborator parses form submissions into
/// [`PortalRequest`]s and pushes them here; the runtime drains the queue
/// on its offline tick. Requests pushed while the portal is stopped are
/// rejected, mirroring the server being down.
pub struct QueuedPortal {
    running: bool,
    queue: heapless::Deque<PortalRequest, 8>,
}

impl Default for QueuedPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl QueuedPortal {
    pub fn new() -> Self {
        Self {
            running: false,
            queue: heapless::Deque::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Enqueue a user request. Fails when the portal is stopped or the
    /// queue is full (the caller answers 503 in that case).
    pub fn push(&mut self, request: PortalRequest) -> Result<(), PortalRequest> {
        if !self.running {
            return Err(request);
        }
        self.queue.push_back(request)
    }
}

impl PortalPort for QueuedPortal {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.queue.clear();
    }

    fn service(&mut self) -> Option<PortalRequest> {
        if self.running {
            self.queue.pop_front()
        } else {
            None
        }
    }
}
