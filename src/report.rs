//! Measurement reporting and the remote actuation protocol.
//!
//! While connected, the device POSTs `{"temp": <decimal>}` to the
//! configured endpoint and obeys the response status as an actuation
//! directive — the remote peer, not the local threshold, owns the relay:
//!
//! | status    | directive                               |
//! |-----------|-----------------------------------------|
//! | 200       | relay off (satisfied)                   |
//! | 201       | relay on (call for heat)                |
//! | 205       | disconnect — drop back to provisioning  |
//! | anything else | protocol violation, treated as a link failure |
//!
//! A transport-level failure and an unrecognised status are deliberately
//! indistinguishable at the actuation layer: both mean "this link is no
//! longer trustworthy" and send the runtime back offline.

use core::fmt;

use serde::Serialize;

// ───────────────────────────────────────────────────────────────
// Transport port
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Could not reach the peer (DNS, TCP connect, TLS).
    Unreachable,
    /// The exchange started but failed midway.
    Io,
    /// The peer did not answer within the client timeout.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "peer unreachable"),
            Self::Io => write!(f, "transport I/O error"),
            Self::Timeout => write!(f, "transport timeout"),
        }
    }
}

/// One-shot JSON POST. The adapter owns the `Content-Type:
/// application/json` header and returns the raw response status.
pub trait ReportTransport {
    fn post_json(&mut self, url: &str, body: &str) -> Result<u16, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Protocol
// ───────────────────────────────────────────────────────────────

/// What the remote peer told us to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    RelayOff,
    RelayOn,
    /// Explicit remote request to leave reporting mode.
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    Transport(TransportError),
    /// The peer answered with a status outside the protocol table.
    UnexpectedStatus(u16),
    Encode,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::UnexpectedStatus(code) => write!(f, "unexpected status {code}"),
            Self::Encode => write!(f, "body encode failed"),
        }
    }
}

impl From<TransportError> for ReportError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

#[derive(Serialize)]
struct Measurement {
    temp: f32,
}

/// Map a response status to a directive per the protocol table.
pub fn interpret_status(status: u16) -> Result<Directive, ReportError> {
    match status {
        200 => Ok(Directive::RelayOff),
        201 => Ok(Directive::RelayOn),
        205 => Ok(Directive::Disconnect),
        other => Err(ReportError::UnexpectedStatus(other)),
    }
}

/// Build and send one measurement report, returning the peer's directive.
pub fn send_measurement(
    transport: &mut dyn ReportTransport,
    url: &str,
    temp_c: f32,
) -> Result<Directive, ReportError> {
    let body =
        serde_json::to_string(&Measurement { temp: temp_c }).map_err(|_| ReportError::Encode)?;
    let status = transport.post_json(url, &body)?;
    interpret_status(status)
}
