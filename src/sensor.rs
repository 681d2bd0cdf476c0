//! Two-phase temperature conversion tracker.
//!
//! The probe's analog-to-digital conversion takes hundreds of
//! milliseconds, so it is never awaited: the tracker issues the request on
//! one tick and reads the result on a later tick, keeping the cooperative
//! loop free in between.
//!
//! ```text
//!  IDLE ──(start_conversion)──▶ AWAITING
//!  AWAITING ──[wait not elapsed]──▶ AWAITING          (returns nothing)
//!  AWAITING ──[elapsed, device done]──▶ IDLE          (emits temperature)
//!  AWAITING ──[elapsed, device busy]──▶ IDLE          (window discarded)
//! ```
//!
//! A missed window is discarded, not retried within the same cycle — the
//! next tick simply starts a fresh conversion. A probe that was absent at
//! init pins the tracker in `Absent`, so neither local control nor online
//! reporting ever runs on a meaningless reading.

use core::fmt;

use log::{debug, warn};

use crate::clock::{elapsed, Millis};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No probe device was discovered on the bus.
    NotPresent,
    /// The bus transaction failed.
    BusError,
    /// The device returned data that failed its integrity check.
    InvalidReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent => write!(f, "probe not present"),
            Self::BusError => write!(f, "bus error"),
            Self::InvalidReading => write!(f, "invalid reading"),
        }
    }
}

/// Non-blocking two-phase temperature probe.
pub trait TemperatureProbe {
    /// Whether a probe device was discovered at init.
    fn is_present(&self) -> bool;

    /// Worst-case conversion duration for the configured resolution.
    /// Computed once at init; the tracker treats it as constant.
    fn conversion_time_ms(&self) -> u32;

    /// Kick off a conversion. Returns immediately.
    fn start_conversion(&mut self) -> Result<(), SensorError>;

    /// Whether the device reports the conversion as complete.
    fn conversion_done(&mut self) -> bool;

    /// Read the last converted temperature in °C.
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Conversion tracker
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No probe discovered at init — the tracker never produces values.
    Absent,
    Idle,
    Awaiting { started_at: Millis },
}

pub struct ConversionTracker {
    phase: Phase,
    wait_ms: u32,
}

impl ConversionTracker {
    pub fn new(wait_ms: u32) -> Self {
        Self {
            phase: Phase::Idle,
            wait_ms,
        }
    }

    /// Tracker for a missing probe: `poll` is a no-op forever.
    pub fn absent() -> Self {
        Self {
            phase: Phase::Absent,
            wait_ms: 0,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.phase == Phase::Absent
    }

    /// True while a conversion is outstanding — the runtime polls every
    /// tick in this phase instead of waiting for the next period gate.
    pub fn in_flight(&self) -> bool {
        matches!(self.phase, Phase::Awaiting { .. })
    }

    /// Advance the tracker by one tick.
    ///
    /// Returns a temperature only on the tick where the conversion is
    /// confirmed complete; otherwise returns `None` and may have issued a
    /// new conversion request.
    pub fn poll(&mut self, now: Millis, probe: &mut dyn TemperatureProbe) -> Option<f32> {
        match self.phase {
            Phase::Absent => None,

            Phase::Idle => {
                match probe.start_conversion() {
                    Ok(()) => {
                        self.phase = Phase::Awaiting { started_at: now };
                    }
                    Err(e) => warn!("sensor: conversion request failed ({e})"),
                }
                None
            }

            Phase::Awaiting { started_at } => {
                if !elapsed(started_at, now, self.wait_ms) {
                    return None;
                }
                // Window over either way; one shot at reading the result.
                self.phase = Phase::Idle;
                if !probe.conversion_done() {
                    debug!("sensor: conversion incomplete at deadline, window discarded");
                    return None;
                }
                match probe.read_celsius() {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!("sensor: read failed ({e})");
                        None
                    }
                }
            }
        }
    }
}
