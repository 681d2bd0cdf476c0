//! Logical relay and indicator outputs.
//!
//! The control logic only ever says "on" or "off"; the active-low wiring
//! of the relay board and the indicator LED is hidden behind
//! [`ActiveLow`]. The indicator additionally supports the provisioning
//! blink pattern with distinct on/off durations, driven by the same
//! elapsed-time gate as every other periodic duty.

use embedded_hal::digital::OutputPin;

use crate::clock::{elapsed, Millis};

// ───────────────────────────────────────────────────────────────
// Switch port
// ───────────────────────────────────────────────────────────────

/// A logical on/off output. `set(true)` means "energised" regardless of
/// electrical polarity.
pub trait SwitchPort {
    fn set(&mut self, on: bool);
    fn is_on(&self) -> bool;
}

/// Active-low pin adapter: logical "on" drives the pin low.
///
/// Pin errors are swallowed — on the targets this runs on, GPIO writes to
/// an initialised output cannot fail, and the control loop has no
/// meaningful recovery for one that somehow does.
pub struct ActiveLow<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> ActiveLow<P> {
    /// Takes ownership of the pin and drives it to the "off" level.
    pub fn new(mut pin: P) -> Self {
        pin.set_high().ok();
        Self { pin, on: false }
    }
}

impl<P: OutputPin> SwitchPort for ActiveLow<P> {
    fn set(&mut self, on: bool) {
        if on {
            self.pin.set_low().ok();
        } else {
            self.pin.set_high().ok();
        }
        self.on = on;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

// ───────────────────────────────────────────────────────────────
// Blinker
// ───────────────────────────────────────────────────────────────

/// Indicator blink while provisioning: short flash, long pause.
pub const BLINK_ON_MS: u32 = 150;
pub const BLINK_OFF_MS: u32 = 1_350;

/// Asymmetric blink pattern generator.
///
/// `tick` returns `Some(new_state)` on the tick where the output should
/// toggle and `None` otherwise; the caller applies it to the indicator.
#[derive(Debug, Clone, Copy)]
pub struct Blinker {
    lit: bool,
    last_toggle: Millis,
    on_ms: u32,
    off_ms: u32,
}

impl Blinker {
    pub fn new(on_ms: u32, off_ms: u32) -> Self {
        Self {
            lit: false,
            last_toggle: 0,
            on_ms,
            off_ms,
        }
    }

    /// Restart the pattern from the dark phase.
    pub fn reset(&mut self, now: Millis) {
        self.lit = false;
        self.last_toggle = now;
    }

    pub fn tick(&mut self, now: Millis) -> Option<bool> {
        let hold = if self.lit { self.on_ms } else { self.off_ms };
        if elapsed(self.last_toggle, now, hold) {
            self.lit = !self.lit;
            self.last_toggle = now;
            Some(self.lit)
        } else {
            None
        }
    }
}
