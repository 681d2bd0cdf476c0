//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` (64-bit
//!   microseconds since boot), narrowed to wrapping milliseconds.
//! - **other targets** — `std::time::Instant` for host tests.
//!
//! The `u32` narrowing is deliberate: the whole control loop is written
//! against a wrapping millisecond counter and the clock gate handles the
//! wrap, so nothing downstream needs the full 64-bit range.

use crate::clock::{ClockPort, Millis};

pub struct MonoClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonoClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl ClockPort for MonoClock {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> Millis {
        ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1_000) as Millis
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}
