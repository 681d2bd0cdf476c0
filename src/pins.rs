//! GPIO pin assignments (ESP32 DevKit wiring).

/// Heating relay, active-low through the driver transistor.
pub const RELAY_GPIO: i32 = 26;

/// Status indicator LED, active-low (on-board LED).
pub const INDICATOR_GPIO: i32 = 2;

/// 1-Wire bus for the DS18B20 temperature probe.
pub const ONEWIRE_GPIO: i32 = 4;
