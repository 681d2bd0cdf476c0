//! DS18B20 temperature probe adapter (1-Wire).
//!
//! The DS18B20's conversion is the slow two-phase operation the tracker
//! exists for: a broadcast "convert" command kicks it off, the device
//! holds the read slot low until the conversion finishes, and the
//! scratchpad read yields the result. At the fixed 12-bit resolution the
//! worst-case conversion time is 750 ms, published once through
//! `conversion_time_ms`.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: a real 1-Wire bus over an open-drain GPIO.
//! On host/test: a static injection point for simulated readings.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::sensor::{SensorError, TemperatureProbe};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

#[cfg(target_os = "espidf")]
use ds18b20::Ds18b20;
#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, InputOutput, PinDriver, Pull},
};
#[cfg(target_os = "espidf")]
use one_wire_bus::{Address, OneWire};

/// Worst-case conversion duration at the fixed 12-bit resolution.
const CONVERSION_TIME_MS: u32 = 750;

// ── Host simulation hooks ─────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_MILLI_C: AtomicI32 = AtomicI32::new(20_000);
#[cfg(not(target_os = "espidf"))]
static SIM_PRESENT: AtomicBool = AtomicBool::new(true);

/// Inject the simulated temperature (host tests).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temperature_c(temp_c: f32) {
    SIM_TEMP_MILLI_C.store((temp_c * 1000.0) as i32, Ordering::Relaxed);
}

/// Simulate an absent probe (host tests).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    SIM_PRESENT.store(present, Ordering::Relaxed);
}

// ── Adapter ───────────────────────────────────────────────────

pub struct Ds18b20Probe {
    #[cfg(target_os = "espidf")]
    bus: OneWire<PinDriver<'static, AnyIOPin, InputOutput>>,
    #[cfg(target_os = "espidf")]
    address: Option<Address>,
    #[cfg(target_os = "espidf")]
    delay: Ets,
    #[cfg(not(target_os = "espidf"))]
    present: bool,
}

impl Ds18b20Probe {
    /// Open the bus and search for the first DS18B20. An empty bus is
    /// not an error: the adapter reports `is_present() == false` and the
    /// runtime enters its explicit no-sensor state.
    #[cfg(target_os = "espidf")]
    pub fn new(pin: AnyIOPin) -> Result<Self, crate::error::Error> {
        let mut bus_pin = PinDriver::input_output_od(pin)
            .map_err(|_| crate::error::Error::Init("1-Wire pin setup failed"))?;
        bus_pin
            .set_pull(Pull::Up)
            .map_err(|_| crate::error::Error::Init("1-Wire pull-up failed"))?;
        bus_pin
            .set_high()
            .map_err(|_| crate::error::Error::Init("1-Wire pin release failed"))?;

        let bus = OneWire::new(bus_pin)
            .map_err(|_| crate::error::Error::Init("1-Wire bus init failed"))?;

        let mut probe = Self {
            bus,
            address: None,
            delay: Ets,
        };
        probe.discover();
        Ok(probe)
    }

    #[cfg(target_os = "espidf")]
    fn discover(&mut self) {
        for found in self.bus.devices(false, &mut self.delay) {
            match found {
                Ok(address) if address.family_code() == ds18b20::FAMILY_CODE => {
                    info!("probe: DS18B20 at {:?}", address);
                    self.address = Some(address);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("probe: bus search failed ({e:?})");
                    return;
                }
            }
        }
        warn!("probe: no DS18B20 found on the bus");
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        let present = SIM_PRESENT.load(Ordering::Relaxed);
        info!("probe: simulation backend (present: {present})");
        Self { present }
    }
}

impl TemperatureProbe for Ds18b20Probe {
    #[cfg(target_os = "espidf")]
    fn is_present(&self) -> bool {
        self.address.is_some()
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_present(&self) -> bool {
        self.present
    }

    fn conversion_time_ms(&self) -> u32 {
        CONVERSION_TIME_MS
    }

    #[cfg(target_os = "espidf")]
    fn start_conversion(&mut self) -> Result<(), SensorError> {
        if self.address.is_none() {
            return Err(SensorError::NotPresent);
        }
        ds18b20::start_simultaneous_temp_measurement(&mut self.bus, &mut self.delay)
            .map_err(|_| SensorError::BusError)
    }

    #[cfg(not(target_os = "espidf"))]
    fn start_conversion(&mut self) -> Result<(), SensorError> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NotPresent)
        }
    }

    #[cfg(target_os = "espidf")]
    fn conversion_done(&mut self) -> bool {
        // The device holds the read slot low while converting.
        self.bus.read_bit(&mut self.delay).unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn conversion_done(&mut self) -> bool {
        self.present
    }

    #[cfg(target_os = "espidf")]
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let address = self.address.ok_or(SensorError::NotPresent)?;
        let sensor = Ds18b20::new::<core::convert::Infallible>(address)
            .map_err(|_| SensorError::InvalidReading)?;
        let data = sensor
            .read_data(&mut self.bus, &mut self.delay)
            .map_err(|_| SensorError::InvalidReading)?;
        Ok(data.temperature)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        if !self.present {
            return Err(SensorError::NotPresent);
        }
        Ok(SIM_TEMP_MILLI_C.load(Ordering::Relaxed) as f32 / 1000.0)
    }
}
