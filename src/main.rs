//! Kosi Thermostat Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  WifiRadio       HttpReportTransport   NvsRecordStore      │
//! │  (RadioPort)     (ReportTransport)     (StoragePort)       │
//! │  Ds18b20Probe    MonoClock             QueuedPortal        │
//! │  (Temperature)   (ClockPort)           (PortalPort)        │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ───────────────       │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │            Runtime (pure logic)                  │      │
//! │  │  mode machine · clock gates · conversion tracker │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! A fixed-rate loop drives `Runtime::tick`; every periodic duty inside
//! is individually time-gated, so the tick itself stays cheap.

#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use log::info;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{IOPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use kosi::actuator::ActiveLow;
use kosi::adapters::http::HttpReportTransport;
use kosi::adapters::probe::Ds18b20Probe;
use kosi::adapters::radio::WifiRadio;
use kosi::adapters::storage::NvsRecordStore;
use kosi::adapters::time::MonoClock;
use kosi::adapters::watchdog::Watchdog;
use kosi::diagnostics::LogDiagnostics;
use kosi::portal::QueuedPortal;
use kosi::runtime::{Hardware, Runtime};

/// Control loop period. Each duty inside the tick has its own gate; this
/// only bounds reaction latency.
const TICK_MS: u32 = 100;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().map_err(|e| anyhow!("logger init: {e:?}"))?;

    info!("kosi v{} starting", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().map_err(|e| anyhow!("peripherals: {e}"))?;
    let sysloop = EspSystemEventLoop::take().map_err(|e| anyhow!("event loop: {e}"))?;
    let nvs_partition = EspDefaultNvsPartition::take().map_err(|e| anyhow!("NVS: {e}"))?;

    let watchdog = Watchdog::new();

    // ── Adapters ──────────────────────────────────────────────
    let clock = MonoClock::new();

    let mut store = NvsRecordStore::new(nvs_partition.clone())
        .map_err(|e| anyhow!("record store: {e}"))?;

    let esp_wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))
        .map_err(|e| anyhow!("wifi driver: {e}"))?;
    let mut radio = WifiRadio::new(esp_wifi);

    let mut transport = HttpReportTransport::new();

    let mut probe = Ds18b20Probe::new(peripherals.pins.gpio4.downgrade())
        .map_err(|e| anyhow!("probe: {e}"))?;
    info!("probe bus on GPIO{}", kosi::pins::ONEWIRE_GPIO);

    let mut relay = ActiveLow::new(
        PinDriver::output(peripherals.pins.gpio26.downgrade())
            .map_err(|e| anyhow!("relay pin: {e}"))?,
    );
    let mut indicator = ActiveLow::new(
        PinDriver::output(peripherals.pins.gpio2.downgrade())
            .map_err(|e| anyhow!("indicator pin: {e}"))?,
    );
    info!(
        "relay on GPIO{}, indicator on GPIO{} (active-low)",
        kosi::pins::RELAY_GPIO,
        kosi::pins::INDICATOR_GPIO
    );

    let mut portal = QueuedPortal::new();
    let mut diag = LogDiagnostics;

    // ── Runtime ───────────────────────────────────────────────
    let mut hw = Hardware {
        clock: &clock,
        store: &mut store,
        radio: &mut radio,
        transport: &mut transport,
        probe: &mut probe,
        relay: &mut relay,
        indicator: &mut indicator,
        portal: &mut portal,
        diag: &mut diag,
    };

    let mut runtime = Runtime::start(&mut hw);
    info!("system ready, entering control loop");

    loop {
        runtime.tick(&mut hw);
        watchdog.feed();
        FreeRtos::delay_ms(TICK_MS);
    }
}
