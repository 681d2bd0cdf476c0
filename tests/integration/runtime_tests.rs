//! End-to-end scenarios for the dual-mode runtime.
//!
//! These drive [`Runtime`] tick by tick against the mock bench and assert
//! on the externally visible side effects: relay and indicator state,
//! radio mode, portal lifecycle, and what got persisted.

use crate::mock_hw::Bench;

use kosi::config::{bounded, DeviceConfig, DEFAULT_SETPOINT_C, SETPOINT_MAX_C};
use kosi::net::{DiscoveredNetwork, EncryptionKind, ScanResults};
use kosi::portal::{PortalRequest, SettingsUpdate};
use kosi::runtime::{Mode, Runtime};

fn stored_config(bench: &Bench) -> DeviceConfig {
    DeviceConfig::decode(bench.store.slot.as_ref().expect("record persisted"))
}

// ── Boot scenarios ────────────────────────────────────────────

#[test]
fn corrupt_magic_boots_offline_with_defaults() {
    let mut bench = Bench::new();
    bench.store.seed_corrupt();

    let runtime = Runtime::start(&mut bench.hw());

    assert_eq!(runtime.mode(), Mode::Offline);
    assert_eq!(runtime.context().config.setpoint_c, DEFAULT_SETPOINT_C);
    assert!(runtime.context().config.is_valid());
    assert!(!runtime.context().has_credentials());

    // Recovery re-persisted a valid record.
    assert!(stored_config(&bench).is_valid());

    // Provisioning side effects: AP and portal up.
    assert!(bench.radio.ap_active);
    assert!(bench.portal.is_running());
    assert!(!bench.diag.is_empty());
}

#[test]
fn first_boot_empty_store_goes_provisioning() {
    let mut bench = Bench::new();
    let runtime = Runtime::start(&mut bench.hw());

    assert_eq!(runtime.mode(), Mode::Offline);
    assert_eq!(bench.radio.begin_connect_calls, 0);
    assert!(bench.radio.ap_active);
}

#[test]
fn valid_credentials_boot_straight_online() {
    let mut bench = Bench::new();
    bench.seed_credentials("HomeNet", "password1");

    let runtime = Runtime::start(&mut bench.hw());

    assert_eq!(runtime.mode(), Mode::Online);
    assert_eq!(bench.radio.begin_connect_calls, 1);
    assert!(bench.radio.station_mode);
    assert!(!bench.radio.ap_active);
    assert!(!bench.portal.is_running());
    // Indicator inactive once connected.
    assert!(!bench.indicator.on);
}

#[test]
fn online_entry_resets_periodic_timers() {
    let mut bench = Bench::new();
    bench.seed_credentials("HomeNet", "password1");
    bench.clock.set(3_000);

    let mut runtime = Runtime::start(&mut bench.hw());
    assert_eq!(runtime.mode(), Mode::Online);

    // Temperature window runs from the online entry (t=3000), not boot.
    bench.clock.set(12_900);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.probe.starts, 0);

    bench.clock.set(13_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.probe.starts, 1);
}

#[test]
fn failed_connect_falls_back_to_provisioning() {
    let mut bench = Bench::new();
    bench.seed_credentials("HomeNet", "password1");
    bench.radio.connect_succeeds = false;

    let runtime = Runtime::start(&mut bench.hw());

    assert_eq!(runtime.mode(), Mode::Offline);
    assert_eq!(bench.radio.begin_connect_calls, 1);
    assert!(bench.radio.ap_active);
    assert!(bench.portal.is_running());
}

// ── Offline duties ────────────────────────────────────────────

#[test]
fn offline_retry_fires_once_per_window() {
    let mut bench = Bench::new();
    bench.seed_credentials("HomeNet", "password1");
    bench.radio.connect_succeeds = false;

    let mut runtime = Runtime::start(&mut bench.hw());
    assert_eq!(bench.radio.begin_connect_calls, 1); // boot attempt

    // Past the user-action grace and the retry window.
    bench.clock.set(70_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.begin_connect_calls, 2);

    // Same window: no further attempts, even over many ticks.
    runtime.tick(&mut bench.hw());
    bench.clock.set(80_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.begin_connect_calls, 2);

    // Next window (retry timer re-armed at the failed attempt).
    bench.clock.set(101_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.begin_connect_calls, 3);
}

#[test]
fn retry_waits_for_user_grace_after_portal_activity() {
    let mut bench = Bench::new();
    let mut runtime = Runtime::start(&mut bench.hw());
    assert_eq!(runtime.mode(), Mode::Offline);

    // User provisions credentials at t=1000.
    bench.clock.set(1_000);
    bench
        .portal
        .push(PortalRequest::Apply(SettingsUpdate {
            ssid: Some(bounded("HomeNet")),
            passphrase: Some(bounded("password1")),
            ..Default::default()
        }))
        .unwrap();
    runtime.tick(&mut bench.hw());
    assert!(runtime.context().has_credentials());

    // Retry window has elapsed but the grace period has not.
    bench.clock.set(31_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.begin_connect_calls, 0);

    // Grace over → exactly one attempt.
    bench.clock.set(61_100);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.begin_connect_calls, 1);
}

#[test]
fn force_offline_pins_provisioning_mode() {
    let mut bench = Bench::new();
    bench.seed_credentials("HomeNet", "password1");
    bench.radio.connect_succeeds = false;

    let mut runtime = Runtime::start(&mut bench.hw());
    bench.clock.set(5_000);
    bench.portal.push(PortalRequest::StayOffline(true)).unwrap();
    runtime.tick(&mut bench.hw());

    bench.radio.connect_succeeds = true;
    bench.clock.set(200_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(runtime.mode(), Mode::Offline);
    assert_eq!(bench.radio.begin_connect_calls, 1); // boot attempt only
}

#[test]
fn offline_scan_populates_network_list() {
    let mut bench = Bench::new();
    let mut runtime = Runtime::start(&mut bench.hw());

    bench.clock.set(15_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.scans_started, 1);

    // Completion arrives on a later tick.
    let mut results = ScanResults::new();
    results
        .push(DiscoveredNetwork {
            ssid: bounded("Neighbour"),
            encryption: EncryptionKind::Wpa2Psk,
            rssi_dbm: -61,
            channel: 6,
            hidden: false,
        })
        .ok();
    bench.radio.next_scan = Some(results);

    bench.clock.set(15_200);
    runtime.tick(&mut bench.hw());
    assert_eq!(runtime.discovered_networks().len(), 1);
    assert_eq!(runtime.discovered_networks()[0].ssid.as_str(), "Neighbour");

    // No new scan until the next window.
    bench.clock.set(20_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.scans_started, 1);

    bench.clock.set(30_200);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.radio.scans_started, 2);
}

#[test]
fn offline_threshold_control_drives_relay() {
    let mut bench = Bench::new();
    bench.probe.temp_c = 15.0; // below the 18.0 default setpoint
    let mut runtime = Runtime::start(&mut bench.hw());

    // Temperature window opens: conversion starts.
    bench.clock.set(10_000);
    runtime.tick(&mut bench.hw());
    assert_eq!(bench.probe.starts, 1);
    assert!(!bench.relay.on);

    // Conversion done: cold room → call for heat.
    bench.clock.set(10_750);
    runtime.tick(&mut bench.hw());
    assert!(bench.relay.on);

    // Warm reading on the next cycle switches it off.
    bench.probe.temp_c = 22.0;
    bench.clock.set(20_750);
    runtime.tick(&mut bench.hw());
    bench.clock.set(21_500);
    runtime.tick(&mut bench.hw());
    assert!(!bench.relay.on);
}

#[test]
fn offline_indicator_blinks_with_asymmetric_pattern() {
    let mut bench = Bench::new();
    let mut runtime = Runtime::start(&mut bench.hw());

    // Dark phase holds 1350 ms, lit phase 150 ms.
    bench.clock.set(1_000);
    runtime.tick(&mut bench.hw());
    assert!(!bench.indicator.on);

    bench.clock.set(1_350);
    runtime.tick(&mut bench.hw());
    assert!(bench.indicator.on);

    bench.clock.set(1_500);
    runtime.tick(&mut bench.hw());
    assert!(!bench.indicator.on);
}

#[test]
fn absent_probe_never_touches_relay() {
    let mut bench = Bench::new();
    bench.probe.present = false;

    let mut runtime = Runtime::start(&mut bench.hw());
    assert!(!runtime.context().sensor_present);

    for t in [10_000, 10_750, 20_000, 30_000] {
        bench.clock.set(t);
        runtime.tick(&mut bench.hw());
    }
    assert_eq!(bench.probe.starts, 0);
    assert!(bench.relay.history.is_empty());
    assert_eq!(runtime.context().last_temperature_c, None);
}

// ── Settings entry point ──────────────────────────────────────

#[test]
fn applied_settings_persist_per_field() {
    let mut bench = Bench::new();
    let mut runtime = Runtime::start(&mut bench.hw());
    let writes_after_boot = bench.store.writes;

    bench.clock.set(2_000);
    bench
        .portal
        .push(PortalRequest::Apply(SettingsUpdate {
            ssid: Some(bounded("NewNet")),
            setpoint_c: Some(21.5),
            ..Default::default()
        }))
        .unwrap();
    runtime.tick(&mut bench.hw());

    // One full re-serialize per applied field.
    assert_eq!(bench.store.writes, writes_after_boot + 2);

    let stored = stored_config(&bench);
    assert_eq!(stored.ssid.as_str(), "NewNet");
    assert_eq!(stored.setpoint_c, 21.5);
}

#[test]
fn out_of_range_setpoint_is_clamped() {
    let mut bench = Bench::new();
    let mut runtime = Runtime::start(&mut bench.hw());

    bench
        .portal
        .push(PortalRequest::Apply(SettingsUpdate {
            setpoint_c: Some(42.0),
            ..Default::default()
        }))
        .unwrap();
    runtime.tick(&mut bench.hw());

    assert_eq!(runtime.context().config.setpoint_c, SETPOINT_MAX_C);
    assert_eq!(stored_config(&bench).setpoint_c, SETPOINT_MAX_C);
}

#[test]
fn factory_reset_clears_credentials_and_persists() {
    let mut bench = Bench::new();
    bench.seed_credentials("HomeNet", "password1");
    bench.radio.connect_succeeds = false;

    let mut runtime = Runtime::start(&mut bench.hw());
    assert_eq!(runtime.mode(), Mode::Offline);

    bench.portal.push(PortalRequest::FactoryReset).unwrap();
    runtime.tick(&mut bench.hw());

    assert!(!runtime.context().has_credentials());
    let stored = stored_config(&bench);
    assert!(stored.is_valid());
    assert!(!stored.has_credentials());
    assert_eq!(stored.setpoint_c, DEFAULT_SETPOINT_C);
}
