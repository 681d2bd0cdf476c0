//! Top-level dual-mode runtime.
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            │                 OFFLINE                  │
//!            │  AP + portal up, indicator blinking,     │
//!            │  scan / temp / blink / retry gates       │
//!            └───────┬──────────────────────▲───────────┘
//!     credentials &  │                      │ connect failed,
//!     retry elapsed  │                      │ report failure,
//!                    ▼                      │ 205 / bad status
//!            ┌──────────────────────────────┴───────────┐
//!            │                 ONLINE                   │
//!            │  station link, remote peer owns relay    │
//!            └──────────────────────────────────────────┘
//! ```
//!
//! A fixed-rate driver calls [`Runtime::tick`]; the handler for the
//! current mode runs each of its duties behind its own elapsed-time gate,
//! so one tick performs at most the work whose period has elapsed. The
//! runtime is the sole writer of [`Mode`] and the sole arbiter of
//! fallback: every component failure funnels here and becomes (at worst)
//! a transition back to provisioning.

pub mod context;

use log::{error, info, warn};

pub use context::{Mode, RuntimeContext};
pub use context::{RETRY_PERIOD_MS, TEMP_CHECK_PERIOD_MS, USER_GRACE_MS, WIFI_SCAN_PERIOD_MS};

use crate::actuator::{Blinker, SwitchPort, BLINK_OFF_MS, BLINK_ON_MS};
use crate::clock::{elapsed, ClockPort, Millis};
use crate::config::{SETPOINT_MAX_C, SETPOINT_MIN_C};
use crate::diagnostics::{DiagLevel, DiagnosticsPort};
use crate::net::{self, DiscoveredNetwork, RadioPort, CONNECT_TIMEOUT_MS};
use crate::portal::{PortalPort, PortalRequest, SettingsUpdate};
use crate::report::{self, Directive, ReportTransport};
use crate::sensor::{ConversionTracker, TemperatureProbe};
use crate::store::{ConfigStore, StoragePort};

/// Every port the runtime drives, bundled per call so the pure state
/// lives in [`RuntimeContext`] and the hardware stays swappable in tests.
pub struct Hardware<'a> {
    pub clock: &'a dyn ClockPort,
    pub store: &'a mut dyn StoragePort,
    pub radio: &'a mut dyn RadioPort,
    pub transport: &'a mut dyn ReportTransport,
    pub probe: &'a mut dyn TemperatureProbe,
    pub relay: &'a mut dyn SwitchPort,
    pub indicator: &'a mut dyn SwitchPort,
    pub portal: &'a mut dyn PortalPort,
    pub diag: &'a mut dyn DiagnosticsPort,
}

pub struct Runtime {
    ctx: RuntimeContext,
    tracker: ConversionTracker,
    blinker: Blinker,
}

impl Runtime {
    /// Boot: load (or recover) the configuration, probe the sensor bus,
    /// and enter the initial mode — a station connect attempt when valid
    /// credentials exist, provisioning otherwise.
    pub fn start(hw: &mut Hardware<'_>) -> Self {
        let now = hw.clock.now_ms();

        let (config, recovered) = ConfigStore::load_or_reset(hw.store);
        if recovered {
            hw.diag
                .record(DiagLevel::Warn, "configuration recovered with factory defaults");
        }

        let sensor_present = hw.probe.is_present();
        let tracker = if sensor_present {
            ConversionTracker::new(hw.probe.conversion_time_ms())
        } else {
            warn!("sensor: no probe discovered, temperature duties disabled");
            hw.diag.record(DiagLevel::Error, "no temperature probe discovered");
            ConversionTracker::absent()
        };

        let mut ctx = RuntimeContext::new(config, now);
        ctx.sensor_present = sensor_present;

        let mut runtime = Self {
            ctx,
            tracker,
            blinker: Blinker::new(BLINK_ON_MS, BLINK_OFF_MS),
        };

        if runtime.ctx.has_credentials() {
            runtime.to_online(hw);
        } else {
            runtime.to_offline(hw);
        }
        runtime
    }

    /// One pass of the cooperative loop.
    pub fn tick(&mut self, hw: &mut Hardware<'_>) {
        let now = hw.clock.now_ms();
        match self.ctx.mode {
            Mode::Offline => self.tick_offline(now, hw),
            Mode::Online => self.tick_online(now, hw),
        }
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    /// Networks seen by the most recent completed scan (portal listing).
    pub fn discovered_networks(&self) -> &[DiscoveredNetwork] {
        &self.ctx.networks
    }

    // ── Offline: provisioning + local control ─────────────────

    fn tick_offline(&mut self, now: Millis, hw: &mut Hardware<'_>) {
        // Portal work first: settings the user just applied should be
        // visible to every gate below on the same tick.
        while let Some(request) = hw.portal.service() {
            self.ctx.last_user_action = now;
            match request {
                PortalRequest::Apply(update) => self.apply_settings(update, hw.store, hw.diag),
                PortalRequest::FactoryReset => self.factory_reset(hw.store, hw.diag),
                PortalRequest::StayOffline(pinned) => {
                    info!("portal: force-offline {}", if pinned { "set" } else { "cleared" });
                    self.ctx.force_offline = pinned;
                }
            }
        }

        // Scan lifecycle: poll an outstanding scan every tick, start a
        // fresh one only on the period gate.
        if self.ctx.scan_in_flight {
            if let Some(networks) = hw.radio.scan_complete() {
                info!("net: scan finished, {} network(s)", networks.len());
                for n in &networks {
                    info!(
                        "net:   '{}' ch{} {} dBm {:?}{}",
                        n.ssid,
                        n.channel,
                        n.rssi_dbm,
                        n.encryption,
                        if n.hidden { " (hidden)" } else { "" }
                    );
                }
                self.ctx.networks = networks;
                self.ctx.scan_in_flight = false;
            }
        } else if self.ctx.wifi_scan.due(now) {
            match hw.radio.start_scan() {
                Ok(()) => self.ctx.scan_in_flight = true,
                Err(e) => warn!("net: scan start failed ({e})"),
            }
        }

        // Temperature: the period gate starts a cycle; an in-flight
        // conversion is polled every tick so the result is picked up as
        // soon as the device is done, not a full window later.
        let window_due = self.ctx.temp_check.due(now);
        if self.tracker.in_flight() || window_due {
            if let Some(t) = self.tracker.poll(now, hw.probe) {
                self.ctx.last_temperature_c = Some(t);
                let call_for_heat = t < self.ctx.config.setpoint_c;
                hw.relay.set(call_for_heat);
                info!(
                    "control: {:.2}°C / setpoint {:.1}°C → relay {}",
                    t,
                    self.ctx.config.setpoint_c,
                    if call_for_heat { "on" } else { "off" }
                );
            }
        }

        // Provisioning indicator blink.
        if let Some(lit) = self.blinker.tick(now) {
            hw.indicator.set(lit);
        }

        // Retry the station connect: at most once per retry window, only
        // with credentials, never while the user is mid-provisioning and
        // never when pinned offline.
        if self.ctx.has_credentials()
            && !self.ctx.force_offline
            && elapsed(self.ctx.last_user_action, now, USER_GRACE_MS)
            && self.ctx.retry.due(now)
        {
            self.to_online(hw);
        }
    }

    // ── Online: report and obey ───────────────────────────────

    fn tick_online(&mut self, now: Millis, hw: &mut Hardware<'_>) {
        let window_due = self.ctx.temp_check.due(now);
        if !(self.tracker.in_flight() || window_due) {
            return;
        }
        let Some(temp_c) = self.tracker.poll(now, hw.probe) else {
            return;
        };
        self.ctx.last_temperature_c = Some(temp_c);

        // Activity indicator held for the duration of the exchange.
        hw.indicator.set(true);
        let outcome =
            report::send_measurement(hw.transport, self.ctx.config.report_url.as_str(), temp_c);
        hw.indicator.set(false);

        match outcome {
            Ok(Directive::RelayOff) => {
                info!("report: {temp_c:.2}°C → 200, relay off");
                hw.relay.set(false);
            }
            Ok(Directive::RelayOn) => {
                info!("report: {temp_c:.2}°C → 201, relay on");
                hw.relay.set(true);
            }
            Ok(Directive::Disconnect) => {
                info!("report: remote requested disconnect");
                hw.diag.record(DiagLevel::Info, "remote disconnect (205)");
                self.to_offline(hw);
            }
            Err(e) => {
                warn!("report: exchange failed ({e})");
                hw.diag.record(DiagLevel::Warn, "report failed, leaving online mode");
                self.to_offline(hw);
            }
        }
    }

    // ── Transitions ───────────────────────────────────────────

    /// OFFLINE → ONLINE attempt: tear down the portal and AP, connect as
    /// a station, and fall straight back on any failure.
    fn to_online(&mut self, hw: &mut Hardware<'_>) {
        info!("runtime: connecting to '{}'", self.ctx.config.ssid);
        hw.portal.stop();

        let mut result = hw.radio.enter_station();
        if result.is_ok() {
            result = hw.radio.begin_connect(
                self.ctx.config.ssid.as_str(),
                self.ctx.config.passphrase.as_str(),
            );
        }
        if result.is_ok() {
            result = net::wait_for_link(hw.radio, hw.clock, CONNECT_TIMEOUT_MS);
        }

        match result {
            Ok(()) => {
                let now = hw.clock.now_ms();
                self.ctx.mode = Mode::Online;
                self.ctx.reset_timers(now);
                hw.indicator.set(false);
                info!(
                    "runtime: online, reporting to {}",
                    self.ctx.config.report_url
                );
                hw.diag.record(DiagLevel::Info, "mode: online");
            }
            Err(e) => {
                warn!("runtime: connect failed ({e})");
                hw.diag.record(DiagLevel::Warn, "connect failed, back to provisioning");
                self.to_offline(hw);
            }
        }
    }

    /// Enter (or re-enter) provisioning: AP + portal up, blink restarted.
    /// Any in-flight online exchange is simply abandoned — nothing else
    /// is running when a transition happens.
    fn to_offline(&mut self, hw: &mut Hardware<'_>) {
        let now = hw.clock.now_ms();
        self.ctx.mode = Mode::Offline;

        hw.radio.disconnect();
        if let Err(e) = hw.radio.enter_provisioning() {
            error!("runtime: failed to start access point ({e})");
        }
        hw.portal.start();

        self.ctx.reset_timers(now);
        self.ctx.scan_in_flight = false;
        self.blinker.reset(now);

        info!("runtime: offline, provisioning AP '{}' up", net::AP_SSID);
        hw.diag.record(DiagLevel::Info, "mode: offline (provisioning)");
    }

    // ── Collaborator entry points ─────────────────────────────

    /// Apply a partial settings update. Every present field is applied
    /// independently and immediately re-persists the full record, so the
    /// stored layout is never a mix of old and new field encodings.
    pub fn apply_settings(
        &mut self,
        update: SettingsUpdate,
        store: &mut dyn StoragePort,
        diag: &mut dyn DiagnosticsPort,
    ) {
        if update.is_empty() {
            return;
        }

        if let Some(ssid) = update.ssid {
            info!("settings: ssid → '{}'", ssid);
            self.ctx.config.ssid = ssid;
            self.persist(store);
        }
        if let Some(passphrase) = update.passphrase {
            info!("settings: passphrase updated");
            self.ctx.config.passphrase = passphrase;
            self.persist(store);
        }
        if let Some(report_url) = update.report_url {
            info!("settings: report_url → '{}'", report_url);
            self.ctx.config.report_url = report_url;
            self.persist(store);
        }
        if let Some(setpoint) = update.setpoint_c {
            let clamped = setpoint.clamp(SETPOINT_MIN_C, SETPOINT_MAX_C);
            if clamped != setpoint {
                warn!(
                    "settings: setpoint {setpoint:.1}°C outside [{SETPOINT_MIN_C:.0}, {SETPOINT_MAX_C:.0}], clamped to {clamped:.1}°C"
                );
            }
            info!("settings: setpoint → {clamped:.1}°C");
            self.ctx.config.setpoint_c = clamped;
            self.persist(store);
        }

        diag.record(DiagLevel::Info, "settings updated via portal");
    }

    /// Reinitialise the stored record to factory defaults.
    pub fn factory_reset(&mut self, store: &mut dyn StoragePort, diag: &mut dyn DiagnosticsPort) {
        self.ctx.config = ConfigStore::reset_to_defaults(store);
        self.ctx.force_offline = false;
        diag.record(DiagLevel::Warn, "factory reset");
    }

    fn persist(&mut self, store: &mut dyn StoragePort) {
        if let Err(e) = ConfigStore::save(store, &self.ctx.config) {
            warn!("settings: persist failed ({e})");
        }
    }
}
