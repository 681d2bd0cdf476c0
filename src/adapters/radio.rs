//! WiFi radio adapter.
//!
//! Implements [`RadioPort`] over the ESP-IDF WiFi driver. Provisioning
//! mode runs the radio as AP+STA so the fixed-identity setup network is
//! up while scans still work; station mode tears the AP down and
//! connects with the stored credentials. Scans are started non-blocking
//! and completion is observed by polling, never awaited.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: a deterministic simulation for host tests —
//!   connects after a few status polls (SSIDs starting with `bad`
//!   terminally fail), scans complete on the next poll with a canned
//!   neighbourhood.

use log::info;

use crate::config::bounded;
use crate::net::{
    DiscoveredNetwork, EncryptionKind, LinkError, LinkStatus, RadioPort, ScanResults, AP_SSID,
};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi, ScanConfig,
};

pub struct WifiRadio {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    connecting: bool,
    #[cfg(target_os = "espidf")]
    scanning: bool,

    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

impl WifiRadio {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            wifi,
            connecting: false,
            scanning: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("radio: simulation backend");
        Self {
            sim: SimRadio::default(),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiRadio {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl RadioPort for WifiRadio {
    fn enter_provisioning(&mut self) -> Result<(), LinkError> {
        let ap = AccessPointConfiguration {
            ssid: AP_SSID.try_into().map_err(|_| LinkError::RadioUnavailable)?,
            auth_method: AuthMethod::None,
            channel: 1,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Mixed(ClientConfiguration::default(), ap))
            .map_err(|_| LinkError::RadioUnavailable)?;
        self.wifi.start().map_err(|_| LinkError::RadioUnavailable)?;
        self.connecting = false;
        info!("radio: AP+STA up, AP '{}'", AP_SSID);
        Ok(())
    }

    fn enter_station(&mut self) -> Result<(), LinkError> {
        self.wifi.stop().ok();
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|_| LinkError::RadioUnavailable)?;
        self.scanning = false;
        info!("radio: station mode, AP down");
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, passphrase: &str) -> Result<(), LinkError> {
        let client = ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| LinkError::InvalidCredentials)?,
            password: passphrase
                .try_into()
                .map_err(|_| LinkError::InvalidCredentials)?,
            auth_method: if passphrase.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| LinkError::RadioUnavailable)?;
        self.wifi.start().map_err(|_| LinkError::RadioUnavailable)?;
        self.wifi
            .connect()
            .map_err(|_| LinkError::ConnectFailed)?;
        self.connecting = true;
        Ok(())
    }

    fn link_status(&mut self) -> LinkStatus {
        if self.wifi.is_connected().unwrap_or(false) {
            LinkStatus::Connected
        } else if self.connecting {
            // The IDF driver does not surface a terminal failure state
            // through this API; the caller's timeout gate bounds the wait.
            LinkStatus::Connecting
        } else {
            LinkStatus::Idle
        }
    }

    fn disconnect(&mut self) {
        self.wifi.disconnect().ok();
        self.connecting = false;
    }

    fn start_scan(&mut self) -> Result<(), LinkError> {
        self.wifi
            .driver_mut()
            .start_scan(&ScanConfig::default(), false)
            .map_err(|_| LinkError::ScanFailed)?;
        self.scanning = true;
        Ok(())
    }

    fn scan_complete(&mut self) -> Option<ScanResults> {
        if !self.scanning || !self.wifi.driver().is_scan_done().unwrap_or(false) {
            return None;
        }
        self.scanning = false;

        let (aps, _found) = self
            .wifi
            .driver_mut()
            .get_scan_result_n::<{ crate::net::MAX_NETWORKS }>()
            .ok()?;

        let mut networks = ScanResults::new();
        for ap in &aps {
            let hidden = ap.ssid.is_empty();
            let entry = DiscoveredNetwork {
                ssid: bounded(ap.ssid.as_str()),
                encryption: match ap.auth_method {
                    Some(AuthMethod::None) | None => EncryptionKind::Open,
                    Some(AuthMethod::WEP) => EncryptionKind::Wep,
                    Some(AuthMethod::WPA) => EncryptionKind::WpaPsk,
                    Some(AuthMethod::WPA2Personal | AuthMethod::WPAWPA2Personal) => {
                        EncryptionKind::Wpa2Psk
                    }
                    Some(AuthMethod::WPA3Personal | AuthMethod::WPA2WPA3Personal) => {
                        EncryptionKind::Wpa3Psk
                    }
                    Some(_) => EncryptionKind::Unknown,
                },
                rssi_dbm: ap.signal_strength,
                channel: ap.channel,
                hidden,
            };
            if networks.push(entry).is_err() {
                break;
            }
        }
        Some(networks)
    }

    fn yield_now(&mut self) {
        // Let the driver task and the TWDT-serviced idle task run.
        esp_idf_hal::delay::FreeRtos::delay_ms(20);
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimRadio {
    connecting: bool,
    failed: bool,
    status_polls: u32,
    scanning: bool,
}

#[cfg(not(target_os = "espidf"))]
impl RadioPort for WifiRadio {
    fn enter_provisioning(&mut self) -> Result<(), LinkError> {
        info!("radio(sim): AP+STA up, AP '{}'", AP_SSID);
        self.sim.connecting = false;
        Ok(())
    }

    fn enter_station(&mut self) -> Result<(), LinkError> {
        info!("radio(sim): station mode");
        self.sim.scanning = false;
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, _passphrase: &str) -> Result<(), LinkError> {
        self.sim.connecting = true;
        self.sim.failed = ssid.starts_with("bad");
        self.sim.status_polls = 0;
        info!("radio(sim): connecting to '{ssid}'");
        Ok(())
    }

    fn link_status(&mut self) -> LinkStatus {
        if !self.sim.connecting {
            return LinkStatus::Idle;
        }
        self.sim.status_polls += 1;
        if self.sim.status_polls < 3 {
            LinkStatus::Connecting
        } else if self.sim.failed {
            LinkStatus::Failed
        } else {
            LinkStatus::Connected
        }
    }

    fn disconnect(&mut self) {
        self.sim.connecting = false;
    }

    fn start_scan(&mut self) -> Result<(), LinkError> {
        self.sim.scanning = true;
        Ok(())
    }

    fn scan_complete(&mut self) -> Option<ScanResults> {
        if !self.sim.scanning {
            return None;
        }
        self.sim.scanning = false;

        let mut networks = ScanResults::new();
        networks
            .push(DiscoveredNetwork {
                ssid: bounded("SimNet"),
                encryption: EncryptionKind::Wpa2Psk,
                rssi_dbm: -52,
                channel: 6,
                hidden: false,
            })
            .ok();
        networks
            .push(DiscoveredNetwork {
                ssid: bounded(""),
                encryption: EncryptionKind::Wpa2Psk,
                rssi_dbm: -78,
                channel: 11,
                hidden: true,
            })
            .ok();
        Some(networks)
    }

    fn yield_now(&mut self) {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}
