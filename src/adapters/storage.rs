//! NVS-backed record storage.
//!
//! The configuration record is kept as a single blob under the "kosi"
//! namespace, so an interrupted write can never leave a half-updated
//! layout: ESP-IDF commits the blob atomically. The simulation backend
//! is a plain in-memory slot (dev/test only).

use log::info;

use crate::config::RECORD_LEN;
use crate::store::{StorageError, StoragePort};

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

const RECORD_KEY: &str = "cfgrec";

pub struct NvsRecordStore {
    #[cfg(target_os = "espidf")]
    nvs: EspNvs<NvsDefault>,
    #[cfg(not(target_os = "espidf"))]
    slot: Option<[u8; RECORD_LEN]>,
}

impl NvsRecordStore {
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, crate::error::Error> {
        let nvs = EspNvs::new(partition, "kosi", true)
            .map_err(|_| crate::error::Error::Init("NVS namespace open failed"))?;
        info!("storage: NVS namespace 'kosi' open");
        Ok(Self { nvs })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("storage: simulation backend");
        Self { slot: None }
    }

    /// Pre-seed the simulated slot (host tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_seed(&mut self, record: [u8; RECORD_LEN]) {
        self.slot = Some(record);
    }

    /// Raw simulated slot contents (host tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_raw(&self) -> Option<[u8; RECORD_LEN]> {
        self.slot
    }
}

impl StoragePort for NvsRecordStore {
    #[cfg(target_os = "espidf")]
    fn read_record(&self, buf: &mut [u8; RECORD_LEN]) -> Result<(), StorageError> {
        match self.nvs.get_blob(RECORD_KEY, buf) {
            Ok(Some(data)) if data.len() == RECORD_LEN => Ok(()),
            Ok(Some(_)) => Err(StorageError::IoError), // wrong length: stale schema
            Ok(None) => Err(StorageError::NotFound),
            Err(_) => Err(StorageError::IoError),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_record(&self, buf: &mut [u8; RECORD_LEN]) -> Result<(), StorageError> {
        match &self.slot {
            Some(record) => {
                buf.copy_from_slice(record);
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_record(&mut self, record: &[u8; RECORD_LEN]) -> Result<(), StorageError> {
        self.nvs
            .set_blob(RECORD_KEY, record)
            .map_err(|_| StorageError::IoError)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_record(&mut self, record: &[u8; RECORD_LEN]) -> Result<(), StorageError> {
        self.slot = Some(*record);
        Ok(())
    }
}
