//! Settings blob in flash.
//!
//! A small magic + length header followed by the postcard blob from
//! `hearth_core::settings`, at a fixed offset below the application
//! partitions. An unformatted region fails the magic check and the core
//! boots with defaults.

use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;
use log::info;
use thiserror_no_std::Error;

use hearth_core::settings::{self, DeviceSettings, SETTINGS_BLOB_MAX, SettingsStore};

const SETTINGS_FLASH_OFFSET: u32 = 0x9000;
const MAGIC: [u8; 4] = *b"HRTH";
const HEADER_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("flash access failed")]
    Flash,
    #[error("no settings blob present")]
    Missing,
    #[error("settings codec: {0}")]
    Codec(settings::SettingsError),
}

pub struct FlashStore {
    flash: FlashStorage,
}

impl FlashStore {
    pub fn new() -> Self {
        Self {
            flash: FlashStorage::new(),
        }
    }
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FlashStore {
    type Error = StoreError;

    fn load(&mut self) -> Result<DeviceSettings, StoreError> {
        let mut raw = [0u8; HEADER_LEN + SETTINGS_BLOB_MAX];
        self.flash
            .read(SETTINGS_FLASH_OFFSET, &mut raw)
            .map_err(|_| StoreError::Flash)?;

        if raw[..4] != MAGIC {
            return Err(StoreError::Missing);
        }
        let len = u16::from_le_bytes([raw[4], raw[5]]) as usize;
        if len > SETTINGS_BLOB_MAX {
            return Err(StoreError::Missing);
        }

        settings::decode(&raw[HEADER_LEN..HEADER_LEN + len]).map_err(StoreError::Codec)
    }

    fn save(&mut self, settings: &DeviceSettings) -> Result<(), StoreError> {
        let mut raw = [0u8; HEADER_LEN + SETTINGS_BLOB_MAX];
        let len = {
            let blob = settings::encode(settings, &mut raw[HEADER_LEN..])
                .map_err(StoreError::Codec)?;
            blob.len()
        };
        raw[..4].copy_from_slice(&MAGIC);
        raw[4..6].copy_from_slice(&(len as u16).to_le_bytes());

        self.flash
            .write(SETTINGS_FLASH_OFFSET, &raw[..HEADER_LEN + len])
            .map_err(|_| StoreError::Flash)?;
        info!("settings blob saved ({len} bytes)");
        Ok(())
    }
}
