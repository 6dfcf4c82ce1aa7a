//! Persisted device settings: identity and network configuration.
//!
//! The storage medium is a shell concern behind [`SettingsStore`]; the core
//! owns the data model and the postcard blob codec so every store
//! implementation round-trips the same bytes. A load failure is not a fault:
//! the device boots with the documented defaults and can be (re)provisioned.

use core::net::Ipv4Addr;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Device name bound, matching the SSID length limit the provisioning AP
/// inherits from it.
pub const DEVICE_NAME_MAX: usize = 32;
pub const SERIAL_MAX: usize = 64;

/// Identity a factory-fresh device boots with.
pub const DEFAULT_DEVICE_NAME: &str = "Hearth Device";

/// Upper bound for the encoded settings blob.
pub const SETTINGS_BLOB_MAX: usize = 192;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("settings blob does not fit the encode buffer")]
    Encode,
    #[error("stored settings blob is malformed")]
    Decode,
}

/// Human-readable name plus the serial code the broker topics are keyed on.
/// The serial is immutable after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub name: heapless::String<DEVICE_NAME_MAX>,
    pub serial: heapless::String<SERIAL_MAX>,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            name: heapless::String::from_str(DEFAULT_DEVICE_NAME).unwrap_or_default(),
            serial: heapless::String::new(),
        }
    }
}

/// Station addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Addressing {
    #[default]
    Automatic,
    Static {
        local_ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet_mask: Ipv4Addr,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub addressing: Addressing,
}

/// Everything the settings store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeviceSettings {
    pub identity: DeviceIdentity,
    pub network: NetworkConfig,
}

/// Truncate an arbitrary string into a bounded settings field.
pub fn bounded<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in value.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Encode settings into `buf`, returning the used prefix.
pub fn encode<'a>(
    settings: &DeviceSettings,
    buf: &'a mut [u8],
) -> Result<&'a [u8], SettingsError> {
    postcard::to_slice(settings, buf)
        .map(|used| &*used)
        .map_err(|_| SettingsError::Encode)
}

/// Decode a settings blob previously produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<DeviceSettings, SettingsError> {
    postcard::from_bytes(bytes).map_err(|_| SettingsError::Decode)
}

/// Load/save of the persisted settings. Implemented by the shells (flash
/// blob on the device, a file or memory in the simulator and tests).
pub trait SettingsStore {
    type Error: core::fmt::Debug;

    fn load(&mut self) -> Result<DeviceSettings, Self::Error>;

    fn save(&mut self, settings: &DeviceSettings) -> Result<(), Self::Error>;
}
