//! Discovery and client settings, loadable from TOML
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock behaviour: one search round, one second of receive inactivity.

use crate::error::{RaumfeldError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";
pub const MEDIA_RENDERER_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:MediaRenderer:1";
pub const DEFAULT_DESCRIPTOR_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings of a single discovery pass
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Receive inactivity that ends a search round
    #[serde(with = "secs_f64")]
    pub timeout: Duration,
    /// Number of search rounds
    pub retries: u32,
    /// Where M-SEARCH requests are sent
    pub search_addr: SocketAddr,
    /// `ST` header of the request
    pub search_target: String,
    pub multicast_ttl: u32,
    /// Per-device client settings used when resolving locations
    pub device: DeviceOptions,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            retries: 1,
            search_addr: SSDP_MULTICAST_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([239, 255, 255, 250], 1900))),
            search_target: MEDIA_RENDERER_DEVICE_TYPE.to_string(),
            multicast_ttl: 2,
            device: DeviceOptions::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RaumfeldError::Config {
            reason: e.to_string(),
        })
    }

    /// Load settings from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| RaumfeldError::Config {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        tracing::info!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }
}

/// Timeouts used by a device handle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceOptions {
    #[serde(with = "secs_f64")]
    pub descriptor_timeout: Duration,
    #[serde(with = "secs_f64")]
    pub control_timeout: Duration,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            descriptor_timeout: DEFAULT_DESCRIPTOR_TIMEOUT,
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
        }
    }
}

/// Durations are written as (fractional) seconds in config files
mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
