//! co2mon.toml configuration parser.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default scrape listen address: all interfaces, port 8080.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";

/// USB vendor id of the common AirCO2ntrol-family monitors.
pub const DEFAULT_VENDOR_ID: u16 = 0x04d9;

/// USB product id of the common AirCO2ntrol-family monitors.
pub const DEFAULT_PRODUCT_ID: u16 = 0xa052;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address '{0}'")]
    InvalidListenAddress(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub server: ServerConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
        }
    }
}

/// How a monitor encodes its input reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportEncoding {
    /// Work it out from the first report that is valid in only one encoding.
    #[default]
    Auto,
    /// Reports arrive in the clear (newer firmware).
    Plain,
    /// Reports are scrambled with the session key (older firmware).
    Scrambled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub sysfs_root: PathBuf,
    pub dev_root: PathBuf,
    pub encoding: ReportEncoding,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            sysfs_root: PathBuf::from("/sys/class/hidraw"),
            dev_root: PathBuf::from("/dev"),
            encoding: ReportEncoding::Auto,
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExporterConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Resolve a `host:port` listen address.
///
/// A bare `:port` binds every interface. Hostnames go through the system
/// resolver and the first result wins.
pub fn parse_listen_address(addr: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = || ConfigError::InvalidListenAddress(addr.to_string());

    let normalized = match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    };

    normalized
        .to_socket_addrs()
        .map_err(|_| invalid())?
        .next()
        .ok_or_else(invalid)
}
