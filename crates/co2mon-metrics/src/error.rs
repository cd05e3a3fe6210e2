//! Error types for binding setup and sampling.

use thiserror::Error;

use co2mon_core::SensorIdentity;
use co2mon_device::DeviceError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate metric name: {0}")]
    Duplicate(String),
}

/// Startup failures. All of them abort the process.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Open(#[from] DeviceError),

    #[error("metric registration failed: {0}")]
    Registry(#[from] RegistryError),
}

/// A failed read in the sampling loop.
#[derive(Debug, Error)]
#[error("failed to read sensor {identity} at '{path}': {source}")]
pub struct SamplingError {
    pub identity: SensorIdentity,
    pub path: String,
    #[source]
    pub source: DeviceError,
}
