//! Shared types used across co2mon crates.

use serde::{Deserialize, Serialize};

/// A sensor found during enumeration.
///
/// The `path` is unique per physical connection point. The vendor serial is
/// informational only: many monitors of the same model report the same one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub path: String,
    pub serial: Option<String>,
}

impl SensorDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            serial: None,
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }
}

/// One physical sample: both values come from the same read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature_celsius: f64,
    pub co2_ppm: u32,
}

impl Reading {
    pub fn new(temperature_celsius: f64, co2_ppm: u32) -> Self {
        Self {
            temperature_celsius,
            co2_ppm,
        }
    }
}
