//! Transport traits consumed by the binding setup and the sampler.

use co2mon_core::{Reading, SensorDescriptor};

use crate::DeviceError;

/// An open connection to one physical sensor.
///
/// Handles are owned by exactly one sampler entry and never shared, so
/// `read` takes `&mut self` and implementations need no locking.
pub trait SensorHandle: Send {
    /// Produce one reading. May block until the hardware reports data.
    fn read(&mut self) -> Result<Reading, DeviceError>;
}

/// Discovers and opens sensors.
pub trait SensorTransport {
    /// List the attached sensors. An empty list is the only failure mode.
    fn enumerate(&self) -> Vec<SensorDescriptor>;

    fn open(&self, descriptor: &SensorDescriptor) -> Result<Box<dyn SensorHandle>, DeviceError>;
}
