//! Sampling loop — keeps every binding's values fresh from its sensor.
//!
//! Sensors are read one after another, in binding order, with no delay
//! beyond the time each read blocks. The first failed read ends the loop;
//! deciding what to do about it is left to the caller.

use std::io;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{info, trace};

use co2mon_device::SensorHandle;

use crate::{MetricBinding, SamplingError};

/// Name of the OS thread running the sampling loop.
pub const THREAD_NAME: &str = "co2mon-sampler";

pub(crate) struct SamplerEntry {
    pub(crate) binding: Arc<MetricBinding>,
    pub(crate) handle: Box<dyn SensorHandle>,
}

/// Sole writer of the binding set. Owns every sensor handle.
pub struct Sampler {
    entries: Vec<SamplerEntry>,
}

impl Sampler {
    pub(crate) fn new(entries: Vec<SamplerEntry>) -> Self {
        Self { entries }
    }

    /// Number of sensors this sampler drives.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read every sensor once and publish each reading.
    ///
    /// Stops at the first failure: sensors later in the order keep their
    /// previous values.
    pub fn run_cycle(&mut self) -> Result<(), SamplingError> {
        for entry in &mut self.entries {
            let reading = entry.handle.read().map_err(|source| SamplingError {
                identity: entry.binding.identity(),
                path: entry.binding.path().to_string(),
                source,
            })?;

            entry.binding.publish(reading);
            trace!(
                identity = %entry.binding.identity(),
                temperature = reading.temperature_celsius,
                co2 = reading.co2_ppm,
                "reading published"
            );
        }
        Ok(())
    }

    /// Sample until a read fails, then return that failure.
    ///
    /// With no sensors there is nothing to sample and this never returns.
    pub fn run(mut self) -> SamplingError {
        info!(sensors = self.entries.len(), "sampling loop started");

        if self.entries.is_empty() {
            loop {
                std::thread::park();
            }
        }

        loop {
            if let Err(e) = self.run_cycle() {
                return e;
            }
        }
    }

    /// Run the loop on a dedicated thread.
    ///
    /// Sensor reads block, so the loop stays off the async runtime. The
    /// returned receiver resolves with the failure that ended the loop.
    pub fn spawn(self) -> io::Result<oneshot::Receiver<SamplingError>> {
        let (tx, rx) = oneshot::channel();
        std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let err = self.run();
                let _ = tx.send(err);
            })?;
        Ok(rx)
    }
}
