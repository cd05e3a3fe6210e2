//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use co2mon_core::{Reading, SensorDescriptor};

use crate::{DeviceError, SensorHandle, SensorTransport};

type Script = Arc<Mutex<VecDeque<Result<Reading, DeviceError>>>>;

struct FakeSensor {
    descriptor: SensorDescriptor,
    script: Script,
    reads: Arc<AtomicUsize>,
    openable: bool,
}

/// Transport whose sensors replay a fixed list of read outcomes.
///
/// Once a sensor's script is exhausted further reads report
/// [`DeviceError::Disconnected`].
#[derive(Default)]
pub struct FakeTransport {
    sensors: Vec<FakeSensor>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sensor at `path` that yields `script` in order.
    pub fn with_sensor(
        mut self,
        path: &str,
        script: Vec<Result<Reading, DeviceError>>,
    ) -> Self {
        self.sensors.push(FakeSensor {
            descriptor: SensorDescriptor::new(path),
            script: Arc::new(Mutex::new(script.into())),
            reads: Arc::new(AtomicUsize::new(0)),
            openable: true,
        });
        self
    }

    /// Add a sensor that enumerates but cannot be opened.
    pub fn with_unopenable(mut self, path: &str) -> Self {
        self.sensors.push(FakeSensor {
            descriptor: SensorDescriptor::new(path),
            script: Arc::default(),
            reads: Arc::new(AtomicUsize::new(0)),
            openable: false,
        });
        self
    }

    /// Number of reads performed against the sensor at `path`.
    pub fn read_count(&self, path: &str) -> usize {
        self.sensors
            .iter()
            .find(|s| s.descriptor.path == path)
            .map(|s| s.reads.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl SensorTransport for FakeTransport {
    fn enumerate(&self) -> Vec<SensorDescriptor> {
        self.sensors.iter().map(|s| s.descriptor.clone()).collect()
    }

    fn open(&self, descriptor: &SensorDescriptor) -> Result<Box<dyn SensorHandle>, DeviceError> {
        let sensor = self
            .sensors
            .iter()
            .find(|s| s.descriptor.path == descriptor.path && s.openable)
            .ok_or_else(|| DeviceError::Open {
                path: descriptor.path.clone(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "device busy"),
            })?;

        Ok(Box::new(FakeHandle {
            script: sensor.script.clone(),
            reads: sensor.reads.clone(),
        }))
    }
}

struct FakeHandle {
    script: Script,
    reads: Arc<AtomicUsize>,
}

impl SensorHandle for FakeHandle {
    fn read(&mut self) -> Result<Reading, DeviceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(DeviceError::Disconnected))
    }
}
