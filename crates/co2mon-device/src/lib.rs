//! co2mon-device — access to USB CO2 monitors.
//!
//! The rest of the workspace talks to sensors only through the
//! [`SensorTransport`] and [`SensorHandle`] traits:
//!
//! ```text
//! SensorTransport
//!   ├── enumerate() → Vec<SensorDescriptor>
//!   └── open(&descriptor) → Box<dyn SensorHandle>
//!
//! SensorHandle
//!   └── read() → Reading   (blocks until the device reports both values)
//! ```
//!
//! [`HidrawTransport`] drives real monitors through Linux hidraw nodes,
//! [`FakeTransport`] replays scripted readings for tests.

pub mod error;
pub mod fake;
pub mod frame;
pub mod hidraw;
pub mod transport;

pub use error::DeviceError;
pub use fake::FakeTransport;
pub use hidraw::HidrawTransport;
pub use transport::{SensorHandle, SensorTransport};
