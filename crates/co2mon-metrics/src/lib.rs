//! co2mon-metrics — live sensor values for the scrape endpoint.
//!
//! Binds every discovered sensor to a pair of gauges, keeps them fresh from
//! the hardware, and renders them in Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! bind_sensors(transport)
//!   ├── BindingSet (Arc) → render_prometheus() ← /metrics handler
//!   └── Sampler
//!         ├── run_cycle() → read every handle, publish each reading
//!         └── spawn() → dedicated thread, reports the terminal failure
//! ```
//!
//! The binding set is closed once setup finishes. The sampler is its only
//! writer; scrape handlers only read.

pub mod binding;
pub mod error;
pub mod prometheus;
pub mod sampler;
pub mod setup;

pub use binding::{BindingSet, BindingSetBuilder, MetricBinding};
pub use error::{RegistryError, SamplingError, SetupError};
pub use prometheus::render_prometheus;
pub use sampler::Sampler;
pub use setup::bind_sensors;
