pub mod config;
pub mod identity;
pub mod types;

pub use config::{ConfigError, ExporterConfig, ReportEncoding, parse_listen_address};
pub use identity::SensorIdentity;
pub use types::*;
