//! Metric bindings: one sensor identity paired with its two live gauges.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use co2mon_core::{Reading, SensorIdentity};

use crate::RegistryError;

/// Namespace prefix shared by every exported gauge.
pub const METRIC_PREFIX: &str = "meter";

/// Name and help text of one exported gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeDesc {
    pub name: String,
    pub help: String,
}

/// Live state for one sensor.
///
/// Temperature and CO2 sit behind a single lock so a scrape always sees a
/// pair taken from the same sample.
#[derive(Debug)]
pub struct MetricBinding {
    identity: SensorIdentity,
    path: String,
    temperature: GaugeDesc,
    co2: GaugeDesc,
    value: RwLock<Option<Reading>>,
}

impl MetricBinding {
    fn new(identity: SensorIdentity, path: &str) -> Self {
        let hex = identity.to_hex();
        Self {
            identity,
            path: path.to_string(),
            temperature: GaugeDesc {
                name: format!("{METRIC_PREFIX}_{hex}_temperature_celsius"),
                help: format!("Current temperature in Celsius for device {hex}"),
            },
            co2: GaugeDesc {
                name: format!("{METRIC_PREFIX}_{hex}_co2_ppm"),
                help: format!("Current CO2 level (ppm) for device {hex}"),
            },
            value: RwLock::new(None),
        }
    }

    pub fn identity(&self) -> SensorIdentity {
        self.identity
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn temperature(&self) -> &GaugeDesc {
        &self.temperature
    }

    pub fn co2(&self) -> &GaugeDesc {
        &self.co2
    }

    /// Replace both values with `reading`.
    pub fn publish(&self, reading: Reading) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(reading);
    }

    /// The most recent reading, or `None` before the first successful read.
    pub fn current(&self) -> Option<Reading> {
        *self.value.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collects bindings during startup and rejects duplicate metric names.
#[derive(Debug, Default)]
pub struct BindingSetBuilder {
    names: HashSet<String>,
    bindings: Vec<Arc<MetricBinding>>,
}

impl BindingSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the gauges for `identity` and append the binding.
    pub fn bind(
        &mut self,
        identity: SensorIdentity,
        path: &str,
    ) -> Result<Arc<MetricBinding>, RegistryError> {
        let binding = MetricBinding::new(identity, path);

        for name in [&binding.temperature.name, &binding.co2.name] {
            if self.names.contains(name) {
                return Err(RegistryError::Duplicate(name.clone()));
            }
        }
        self.names.insert(binding.temperature.name.clone());
        self.names.insert(binding.co2.name.clone());

        let binding = Arc::new(binding);
        self.bindings.push(binding.clone());
        debug!(%identity, %path, "metric binding registered");
        Ok(binding)
    }

    /// Freeze the set. No bindings can be added afterwards.
    pub fn build(self) -> BindingSet {
        BindingSet {
            bindings: self.bindings,
        }
    }
}

/// Every binding created at startup, in enumeration order.
#[derive(Debug, Default)]
pub struct BindingSet {
    bindings: Vec<Arc<MetricBinding>>,
}

impl BindingSet {
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricBinding> {
        self.bindings.iter().map(|b| b.as_ref())
    }
}
