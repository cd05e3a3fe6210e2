//! Startup binding: enumerate once, open every sensor, register its gauges.

use std::sync::Arc;

use tracing::{info, warn};

use co2mon_core::SensorIdentity;
use co2mon_device::SensorTransport;

use crate::sampler::SamplerEntry;
use crate::{BindingSet, BindingSetBuilder, Sampler, SetupError};

/// Bind every enumerated sensor, in enumeration order.
///
/// Finding no sensors is not an error. Failing to open any one of them, or
/// a metric name collision, aborts setup: there is no partial mode.
pub fn bind_sensors(
    transport: &dyn SensorTransport,
) -> Result<(Arc<BindingSet>, Sampler), SetupError> {
    let descriptors = transport.enumerate();
    if descriptors.is_empty() {
        warn!("no sensors found, serving without sensor metrics");
    }

    let mut builder = BindingSetBuilder::new();
    let mut entries = Vec::with_capacity(descriptors.len());

    for descriptor in &descriptors {
        let handle = transport.open(descriptor)?;
        let identity = SensorIdentity::from_path(&descriptor.path);
        let binding = builder.bind(identity, &descriptor.path)?;

        info!(
            path = %descriptor.path,
            serial = ?descriptor.serial,
            %identity,
            "sensor bound"
        );
        entries.push(SamplerEntry { binding, handle });
    }

    Ok((Arc::new(builder.build()), Sampler::new(entries)))
}
