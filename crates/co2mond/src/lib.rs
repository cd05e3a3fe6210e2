//! co2mond — the co2mon exporter daemon.
//!
//! Wires the subsystems together:
//! - Sensor binding (enumerate, open, register gauges)
//! - Sampling loop on its own thread
//! - Scrape endpoint (axum)
//!
//! A failed sensor read ends [`serve`] with an error so the process exits
//! and the supervisor can restart it.

use std::future::{Future, IntoFuture};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use co2mon_api::METRICS_PATH;
use co2mon_device::SensorTransport;
use co2mon_metrics::bind_sensors;

/// Bind sensors from `transport`, start sampling, and serve scrapes on
/// `listener` until `shutdown` resolves or a sensor read fails.
pub async fn serve<F>(
    listener: TcpListener,
    transport: &dyn SensorTransport,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    // ── Bind sensors ───────────────────────────────────────────

    let (bindings, sampler) = bind_sensors(transport).context("sensor setup failed")?;
    info!(sensors = bindings.len(), "sensor bindings ready");

    // ── Start sampling ─────────────────────────────────────────

    let sampler_failure = sampler
        .spawn()
        .context("failed to start sampling thread")?;

    // ── Start scrape server ────────────────────────────────────

    let addr = listener.local_addr()?;
    let router = co2mon_api::build_router(bindings);
    info!(%addr, path = METRICS_PATH, "serving metrics");

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .into_future();

    tokio::select! {
        result = server => {
            result?;
            info!("scrape server stopped");
            Ok(())
        }
        failure = sampler_failure => match failure {
            Ok(err) => {
                error!(error = %err, "sensor read failed, shutting down");
                Err(err).context("sampling loop terminated")
            }
            Err(_) => anyhow::bail!("sampling thread exited without reporting"),
        },
    }
}
