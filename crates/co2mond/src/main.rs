//! co2mond — USB CO2 monitor exporter.
//!
//! # Usage
//!
//! ```text
//! co2mond [LISTEN_ADDRESS] [--config /etc/co2mon.toml]
//! co2mond :9101
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use co2mon_core::{ExporterConfig, parse_listen_address};
use co2mon_device::HidrawTransport;

#[derive(Parser, Debug)]
#[command(name = "co2mond", about = "Prometheus exporter for USB CO2 monitors", version)]
struct Cli {
    /// The address to listen on for HTTP requests (host:port or :port).
    /// Defaults to :8080 unless set in the config file.
    listen_address: Option<String>,

    /// Path to a co2mon.toml configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ExporterConfig::default(),
        };
        if let Some(addr) = &self.listen_address {
            config.server.listen_address = addr.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,co2mond=debug,co2mon=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let addr = parse_listen_address(&config.server.listen_address)?;

    info!(
        vendor_id = format_args!("{:04x}", config.device.vendor_id),
        product_id = format_args!("{:04x}", config.device.product_id),
        "co2mond starting"
    );

    let transport = HidrawTransport::new(&config.device);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    co2mond::serve(listener, &transport, shutdown_signal()).await?;

    info!("co2mond stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_listen_address() {
        let cli = Cli::try_parse_from(["co2mond"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.server.listen_address, ":8080");
    }

    #[test]
    fn positional_listen_address() {
        let cli = Cli::try_parse_from(["co2mond", "127.0.0.1:9101"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.server.listen_address, "127.0.0.1:9101");
    }

    #[test]
    fn cli_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nlisten_address = \":9200\"\n\n[device]\nproduct_id = 0xa053"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["co2mond", "--config", path]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.server.listen_address, ":9200");
        assert_eq!(config.device.product_id, 0xa053);

        let cli = Cli::try_parse_from(["co2mond", ":9300", "--config", path]).unwrap();
        assert_eq!(cli.resolve_config().unwrap().server.listen_address, ":9300");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["co2mond", "--config", "/nonexistent/co2mon.toml"]).unwrap();
        assert!(cli.resolve_config().is_err());
    }
}
