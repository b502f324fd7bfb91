use anyhow::{Context, Result};
use std::sync::Arc;
use tesy_bridge_adapter_tesy::TesyClient;
use tesy_bridge_agent::{Bridge, BridgeConfig, Bus};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Tesy bridge agent"
    );

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let client = TesyClient::new(&config.client).context("Failed to create Tesy client")?;
    let (bus, eventloop) = Bus::new(&config.bus, &config.bridge.device_id)
        .context("Failed to create MQTT binding")?;

    let (bridge, ticks) = Bridge::new(config.bridge, client, bus.sink());
    let bridge = Arc::new(bridge);

    tokio::spawn(bus.serve(eventloop, Arc::clone(&bridge)));

    tracing::info!("Bridge running, press Ctrl+C to stop");

    tokio::select! {
        () = Arc::clone(&bridge).run(ticks, config.retry) => {
            tracing::warn!("Poll loop ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    bridge.scheduler().stop();
    tracing::info!("Bridge stopped");
    Ok(())
}
