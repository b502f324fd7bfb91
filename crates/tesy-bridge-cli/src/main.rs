//! # Tesy Bridge CLI
//!
//! One-shot operations against the configured water heater, using the same
//! `TESY_*` environment as the agent.

use anyhow::{bail, Context, Result};
use std::env;
use tesy_bridge_adapter_tesy::TesyClient;
use tesy_bridge_agent::{Bridge, BridgeConfig, PollOutcome};
use tesy_bridge_core::{CapabilityChange, CapabilitySink, TargetHeaterCoolerState};
use tracing_subscriber::EnvFilter;

/// Changes are reported by the commands themselves.
struct Silent;

impl CapabilitySink for Silent {
    fn publish(&self, _change: &CapabilityChange) {}
}

type CliBridge = Bridge<TesyClient, Silent>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "login" => {
            connect().await?;
            println!("Login OK");
        }
        "status" => {
            let bridge = connect().await?;
            match bridge.refresh().await {
                PollOutcome::Updated(_) => {}
                PollOutcome::DeviceMissing => {
                    bail!("device {} not found on account", bridge.device_id())
                }
                PollOutcome::NotReady | PollOutcome::Failed => bail!("failed to fetch status"),
            }
            let report = serde_json::json!({
                "device_id": bridge.device_id(),
                "info": bridge.accessory_info(),
                "state": bridge.view().await,
                "status": bridge.status().await,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "power" => {
            let on = match args.get(2).map(String::as_str) {
                Some("on") => true,
                Some("off") => false,
                _ => usage("power <on|off>"),
            };
            let bridge = connect().await?;
            bridge.set_active(on).await.context("Power command failed")?;
            println!("Power {}", if on { "on" } else { "off" });
        }
        "mode" => {
            let target = match args.get(2).map(String::as_str) {
                Some("auto") => TargetHeaterCoolerState::Auto,
                Some("heat") => TargetHeaterCoolerState::Heat,
                _ => usage("mode <auto|heat>"),
            };
            let bridge = connect().await?;
            bridge
                .set_target_state(target)
                .await
                .context("Mode command failed")?;
            println!("Mode {target:?}");
        }
        "temp" => {
            let Some(value) = args.get(2).and_then(|v| v.parse::<f64>().ok()) else {
                usage("temp <value>")
            };
            let bridge = connect().await?;
            let sent = bridge
                .set_target_temperature(value)
                .await
                .context("Temperature command failed")?;
            println!("Target temperature {sent}");
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Build a bridge from the environment and log in.
async fn connect() -> Result<CliBridge> {
    let config = BridgeConfig::from_env().context("Invalid configuration")?;
    let client = TesyClient::new(&config.client).context("Failed to create Tesy client")?;
    let (bridge, _ticks) = Bridge::new(config.bridge, client, Silent);

    if !bridge.login().await {
        bail!("login failed");
    }
    Ok(bridge)
}

fn usage(command: &str) -> ! {
    eprintln!("Usage: tesy-bridge {command}");
    std::process::exit(1);
}

fn print_help() {
    println!(
        r"Tesy Bridge CLI

USAGE:
    tesy-bridge <COMMAND> [ARGS]

COMMANDS:
    login             Verify the configured credentials
    status            Print the device state as JSON
    power <on|off>    Switch the heater on or off
    mode <auto|heat>  Select eco (auto) or manual (heat) mode
    temp <value>      Set the target temperature (clamped to the range)
    help              Show this help message

ENVIRONMENT:
    TESY_DEVICE_ID, TESY_USERNAME, TESY_PASSWORD are required.
    See the agent documentation for the optional variables.

EXAMPLES:
    tesy-bridge status
    tesy-bridge temp 3
"
    );
}
