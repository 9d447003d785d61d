//! Command-line front end for bridge discovery and registration.
//!
//! Run with: cargo run --example hue_cli -- --help

use clap::{Parser, Subcommand};
use hue_bridge::{BridgeDiscoverer, ConfigStore, Discover, DiscoveryConfig, Error, Registrar};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hue-cli")]
#[command(about = "Find Hue bridges and manage this machine's registration", long_about = None)]
struct Cli {
    /// Config directory (default: $HUE_CONFIG_DIR, /etc/hue-lib or ~/.hue-lib)
    #[arg(short, long, global = true)]
    config_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover bridges on the network
    Discover {
        /// SSDP listen window in seconds (default: 5)
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },

    /// List bridges remembered from earlier discoveries
    Bridges,

    /// Register with the first bridge found (press its link button first)
    Register,

    /// Show the registered application and its bridge
    Show,

    /// Unregister the application and forget it
    Remove,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = match cli.config_dir {
        Some(dir) => ConfigStore::new(dir),
        None => ConfigStore::open()?,
    };

    match cli.command {
        Commands::Discover { timeout } => {
            println!("Discovering bridges (timeout: {}s)...", timeout);
            let config = DiscoveryConfig {
                listen_window: Duration::from_secs(timeout),
                ..DiscoveryConfig::default()
            };
            let bridges = BridgeDiscoverer::new(&config)?.discover().await?;
            if bridges.is_empty() {
                println!("No bridges found on the network.");
            } else {
                println!("\nFound {} bridge(s):", bridges.len());
                for (id, uri) in bridges.iter() {
                    println!("  {:36}  {}", id, uri);
                }
            }
        }

        Commands::Bridges => {
            for bridge in store.bridges()? {
                println!("  {:36}  {}", bridge.id, bridge.uri);
            }
        }

        Commands::Register => {
            let discoverer = BridgeDiscoverer::new(&DiscoveryConfig::default())?;
            let registrar = Registrar::new(store, discoverer)?;
            match registrar.register_default().await {
                Ok(bridge) => println!(
                    "Registered {} with bridge at {}",
                    bridge.application_id(),
                    bridge.base_uri()
                ),
                Err(Error::Api(err)) if err.is_link_button_not_pressed() => {
                    eprintln!("Press the link button on the bridge and try again.")
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        Commands::Show => {
            let discoverer = BridgeDiscoverer::new(&DiscoveryConfig::default())?;
            let registrar = Registrar::new(store, discoverer)?;
            match registrar.resolve_default().await {
                Ok(bridge) => {
                    println!("Application: {}", bridge.application_id());
                    println!("Bridge:      {}", bridge.base_uri());
                }
                Err(Error::NotConfigured) => println!("Not registered. Run `register` first."),
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        Commands::Remove => {
            let discoverer = BridgeDiscoverer::new(&DiscoveryConfig::default())?;
            let registrar = Registrar::new(store, discoverer)?;
            let removal = registrar.remove_default().await?;
            match removal.unregister_error {
                None => println!("Removed {}", removal.application_id),
                Some(e) => println!(
                    "Removed {} locally; the bridge did not confirm: {}",
                    removal.application_id, e
                ),
            }
        }
    }

    Ok(())
}
