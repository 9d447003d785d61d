//! # hue_bridge
//!
//! Find Philips Hue bridges on the local network, register an application
//! identity with one of them, and remember that identity across runs.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hue_bridge::{Error, Registrar};
//!
//! async fn connect() -> Result<(), Box<dyn std::error::Error>> {
//!     let registrar = Registrar::open()?;
//!
//!     // Reuse the stored identity, or register after the link button is pressed.
//!     let bridge = match registrar.resolve_default().await {
//!         Ok(bridge) => bridge,
//!         Err(Error::NotConfigured) => registrar.register_default().await?,
//!         Err(e) => return Err(e.into()),
//!     };
//!
//!     println!("{} via {}", bridge.application_id(), bridge.base_uri());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Discovery**: SSDP broadcast with a fixed listen window, falling back to
//!   the vendor's NUPNP directory when nothing answers ([`discover_bridges`],
//!   [`BridgeDiscoverer`])
//! - **Registration**: the link-button handshake and its failure modes
//!   ([`Registrar`], [`ApiError`])
//! - **Persistence**: bridge and application records as JSON files
//!   ([`ConfigStore`])
//!
//! ## Configuration directory
//!
//! [`ConfigStore::open`] uses `$HUE_CONFIG_DIR` when set, otherwise
//! `/etc/hue-lib`, falling back to `~/.hue-lib` when the system directory is
//! not writable.
//!
//! ## Logging
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade; install
//! any logger to see it.
//!
//! ## Limitations
//!
//! Households with several bridges are not supported: registration always
//! picks the first bridge discovered.

mod bridge;
mod config;
mod discovery;
mod errors;
mod nupnp;
mod percent;
mod registration;
mod response;
pub mod runtime;
mod ssdp;

// Re-export public API
pub use bridge::Bridge;
pub use config::{ApplicationRecord, BridgeRecord, ConfigStore};
pub use discovery::{
    BridgeDiscoverer, Bridges, Discover, DiscoveryConfig, Strategy, discover_bridges,
};
pub use errors::Error;
pub use nupnp::NupnpStrategy;
pub use percent::Percent;
pub use registration::{DEVICE_TYPE, Registrar, Removal};
pub use response::{ApiError, ApiErrorKind};
pub use ssdp::{M_SEARCH, SsdpStrategy};
