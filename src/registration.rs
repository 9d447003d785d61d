//! Registering this installation with a bridge and resolving it later.

use log::{info, warn};
use reqwest::Client;

use crate::bridge::{self, Bridge};
use crate::config::{ApplicationRecord, BridgeRecord, ConfigStore};
use crate::discovery::{BridgeDiscoverer, Bridges, Discover, DiscoveryConfig};
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Device type announced to the bridge unless overridden.
pub const DEVICE_TYPE: &str = "hue-lib";

/// Outcome of [`Registrar::remove_default`].
#[derive(Debug)]
pub struct Removal {
    /// The credential that was removed locally
    pub application_id: String,
    /// Why the bridge did not revoke the credential, if it did not
    pub unregister_error: Option<Error>,
}

impl Removal {
    /// True when the bridge also revoked the credential.
    pub fn is_clean(&self) -> bool {
        self.unregister_error.is_none()
    }
}

/// Coordinates discovery, the registration handshake and the config store.
///
/// The default application moves between two states: unconfigured (no
/// record) and configured (one record). [`register_default`] goes from the
/// first to the second, [`remove_default`] goes back.
///
/// Only one bridge per installation is supported: when discovery finds
/// several, the first one seen is registered with.
///
/// [`register_default`]: Registrar::register_default
/// [`remove_default`]: Registrar::remove_default
///
/// # Example
///
/// ```ignore
/// use hue_bridge::{Error, Registrar};
///
/// let registrar = Registrar::open()?;
/// let bridge = match registrar.resolve_default().await {
///     Ok(bridge) => bridge,
///     Err(Error::NotConfigured) => registrar.register_default().await?,
///     Err(e) => return Err(e.into()),
/// };
/// println!("using {}", bridge.base_uri());
/// ```
#[derive(Debug)]
pub struct Registrar<D = BridgeDiscoverer> {
    store: ConfigStore,
    discoverer: D,
    client: Client,
    device_type: String,
}

impl Registrar {
    /// Use the installation's config directory and network discovery.
    pub fn open() -> Result<Self> {
        let discoverer = BridgeDiscoverer::new(&DiscoveryConfig::default())?;
        Registrar::new(ConfigStore::open()?, discoverer)
    }
}

impl<D: Discover> Registrar<D> {
    pub fn new(store: ConfigStore, discoverer: D) -> Result<Self> {
        Ok(Registrar {
            store,
            discoverer,
            client: bridge::http_client()?,
            device_type: DEVICE_TYPE.to_string(),
        })
    }

    /// Announce a different device type when registering.
    pub fn device_type(mut self, device_type: &str) -> Self {
        self.device_type = device_type.to_string();
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Register a new default application with the first bridge discovered.
    ///
    /// Someone has to press the bridge's link button shortly before this is
    /// called; otherwise the bridge refuses with [`Error::Api`].
    pub async fn register_default(&self) -> Result<Bridge> {
        if self.store.find_default_application()?.is_some() {
            return Err(Error::AlreadyRegistered);
        }

        let bridges = self.discover_and_cache().await?;
        let Some((bridge_id, uri)) = bridges.first() else {
            return Err(Error::NoBridgeFound);
        };

        info!("Registering new app with bridge {} at {}", bridge_id, uri);
        let bridge = Bridge::register_with(&self.client, uri, &self.device_type).await?;

        self.store
            .write_application(&ApplicationRecord::new(bridge_id, bridge.application_id()))?;
        Ok(bridge)
    }

    /// Build a [`Bridge`] for the stored default application.
    ///
    /// Uses the cached bridge address when there is one and only falls back
    /// to discovery when the bridge is not cached.
    pub async fn resolve_default(&self) -> Result<Bridge> {
        let application = self.store.default_application()?;

        let uri = match self.store.find_bridge(&application.bridge_id)? {
            Some(record) => record.uri,
            None => {
                info!(
                    "Bridge {} not cached, running discovery",
                    application.bridge_id
                );
                let bridges = self.discover_and_cache().await?;
                bridges
                    .get(&application.bridge_id)
                    .map(String::from)
                    .ok_or_else(|| Error::BridgeNotFound(application.bridge_id.clone()))?
            }
        };

        Ok(Bridge::with_client(
            &application.application_id,
            &uri,
            self.client.clone(),
        ))
    }

    /// Unregister the default application and forget it locally.
    ///
    /// The local record is deleted even when the bridge refuses or cannot be
    /// reached; the failure is returned in [`Removal::unregister_error`].
    pub async fn remove_default(&self) -> Result<Removal> {
        let bridge = self.resolve_default().await?;

        let unregister_error = match bridge.unregister().await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    "Failed to unregister {} at {}: {}",
                    bridge.application_id(),
                    bridge.base_uri(),
                    e
                );
                Some(e)
            }
        };

        self.store.delete_default_application()?;
        Ok(Removal {
            application_id: bridge.application_id().to_string(),
            unregister_error,
        })
    }

    /// Discover bridges and remember every one of them.
    async fn discover_and_cache(&self) -> Result<Bridges> {
        let bridges = self.discoverer.discover().await?;
        for (id, uri) in bridges.iter() {
            self.store.write_bridge(&BridgeRecord::new(id, uri))?;
        }
        Ok(bridges)
    }
}
