//! Bridge discovery: SSDP broadcast first, NUPNP directory lookup as fallback.

use std::future::Future;
use std::time::Duration;

use log::info;

use crate::errors::Error;
use crate::nupnp::NupnpStrategy;
use crate::ssdp::SsdpStrategy;

type Result<T> = std::result::Result<T, Error>;

/// Bridges found by discovery, keyed by bridge id and valued by base URI.
///
/// Iteration follows the order in which ids were first seen. Seeing an id
/// again replaces its URI without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bridges {
    entries: Vec<(String, String)>,
}

impl Bridges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `uri` for `id`. Returns `true` if the id was not known yet.
    pub fn insert(&mut self, id: &str, uri: &str) -> bool {
        match self.entries.iter_mut().find(|(known, _)| known == id) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(uri);
                false
            }
            None => {
                self.entries.push((id.to_string(), uri.to_string()));
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, uri)| uri.as_str())
    }

    /// The bridge seen first.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.entries
            .first()
            .map(|(id, uri)| (id.as_str(), uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, uri)| (id.as_str(), uri.as_str()))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Bridges {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bridges = Bridges::new();
        for (id, uri) in iter {
            bridges.insert(id.as_ref(), uri.as_ref());
        }
        bridges
    }
}

impl IntoIterator for Bridges {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Tunables for discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How long to listen for SSDP replies, measured from the start of listening
    pub listen_window: Duration,
    /// Where the M-SEARCH request is sent
    pub ssdp_target: String,
    /// Remote directory queried when SSDP finds nothing
    pub nupnp_url: String,
    /// Timeout for the directory request
    pub http_timeout: Duration,
}

impl DiscoveryConfig {
    pub const DEFAULT_LISTEN_WINDOW: Duration = Duration::from_secs(5);
    pub const DEFAULT_SSDP_TARGET: &'static str = "239.255.255.250:1900";
    pub const DEFAULT_NUPNP_URL: &'static str = "https://www.meethue.com/api/nupnp";
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            listen_window: Self::DEFAULT_LISTEN_WINDOW,
            ssdp_target: Self::DEFAULT_SSDP_TARGET.to_string(),
            nupnp_url: Self::DEFAULT_NUPNP_URL.to_string(),
            http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// One way of finding bridges.
///
/// Strategies add what they find to a shared accumulator, so a later
/// strategy can see what an earlier one already found.
pub trait Strategy: Send + Sync {
    fn run(&self, bridges: &mut Bridges) -> impl Future<Output = Result<()>> + Send;
}

/// Anything that can produce the current set of bridges.
pub trait Discover: Send + Sync {
    fn discover(&self) -> impl Future<Output = Result<Bridges>> + Send;
}

/// Runs a primary strategy and, only when it found nothing, a fallback.
///
/// Each call to [`Discover::discover`] starts from an empty accumulator.
#[derive(Debug)]
pub struct BridgeDiscoverer<P = SsdpStrategy, F = NupnpStrategy> {
    primary: P,
    fallback: F,
}

impl BridgeDiscoverer {
    /// SSDP broadcast with NUPNP fallback.
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        Ok(Self::with_strategies(
            SsdpStrategy::new(config),
            NupnpStrategy::new(config)?,
        ))
    }
}

impl<P: Strategy, F: Strategy> BridgeDiscoverer<P, F> {
    pub fn with_strategies(primary: P, fallback: F) -> Self {
        BridgeDiscoverer { primary, fallback }
    }
}

impl<P: Strategy, F: Strategy> Discover for BridgeDiscoverer<P, F> {
    async fn discover(&self) -> Result<Bridges> {
        let mut bridges = Bridges::new();
        self.primary.run(&mut bridges).await?;

        if bridges.is_empty() {
            self.fallback.run(&mut bridges).await?;
        }

        info!("Discovered {} bridge(s)", bridges.len());
        Ok(bridges)
    }
}

/// Discover bridges on the local network with default settings.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use hue_bridge::discover_bridges;
///
/// let bridges = discover_bridges(Duration::from_secs(5)).await?;
/// for (id, uri) in bridges.iter() {
///     println!("{id} at {uri}");
/// }
/// ```
pub async fn discover_bridges(listen_window: Duration) -> Result<Bridges> {
    let config = DiscoveryConfig {
        listen_window,
        ..DiscoveryConfig::default()
    };
    BridgeDiscoverer::new(&config)?.discover().await
}
