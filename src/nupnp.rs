//! NUPNP fallback: ask the vendor's directory which bridges share our address.

use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

use crate::discovery::{Bridges, DiscoveryConfig, Strategy};
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Query the remote NUPNP directory with a single GET.
#[derive(Debug, Clone)]
pub struct NupnpStrategy {
    client: Client,
    url: String,
}

impl NupnpStrategy {
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(NupnpStrategy {
            client,
            url: config.nupnp_url.clone(),
        })
    }
}

impl Strategy for NupnpStrategy {
    async fn run(&self, bridges: &mut Bridges) -> Result<()> {
        info!("Bridge NUPNP discovery");
        let body = self.client.get(&self.url).send().await?.text().await?;
        let found = parse_directory(&body, bridges);
        debug!("NUPNP directory listed {} bridge(s)", found);
        Ok(())
    }
}

/// Add every well-formed directory entry to `bridges`.
///
/// A body that is not a JSON array contributes nothing; entries lacking a
/// string `id` or `internalipaddress` are skipped one by one. Returns the
/// number of entries accepted.
pub(crate) fn parse_directory(body: &str, bridges: &mut Bridges) -> usize {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(body) else {
        debug!("Ignoring malformed NUPNP response");
        return 0;
    };

    let mut found = 0;
    for entry in &entries {
        let id = entry.get("id").and_then(|v| v.as_str());
        let ip = entry.get("internalipaddress").and_then(|v| v.as_str());
        if let (Some(id), Some(ip)) = (id, ip) {
            bridges.insert(id, &format!("http://{}/api", ip));
            found += 1;
        }
    }
    found
}
