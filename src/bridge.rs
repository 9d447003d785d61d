//! Authenticated access to a single bridge.

use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::errors::Error;
use crate::response;

type Result<T> = std::result::Result<T, Error>;

/// Body of a registration request.
#[derive(Debug, Serialize)]
struct RegistrationRequest<'a> {
    devicetype: &'a str,
}

/// A bridge together with the application credential used to talk to it.
///
/// Obtained from [`Registrar::register_default`](crate::Registrar::register_default)
/// or [`Registrar::resolve_default`](crate::Registrar::resolve_default).
#[derive(Debug, Clone)]
pub struct Bridge {
    application_id: String,
    base_uri: String,
    client: Client,
}

impl Bridge {
    pub(crate) const TIMEOUT: Duration = Duration::from_secs(10);

    /// Wrap an existing credential. No network traffic happens here.
    pub fn new(application_id: &str, base_uri: &str) -> Result<Self> {
        Ok(Self::with_client(application_id, base_uri, http_client()?))
    }

    pub(crate) fn with_client(application_id: &str, base_uri: &str, client: Client) -> Self {
        Bridge {
            application_id: application_id.to_string(),
            base_uri: base_uri.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Ask the bridge at `base_uri` for a new application credential.
    ///
    /// The bridge only grants one while its link button has recently been
    /// pressed; otherwise this fails with [`Error::Api`].
    pub(crate) async fn register_with(
        client: &Client,
        base_uri: &str,
        device_type: &str,
    ) -> Result<Self> {
        let request = RegistrationRequest {
            devicetype: device_type,
        };
        let body = read_json(client.post(base_uri).json(&request).send().await?).await?;
        debug!("Registration response: {:?}", body);

        let username = response::registered_username(body)?;
        Ok(Self::with_client(&username, base_uri, client.clone()))
    }

    /// Revoke this application's credential on the bridge.
    pub async fn unregister(&self) -> Result<()> {
        let url = self.url(&format!("config/whitelist/{}", self.application_id));
        let body = read_json(self.client.delete(&url).send().await?).await?;
        debug!("Unregister response: {:?}", body);
        response::first_success(body).map(|_| ())
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// `<base uri>/<application id>/<path>`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_uri,
            self.application_id,
            path.trim_start_matches('/')
        )
    }
}

pub(crate) fn http_client() -> Result<Client> {
    Ok(Client::builder().timeout(Bridge::TIMEOUT).build()?)
}

/// Bridges answer errors with 200 and a JSON body, so the status is not checked.
async fn read_json(response: reqwest::Response) -> Result<Value> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(Error::JsonLoad)
}
