//! SSDP (UDP multicast) bridge discovery.

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, info};
use uuid::Uuid;

use crate::discovery::{Bridges, DiscoveryConfig, Strategy};
use crate::errors::Error;
use crate::runtime::{self, AsyncUdpSocket, Instant, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// The search request sent to the discovery group.
pub const M_SEARCH: &str = "M-SEARCH * HTTP/1.1\r\n\
ST: ssdp:all\r\n\
MX: 10\r\n\
MAN: ssdp:discover\r\n\
HOST: 239.255.255.250:1900\r\n\
\r\n";

/// Substring identifying replies sent by a Hue bridge.
const VENDOR_MARKER: &str = "IpBridge";
const UUID_PREFIX: &str = "uuid:";
const UUID_LEN: usize = 36;

/// Broadcast an M-SEARCH and collect replies until the listen window closes.
#[derive(Debug, Clone)]
pub struct SsdpStrategy {
    target: String,
    listen_window: Duration,
}

impl SsdpStrategy {
    pub fn new(config: &DiscoveryConfig) -> Self {
        SsdpStrategy {
            target: config.ssdp_target.clone(),
            listen_window: config.listen_window,
        }
    }
}

impl Strategy for SsdpStrategy {
    async fn run(&self, bridges: &mut Bridges) -> Result<()> {
        info!("Bridge SSDP discovery");
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| Error::socket("bind", e))?;

        socket
            .set_broadcast(true)
            .map_err(|e| Error::socket("set_broadcast", e))?;

        socket
            .send_to(M_SEARCH.as_bytes(), &self.target)
            .await
            .map_err(|e| Error::socket("send_to", e))?;

        collect_replies(&socket, self.listen_window, bridges).await;
        Ok(())
    }
}

/// Receive datagrams until `window` has elapsed since the call started.
///
/// The deadline is fixed up front; replies arriving do not extend it.
/// Whatever was gathered stays in `bridges` when the deadline passes.
pub(crate) async fn collect_replies<S: AsyncUdpSocket>(
    socket: &S,
    window: Duration,
    bridges: &mut Bridges,
) {
    let deadline = Instant::now() + window;
    let mut buffer = [0u8; 2048];

    loop {
        match runtime::timeout_at(deadline, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, addr))) => record_reply(bridges, &buffer[..size], addr),
            Ok(Err(e)) => debug!("SSDP receive error: {}", e),
            Err(_) => {
                info!("SSDP listen window closed");
                return;
            }
        }
    }
}

/// Add the bridge announced by one datagram, if it is a bridge reply.
pub(crate) fn record_reply(bridges: &mut Bridges, datagram: &[u8], source: SocketAddr) {
    let Ok(message) = std::str::from_utf8(datagram) else {
        debug!("Ignoring non-text datagram from {}", source);
        return;
    };

    let Some(id) = parse_reply(message) else {
        debug!("Found {}: {}", source, message);
        return;
    };

    if bridges.insert(&id, &base_uri(source)) {
        info!("Found bridge ({}) with uuid: {}", source, id);
    }
}

/// Extract the bridge UUID from a reply.
///
/// A reply counts only if it carries the vendor marker, a `LOCATION` header
/// and a `uuid:` token followed by a well-formed 36 character UUID.
pub(crate) fn parse_reply(message: &str) -> Option<String> {
    if !message.contains(VENDOR_MARKER) || !has_location(message) {
        return None;
    }

    message.match_indices(UUID_PREFIX).find_map(|(start, _)| {
        let token = message.get(start + UUID_PREFIX.len()..)?.get(..UUID_LEN)?;
        Uuid::try_parse(token).ok().map(|_| token.to_string())
    })
}

fn has_location(message: &str) -> bool {
    message.lines().any(|line| {
        line.split_once(':').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("LOCATION") && !value.trim().is_empty()
        })
    })
}

fn base_uri(source: SocketAddr) -> String {
    match source {
        SocketAddr::V4(v4) => format!("http://{}/api", v4.ip()),
        SocketAddr::V6(v6) => format!("http://[{}]/api", v6.ip()),
    }
}
