//! Async runtime seams.
//!
//! Discovery talks to the network through [`AsyncUdpSocket`] rather than a
//! concrete socket type, so the receive loop can be driven by a scripted socket
//! in tests. The production implementation is backed by tokio, which the HTTP
//! client requires anyway.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

mod tokio_impl;

pub use tokio_impl::*;

/// Trait for async UDP socket operations used by discovery.
pub trait AsyncUdpSocket: Send + Sync {
    /// Send data to a specific address.
    fn send_to(&self, buf: &[u8], addr: &str) -> impl Future<Output = io::Result<usize>> + Send;

    /// Receive data and the source address.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;
}

/// Run a future until `deadline`.
///
/// Returns `Err(TimedOut)` if the deadline passes before the future completes.
pub async fn timeout_at<F, T>(deadline: Instant, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    timeout_at_impl(deadline.0, future).await
}

/// Error returned when a timeout expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// A measurement of monotonically increasing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(InstantInner);

impl Instant {
    /// Returns the current instant.
    pub fn now() -> Self {
        Instant(InstantInner::now())
    }

    /// Returns the duration elapsed since this instant was created.
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

impl std::ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0 + rhs)
    }
}
