// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LAN discovery of ATAG One thermostats.
//!
//! The thermostat periodically broadcasts a short ASCII datagram on UDP port
//! 11000:
//!
//! ```text
//! ONE 6808-1401-3109_15-30-001-544 (ST)
//! ```
//!
//! The second token is the device id and the sender's address is the host
//! running the REST API. Discovery is a single wait for the first valid
//! announcement, bounded by a timeout.
//!
//! # Examples
//!
//! ```no_run
//! use atag_one::discovery::{discover, DiscoveryOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> atag_one::Result<()> {
//! let options = DiscoveryOptions::new().with_timeout(Duration::from_secs(60));
//! let found = discover(&options).await?;
//! println!("{} at {}", found.device_id, found.host);
//! # Ok(())
//! # }
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};

use crate::error::{RequestError, Result};

/// UDP port the thermostat announces itself on.
pub const DISCOVERY_PORT: u16 = 11000;

/// How long to wait for an announcement.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

const ANNOUNCEMENT_PREFIX: &str = "ONE";

/// Options for [`discover`].
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    timeout: Duration,
    bind_addr: SocketAddr,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DISCOVERY_PORT),
        }
    }
}

impl DiscoveryOptions {
    /// Listens on `0.0.0.0:11000` for 30 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to wait for an announcement.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the port to listen on.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Sets the local address to listen on.
    #[must_use]
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// The configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The configured listen address.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// A thermostat found on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Address the announcement came from.
    pub host: IpAddr,
    /// Device id from the announcement.
    pub device_id: String,
}

/// Waits for the first thermostat announcement.
///
/// # Errors
///
/// - [`RequestError::Socket`] if the port cannot be bound or read
/// - [`RequestError::DiscoveryTimeout`] if nothing valid arrives in time
pub async fn discover(options: &DiscoveryOptions) -> Result<DiscoveredDevice> {
    let socket = UdpSocket::bind(options.bind_addr)
        .await
        .map_err(RequestError::Socket)?;

    tracing::debug!(addr = %options.bind_addr, timeout_s = options.timeout.as_secs(), "Listening for thermostat");

    listen_on(&socket, options.timeout).await
}

/// Waits on an already bound socket for the first valid announcement.
///
/// Datagrams that are not announcements are skipped.
///
/// # Errors
///
/// Same as [`discover`].
pub async fn listen_on(socket: &UdpSocket, timeout: Duration) -> Result<DiscoveredDevice> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0_u8; 512];

    loop {
        let (len, from) = timeout_at(deadline, socket.recv_from(&mut buf))
            .await
            .map_err(|_| RequestError::DiscoveryTimeout(timeout))?
            .map_err(RequestError::Socket)?;

        match parse_announcement(&buf[..len]) {
            Ok(device_id) => {
                tracing::info!(host = %from.ip(), device_id = %device_id, "Discovered thermostat");
                return Ok(DiscoveredDevice {
                    host: from.ip(),
                    device_id,
                });
            }
            Err(err) => {
                tracing::debug!(from = %from, error = %err, "Ignoring datagram");
            }
        }
    }
}

/// Extracts the device id from an announcement datagram.
///
/// # Errors
///
/// Returns [`RequestError::InvalidAnnouncement`] unless the datagram is
/// ASCII text starting with `ONE` followed by a device id.
///
/// # Examples
///
/// ```
/// use atag_one::discovery::parse_announcement;
///
/// let id = parse_announcement(b"ONE 6808-1401-3109_15-30-001-544 (ST)").unwrap();
/// assert_eq!(id, "6808-1401-3109_15-30-001-544");
/// ```
pub fn parse_announcement(datagram: &[u8]) -> std::result::Result<String, RequestError> {
    let invalid = || RequestError::InvalidAnnouncement(String::from_utf8_lossy(datagram).into_owned());

    let text = std::str::from_utf8(datagram).map_err(|_| invalid())?;
    let mut tokens = text.split_whitespace();

    match (tokens.next(), tokens.next()) {
        (Some(ANNOUNCEMENT_PREFIX), Some(device_id)) => Ok(device_id.to_string()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn parses_announcement() {
        assert_eq!(
            parse_announcement(b"ONE 6808-1401-3109_15-30-001-544 (ST)").unwrap(),
            "6808-1401-3109_15-30-001-544"
        );
        assert_eq!(parse_announcement(b"ONE abc").unwrap(), "abc");
    }

    #[test]
    fn rejects_other_datagrams() {
        assert!(parse_announcement(b"ONE").is_err());
        assert!(parse_announcement(b"").is_err());
        assert!(parse_announcement(b"HELLO abc").is_err());
        assert!(matches!(
            parse_announcement(&[0xff, 0xfe]),
            Err(RequestError::InvalidAnnouncement(_))
        ));
    }

    #[test]
    fn default_options() {
        let options = DiscoveryOptions::new();
        assert_eq!(options.timeout(), Duration::from_secs(30));
        assert_eq!(options.bind_addr().port(), 11000);

        let options = options.with_port(12000).with_timeout(Duration::from_secs(1));
        assert_eq!(options.bind_addr().port(), 12000);
        assert_eq!(options.timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn receives_announcement() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"garbage", addr).await.unwrap();
        sender
            .send_to(b"ONE 6808-1401-3109_15-30-001-544 (ST)", addr)
            .await
            .unwrap();

        let found = listen_on(&listener, Duration::from_secs(5)).await.unwrap();
        assert_eq!(found.device_id, "6808-1401-3109_15-30-001-544");
        assert_eq!(found.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn times_out() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let err = listen_on(&listener, Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
        assert!(matches!(
            err,
            Error::Request(RequestError::DiscoveryTimeout(_))
        ));
    }
}
