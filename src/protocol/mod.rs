// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire protocol for the ATAG One local REST API.
//!
//! The thermostat exposes three JSON endpoints below `http://<host>:10000/`:
//!
//! - `retrieve`: returns a report, selected by an [`Info`] mask
//! - `update`: writes control values
//! - `pair`: registers this client with the thermostat
//!
//! Requests go through a [`RequestChannel`], which spaces calls out and
//! retries dropped connections. The channel talks to the network through a
//! [`Transport`]; [`HttpTransport`] is the `reqwest` based implementation.

mod channel;
#[cfg(feature = "http")]
mod http;
mod message;

pub use channel::RequestChannel;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use message::{Info, MessageBuilder};

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// The three kinds of message the thermostat understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Report request.
    Retrieve,
    /// Control write.
    Update,
    /// Pairing request.
    Pair,
}

impl MessageKind {
    /// Endpoint path, relative to the API root.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Update => "update",
            Self::Pair => "pair",
        }
    }

    /// Top-level key of the request envelope.
    #[must_use]
    pub fn message_key(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve_message",
            Self::Update => "update_message",
            Self::Pair => "pair_message",
        }
    }

    /// Top-level key of the reply envelope.
    #[must_use]
    pub fn reply_key(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve_reply",
            Self::Update => "update_reply",
            Self::Pair => "pair_reply",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection was refused, reset or dropped mid-request.
    #[error("connection dropped: {0}")]
    ConnectionDropped(String),

    /// No reply arrived within the timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The thermostat answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The reply body is not valid JSON.
    #[error("invalid reply body: {0}")]
    InvalidBody(String),

    /// The URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other client-side protocol failure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Returns `true` for failures worth retrying on a fresh connection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionDropped(_))
    }
}

/// Capability needed to exchange JSON messages with the thermostat.
///
/// Implementations send one request and return the parsed reply body.
/// They do not retry, rate limit or interpret the reply; the
/// [`RequestChannel`] does that.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends `body` to `url` and returns the decoded JSON reply.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing why no usable reply arrived.
    async fn request(&self, url: &str, body: &Value) -> Result<Value, TransportError>;

    /// Releases any resources held by the transport.
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_route_to_paths() {
        assert_eq!(MessageKind::Retrieve.path(), "retrieve");
        assert_eq!(MessageKind::Update.path(), "update");
        assert_eq!(MessageKind::Pair.path(), "pair");
        assert_eq!(MessageKind::Pair.message_key(), "pair_message");
        assert_eq!(MessageKind::Update.reply_key(), "update_reply");
    }

    #[test]
    fn only_dropped_connections_are_transient() {
        assert!(TransportError::ConnectionDropped("reset".into()).is_transient());
        assert!(!TransportError::Timeout(Duration::from_secs(15)).is_transient());
        assert!(!TransportError::InvalidBody("<html>".into()).is_transient());
        assert!(!TransportError::InvalidUrl("http://".into()).is_transient());
        assert!(!TransportError::Status(500).is_transient());
    }
}
