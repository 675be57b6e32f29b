// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport backed by `reqwest`.

use std::io;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::config::DeviceConfig;

use super::{Transport, TransportError};

/// User agent the official app sends.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; AtagOneAPI/x; http://atag.one/)";

/// [`Transport`] that POSTs JSON bodies over HTTP.
///
/// The thermostat closes connections after every reply, so keep-alive is
/// disabled.
///
/// # Examples
///
/// ```no_run
/// use atag_one::protocol::HttpTransport;
/// use std::time::Duration;
///
/// let transport = HttpTransport::new(Duration::from_secs(15))?;
/// # Ok::<(), atag_one::protocol::TransportError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Creates a transport using the timeout of `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: &DeviceConfig) -> Result<Self, TransportError> {
        Self::new(config.timeout())
    }

    fn map_error(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_builder() {
            TransportError::InvalidUrl(err.to_string())
        } else if err.is_connect() || is_connection_drop(err) {
            TransportError::ConnectionDropped(err.to_string())
        } else {
            TransportError::Protocol(err.to_string())
        }
    }
}

impl Transport for HttpTransport {
    async fn request(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let text = response.text().await.map_err(|e| self.map_error(&e))?;

        tracing::debug!(body = %text, "Received HTTP response");

        serde_json::from_str(&text).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}

/// Walks the error chain looking for a reset or aborted socket.
fn is_connection_drop(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        source = cause.source();
    }
    false
}
