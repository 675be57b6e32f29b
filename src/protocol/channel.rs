// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rate-limited, serialized request channel.

use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::DeviceConfig;
use crate::error::{Error, RequestError, ResponseError, Result};

use super::{MessageKind, Transport, TransportError};

/// Serializes calls to one thermostat.
///
/// The thermostat handles a single client poorly when hammered, so:
///
/// - only one call is in flight at a time; other callers wait
/// - consecutive calls start at least `min_call_interval` apart
/// - a dropped connection is retried up to `max_retries` times, each retry
///   going through the same spacing
///
/// Dropping a pending [`send`](Self::send) future releases the gate.
#[derive(Debug)]
pub struct RequestChannel<T> {
    transport: T,
    base_url: RwLock<Option<String>>,
    min_call_interval: Duration,
    max_retries: u32,
    last_call: Mutex<Option<Instant>>,
}

impl<T: Transport> RequestChannel<T> {
    /// Creates a channel using the spacing and retry settings of `config`.
    pub fn new(transport: T, config: &DeviceConfig) -> Self {
        Self {
            transport,
            base_url: RwLock::new(config.base_url()),
            min_call_interval: config.min_call_interval(),
            max_retries: config.max_retries(),
            last_call: Mutex::new(None),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn set_base_url(&self, base_url: String) {
        *self.base_url.write() = Some(base_url);
    }

    /// Sends `payload` to the endpoint for `kind` and returns the JSON reply.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the connection kept dropping
    /// - [`Error::Response`] for non-success HTTP statuses and non-JSON replies
    /// - [`Error::Request`] for timeouts and bad URLs
    pub async fn send(&self, kind: MessageKind, payload: &Value) -> Result<Value> {
        let url = self
            .base_url
            .read()
            .as_ref()
            .map(|base| format!("{base}{}", kind.path()))
            .ok_or(RequestError::NoHost)?;

        let mut last_call = self.last_call.lock().await;
        let mut attempts = 0;

        loop {
            attempts += 1;
            self.wait_turn(&mut last_call).await;

            tracing::debug!(url = %url, kind = %kind, attempt = attempts, "Calling thermostat");

            match self.transport.request(&url, payload).await {
                Ok(reply) => {
                    tracing::debug!(kind = %kind, reply = %reply, "Received reply");
                    return Ok(reply);
                }
                Err(err) if err.is_transient() && attempts <= self.max_retries => {
                    tracing::debug!(error = %err, attempt = attempts, "Connection dropped, retrying");
                }
                Err(err) => return Err(classify(err, attempts)),
            }
        }
    }

    /// Closes the transport.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    async fn wait_turn(&self, last_call: &mut Option<Instant>) {
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_call_interval {
                let remaining = self.min_call_interval - elapsed;
                tracing::debug!(remaining_ms = remaining.as_millis(), "Sleeping before next call");
                tokio::time::sleep(remaining).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

fn classify(err: TransportError, attempts: u32) -> Error {
    match err {
        TransportError::ConnectionDropped(_) => Error::Connection {
            attempts,
            source: err,
        },
        TransportError::InvalidBody(body) => ResponseError::InvalidBody(body).into(),
        TransportError::Status(code) => ResponseError::Status(code).into(),
        TransportError::Timeout(_)
        | TransportError::InvalidUrl(_)
        | TransportError::Protocol(_)
        | TransportError::Closed => RequestError::Transport(err).into(),
    }
}
