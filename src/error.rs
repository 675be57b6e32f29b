// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `atag_one` library.
//!
//! Every failure surfaced to callers is an [`Error`]. Its [`ErrorKind`]
//! tells which class of failure occurred:
//!
//! - [`ErrorKind::Unauthorized`]: pairing was rejected, or is required and missing
//! - [`ErrorKind::Request`]: the device could not be reached, the outbound
//!   request was malformed, or discovery timed out
//! - [`ErrorKind::Response`]: a reply arrived with a non-success HTTP status
//!   or could not be decoded
//! - [`ErrorKind::Connection`]: a transient network failure persisted after retries
//! - [`ErrorKind::Unknown`]: anything else

use std::time::Duration;

use thiserror::Error;

use crate::protocol::{MessageKind, TransportError};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Pairing was rejected by the thermostat, or has not completed yet.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request could not be sent or was refused.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// The reply could not be decoded.
    #[error("response error: {0}")]
    Response(#[from] ResponseError),

    /// The connection kept dropping after all retries were used.
    #[error("connection failed after {attempts} attempts: {source}")]
    Connection {
        /// Number of attempts made, including the first one.
        attempts: u32,
        /// The last transport failure.
        #[source]
        source: TransportError,
    },

    /// Uncategorized failure.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Unauthorized`].
    Unauthorized,
    /// See [`Error::Request`].
    Request,
    /// See [`Error::Response`].
    Response,
    /// See [`Error::Connection`].
    Connection,
    /// See [`Error::Unknown`].
    Unknown,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Request(_) => ErrorKind::Request,
            Self::Response(_) => ErrorKind::Response,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// Errors raised before or while sending a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The field cannot be written through the update endpoint.
    #[error("field is not controllable: {0}")]
    NotControllable(String),

    /// The value is not valid for the field.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// The field being written.
        field: String,
        /// The rejected value, as given by the caller.
        value: String,
    },

    /// The thermostat answered but did not accept the message.
    #[error("{kind} not acknowledged (acc_status {status:?})")]
    NotAcknowledged {
        /// Which message was refused.
        kind: MessageKind,
        /// The reported `acc_status`, if any.
        status: Option<i64>,
    },

    /// The transport refused or failed the request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No host is configured for the session.
    #[error("no host configured")]
    NoHost,

    /// No discovery announcement arrived in time.
    #[error("no thermostat announced itself within {0:?}")]
    DiscoveryTimeout(Duration),

    /// The discovery socket failed.
    #[error("discovery socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The discovery datagram did not have the expected shape.
    #[error("invalid discovery announcement: {0:?}")]
    InvalidAnnouncement(String),
}

/// Errors related to decoding thermostat replies.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The thermostat answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The body was not JSON at all.
    #[error("reply is not JSON: {0}")]
    InvalidBody(String),

    /// Expected group or field is missing from the reply.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// A field had an unexpected type.
    #[error("failed to decode {field}: {message}")]
    InvalidValue {
        /// The field that failed to decode.
        field: String,
        /// Description of the failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
