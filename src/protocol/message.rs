// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request envelopes.

use std::ops::BitOr;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::MessageKind;

/// Bitmask selecting which sections a retrieve reply contains.
///
/// # Examples
///
/// ```
/// use atag_one::protocol::Info;
///
/// let info = Info::CONTROL | Info::REPORT;
/// assert_eq!(info.bits(), 9);
/// assert!(info.contains(Info::REPORT));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Info(u8);

impl Info {
    /// Nothing but the status group.
    pub const NONE: Self = Self(0);
    /// The `control` group.
    pub const CONTROL: Self = Self(1);
    /// Heating and hot water schedules.
    pub const SCHEDULES: Self = Self(2);
    /// The `configuration` group.
    pub const CONFIGURATION: Self = Self(4);
    /// The `report` group.
    pub const REPORT: Self = Self(8);
    /// The `status` group.
    pub const STATUS: Self = Self(16);
    /// Visible wifi networks.
    pub const WIFI_SCAN: Self = Self(32);
    /// The `report.details` sub-group.
    pub const DETAILS: Self = Self(64);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Info {
    fn default() -> Self {
        Self::CONTROL | Self::CONFIGURATION | Self::REPORT | Self::STATUS | Self::DETAILS
    }
}

impl BitOr for Info {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Serialize)]
struct AccountAuth<'a> {
    user_account: &'a str,
    mac_address: &'a str,
}

/// Builds request envelopes for one client identity.
///
/// Every message carries a sequence number that increases per builder.
#[derive(Debug)]
pub struct MessageBuilder {
    mail: String,
    mac: String,
    seqnr: AtomicU32,
}

impl MessageBuilder {
    /// Creates a builder for the given account and client identifier.
    #[must_use]
    pub fn new(mail: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            mail: mail.into(),
            mac: mac.into(),
            seqnr: AtomicU32::new(1),
        }
    }

    /// Builds a retrieve request.
    #[must_use]
    pub fn retrieve(&self, info: Info) -> Value {
        let mut body = Map::new();
        body.insert("info".into(), json!(info.bits()));
        self.envelope(MessageKind::Retrieve, body)
    }

    /// Builds an update request.
    ///
    /// `configuration` is omitted when empty.
    #[must_use]
    pub fn update(&self, control: Map<String, Value>, configuration: Map<String, Value>) -> Value {
        let mut body = Map::new();
        body.insert("control".into(), Value::Object(control));
        if !configuration.is_empty() {
            body.insert("configuration".into(), Value::Object(configuration));
        }
        self.envelope(MessageKind::Update, body)
    }

    /// Builds a pair request registering this client under `device_name`.
    #[must_use]
    pub fn pair(&self, device_name: &str) -> Value {
        let mut body = Map::new();
        body.insert(
            "accounts".into(),
            json!({
                "entries": [{
                    "user_account": self.mail,
                    "mac_address": self.mac,
                    "device_name": device_name,
                    "account_type": 1,
                }]
            }),
        );
        self.envelope(MessageKind::Pair, body)
    }

    fn envelope(&self, kind: MessageKind, mut body: Map<String, Value>) -> Value {
        let seqnr = self.seqnr.fetch_add(1, Ordering::Relaxed);
        body.insert("seqnr".into(), json!(seqnr));
        body.insert(
            "account_auth".into(),
            json!(AccountAuth {
                user_account: &self.mail,
                mac_address: &self.mac,
            }),
        );

        let mut envelope = Map::new();
        envelope.insert(kind.message_key().into(), Value::Object(body));
        Value::Object(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MessageBuilder {
        MessageBuilder::new("me@example.com", "02:11:22:33:44:55")
    }

    #[test]
    fn default_info_selects_report_sections() {
        let info = Info::default();
        assert_eq!(info.bits(), 93);
        assert!(info.contains(Info::REPORT));
        assert!(info.contains(Info::DETAILS));
        assert!(!info.contains(Info::SCHEDULES));
    }

    #[test]
    fn retrieve_envelope() {
        let msg = builder().retrieve(Info::CONTROL | Info::REPORT | Info::DETAILS);
        assert_eq!(
            msg,
            json!({
                "retrieve_message": {
                    "seqnr": 1,
                    "account_auth": {
                        "user_account": "me@example.com",
                        "mac_address": "02:11:22:33:44:55"
                    },
                    "info": 73
                }
            })
        );
    }

    #[test]
    fn pair_envelope_registers_self() {
        let msg = builder().pair("kitchen");
        let entry = &msg["pair_message"]["accounts"]["entries"][0];
        assert_eq!(entry["user_account"], "me@example.com");
        assert_eq!(entry["mac_address"], "02:11:22:33:44:55");
        assert_eq!(entry["device_name"], "kitchen");
        assert_eq!(entry["account_type"], 1);
        assert_eq!(
            msg["pair_message"]["account_auth"]["mac_address"],
            "02:11:22:33:44:55"
        );
    }

    #[test]
    fn update_envelope_omits_empty_configuration() {
        let mut control = Map::new();
        control.insert("ch_mode_temp".into(), json!(20.5));
        let msg = builder().update(control, Map::new());

        assert_eq!(msg["update_message"]["control"]["ch_mode_temp"], 20.5);
        assert!(msg["update_message"].get("configuration").is_none());
    }

    #[test]
    fn seqnr_increments() {
        let builder = builder();
        let first = builder.retrieve(Info::NONE);
        let second = builder.pair("x");
        assert_eq!(first["retrieve_message"]["seqnr"], 1);
        assert_eq!(second["pair_message"]["seqnr"], 2);
    }
}
