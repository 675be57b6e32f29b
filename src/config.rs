// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::Info;

/// Connection parameters for one ATAG One thermostat.
///
/// Everything is fixed at construction, except the host which may be filled
/// in later by [`AtagOne::discover`](crate::AtagOne::discover).
///
/// # Examples
///
/// ```
/// use atag_one::DeviceConfig;
/// use std::time::Duration;
///
/// let config = DeviceConfig::new("192.168.1.20")
///     .with_mail("me@example.com")
///     .with_min_call_interval(Duration::from_secs(3));
///
/// assert_eq!(config.base_url().as_deref(), Some("http://192.168.1.20:10000/"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    host: Option<String>,
    port: u16,
    mail: String,
    mac: String,
    device_name: String,
    device_id: Option<String>,
    timeout: Duration,
    min_call_interval: Duration,
    max_retries: u32,
    info: Info,
}

impl DeviceConfig {
    /// Port the thermostat's REST API listens on.
    pub const DEFAULT_PORT: u16 = 10000;
    /// Per-request HTTP timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
    /// Minimum spacing between two calls to the thermostat.
    pub const DEFAULT_MIN_CALL_INTERVAL: Duration = Duration::from_secs(5);
    /// Retries after a dropped connection.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Label shown on the thermostat's pairing prompt.
    pub const DEFAULT_DEVICE_NAME: &'static str = "atag_one";

    /// Creates a configuration for a thermostat at a known host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the account (mail address) registered with the thermostat.
    #[must_use]
    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = mail.into();
        self
    }

    /// Sets the client identifier sent as `mac_address`.
    ///
    /// The thermostat remembers paired clients by this token, so reuse
    /// the same value across restarts to avoid pairing again.
    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = mac.into();
        self
    }

    /// Sets the label shown on the thermostat while pairing.
    #[must_use]
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Sets a device id learned earlier (for example by discovery).
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the minimum spacing between calls.
    #[must_use]
    pub fn with_min_call_interval(mut self, interval: Duration) -> Self {
        self.min_call_interval = interval;
        self
    }

    /// Sets how many times a dropped connection is retried.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets which report sections a retrieve asks for.
    #[must_use]
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Returns the host, if known.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub(crate) fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the account mail address.
    #[must_use]
    pub fn mail(&self) -> &str {
        &self.mail
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Returns the pairing label.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Returns the configured device id, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the minimum spacing between calls.
    #[must_use]
    pub fn min_call_interval(&self) -> Duration {
        self.min_call_interval
    }

    /// Returns the retry bound for dropped connections.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the retrieve info mask.
    #[must_use]
    pub fn info(&self) -> Info {
        self.info
    }

    /// Builds the API root, `http://<host>:<port>/`.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("http://{host}:{}/", self.port))
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: Self::DEFAULT_PORT,
            mail: String::new(),
            mac: generate_mac(),
            device_name: Self::DEFAULT_DEVICE_NAME.to_string(),
            device_id: None,
            timeout: Self::DEFAULT_TIMEOUT,
            min_call_interval: Self::DEFAULT_MIN_CALL_INTERVAL,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            info: Info::default(),
        }
    }
}

/// Derives a locally administered unicast MAC-style token from a random UUID.
fn generate_mac() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let mut octets = [0u8; 6];
    octets.copy_from_slice(&bytes[..6]);
    octets[0] = (octets[0] | 0x02) & 0xFE;
    octets
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = DeviceConfig::new("10.0.0.5");
        assert_eq!(config.host(), Some("10.0.0.5"));
        assert_eq!(config.port(), 10000);
        assert_eq!(config.mail(), "");
        assert_eq!(config.device_name(), "atag_one");
        assert!(config.device_id().is_none());
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.min_call_interval(), Duration::from_secs(5));
        assert_eq!(config.max_retries(), 3);
    }

    #[test]
    fn base_url_requires_host() {
        assert!(DeviceConfig::default().base_url().is_none());

        let config = DeviceConfig::new("atag.local").with_port(8080);
        assert_eq!(config.base_url().as_deref(), Some("http://atag.local:8080/"));
    }

    #[test]
    fn generated_mac_is_locally_administered() {
        let mac = generate_mac();
        let octets: Vec<u8> = mac
            .split(':')
            .map(|o| u8::from_str_radix(o, 16).unwrap())
            .collect();
        assert_eq!(octets.len(), 6);
        assert_eq!(octets[0] & 0x02, 0x02);
        assert_eq!(octets[0] & 0x01, 0);
    }

    #[test]
    fn mac_is_stable_per_config() {
        let config = DeviceConfig::new("h");
        let cloned = config.clone();
        assert_eq!(config.mac(), cloned.mac());
        assert_ne!(DeviceConfig::new("h").mac(), DeviceConfig::new("h").mac());
    }

    #[test]
    fn builder_chain() {
        let config = DeviceConfig::new("h")
            .with_mail("a@b.c")
            .with_mac("02:00:00:00:00:01")
            .with_device_name("kitchen")
            .with_device_id("6808-1401-3109_15-30-001-544")
            .with_max_retries(1);

        assert_eq!(config.mail(), "a@b.c");
        assert_eq!(config.mac(), "02:00:00:00:00:01");
        assert_eq!(config.device_name(), "kitchen");
        assert_eq!(config.device_id(), Some("6808-1401-3109_15-30-001-544"));
        assert_eq!(config.max_retries(), 1);
    }

    #[test]
    fn deserialize_partial_config() {
        let config: DeviceConfig =
            serde_json::from_str(r#"{"host": "10.0.0.9", "mail": "x@y.z"}"#).unwrap();
        assert_eq!(config.host(), Some("10.0.0.9"));
        assert_eq!(config.mail(), "x@y.z");
        assert_eq!(config.port(), DeviceConfig::DEFAULT_PORT);
    }
}
