// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session with one ATAG One thermostat.
//!
//! [`AtagOne`] ties the pieces together: it pairs with the thermostat on
//! first use, polls reports, writes controls and exposes the decoded state
//! through typed accessors.
//!
//! # Polling
//!
//! [`AtagOne::update`] is meant to run on a timer. It never fails; errors
//! are logged and the last good report is kept. Use [`AtagOne::refresh`]
//! when the caller needs to know whether the poll worked.
//!
//! ```no_run
//! use atag_one::{AtagOne, DeviceConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> atag_one::Result<()> {
//! let thermostat = AtagOne::new(DeviceConfig::new("192.168.1.20").with_mail("me@example.com"))?;
//!
//! loop {
//!     thermostat.update().await;
//!     println!("room: {:?}", thermostat.current_temperature());
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//! }
//! # }
//! ```
//!
//! # Writing controls
//!
//! ```no_run
//! use atag_one::{AtagOne, DeviceConfig};
//!
//! # async fn example() -> atag_one::Result<()> {
//! let thermostat = AtagOne::new(DeviceConfig::new("192.168.1.20"))?;
//!
//! thermostat.set_mode("auto").await?;
//! thermostat.set_temperature(20.5).await?;
//!
//! // Shown immediately, before the thermostat reports it back.
//! assert_eq!(thermostat.target_temperature(), Some(20.5));
//! # Ok(())
//! # }
//! ```

mod control;

use std::net::IpAddr;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::DeviceConfig;
use crate::discovery::{self, DiscoveredDevice, DiscoveryOptions};
use crate::error::{Error, RequestError, Result};
use crate::pairing::{ACC_STATUS_ACCEPTED, PairReply, PairingState, PairingStatus};
use crate::protocol::{Info, MessageBuilder, MessageKind, RequestChannel, Transport};
use crate::report::tables::field;
use crate::report::{DecodedValue, Report, ReportField, acc_status, decode_device_id};
use crate::types::{AtagDateTime, BoilerStatus, ControlValue};

#[cfg(feature = "http")]
use crate::protocol::HttpTransport;

use control::ControlWrite;

/// A session with one thermostat.
///
/// Each session owns its request gate, pairing state and report. Calls
/// from several tasks are serialized by the gate; share the session with
/// an `Arc` when needed.
#[derive(Debug)]
pub struct AtagOne<T> {
    config: RwLock<DeviceConfig>,
    channel: RequestChannel<T>,
    messages: MessageBuilder,
    pairing: Mutex<PairingState>,
    report: RwLock<Report>,
    device_id: RwLock<Option<String>>,
}

#[cfg(feature = "http")]
impl AtagOne<HttpTransport> {
    /// Creates a session talking HTTP to the configured host.
    ///
    /// Nothing is sent until the first operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the HTTP client cannot be built.
    pub fn new(config: DeviceConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config).map_err(RequestError::Transport)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> AtagOne<T> {
    /// Creates a session using a custom transport.
    ///
    /// A configured device id marks the session as already paired.
    pub fn with_transport(config: DeviceConfig, transport: T) -> Self {
        let device_id = config.device_id().map(str::to_string);
        Self {
            channel: RequestChannel::new(transport, &config),
            messages: MessageBuilder::new(config.mail(), config.mac()),
            pairing: Mutex::new(PairingState::new(device_id.is_some())),
            report: RwLock::new(Report::default()),
            device_id: RwLock::new(device_id),
            config: RwLock::new(config),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    /// Returns a copy of the session configuration.
    #[must_use]
    pub fn config(&self) -> DeviceConfig {
        self.config.read().clone()
    }

    /// Host the session talks to, if known.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        self.config.read().host().map(str::to_string)
    }

    /// Current pairing status.
    #[must_use]
    pub fn pairing_status(&self) -> PairingStatus {
        self.pairing.lock().status()
    }

    // ========== Network operations ==========

    /// Runs the pairing handshake unless already paired.
    ///
    /// When the thermostat accepts and the device id is not known yet, one
    /// retrieve with an empty info mask is sent to learn it.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if the thermostat rejects the request, or it
    ///   still waits for confirmation on its display
    /// - any channel error from sending the requests
    pub async fn pair(&self) -> Result<()> {
        if self.pairing.lock().is_paired() {
            return Ok(());
        }

        self.pairing.lock().on_request_sent();
        let payload = self.messages.pair(self.config.read().device_name());

        tracing::debug!("Sending pair request");
        let reply = self.channel.send(MessageKind::Pair, &payload).await?;
        let outcome = self
            .pairing
            .lock()
            .on_reply(acc_status(&reply, MessageKind::Pair));

        match outcome {
            Ok(PairReply::Accepted) => {
                let known = self.device_id.read().is_some();
                if !known {
                    let payload = self.messages.retrieve(Info::NONE);
                    let reply = self.channel.send(MessageKind::Retrieve, &payload).await?;
                    let device_id = decode_device_id(&reply)?;
                    *self.device_id.write() = Some(device_id);
                }
                self.pairing.lock().on_confirmed();
                tracing::info!(device_id = ?self.device_id(), "Paired with thermostat");
                Ok(())
            }
            Ok(PairReply::AwaitingConfirmation(code)) => {
                tracing::info!(acc_status = code, "Confirm pairing on the thermostat");
                Err(Error::Unauthorized(
                    "pairing waits for confirmation on the thermostat".to_string(),
                ))
            }
            Ok(PairReply::NoStatus) => {
                tracing::warn!("Pair reply carried no status");
                Err(Error::Unauthorized("pair reply carried no status".to_string()))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Pairing failed");
                Err(err)
            }
        }
    }

    /// Polls a fresh report, keeping the previous one on failure.
    pub async fn update(&self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(error = %err, kind = ?err.kind(), "Thermostat update failed");
        }
    }

    /// Polls a fresh report.
    ///
    /// Pairs first if needed. On success the new report replaces the old
    /// one; fields the reply lacks keep their last known value.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if pairing is incomplete or the thermostat
    ///   refuses the retrieve
    /// - [`Error::Response`] if the reply lacks a required group or field
    /// - any channel error
    pub async fn refresh(&self) -> Result<()> {
        self.pair().await?;

        let info = self.config.read().info();
        let payload = self.messages.retrieve(info);
        let reply = self.channel.send(MessageKind::Retrieve, &payload).await?;

        if let Some(status) = acc_status(&reply, MessageKind::Retrieve)
            && status != ACC_STATUS_ACCEPTED
        {
            return Err(Error::Unauthorized(format!(
                "retrieve refused by thermostat (acc_status {status})"
            )));
        }

        let report = Report::from_reply(&reply)?;
        self.store_report(report);
        Ok(())
    }

    fn store_report(&self, mut report: Report) {
        {
            let mut current = self.report.write();
            report.merge_previous(&current);
            tracing::debug!(fields = report.len(), report_time = ?report.report_time(), "Stored report");
            *current = report;
        }

        let reported = self.report.read().device_id().map(str::to_string);
        if let Some(id) = reported {
            let mut device_id = self.device_id.write();
            if device_id.is_none() {
                *device_id = Some(id);
            }
        }
    }

    /// Writes one control field.
    ///
    /// `value` is a number, or for enumerated fields the name of a state
    /// (`"auto"`, `"room"`, `"eco"`, ...). Once acknowledged, the written
    /// value is shown for [`CONTROL_GRACE_PERIOD`](crate::report::CONTROL_GRACE_PERIOD)
    /// even if reports still carry the old one. Writing the value already
    /// shown sends nothing.
    ///
    /// # Errors
    ///
    /// - [`RequestError::NotControllable`] / [`RequestError::InvalidValue`]
    ///   before anything is sent
    /// - [`Error::Unauthorized`] if pairing is incomplete
    /// - [`RequestError::NotAcknowledged`] if `acc_status` is not 2
    /// - any channel error
    pub async fn set(&self, field_id: &str, value: impl Into<ControlValue>) -> Result<bool> {
        let value = value.into();
        let write = ControlWrite::new(field_id, &value)?;

        let current = self.report.read().state(field_id);
        if current.as_ref() == Some(&write.target.state) {
            tracing::debug!(field = field_id, value = %value, "Control already at target");
            return Ok(true);
        }

        self.pair().await?;

        let target = write.target.clone();
        let (control, configuration) = write.into_groups();
        let payload = self.messages.update(control, configuration);
        let reply = self.channel.send(MessageKind::Update, &payload).await?;

        match acc_status(&reply, MessageKind::Update) {
            Some(ACC_STATUS_ACCEPTED) => {
                self.report.write().set_target(field_id, target);
                tracing::info!(field = field_id, value = %value, "Control value set");
                Ok(true)
            }
            status => Err(RequestError::NotAcknowledged {
                kind: MessageKind::Update,
                status,
            }
            .into()),
        }
    }

    /// Sets the heating preset: `manual`, `auto`, `vacation`, `extend` or
    /// `fireplace`.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_mode(&self, mode: &str) -> Result<bool> {
        self.set(field::CH_MODE, mode).await
    }

    /// Sets the room temperature setpoint.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_temperature(&self, temperature: f64) -> Result<bool> {
        self.set(field::CH_MODE_TEMP, temperature).await
    }

    /// Sets the control strategy: `weather` or `room`.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_hvac_mode(&self, mode: &str) -> Result<bool> {
        self.set(field::CH_CONTROL_MODE, mode).await
    }

    /// Sets the hot water setpoint.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub async fn set_dhw_temperature(&self, temperature: f64) -> Result<bool> {
        self.set(field::DHW_TEMP_SETP, temperature).await
    }

    /// Listens for the thermostat's announcement and points the session at it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] on timeout or socket failure.
    pub async fn discover(&self) -> Result<DiscoveredDevice> {
        self.discover_with(&DiscoveryOptions::new()).await
    }

    /// Like [`discover`](Self::discover) with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] on timeout or socket failure.
    pub async fn discover_with(&self, options: &DiscoveryOptions) -> Result<DiscoveredDevice> {
        let found = discovery::discover(options).await?;

        let host = match found.host {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        };
        let base_url = {
            let mut config = self.config.write();
            config.set_host(host);
            config.base_url()
        };
        if let Some(base_url) = base_url {
            self.channel.set_base_url(base_url);
        }
        *self.device_id.write() = Some(found.device_id.clone());

        Ok(found)
    }

    /// Closes the transport.
    pub async fn close(&self) {
        self.channel.close().await;
    }

    // ========== Derived state ==========

    /// Copy of the last decoded report.
    #[must_use]
    pub fn sensordata(&self) -> Report {
        self.report.read().clone()
    }

    /// Visible state of any field.
    #[must_use]
    pub fn state(&self, field_id: &str) -> Option<DecodedValue> {
        self.report.read().state(field_id)
    }

    /// Device id, from configuration, pairing, discovery or reports.
    #[must_use]
    pub fn device_id(&self) -> Option<String> {
        self.device_id.read().clone()
    }

    /// When the thermostat produced the last report.
    #[must_use]
    pub fn report_time(&self) -> Option<AtagDateTime> {
        self.report.read().report_time()
    }

    /// Room temperature.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.number(field::ROOM_TEMP)
    }

    /// Outside temperature.
    #[must_use]
    pub fn outside_temperature(&self) -> Option<f64> {
        self.number(field::OUTSIDE_TEMP)
    }

    /// Room temperature setpoint.
    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.number(field::CH_MODE_TEMP)
    }

    /// Heating preset, such as `auto` or `manual`.
    #[must_use]
    pub fn mode(&self) -> Option<String> {
        self.text(field::CH_MODE)
    }

    /// Control strategy, `weather` or `room`.
    #[must_use]
    pub fn hvac_mode(&self) -> Option<String> {
        self.text(field::CH_CONTROL_MODE)
    }

    /// Decoded boiler status.
    #[must_use]
    pub fn boiler_status(&self) -> Option<BoilerStatus> {
        self.state(field::BOILER_STATUS)?.as_boiler_status()
    }

    /// Returns `true` if the burner is lit.
    #[must_use]
    pub fn burner_active(&self) -> Option<bool> {
        self.boiler_status().map(|s| s.burner_active())
    }

    /// Returns `true` if central heating is running.
    #[must_use]
    pub fn ch_active(&self) -> Option<bool> {
        self.boiler_status().map(|s| s.ch_active())
    }

    /// Returns `true` if hot water is being heated.
    #[must_use]
    pub fn dhw_active(&self) -> Option<bool> {
        self.boiler_status().map(|s| s.dhw_active())
    }

    /// Relative modulation level while the burner is lit, 0 otherwise.
    #[must_use]
    pub fn flame_level(&self) -> Option<f64> {
        if self.burner_active()? {
            self.number(field::REL_MOD_LEVEL)
        } else {
            Some(0.0)
        }
    }

    /// Hot water temperature.
    #[must_use]
    pub fn dhw_temperature(&self) -> Option<f64> {
        self.number(field::DHW_WATER_TEMP)
    }

    /// Hot water setpoint.
    ///
    /// A setpoint written within the last 15 seconds wins. Otherwise, while
    /// hot water is idle the thermostat reports it in `dhw_mode_temp`.
    #[must_use]
    pub fn dhw_target_temperature(&self) -> Option<f64> {
        let written = match self.report.read().get(field::DHW_TEMP_SETP) {
            Some(ReportField::Control(control)) => {
                control.target().and_then(|t| t.value().as_f64())
            }
            _ => None,
        };
        if written.is_some() {
            return written;
        }

        if self.dhw_active() == Some(true) {
            self.number(field::DHW_TEMP_SETP)
        } else {
            self.number(field::DHW_MODE_TEMP)
                .or_else(|| self.number(field::DHW_TEMP_SETP))
        }
    }

    /// Lowest hot water setpoint the boiler accepts.
    #[must_use]
    pub fn dhw_min_temperature(&self) -> Option<f64> {
        self.number(field::DHW_MIN_SET)
    }

    /// Highest hot water setpoint the boiler accepts.
    #[must_use]
    pub fn dhw_max_temperature(&self) -> Option<f64> {
        self.number(field::DHW_MAX_SET)
    }

    /// How long the current heating preset lasts.
    #[must_use]
    pub fn mode_duration(&self) -> Option<Duration> {
        self.state(field::CH_MODE_DURATION)?.as_duration()
    }

    /// Hot water mode while heating water, `off` otherwise.
    #[must_use]
    pub fn dhw_operation(&self) -> Option<String> {
        if self.dhw_active()? {
            self.text(field::DHW_MODE)
        } else {
            Some("off".to_string())
        }
    }

    /// Temperature unit, `°C` or `°F`.
    #[must_use]
    pub fn temperature_unit(&self) -> &'static str {
        self.report.read().temperature_unit()
    }

    /// Firmware version, taken from the update download URL.
    #[must_use]
    pub fn api_version(&self) -> Option<String> {
        self.text(field::DOWNLOAD_URL)
    }

    fn number(&self, field_id: &str) -> Option<f64> {
        self.state(field_id)?.as_f64()
    }

    fn text(&self, field_id: &str) -> Option<String> {
        self.state(field_id).map(|v| v.to_string())
    }
}
