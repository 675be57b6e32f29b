// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `atag_one` - async client for the local REST API of ATAG One thermostats.
//!
//! The thermostat serves a small JSON API on port 10000 of the local
//! network. This library pairs with it, polls its reports, decodes the
//! compact field encoding and writes control values.
//!
//! # Features
//!
//! - **Discovery**: find the thermostat through its UDP announcements
//! - **Pairing**: the one-time handshake confirmed on the thermostat
//! - **Reports**: boiler status, temperatures, modes and timestamps decoded
//!   into typed values
//! - **Controls**: heating preset, setpoints, control strategy and hot water
//! - **Gentle polling**: one call at a time, at least 5 seconds apart, with
//!   retries on dropped connections
//!
//! # Quick Start
//!
//! ```no_run
//! use atag_one::{AtagOne, DeviceConfig};
//!
//! #[tokio::main]
//! async fn main() -> atag_one::Result<()> {
//!     let thermostat = AtagOne::new(DeviceConfig::default().with_mail("me@example.com"))?;
//!
//!     // Find the thermostat on the LAN
//!     let found = thermostat.discover().await?;
//!     println!("found {} at {}", found.device_id, found.host);
//!
//!     // The first call pairs; confirm the prompt on the thermostat
//!     thermostat.refresh().await?;
//!
//!     println!(
//!         "{:?} {} (target {:?}), boiler: {:?}",
//!         thermostat.current_temperature(),
//!         thermostat.temperature_unit(),
//!         thermostat.target_temperature(),
//!         thermostat.boiler_status(),
//!     );
//!
//!     thermostat.set_temperature(20.5).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Custom transports
//!
//! [`AtagOne::with_transport`] accepts any [`protocol::Transport`], which
//! is how the HTTP layer is replaced in tests.

mod config;
mod device;
pub mod discovery;
pub mod error;
pub mod pairing;
pub mod protocol;
pub mod report;
pub mod types;

pub use config::DeviceConfig;
pub use device::AtagOne;
pub use discovery::{DiscoveredDevice, DiscoveryOptions};
pub use error::{Error, ErrorKind, RequestError, ResponseError, Result};
pub use pairing::PairingStatus;
#[cfg(feature = "http")]
pub use protocol::HttpTransport;
pub use protocol::{Info, MessageKind, Transport, TransportError};
pub use report::{DecodedValue, Report, ReportField, SensorValue};
pub use types::{AtagDateTime, BoilerStatus, ControlValue};
