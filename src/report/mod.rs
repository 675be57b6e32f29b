// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded thermostat reports.
//!
//! A retrieve reply is a set of flat groups (`status`, `report`, `control`,
//! `configuration`) mapping field ids to integers, floats or strings. Many
//! integers are codes: bitmasks, enumerations or timestamps. This module
//! turns them into [`DecodedValue`]s.
//!
//! Fields from the `control` group can be written. After a successful write
//! the written value is shown for [`CONTROL_GRACE_PERIOD`], because the
//! thermostat takes a while to report it back.
//!
//! # Examples
//!
//! ```
//! use atag_one::report::{DecodedValue, Report};
//! use serde_json::json;
//!
//! let reply = json!({
//!     "retrieve_reply": {
//!         "status": {"device_id": "6808-1401-3109_15-30-001-544"},
//!         "report": {"report_time": 614599463, "boiler_status": 10, "room_temp": 20.5},
//!         "control": {"ch_mode": 2, "ch_mode_temp": 21.0}
//!     }
//! });
//!
//! let report = Report::from_reply(&reply).unwrap();
//! assert_eq!(report.state("ch_mode"), Some(DecodedValue::Enum("auto")));
//! assert_eq!(report.device_id(), Some("6808-1401-3109_15-30-001-544"));
//! ```

mod decoder;
pub(crate) mod tables;

pub use decoder::decode_field;
pub(crate) use decoder::{acc_status, decode_device_id};

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::error::ResponseError;
use crate::types::{AtagDateTime, BoilerStatus};

use tables::field;

/// How long a written control value is shown before the reported value
/// takes over again.
pub const CONTROL_GRACE_PERIOD: Duration = Duration::from_secs(15);

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// A measurement, setpoint, or a code without a known name.
    Number(f64),
    /// Free text.
    Text(String),
    /// Name of an enumerated state.
    Enum(&'static str),
    /// Decoded `boiler_status`.
    Boiler(BoilerStatus),
    /// A point in time.
    Time(AtagDateTime),
    /// A length of time.
    Duration(Duration),
}

impl DecodedValue {
    /// Returns the number, if this is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text or state name.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Enum(s) => Some(*s),
            _ => None,
        }
    }

    /// Returns the boiler status, if this is one.
    #[must_use]
    pub fn as_boiler_status(&self) -> Option<BoilerStatus> {
        match self {
            Self::Boiler(status) => Some(*status),
            _ => None,
        }
    }

    /// Returns the timestamp, if this is one.
    #[must_use]
    pub fn as_time(&self) -> Option<AtagDateTime> {
        match self {
            Self::Time(time) => Some(*time),
            _ => None,
        }
    }

    /// Returns the duration, if this is one.
    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Enum(s) => f.write_str(s),
            Self::Boiler(status) => write!(f, "{status}"),
            Self::Time(time) => write!(f, "{time}"),
            Self::Duration(d) => write!(f, "{}s", d.as_secs()),
        }
    }
}

/// Decoded view of one raw field.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorValue {
    /// The decoded value.
    pub state: DecodedValue,
    /// The raw integer, when the field was an integer.
    pub state_orig: Option<i64>,
}

/// A value written locally and not yet confirmed by a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlTarget {
    value: DecodedValue,
    set_at: Instant,
}

impl ControlTarget {
    pub(crate) fn new(value: DecodedValue) -> Self {
        Self {
            value,
            set_at: Instant::now(),
        }
    }

    /// The written value.
    #[must_use]
    pub fn value(&self) -> &DecodedValue {
        &self.value
    }

    /// When the write was acknowledged.
    #[must_use]
    pub fn set_at(&self) -> Instant {
        self.set_at
    }

    /// Returns `true` while inside the grace period.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.set_at.elapsed() < CONTROL_GRACE_PERIOD
    }
}

/// A writable field: the reported value plus an optional pending target.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlField {
    reported: SensorValue,
    target: Option<ControlTarget>,
}

impl ControlField {
    pub(crate) fn new(reported: SensorValue) -> Self {
        Self {
            reported,
            target: None,
        }
    }

    /// The value last reported by the thermostat.
    #[must_use]
    pub fn reported(&self) -> &SensorValue {
        &self.reported
    }

    /// The pending target, while it is still inside the grace period.
    #[must_use]
    pub fn target(&self) -> Option<&ControlTarget> {
        self.target.as_ref().filter(|t| t.is_active())
    }

    /// The target while active, the reported value otherwise.
    #[must_use]
    pub fn state(&self) -> DecodedValue {
        self.target().map_or_else(
            || self.reported.state.clone(),
            |target| target.value.clone(),
        )
    }
}

/// One field of a [`Report`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportField {
    /// Read-only field.
    Sensor(SensorValue),
    /// Writable field from the `control` group.
    Control(ControlField),
}

impl ReportField {
    /// The value callers should see.
    #[must_use]
    pub fn state(&self) -> DecodedValue {
        match self {
            Self::Sensor(value) => value.state.clone(),
            Self::Control(control) => control.state(),
        }
    }

    /// The value as last reported, ignoring any pending target.
    #[must_use]
    pub fn reported(&self) -> &SensorValue {
        match self {
            Self::Sensor(value) => value,
            Self::Control(control) => control.reported(),
        }
    }

    /// Returns `true` for writable fields.
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }
}

/// The last known state of the thermostat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    fields: HashMap<String, ReportField>,
}

impl Report {
    /// Decodes a retrieve reply.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::MissingField`] if a required group or field
    /// is missing.
    pub fn from_reply(reply: &Value) -> Result<Self, ResponseError> {
        decoder::decode_reply(reply).map(|fields| Self { fields })
    }

    /// Returns `true` if no report has been decoded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of known fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns a field by id.
    #[must_use]
    pub fn get(&self, field_id: &str) -> Option<&ReportField> {
        self.fields.get(field_id)
    }

    /// Returns the visible state of a field.
    #[must_use]
    pub fn state(&self, field_id: &str) -> Option<DecodedValue> {
        self.get(field_id).map(ReportField::state)
    }

    /// Iterates over `(id, field)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportField)> {
        self.fields.iter().map(|(id, f)| (id.as_str(), f))
    }

    /// Time the thermostat produced the report.
    #[must_use]
    pub fn report_time(&self) -> Option<AtagDateTime> {
        self.get(field::REPORT_TIME)?.reported().state.as_time()
    }

    /// Device id from the status group.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        match &self.get(field::DEVICE_ID)?.reported().state {
            DecodedValue::Text(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Temperature unit configured on the thermostat, `°C` if unknown.
    #[must_use]
    pub fn temperature_unit(&self) -> &'static str {
        match self.get(field::TEMP_UNIT).map(|f| &f.reported().state) {
            Some(DecodedValue::Enum(unit)) => *unit,
            _ => "°C",
        }
    }

    /// Unit of measurement of a field, if it has one.
    #[must_use]
    pub fn unit(&self, field_id: &str) -> Option<&'static str> {
        tables::unit(field_id, self.temperature_unit())
    }

    /// Folds the previous report into a freshly decoded one.
    ///
    /// Fields the new reply lacks keep their previous value. Pending targets
    /// survive while active and while the new report still disagrees.
    pub(crate) fn merge_previous(&mut self, previous: &Self) {
        for (id, old) in &previous.fields {
            let Some(new) = self.fields.get_mut(id) else {
                self.fields.insert(id.clone(), old.clone());
                continue;
            };
            if let (ReportField::Control(new), ReportField::Control(old)) = (new, old)
                && let Some(target) = old.target()
                && target.value != new.reported.state
            {
                new.target = Some(target.clone());
            }
        }
    }

    /// Records an acknowledged write.
    pub(crate) fn set_target(&mut self, field_id: &str, value: SensorValue) {
        let target = ControlTarget::new(value.state.clone());
        match self.fields.get_mut(field_id) {
            Some(ReportField::Control(control)) => control.target = Some(target),
            Some(entry) => {
                let reported = entry.reported().clone();
                *entry = ReportField::Control(ControlField {
                    reported,
                    target: Some(target),
                });
            }
            None => {
                self.fields.insert(
                    field_id.to_string(),
                    ReportField::Control(ControlField {
                        reported: value,
                        target: Some(target),
                    }),
                );
            }
        }
    }
}
