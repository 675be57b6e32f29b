// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation of control writes.

use serde_json::{Map, Value, json};

use crate::error::RequestError;
use crate::report::tables::{self, field};
use crate::report::{SensorValue, decode_field};
use crate::types::{AtagDateTime, ControlValue};

/// Length of a vacation started through `ch_mode`.
const VACATION_SECONDS: i64 = 24 * 60 * 60;

/// A validated write, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ControlWrite {
    pub field: String,
    pub wire: Value,
    pub target: SensorValue,
}

impl ControlWrite {
    /// Checks that `field` is writable and converts `value` to its wire form.
    pub fn new(field_id: &str, value: &ControlValue) -> Result<Self, RequestError> {
        if !tables::is_controllable(field_id) {
            return Err(RequestError::NotControllable(field_id.to_string()));
        }

        let invalid = || RequestError::InvalidValue {
            field: field_id.to_string(),
            value: value.to_string(),
        };

        let wire = if tables::states(field_id).is_some() {
            let code = match value {
                ControlValue::Name(name) => tables::state_code(field_id, name),
                ControlValue::Number(n) => integral(*n)
                    .filter(|code| tables::state_name(field_id, *code).is_some()),
            }
            .ok_or_else(invalid)?;
            json!(code)
        } else {
            let number = match value {
                ControlValue::Number(n) => Some(*n),
                ControlValue::Name(text) => text.trim().parse::<f64>().ok(),
            }
            .filter(|n| n.is_finite())
            .ok_or_else(invalid)?;
            json!(number)
        };

        let target = decode_field(field_id, &wire).ok_or_else(invalid)?;

        Ok(Self {
            field: field_id.to_string(),
            wire,
            target,
        })
    }

    /// Builds the `control` and `configuration` groups of the update message.
    ///
    /// Switching `ch_mode` to vacation also starts a one day vacation now.
    pub fn into_groups(self) -> (Map<String, Value>, Map<String, Value>) {
        let mut control = Map::new();
        let mut configuration = Map::new();

        if self.field == field::CH_MODE && self.wire.as_i64() == Some(tables::CH_MODE_VACATION) {
            control.insert(field::VACATION_DURATION.into(), json!(VACATION_SECONDS));
            configuration.insert(
                field::START_VACATION.into(),
                json!(AtagDateTime::now().device_seconds()),
            );
        }
        control.insert(self.field, self.wire);

        (control, configuration)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 1.0e9).then_some(n as i64)
}
