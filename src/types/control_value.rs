// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Values accepted by control writes.

use std::fmt;

/// A value to write to a controllable field.
///
/// Numeric fields take a number. Enumerated fields take either the raw code
/// or its name, matched case-insensitively.
///
/// # Examples
///
/// ```
/// use atag_one::types::ControlValue;
///
/// let temp = ControlValue::from(20.5);
/// let mode = ControlValue::from("auto");
/// assert_eq!(temp, ControlValue::Number(20.5));
/// assert_eq!(mode, ControlValue::Name("auto".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    /// A numeric value or raw code.
    Number(f64),
    /// A named state of an enumerated field.
    Name(String),
}

impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for ControlValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for ControlValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u8> for ControlValue {
    fn from(value: u8) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for ControlValue {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for ControlValue {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}
