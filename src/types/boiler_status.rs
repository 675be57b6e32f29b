// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boiler status bitmask.

use serde::{Deserialize, Serialize};

/// Bits of `boiler_status` that carry information. Bit 0 is ignored.
const MASK: i64 = 0b1110;
const BURNER: i64 = 0b1000;
const DHW: i64 = 0b0100;
const CH: i64 = 0b0010;

/// Decoded `boiler_status` field.
///
/// The raw value is masked with `0b1110`; bit 3 is the burner, bit 2 domestic
/// hot water and bit 1 central heating.
///
/// # Examples
///
/// ```
/// use atag_one::types::BoilerStatus;
///
/// let status = BoilerStatus::from_raw(10);
/// assert_eq!(status.to_array(), [true, false, true]);
/// assert_eq!(status.label(), "Heating CV");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoilerStatus {
    burner: bool,
    dhw: bool,
    ch: bool,
}

impl BoilerStatus {
    /// Decodes a raw `boiler_status` value.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        let bits = raw & MASK;
        Self {
            burner: bits & BURNER != 0,
            dhw: bits & DHW != 0,
            ch: bits & CH != 0,
        }
    }

    /// Returns `true` if the burner is lit.
    #[must_use]
    pub const fn burner_active(&self) -> bool {
        self.burner
    }

    /// Returns `true` if domestic hot water is being heated.
    #[must_use]
    pub const fn dhw_active(&self) -> bool {
        self.dhw
    }

    /// Returns `true` if central heating is active.
    #[must_use]
    pub const fn ch_active(&self) -> bool {
        self.ch
    }

    /// `[burner, dhw, ch]`.
    #[must_use]
    pub const fn to_array(&self) -> [bool; 3] {
        [self.burner, self.dhw, self.ch]
    }

    /// The masked bits this status was decoded from.
    #[must_use]
    pub fn bits(&self) -> u8 {
        u8::from(self.burner) << 3 | u8::from(self.dhw) << 2 | u8::from(self.ch) << 1
    }

    /// Human readable description, as shown by the thermostat's app.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match (self.burner, self.dhw, self.ch) {
            (true, true, true) => "Heating CV & Water",
            (true, true, false) => "Heating Water",
            (true, false, true) => "Heating CV",
            (true, false, false) => "Heating Boiler",
            (false, true, true) => "CV & Water active",
            (false, true, false) => "Water active",
            (false, false, true) => "CV active",
            (false, false, false) => "Idle",
        }
    }
}

impl std::fmt::Display for BoilerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
