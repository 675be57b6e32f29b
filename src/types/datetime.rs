// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat timestamps.
//!
//! The thermostat counts time in seconds since 2000-01-01T00:00:00 UTC rather
//! than since the Unix epoch. [`AtagDateTime`] converts between the two.
//!
//! # Examples
//!
//! ```
//! use atag_one::types::AtagDateTime;
//! use chrono::{Datelike, Timelike};
//!
//! let dt = AtagDateTime::from_device_seconds(3600).unwrap();
//! assert_eq!(dt.utc().year(), 2000);
//! assert_eq!(dt.utc().hour(), 1);
//! assert_eq!(dt.device_seconds(), 3600);
//! ```

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Unix timestamp of 2000-01-01T00:00:00 UTC.
pub const DEVICE_EPOCH_UNIX: i64 = 946_684_800;

/// An instant reported by (or sent to) the thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtagDateTime(DateTime<Utc>);

impl AtagDateTime {
    /// Converts seconds since the device epoch.
    ///
    /// Returns `None` if the result is outside chrono's supported range.
    #[must_use]
    pub fn from_device_seconds(seconds: i64) -> Option<Self> {
        let unix = seconds.checked_add(DEVICE_EPOCH_UNIX)?;
        DateTime::from_timestamp(unix, 0).map(Self)
    }

    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Seconds since the device epoch, truncated to whole seconds.
    #[must_use]
    pub fn device_seconds(&self) -> i64 {
        self.0.timestamp() - DEVICE_EPOCH_UNIX
    }

    /// The instant in UTC.
    #[must_use]
    pub const fn utc(&self) -> DateTime<Utc> {
        self.0
    }

    /// The instant in the local time zone.
    #[must_use]
    pub fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }
}

impl From<DateTime<Utc>> for AtagDateTime {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }
}

impl std::fmt::Display for AtagDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.local().format("%Y-%m-%d %H:%M:%S %:z"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn zero_is_device_epoch() {
        let dt = AtagDateTime::from_device_seconds(0).unwrap();
        assert_eq!(dt.utc(), Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn decodes_known_report_time() {
        // 2019-06-23 10:04:23 UTC
        let dt = AtagDateTime::from_device_seconds(614_599_463).unwrap();
        let utc = dt.utc();
        assert_eq!((utc.year(), utc.month(), utc.day()), (2019, 6, 23));
        assert_eq!((utc.hour(), utc.minute(), utc.second()), (10, 4, 23));
    }

    #[test]
    fn round_trips_through_device_seconds() {
        for seconds in [0, 1, 86_399, 614_599_463, 1_000_000_000] {
            let dt = AtagDateTime::from_device_seconds(seconds).unwrap();
            assert_eq!(dt.device_seconds(), seconds);
        }
    }

    #[test]
    fn local_is_same_instant() {
        let dt = AtagDateTime::from_device_seconds(614_599_463).unwrap();
        assert_eq!(dt.local().with_timezone(&Utc), dt.utc());
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(AtagDateTime::from_device_seconds(i64::MAX).is_none());
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(AtagDateTime::now().device_seconds() > 0);
    }
}
