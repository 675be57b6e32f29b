// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for ATAG One reports and controls.
//!
//! - [`BoilerStatus`] - burner / hot water / central heating activity
//! - [`AtagDateTime`] - timestamps counted from 2000-01-01 UTC
//! - [`ControlValue`] - numeric or named value for a control write

mod boiler_status;
mod control_value;
mod datetime;

pub use boiler_status::BoilerStatus;
pub use control_value::ControlValue;
pub use datetime::{AtagDateTime, DEVICE_EPOCH_UNIX};
