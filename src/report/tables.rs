// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static lookup tables for report fields.

/// Field ids with special decoding.
pub mod field {
    pub const BOILER_STATUS: &str = "boiler_status";
    pub const REPORT_TIME: &str = "report_time";
    pub const DATE_TIME: &str = "date_time";
    pub const START_VACATION: &str = "start_vacation";
    pub const DEVICE_ID: &str = "device_id";
    pub const DOWNLOAD_URL: &str = "download_url";
    pub const TEMP_UNIT: &str = "temp_unit";

    pub const CH_MODE: &str = "ch_mode";
    pub const CH_MODE_TEMP: &str = "ch_mode_temp";
    pub const CH_CONTROL_MODE: &str = "ch_control_mode";
    pub const CH_MODE_DURATION: &str = "ch_mode_duration";
    pub const WEATHER_STATUS: &str = "weather_status";
    pub const CONNECTION_STATUS: &str = "connection_status";

    pub const DHW_MODE: &str = "dhw_mode";
    pub const DHW_MODE_TEMP: &str = "dhw_mode_temp";
    pub const DHW_TEMP_SETP: &str = "dhw_temp_setp";
    pub const DHW_WATER_TEMP: &str = "dhw_water_temp";
    pub const DHW_MIN_SET: &str = "dhw_min_set";
    pub const DHW_MAX_SET: &str = "dhw_max_set";

    pub const ROOM_TEMP: &str = "room_temp";
    pub const OUTSIDE_TEMP: &str = "outside_temp";
    pub const REL_MOD_LEVEL: &str = "rel_mod_level";

    pub const VACATION_DURATION: &str = "vacation_duration";
}

/// `ch_mode` code for vacation.
pub const CH_MODE_VACATION: i64 = 3;

/// Modulus recovering `dhw_mode_temp` from its encoded form.
pub const DHW_MODE_TEMP_MODULUS: i64 = 150;

const CH_MODE: &[(i64, &str)] = &[
    (1, "manual"),
    (2, "auto"),
    (3, "vacation"),
    (4, "extend"),
    (5, "fireplace"),
];

const CH_CONTROL_MODE: &[(i64, &str)] = &[(0, "weather"), (1, "room")];

const DHW_MODE: &[(i64, &str)] = &[(0, "comfort"), (1, "eco")];

const TEMP_UNIT: &[(i64, &str)] = &[(0, "°C"), (1, "°F")];

const WEATHER_STATUS: &[(i64, &str)] = &[
    (0, "sunny"),
    (1, "clear"),
    (2, "rainy"),
    (3, "snowy"),
    (4, "hail"),
    (5, "windy"),
    (6, "misty"),
    (7, "cloudy"),
    (8, "partly sunny"),
    (9, "partly cloudy"),
    (10, "showers"),
    (11, "lightning"),
    (12, "hurricane"),
    (13, "unknown"),
];

const CONNECTION_STATUS: &[(i64, &str)] = &[
    (0, "disconnected"),
    (7, "lan"),
    (23, "cloud"),
];

/// Returns the code table of an enumerated field.
pub fn states(field_id: &str) -> Option<&'static [(i64, &'static str)]> {
    match field_id {
        field::CH_MODE => Some(CH_MODE),
        field::CH_CONTROL_MODE => Some(CH_CONTROL_MODE),
        field::DHW_MODE => Some(DHW_MODE),
        field::TEMP_UNIT => Some(TEMP_UNIT),
        field::WEATHER_STATUS => Some(WEATHER_STATUS),
        field::CONNECTION_STATUS => Some(CONNECTION_STATUS),
        _ => None,
    }
}

/// Looks up the name of `code`.
pub fn state_name(field_id: &str, code: i64) -> Option<&'static str> {
    states(field_id)?
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Looks up the code of `name`, ignoring case.
pub fn state_code(field_id: &str, name: &str) -> Option<i64> {
    states(field_id)?
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

/// Fields counted in seconds since the device epoch.
pub fn is_time(field_id: &str) -> bool {
    matches!(
        field_id,
        field::REPORT_TIME | field::DATE_TIME | field::START_VACATION
    )
}

/// Fields counted in seconds of duration.
pub fn is_duration(field_id: &str) -> bool {
    matches!(
        field_id,
        field::CH_MODE_DURATION | field::VACATION_DURATION | "extend_duration" | "fireplace_duration"
    )
}

/// Fields writable through the update endpoint.
pub const CONTROLLABLE: &[&str] = &[
    field::CH_MODE,
    field::CH_MODE_TEMP,
    field::CH_CONTROL_MODE,
    field::DHW_TEMP_SETP,
    field::DHW_MODE,
];

/// Returns `true` if `field_id` may be written.
pub fn is_controllable(field_id: &str) -> bool {
    CONTROLLABLE.contains(&field_id)
}

/// Unit of measurement for a numeric field.
///
/// Temperatures use `temp_unit`, which comes from the configuration group.
pub fn unit<'a>(field_id: &str, temp_unit: &'a str) -> Option<&'a str> {
    match field_id {
        "tout_avg" | field::DHW_TEMP_SETP | "ch_setpoint" | field::DHW_MAX_SET | field::DHW_MIN_SET => {
            Some(temp_unit)
        }
        field::REL_MOD_LEVEL | "min_mod_level" => Some("%"),
        "voltage" => Some("V"),
        "current" => Some("mA"),
        "dhw_flow_rate" => Some("l/min"),
        "rssi" => Some("dBm"),
        id if id.ends_with("_temp") => Some(temp_unit),
        id if id.ends_with("_pres") => Some("bar"),
        id if id.ends_with("_hours") => Some("h"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_names_and_codes() {
        assert_eq!(state_name(field::CH_MODE, 2), Some("auto"));
        assert_eq!(state_name(field::CH_MODE, 9), None);
        assert_eq!(state_code(field::CH_MODE, "AUTO"), Some(2));
        assert_eq!(state_code(field::CH_CONTROL_MODE, "room"), Some(1));
        assert_eq!(state_code(field::CH_MODE_TEMP, "auto"), None);
    }

    #[test]
    fn classifies_fields() {
        assert!(is_time(field::REPORT_TIME));
        assert!(is_time(field::DATE_TIME));
        assert!(!is_time(field::ROOM_TEMP));
        assert!(is_duration("extend_duration"));
        assert!(is_controllable(field::CH_MODE_TEMP));
        assert!(!is_controllable(field::ROOM_TEMP));
    }

    #[test]
    fn units() {
        assert_eq!(unit(field::ROOM_TEMP, "°C"), Some("°C"));
        assert_eq!(unit("tout_avg", "°F"), Some("°F"));
        assert_eq!(unit("ch_water_pres", "°C"), Some("bar"));
        assert_eq!(unit("burning_hours", "°C"), Some("h"));
        assert_eq!(unit(field::REL_MOD_LEVEL, "°C"), Some("%"));
        assert_eq!(unit(field::BOILER_STATUS, "°C"), None);
    }
}
