// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of raw report fields.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::ResponseError;
use crate::protocol::MessageKind;
use crate::types::{AtagDateTime, BoilerStatus};

use super::tables::{self, field};
use super::{ControlField, DecodedValue, ReportField, SensorValue};

/// Groups that must be present in a retrieve reply.
const REQUIRED_GROUPS: &[&str] = &["report", "control", "status"];

/// Fields that must be present, as `(group, field)`.
const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("report", field::REPORT_TIME),
    ("report", field::BOILER_STATUS),
    ("control", field::CH_MODE),
];

/// Decodes one raw field.
///
/// Returns `None` for values that are not scalars (objects, arrays, null).
/// Lookups that miss fall back to the raw number; decoding never fails.
///
/// # Examples
///
/// ```
/// use atag_one::report::{decode_field, DecodedValue};
/// use serde_json::json;
///
/// let mode = decode_field("ch_mode", &json!(2)).unwrap();
/// assert_eq!(mode.state, DecodedValue::Enum("auto"));
/// assert_eq!(mode.state_orig, Some(2));
///
/// let unknown = decode_field("ch_mode", &json!(42)).unwrap();
/// assert_eq!(unknown.state, DecodedValue::Number(42.0));
/// ```
#[must_use]
pub fn decode_field(field_id: &str, raw: &Value) -> Option<SensorValue> {
    let state_orig = as_integer(raw);

    let state = match (field_id, state_orig) {
        (field::BOILER_STATUS, Some(code)) => DecodedValue::Boiler(BoilerStatus::from_raw(code)),
        (field::DHW_MODE_TEMP, Some(code)) => {
            DecodedValue::Number(to_f64(code % tables::DHW_MODE_TEMP_MODULUS))
        }
        (field::DHW_MODE_TEMP, None) if raw.is_number() => {
            DecodedValue::Number(raw.as_f64()? % to_f64(tables::DHW_MODE_TEMP_MODULUS))
        }
        (field::DOWNLOAD_URL, _) => {
            let url = raw.as_str()?;
            DecodedValue::Text(url.rsplit('/').next().unwrap_or(url).to_string())
        }
        (id, Some(seconds)) if tables::is_time(id) => AtagDateTime::from_device_seconds(seconds)
            .map_or(DecodedValue::Number(to_f64(seconds)), DecodedValue::Time),
        (id, Some(seconds)) if tables::is_duration(id) => u64::try_from(seconds).map_or(
            DecodedValue::Number(to_f64(seconds)),
            |secs| DecodedValue::Duration(Duration::from_secs(secs)),
        ),
        (id, Some(code)) if tables::states(id).is_some() => tables::state_name(id, code)
            .map_or(DecodedValue::Number(to_f64(code)), DecodedValue::Enum),
        _ => passthrough(raw)?,
    };

    Some(SensorValue { state, state_orig })
}

/// Decodes a complete retrieve reply into report fields.
///
/// `report.details` is merged into `report`. Fields from the `control`
/// group become [`ReportField::Control`]; everything else is a sensor.
///
/// # Errors
///
/// Returns [`ResponseError::MissingField`] naming the first required group
/// or field that is absent.
pub(crate) fn decode_reply(reply: &Value) -> Result<HashMap<String, ReportField>, ResponseError> {
    let reply_key = MessageKind::Retrieve.reply_key();
    let reply = reply
        .get(reply_key)
        .and_then(Value::as_object)
        .ok_or_else(|| ResponseError::MissingField(reply_key.to_string()))?;

    for group in REQUIRED_GROUPS {
        if !reply.get(*group).is_some_and(Value::is_object) {
            return Err(ResponseError::MissingField(format!("{reply_key}.{group}")));
        }
    }

    let report = merged_report(reply);

    for (group, id) in REQUIRED_FIELDS {
        let present = match *group {
            "report" => report.contains_key(*id),
            other => reply.get(other).and_then(|g| g.get(*id)).is_some(),
        };
        if !present {
            return Err(ResponseError::MissingField(format!("{reply_key}.{group}.{id}")));
        }
    }

    let mut fields = HashMap::new();
    let groups = [
        ("configuration", reply.get("configuration").and_then(Value::as_object)),
        ("status", reply.get("status").and_then(Value::as_object)),
        ("report", Some(&report)),
        ("control", reply.get("control").and_then(Value::as_object)),
    ];

    for (group, values) in groups {
        let Some(values) = values else { continue };
        for (id, raw) in values {
            let Some(value) = decode_field(id, raw) else {
                continue;
            };
            let entry = if group == "control" {
                ReportField::Control(ControlField::new(value))
            } else {
                ReportField::Sensor(value)
            };
            fields.insert(id.clone(), entry);
        }
    }

    Ok(fields)
}

/// Reads `retrieve_reply.status.device_id`.
pub(crate) fn decode_device_id(reply: &Value) -> Result<String, ResponseError> {
    reply
        .get(MessageKind::Retrieve.reply_key())
        .and_then(|r| r.get("status"))
        .and_then(|s| s.get(field::DEVICE_ID))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ResponseError::MissingField("retrieve_reply.status.device_id".to_string()))
}

/// Reads `<kind>_reply.acc_status`.
pub(crate) fn acc_status(reply: &Value, kind: MessageKind) -> Option<i64> {
    reply
        .get(kind.reply_key())
        .and_then(|r| r.get("acc_status"))
        .and_then(as_integer)
}

fn merged_report(reply: &Map<String, Value>) -> Map<String, Value> {
    let mut report = reply
        .get("report")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(Value::Object(details)) = report.remove("details") {
        report.extend(details);
    }
    report
}

fn passthrough(raw: &Value) -> Option<DecodedValue> {
    match raw {
        Value::Number(n) => n.as_f64().map(DecodedValue::Number),
        Value::String(s) => Some(DecodedValue::Text(s.clone())),
        Value::Bool(b) => Some(DecodedValue::Number(if *b { 1.0 } else { 0.0 })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(raw: &Value) -> Option<i64> {
    if let Some(n) = raw.as_i64() {
        return Some(n);
    }
    let f = raw.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: i64) -> f64 {
    n as f64
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_reply() -> Value {
        json!({
            "retrieve_reply": {
                "seqnr": 1,
                "acc_status": 2,
                "status": {
                    "device_id": "6808-1401-3109_15-30-001-544",
                    "device_status": 16385,
                    "connection_status": 23,
                    "date_time": 614_599_463
                },
                "report": {
                    "report_time": 614_599_463,
                    "burning_hours": 1225.5,
                    "room_temp": 20.3,
                    "outside_temp": 12.0,
                    "boiler_status": 10,
                    "details": {
                        "rel_mod_level": 32,
                        "boiler_temp": 55.1
                    }
                },
                "control": {
                    "ch_mode": 2,
                    "ch_mode_temp": 20.5,
                    "ch_control_mode": 0,
                    "dhw_mode_temp": 200,
                    "weather_status": 8,
                    "vacation_duration": 86400
                },
                "configuration": {
                    "temp_unit": 0,
                    "download_url": "http://firmware.atag-one.com/R58/1.0.93"
                }
            }
        })
    }

    #[test]
    fn boiler_status_scenario() {
        let value = decode_field(field::BOILER_STATUS, &json!(10)).unwrap();
        assert_eq!(
            value.state,
            DecodedValue::Boiler(BoilerStatus::from_raw(10))
        );
        match value.state {
            DecodedValue::Boiler(status) => assert_eq!(status.to_array(), [true, false, true]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(value.state_orig, Some(10));
    }

    #[test]
    fn boiler_status_ignores_low_bit() {
        for raw in 0..64 {
            assert_eq!(
                decode_field(field::BOILER_STATUS, &json!(raw)).unwrap().state,
                decode_field(field::BOILER_STATUS, &json!(raw | 1)).unwrap().state
            );
        }
    }

    #[test]
    fn time_fields_use_device_epoch() {
        let value = decode_field(field::REPORT_TIME, &json!(0)).unwrap();
        assert_eq!(
            value.state,
            DecodedValue::Time(AtagDateTime::from_device_seconds(0).unwrap())
        );
    }

    #[test]
    fn time_round_trip() {
        let original = AtagDateTime::from_device_seconds(614_599_463).unwrap();
        let value = decode_field(field::DATE_TIME, &json!(original.device_seconds())).unwrap();
        assert_eq!(value.state, DecodedValue::Time(original));
    }

    #[test]
    fn enum_miss_falls_back_to_raw() {
        let value = decode_field(field::WEATHER_STATUS, &json!(99)).unwrap();
        assert_eq!(value.state, DecodedValue::Number(99.0));
        assert_eq!(value.state_orig, Some(99));
    }

    #[test]
    fn dhw_mode_temp_is_reduced() {
        let value = decode_field(field::DHW_MODE_TEMP, &json!(200)).unwrap();
        assert_eq!(value.state, DecodedValue::Number(50.0));

        let value = decode_field(field::DHW_MODE_TEMP, &json!(60)).unwrap();
        assert_eq!(value.state, DecodedValue::Number(60.0));
    }

    #[test]
    fn fractional_dhw_mode_temp_is_reduced() {
        let value = decode_field(field::DHW_MODE_TEMP, &json!(200.5)).unwrap();
        assert_eq!(value.state, DecodedValue::Number(50.5));
        assert_eq!(value.state_orig, None);

        let value = decode_field(field::DHW_MODE_TEMP, &json!(55.5)).unwrap();
        assert_eq!(value.state, DecodedValue::Number(55.5));
    }

    #[test]
    fn unknown_fields_pass_through() {
        assert_eq!(
            decode_field("pcb_temp", &json!(31)).unwrap().state,
            DecodedValue::Number(31.0)
        );
        assert_eq!(
            decode_field("ch_water_pres", &json!(1.6)).unwrap().state,
            DecodedValue::Number(1.6)
        );
        assert_eq!(
            decode_field("device_id", &json!("abc")).unwrap().state,
            DecodedValue::Text("abc".into())
        );
        assert!(decode_field("wifi", &json!([1, 2])).is_none());
    }

    #[test]
    fn float_with_integral_value_keeps_raw_code() {
        let value = decode_field(field::CH_MODE, &json!(1.0)).unwrap();
        assert_eq!(value.state, DecodedValue::Enum("manual"));
        assert_eq!(value.state_orig, Some(1));
    }

    #[test]
    fn download_url_keeps_version() {
        let value = decode_field(
            field::DOWNLOAD_URL,
            &json!("http://firmware.atag-one.com/R58/1.0.93"),
        )
        .unwrap();
        assert_eq!(value.state, DecodedValue::Text("1.0.93".into()));
    }

    #[test]
    fn durations() {
        let value = decode_field(field::VACATION_DURATION, &json!(3600)).unwrap();
        assert_eq!(value.state, DecodedValue::Duration(Duration::from_secs(3600)));
    }

    #[test]
    fn decodes_full_reply() {
        let fields = decode_reply(&sample_reply()).unwrap();

        assert!(matches!(fields["room_temp"], ReportField::Sensor(_)));
        assert!(matches!(fields["ch_mode"], ReportField::Control(_)));
        assert_eq!(fields["rel_mod_level"].state(), DecodedValue::Number(32.0));
        assert_eq!(fields["ch_mode"].state(), DecodedValue::Enum("auto"));
        assert_eq!(fields["dhw_mode_temp"].state(), DecodedValue::Number(50.0));
        assert_eq!(fields["temp_unit"].state(), DecodedValue::Enum("°C"));
        assert_eq!(fields["connection_status"].state(), DecodedValue::Enum("cloud"));
        assert!(!fields.contains_key("details"));
    }

    #[test]
    fn missing_group_is_named() {
        let mut reply = sample_reply();
        reply["retrieve_reply"].as_object_mut().unwrap().remove("control");

        let err = decode_reply(&reply).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing field in response: retrieve_reply.control"
        );
    }

    #[test]
    fn missing_field_is_named() {
        let mut reply = sample_reply();
        reply["retrieve_reply"]["report"]
            .as_object_mut()
            .unwrap()
            .remove("boiler_status");

        let err = decode_reply(&reply).unwrap_err();
        assert!(
            matches!(err, ResponseError::MissingField(ref f) if f == "retrieve_reply.report.boiler_status")
        );
    }

    #[test]
    fn missing_envelope() {
        let err = decode_reply(&json!({"update_reply": {}})).unwrap_err();
        assert!(matches!(err, ResponseError::MissingField(ref f) if f == "retrieve_reply"));
    }

    #[test]
    fn reads_device_id_and_acc_status() {
        let reply = sample_reply();
        assert_eq!(
            decode_device_id(&reply).unwrap(),
            "6808-1401-3109_15-30-001-544"
        );
        assert_eq!(acc_status(&reply, MessageKind::Retrieve), Some(2));
        assert_eq!(acc_status(&reply, MessageKind::Update), None);
    }
}
