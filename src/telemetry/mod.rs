// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of `/1/devices` payloads into sensor readings.
//!
//! Parsing never fails. A body that is not a JSON array reads as an empty
//! device list, and any field missing from the selected device reads as
//! `None` (or `false` for motion).
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use remo_sensor::telemetry::parse_reading;
//!
//! let body = r#"[{"newest_events":{"hu":{"val":100},"te":{"val":35}}}]"#;
//! let reading = parse_reading(body, None, Utc::now());
//!
//! assert_eq!(reading.humidity(), Some(100.0));
//! assert_eq!(reading.temperature(), Some(35.0));
//! assert_eq!(reading.light(), None);
//! assert!(!reading.motion());
//! ```

mod device_record;

pub use device_record::{DeviceRecord, NewestEvents, select_device};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::reading::Reading;

/// How long a motion event counts as current motion.
pub const MOTION_WINDOW: TimeDelta = TimeDelta::milliseconds(300_000);

/// Decodes a device list, degrading malformed input to an empty list.
///
/// Entries that are not JSON objects are kept as empty records so list
/// positions stay intact. Within an object, a field of the wrong shape
/// reads as absent without affecting the other fields.
#[must_use]
pub fn decode_devices(body: &str) -> Vec<DeviceRecord> {
    match serde_json::from_str::<Vec<serde_json::Value>>(body) {
        Ok(entries) => entries
            .into_iter()
            .map(|entry| DeviceRecord::deserialize(entry).unwrap_or_default())
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Response body is not a device list, treating as empty");
            Vec::new()
        }
    }
}

/// Parses a response body into a reading for the selected device.
///
/// # Arguments
///
/// * `body` - The raw response body (a JSON array of device records)
/// * `device_name` - Optional name used to select the device
/// * `now` - Reference time for deciding whether motion is recent
#[must_use]
pub fn parse_reading(body: &str, device_name: Option<&str>, now: DateTime<Utc>) -> Reading {
    let devices = decode_devices(body);
    select_device(&devices, device_name)
        .and_then(DeviceRecord::newest_events)
        .map_or_else(Reading::default, |events| reading_from_events(events, now))
}

fn reading_from_events(events: &NewestEvents, now: DateTime<Utc>) -> Reading {
    let motion = events
        .motion_at()
        .is_some_and(|at| now.signed_duration_since(at) < MOTION_WINDOW);

    Reading::new(
        events.humidity(),
        events.temperature(),
        events.illuminance(),
        motion,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn parse_basic_response() {
        let reading = parse_reading(
            r#"[{"newest_events":{"hu":{"val":100},"te":{"val":35}}}]"#,
            None,
            now(),
        );
        assert_eq!(reading, Reading::new(Some(100.0), Some(35.0), None, false));
    }

    #[test]
    fn parse_selects_named_device() {
        let body = r#"[
            {"name":"Bedroom","newest_events":{"hu":{"val":100},"te":{"val":35}}},
            {"name":"Living","newest_events":{"hu":{"val":10},"te":{"val":1}}}
        ]"#;
        assert_eq!(parse_reading(body, Some("Living"), now()).humidity(), Some(10.0));
        assert_eq!(parse_reading(body, None, now()).humidity(), Some(100.0));
        assert_eq!(parse_reading(body, Some("Attic"), now()).humidity(), Some(100.0));
    }

    #[test]
    fn parse_empty_body() {
        assert_eq!(parse_reading("", Some("Living"), now()), Reading::default());
    }

    #[test]
    fn parse_malformed_json() {
        assert_eq!(parse_reading("{not json", None, now()), Reading::default());
        assert_eq!(parse_reading(r#"{"a":1}"#, None, now()), Reading::default());
        assert_eq!(parse_reading("null", None, now()), Reading::default());
    }

    #[test]
    fn parse_empty_list() {
        assert_eq!(parse_reading("[]", None, now()), Reading::default());
    }

    #[test]
    fn parse_device_without_events() {
        assert_eq!(
            parse_reading(r#"[{"newest_events":{}}]"#, None, now()),
            Reading::default()
        );
        assert_eq!(parse_reading(r#"[{}]"#, None, now()), Reading::default());
    }

    #[test]
    fn malformed_entry_keeps_position() {
        let body = r#"[{"name":7},{"name":"Living","newest_events":{"te":{"val":20}}}]"#;
        assert_eq!(decode_devices(body).len(), 2);
        assert_eq!(parse_reading(body, None, now()).temperature(), None);
        assert_eq!(parse_reading(body, Some("Living"), now()).temperature(), Some(20.0));
    }

    #[test]
    fn malformed_event_does_not_change_selected_device() {
        let body = r#"[
            {"name":"Bedroom","newest_events":{"hu":{"val":50},"te":{"val":1}}},
            {"name":"Living","newest_events":{"hu":5,"te":{"val":20}}}
        ]"#;
        let reading = parse_reading(body, Some("Living"), now());
        assert_eq!(reading.temperature(), Some(20.0));
        assert_eq!(reading.humidity(), None);
    }

    #[test]
    fn parse_light() {
        let reading = parse_reading(r#"[{"newest_events":{"il":{"val":87.5}}}]"#, None, now());
        assert_eq!(reading.light(), Some(87.5));
    }

    #[test]
    fn recent_motion_is_detected() {
        let body = r#"[{"newest_events":{"mo":{"val":1,"created_at":"2024-06-01T11:58:00Z"}}}]"#;
        assert!(parse_reading(body, None, now()).motion());
    }

    #[test]
    fn old_motion_is_ignored() {
        let body = r#"[{"newest_events":{"mo":{"val":1,"created_at":"2024-06-01T11:54:00Z"}}}]"#;
        assert!(!parse_reading(body, None, now()).motion());
    }

    #[test]
    fn motion_window_is_exclusive() {
        let body = r#"[{"newest_events":{"mo":{"created_at":"2024-06-01T11:55:00Z"}}}]"#;
        assert!(!parse_reading(body, None, now()).motion());
    }

    #[test]
    fn motion_timestamp_with_offset() {
        let body = r#"[{"newest_events":{"mo":{"created_at":"2024-06-01T20:59:00+09:00"}}}]"#;
        assert!(parse_reading(body, None, now()).motion());
    }

    #[test]
    fn missing_motion_timestamp() {
        let body = r#"[{"newest_events":{"mo":{"val":1}}}]"#;
        assert!(!parse_reading(body, None, now()).motion());
    }
}
