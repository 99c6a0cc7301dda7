// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records returned by the `/1/devices` endpoint.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// One entry of the device list returned by the cloud API.
///
/// Only the fields needed for sensor readings are decoded; everything else
/// in the payload is ignored.
///
/// # Examples
///
/// ```
/// use remo_sensor::telemetry::DeviceRecord;
///
/// let json = r#"{"name":"Living Remo","newest_events":{"te":{"val":21.5}}}"#;
/// let record: DeviceRecord = serde_json::from_str(json).unwrap();
///
/// assert_eq!(record.name(), Some("Living Remo"));
/// assert_eq!(record.newest_events().and_then(|e| e.temperature()), Some(21.5));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRecord {
    /// User-assigned device name.
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,

    /// Latest event of each sensor type.
    #[serde(default, deserialize_with = "lenient")]
    newest_events: Option<NewestEvents>,
}

impl DeviceRecord {
    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the newest sensor events.
    #[must_use]
    pub fn newest_events(&self) -> Option<&NewestEvents> {
        self.newest_events.as_ref()
    }
}

/// Latest sensor events keyed by the API's two-letter sensor codes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewestEvents {
    /// Humidity.
    #[serde(rename = "hu", default, deserialize_with = "lenient")]
    humidity: Option<ValueEvent>,

    /// Temperature.
    #[serde(rename = "te", default, deserialize_with = "lenient")]
    temperature: Option<ValueEvent>,

    /// Illuminance.
    #[serde(rename = "il", default, deserialize_with = "lenient")]
    illuminance: Option<ValueEvent>,

    /// Motion.
    #[serde(rename = "mo", default, deserialize_with = "lenient")]
    motion: Option<MotionEvent>,
}

impl NewestEvents {
    /// Returns the humidity value.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.humidity.as_ref().and_then(ValueEvent::value)
    }

    /// Returns the temperature value.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature.as_ref().and_then(ValueEvent::value)
    }

    /// Returns the illuminance value.
    #[must_use]
    pub fn illuminance(&self) -> Option<f64> {
        self.illuminance.as_ref().and_then(ValueEvent::value)
    }

    /// Returns when motion was last detected, if the timestamp is valid.
    #[must_use]
    pub fn motion_at(&self) -> Option<DateTime<Utc>> {
        self.motion.as_ref().and_then(MotionEvent::created_at)
    }
}

/// A measurement event carrying a `val` field.
#[derive(Debug, Clone, Default, Deserialize)]
struct ValueEvent {
    // Kept loose so a non-numeric value reads as absent instead of
    // failing the whole record.
    #[serde(default)]
    val: Option<serde_json::Value>,
}

impl ValueEvent {
    fn value(&self) -> Option<f64> {
        self.val.as_ref().and_then(serde_json::Value::as_f64)
    }
}

/// A motion event; only its timestamp matters.
#[derive(Debug, Clone, Default, Deserialize)]
struct MotionEvent {
    #[serde(default, deserialize_with = "lenient")]
    created_at: Option<String>,
}

impl MotionEvent {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Decodes an optional field, reading a value of the wrong shape as `None`.
///
/// A malformed field only blanks itself; the rest of the record still
/// decodes.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

/// Picks the device to read from.
///
/// With a `device_name`, the first record whose name matches exactly wins.
/// Without a name, or when nothing matches, the first record is used.
/// Returns `None` only for an empty list.
///
/// # Examples
///
/// ```
/// use remo_sensor::telemetry::{DeviceRecord, select_device};
///
/// let devices: Vec<DeviceRecord> =
///     serde_json::from_str(r#"[{"name":"Bedroom"},{"name":"Living"}]"#).unwrap();
///
/// assert_eq!(select_device(&devices, Some("Living")).and_then(|d| d.name()), Some("Living"));
/// assert_eq!(select_device(&devices, Some("Attic")).and_then(|d| d.name()), Some("Bedroom"));
/// assert!(select_device(&[], None).is_none());
/// ```
#[must_use]
pub fn select_device<'a>(
    devices: &'a [DeviceRecord],
    device_name: Option<&str>,
) -> Option<&'a DeviceRecord> {
    device_name
        .and_then(|wanted| devices.iter().find(|d| d.name() == Some(wanted)))
        .or_else(|| devices.first())
}
