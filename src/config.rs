// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor client configuration.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::poller::PollSchedule;
use crate::reading::SensorKind;

/// Configuration for one polled Nature Remo device.
///
/// Keys follow the plugin configuration format, so a config block can be
/// deserialized directly.
///
/// # Examples
///
/// ```
/// use remo_sensor::SensorConfig;
///
/// let config = SensorConfig::from_json(r#"{
///     "name": "Sensor",
///     "deviceName": "Living Remo",
///     "accessToken": "xxxxxxxx",
///     "schedule": "*/10 * * * *"
/// }"#).unwrap();
///
/// assert_eq!(config.device_name(), Some("Living Remo"));
/// assert_eq!(config.schedule(), "*/10 * * * *");
/// assert!(!config.cache());
///
/// // Built in code
/// let config = SensorConfig::new("xxxxxxxx")
///     .with_device_name("Living Remo")
///     .with_cache(true);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    device_name: Option<String>,
    #[serde(default)]
    access_token: String,
    #[serde(default = "default_schedule")]
    schedule: String,
    #[serde(default)]
    mini: bool,
    #[serde(default)]
    cache: bool,
    #[serde(default)]
    sensors: SensorToggles,
}

/// Per-sensor enable flags. Unset flags count as enabled.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SensorToggles {
    /// Temperature sensor flag.
    #[serde(default)]
    pub temperature: Option<bool>,
    /// Humidity sensor flag.
    #[serde(default)]
    pub humidity: Option<bool>,
    /// Illuminance sensor flag.
    #[serde(default)]
    pub light: Option<bool>,
    /// Motion sensor flag.
    #[serde(default)]
    pub motion: Option<bool>,
}

impl SensorToggles {
    fn get(&self, kind: SensorKind) -> Option<bool> {
        match kind {
            SensorKind::Temperature => self.temperature,
            SensorKind::Humidity => self.humidity,
            SensorKind::Light => self.light,
            SensorKind::Motion => self.motion,
        }
    }

    fn set(&mut self, kind: SensorKind, enabled: bool) {
        let slot = match kind {
            SensorKind::Temperature => &mut self.temperature,
            SensorKind::Humidity => &mut self.humidity,
            SensorKind::Light => &mut self.light,
            SensorKind::Motion => &mut self.motion,
        };
        *slot = Some(enabled);
    }
}

fn default_schedule() -> String {
    SensorConfig::DEFAULT_SCHEDULE.to_string()
}

impl SensorConfig {
    /// Default polling schedule: every five minutes.
    pub const DEFAULT_SCHEDULE: &'static str = "*/5 * * * *";

    /// Creates a configuration with the given access token and defaults.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            name: None,
            device_name: None,
            access_token: access_token.into(),
            schedule: default_schedule(),
            mini: false,
            cache: false,
            sensors: SensorToggles::default(),
        }
    }

    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the device name used to pick a device from the list.
    #[must_use]
    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }

    /// Sets the cron schedule for polling.
    #[must_use]
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = schedule.into();
        self
    }

    /// Marks the device as a Remo mini (temperature only).
    #[must_use]
    pub fn with_mini(mut self, mini: bool) -> Self {
        self.mini = mini;
        self
    }

    /// Enables or disables cache mode.
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Enables or disables a single sensor.
    #[must_use]
    pub fn with_sensor(mut self, kind: SensorKind, enabled: bool) -> Self {
        self.sensors.set(kind, enabled);
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the device name filter.
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the cron schedule.
    #[must_use]
    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    /// Returns whether the device is a Remo mini.
    #[must_use]
    pub fn mini(&self) -> bool {
        self.mini
    }

    /// Returns whether cache mode is enabled.
    #[must_use]
    pub fn cache(&self) -> bool {
        self.cache
    }

    /// Returns true if the given sensor is enabled.
    ///
    /// A Remo mini only has a temperature sensor, so the other kinds are
    /// always disabled for it.
    #[must_use]
    pub fn is_enabled(&self, kind: SensorKind) -> bool {
        if self.mini && kind != SensorKind::Temperature {
            return false;
        }
        self.sensors.get(kind).unwrap_or(true)
    }

    /// Returns the enabled sensor kinds, in publishing order.
    #[must_use]
    pub fn enabled_kinds(&self) -> Vec<SensorKind> {
        SensorKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    /// Checks the configuration and parses its schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is empty or the schedule is not
    /// a valid cron expression.
    pub fn validate(&self) -> Result<PollSchedule, ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }
        PollSchedule::parse(&self.schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_object() {
        let config = SensorConfig::from_json("{}").unwrap();
        assert!(config.name().is_none());
        assert!(config.device_name().is_none());
        assert_eq!(config.access_token(), "");
        assert_eq!(config.schedule(), "*/5 * * * *");
        assert!(!config.mini());
        assert!(!config.cache());
        assert_eq!(config.enabled_kinds(), SensorKind::ALL.to_vec());
    }

    #[test]
    fn full_config() {
        let config = SensorConfig::from_json(
            r#"{
                "accessory": "remo-sensor",
                "name": "Sensor",
                "deviceName": "Living Remo",
                "accessToken": "xxxxxxxxxxxxxxx",
                "schedule": "*/10 * * * *",
                "cache": true,
                "sensors": {"light": false}
            }"#,
        )
        .unwrap();

        assert_eq!(config.name(), Some("Sensor"));
        assert_eq!(config.device_name(), Some("Living Remo"));
        assert_eq!(config.access_token(), "xxxxxxxxxxxxxxx");
        assert_eq!(config.schedule(), "*/10 * * * *");
        assert!(config.cache());
        assert!(!config.is_enabled(SensorKind::Light));
        assert!(config.is_enabled(SensorKind::Motion));
    }

    #[test]
    fn mini_is_temperature_only() {
        let config = SensorConfig::new("token")
            .with_mini(true)
            .with_sensor(SensorKind::Humidity, true);
        assert_eq!(config.enabled_kinds(), vec![SensorKind::Temperature]);
    }

    #[test]
    fn disable_temperature() {
        let config = SensorConfig::new("token").with_sensor(SensorKind::Temperature, false);
        assert!(!config.is_enabled(SensorKind::Temperature));
        assert_eq!(config.enabled_kinds().len(), 3);
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            SensorConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn validate_requires_token() {
        assert!(matches!(
            SensorConfig::new("  ").validate(),
            Err(ConfigError::MissingAccessToken)
        ));
    }

    #[test]
    fn validate_rejects_bad_schedule() {
        let config = SensorConfig::new("token").with_schedule("every five minutes");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(SensorConfig::new("token").validate().is_ok());
    }
}
