// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor readings and the sensor kinds that select fields from them.

use std::fmt;

/// The kinds of sensor a Nature Remo device may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Temperature in degrees Celsius (`te` event).
    Temperature,
    /// Relative humidity in percent (`hu` event).
    Humidity,
    /// Illuminance (`il` event).
    Light,
    /// Recent motion (`mo` event).
    Motion,
}

impl SensorKind {
    /// All sensor kinds in declaration order, which is also publishing order.
    pub const ALL: [Self; 4] = [Self::Temperature, Self::Humidity, Self::Light, Self::Motion];

    /// Returns the lowercase name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Motion => "motion",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value taken from a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorValue {
    /// A numeric measurement, `None` when the device did not report it.
    Number(Option<f64>),
    /// Whether motion was detected recently.
    Motion(bool),
}

impl SensorValue {
    /// Returns the numeric value, if this is a reported measurement.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => *value,
            Self::Motion(_) => None,
        }
    }

    /// Returns the motion flag, if this is a motion value.
    #[must_use]
    pub fn as_motion(&self) -> Option<bool> {
        match self {
            Self::Motion(detected) => Some(*detected),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(Some(value)) => write!(f, "{value}"),
            Self::Number(None) => f.write_str("null"),
            Self::Motion(detected) => write!(f, "{detected}"),
        }
    }
}

/// A snapshot of one device's sensors at one point in time.
///
/// Readings are produced whole by [`parse_reading`](crate::telemetry::parse_reading)
/// and never modified afterwards.
///
/// # Examples
///
/// ```
/// use remo_sensor::{Reading, SensorKind, SensorValue};
///
/// let reading = Reading::new(Some(45.0), Some(21.5), None, false);
/// assert_eq!(reading.value(SensorKind::Temperature), SensorValue::Number(Some(21.5)));
/// assert_eq!(reading.value(SensorKind::Light), SensorValue::Number(None));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    humidity: Option<f64>,
    temperature: Option<f64>,
    light: Option<f64>,
    motion: bool,
}

impl Reading {
    /// Creates a reading from its fields.
    #[must_use]
    pub fn new(
        humidity: Option<f64>,
        temperature: Option<f64>,
        light: Option<f64>,
        motion: bool,
    ) -> Self {
        Self {
            humidity,
            temperature,
            light,
            motion,
        }
    }

    /// Returns the relative humidity.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.humidity
    }

    /// Returns the temperature.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Returns the illuminance.
    #[must_use]
    pub fn light(&self) -> Option<f64> {
        self.light
    }

    /// Returns whether motion was detected in the last five minutes.
    #[must_use]
    pub fn motion(&self) -> bool {
        self.motion
    }

    /// Returns the value for the given sensor kind.
    #[must_use]
    pub fn value(&self, kind: SensorKind) -> SensorValue {
        match kind {
            SensorKind::Humidity => SensorValue::Number(self.humidity),
            SensorKind::Temperature => SensorValue::Number(self.temperature),
            SensorKind::Light => SensorValue::Number(self.light),
            SensorKind::Motion => SensorValue::Motion(self.motion),
        }
    }

    /// Returns the reported numeric value for the given kind.
    ///
    /// Motion has no numeric value, so this is always `None` for
    /// [`SensorKind::Motion`].
    #[must_use]
    pub fn number(&self, kind: SensorKind) -> Option<f64> {
        self.value(kind).as_number()
    }
}
