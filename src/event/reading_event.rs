// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor update events.

use crate::error::FetchError;
use crate::reading::{SensorKind, SensorValue};

/// One scheduled update for one sensor kind.
///
/// # Examples
///
/// ```
/// use remo_sensor::event::ReadingEvent;
/// use remo_sensor::{SensorKind, SensorValue};
///
/// let event = ReadingEvent::new(SensorKind::Humidity, Ok(SensorValue::Number(Some(48.0))));
/// assert_eq!(event.value().unwrap().as_number(), Some(48.0));
/// assert!(!event.is_error());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingEvent {
    kind: SensorKind,
    value: Result<SensorValue, FetchError>,
}

impl ReadingEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(kind: SensorKind, value: Result<SensorValue, FetchError>) -> Self {
        Self { kind, value }
    }

    /// Returns the sensor kind this event is about.
    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Returns the published value or error.
    ///
    /// # Errors
    ///
    /// Returns the fetch error that ended the scheduled cycle.
    pub fn value(&self) -> Result<SensorValue, &FetchError> {
        self.value.as_ref().copied()
    }

    /// Returns true if the cycle failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.value.is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    #[test]
    fn error_event() {
        let event = ReadingEvent::new(SensorKind::Light, Err(FetchError::status(500, None)));
        assert!(event.is_error());
        assert_eq!(
            event.value().unwrap_err().kind(),
            FetchErrorKind::Status(500)
        );
    }

    #[test]
    fn motion_event() {
        let event = ReadingEvent::new(SensorKind::Motion, Ok(SensorValue::Motion(true)));
        assert_eq!(event.kind(), SensorKind::Motion);
        assert_eq!(event.value().unwrap().as_motion(), Some(true));
    }
}
