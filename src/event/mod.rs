// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publishing of scheduled sensor updates.
//!
//! The [`ScheduledPoller`](crate::poller::ScheduledPoller) hands every update
//! to a [`ReadingSink`]. Closures implement the trait directly, and the
//! [`EventBus`] turns updates into [`ReadingEvent`]s on a broadcast channel
//! so several consumers can observe them.
//!
//! # Examples
//!
//! ```
//! use remo_sensor::SensorKind;
//! use remo_sensor::SensorValue;
//! use remo_sensor::event::{EventBus, ReadingSink};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.update_reading(SensorKind::Temperature, Ok(SensorValue::Number(Some(21.5))));
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.kind(), SensorKind::Temperature);
//! ```

mod event_bus;
mod reading_event;

pub use event_bus::EventBus;
pub use reading_event::ReadingEvent;

use crate::error::FetchError;
use crate::reading::{SensorKind, SensorValue};

/// Receiver of scheduled sensor updates.
///
/// Called once per enabled sensor kind after every scheduled cycle, with
/// either the new value or the error that ended the cycle.
pub trait ReadingSink: Send + Sync {
    /// Publishes one sensor update.
    fn update_reading(&self, kind: SensorKind, value: Result<SensorValue, FetchError>);
}

impl<F> ReadingSink for F
where
    F: Fn(SensorKind, Result<SensorValue, FetchError>) + Send + Sync,
{
    fn update_reading(&self, kind: SensorKind, value: Result<SensorValue, FetchError>) {
        self(kind, value);
    }
}
