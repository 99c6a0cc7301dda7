// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting sensor updates.

use tokio::sync::broadcast;

use super::{ReadingEvent, ReadingSink};
use crate::error::FetchError;
use crate::reading::{SensorKind, SensorValue};

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Broadcasts sensor updates to any number of subscribers.
///
/// If a subscriber falls behind by more than the channel capacity, it
/// loses the oldest events and receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use remo_sensor::event::{EventBus, ReadingEvent};
/// use remo_sensor::{SensorKind, SensorValue};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
/// let mut rx2 = bus.subscribe();
///
/// bus.publish(ReadingEvent::new(SensorKind::Light, Ok(SensorValue::Number(Some(80.0)))));
/// assert_eq!(bus.subscriber_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ReadingEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReadingEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: ReadingEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSink for EventBus {
    fn update_reading(&self, kind: SensorKind, value: Result<SensorValue, FetchError>) {
        self.publish(ReadingEvent::new(kind, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature(value: f64) -> ReadingEvent {
        ReadingEvent::new(SensorKind::Temperature, Ok(SensorValue::Number(Some(value))))
    }

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn drop_subscriber_decrements_count() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn publish_without_subscribers_is_ignored() {
        let bus = EventBus::new();
        bus.publish(temperature(20.0));
    }

    #[tokio::test]
    async fn publish_delivers_to_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(temperature(21.0));

        assert_eq!(rx1.recv().await.unwrap(), temperature(21.0));
        assert_eq!(rx2.recv().await.unwrap(), temperature(21.0));
    }

    #[tokio::test]
    async fn sink_publishes_errors() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.update_reading(SensorKind::Humidity, Err(FetchError::timeout(10)));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), SensorKind::Humidity);
        assert!(event.value().unwrap_err().is_timeout());
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();
        let mut rx = bus1.subscribe();

        bus2.publish(temperature(19.5));

        assert_eq!(rx.try_recv().unwrap(), temperature(19.5));
    }
}
