// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `remo_sensor` - A Rust library polling Nature Remo room sensors.
//!
//! The library fetches the device list from the Nature Remo cloud API,
//! picks one device and exposes its temperature, humidity, illuminance and
//! motion readings in two ways:
//!
//! - **On demand**: [`RemoSensor::get`] and the per-sensor helpers
//! - **Scheduled**: a cron-driven [`ScheduledPoller`] publishing to a
//!   [`ReadingSink`](event::ReadingSink)
//!
//! Concurrent reads share a single HTTP request, and the last good reading
//! is kept for cache mode and for answering reads that time out.
//!
//! # Quick Start
//!
//! ## On-demand reads
//!
//! ```no_run
//! use remo_sensor::{RemoSensor, SensorConfig};
//!
//! #[tokio::main]
//! async fn main() -> remo_sensor::Result<()> {
//!     let sensor = RemoSensor::new(SensorConfig::new("access-token"))?;
//!
//!     // Both reads are served by one request
//!     let (temperature, humidity) = tokio::join!(sensor.temperature(), sensor.humidity());
//!     println!("{:?} C, {:?} %", temperature?, humidity?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Scheduled updates
//!
//! ```no_run
//! use remo_sensor::event::EventBus;
//! use remo_sensor::{RemoSensor, SensorConfig};
//!
//! #[tokio::main]
//! async fn main() -> remo_sensor::Result<()> {
//!     let config = SensorConfig::new("access-token").with_schedule("*/10 * * * *");
//!     let sensor = RemoSensor::new(config)?;
//!
//!     let bus = EventBus::new();
//!     let mut events = bus.subscribe();
//!     let _poller = sensor.start_polling(bus.clone());
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{}: {:?}", event.kind(), event.value());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod poller;
pub mod protocol;
mod reading;
mod sensor;
pub mod telemetry;

pub use cache::ReadingCache;
pub use config::{SensorConfig, SensorToggles};
pub use error::{ConfigError, Error, FetchError, FetchErrorKind, Result};
pub use poller::{PollSchedule, PollerState, ScheduledPoller};
pub use protocol::{ApiConfig, FetchOptions, SingleFlightRequester};
pub use reading::{Reading, SensorKind, SensorValue};
pub use sensor::RemoSensor;
