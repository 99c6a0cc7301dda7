// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device sensor client with cache fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::ReadingCache;
use crate::config::SensorConfig;
use crate::error::{Error, FetchError, Result};
use crate::event::ReadingSink;
use crate::poller::{PollSchedule, ScheduledPoller};
use crate::protocol::{ApiConfig, FetchOptions, SingleFlightRequester};
use crate::reading::{Reading, SensorKind, SensorValue};
use crate::telemetry::parse_reading;

/// Client for the sensors of one Nature Remo device.
///
/// Cloning is cheap and every clone shares the same in-flight request and
/// cache.
///
/// # Read policy
///
/// [`get`](Self::get) resolves a sensor value as follows:
///
/// 1. In cache mode, a cached numeric value is returned without any request.
/// 2. Otherwise the device list is fetched, bounded by the read timeout. A
///    successful fetch replaces the cached reading.
/// 3. If the fetch timed out and a cached numeric value exists, that value
///    is returned instead of the error. Any other failure is returned.
///
/// # Examples
///
/// ```no_run
/// use remo_sensor::{RemoSensor, SensorConfig, SensorKind};
///
/// #[tokio::main]
/// async fn main() -> remo_sensor::Result<()> {
///     let config = SensorConfig::new("access-token").with_device_name("Living Remo");
///     let sensor = RemoSensor::new(config)?;
///
///     println!("temperature: {:?}", sensor.temperature().await?);
///     println!("humidity: {}", sensor.get(SensorKind::Humidity).await?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RemoSensor {
    inner: Arc<SensorInner>,
}

#[derive(Debug)]
struct SensorInner {
    config: SensorConfig,
    schedule: PollSchedule,
    requester: SingleFlightRequester,
    cache: ReadingCache,
    read_timeout: Duration,
}

impl RemoSensor {
    /// Creates a client for the public cloud API.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: SensorConfig) -> Result<Self> {
        Self::with_api(config, ApiConfig::new())
    }

    /// Creates a client with explicit API connection parameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn with_api(config: SensorConfig, api: ApiConfig) -> Result<Self> {
        let schedule = config.validate()?;
        let read_timeout = api.read_timeout();
        let client = api.into_client(config.access_token())?;

        tracing::debug!(
            name = config.name().unwrap_or("-"),
            device = config.device_name().unwrap_or("-"),
            cache = config.cache(),
            "Created sensor client"
        );

        Ok(Self {
            inner: Arc::new(SensorInner {
                config,
                schedule,
                requester: SingleFlightRequester::new(client),
                cache: ReadingCache::new(),
                read_timeout,
            }),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SensorConfig {
        &self.inner.config
    }

    /// Returns the polling schedule.
    #[must_use]
    pub fn schedule(&self) -> &PollSchedule {
        &self.inner.schedule
    }

    /// Returns the reading cache.
    #[must_use]
    pub fn cache(&self) -> &ReadingCache {
        &self.inner.cache
    }

    /// Returns the single-flight requester.
    #[must_use]
    pub fn requester(&self) -> &SingleFlightRequester {
        &self.inner.requester
    }

    /// Fetches and parses a fresh reading.
    ///
    /// Does not consult or update the cache.
    ///
    /// # Errors
    ///
    /// Returns the classified fetch error.
    pub async fn fetch_reading(
        &self,
        options: FetchOptions,
    ) -> std::result::Result<Reading, FetchError> {
        let body = self.inner.requester.fetch(options).await?;
        Ok(parse_reading(
            &body,
            self.inner.config.device_name(),
            Utc::now(),
        ))
    }

    /// Reads one sensor value.
    ///
    /// # Errors
    ///
    /// Returns `Error::SensorDisabled` for a disabled sensor and
    /// `Error::Fetch` when the request failed and no cached value applies.
    pub async fn get(&self, kind: SensorKind) -> Result<SensorValue> {
        if !self.inner.config.is_enabled(kind) {
            return Err(Error::SensorDisabled(kind));
        }

        tracing::debug!(sensor = %kind, "Getting sensor value");

        let cache = &self.inner.cache;
        if self.inner.config.cache()
            && let Some(value) = cache.number(kind)
        {
            tracing::debug!(sensor = %kind, value, "Serving cached value");
            return Ok(SensorValue::Number(Some(value)));
        }

        let options = FetchOptions::new().with_timeout(self.inner.read_timeout);
        match self.fetch_reading(options).await {
            Ok(reading) => {
                cache.store(reading);
                let value = reading.value(kind);
                tracing::debug!(sensor = %kind, %value, "Got sensor value");
                Ok(value)
            }
            Err(e) if e.is_timeout() => match cache.number(kind) {
                Some(value) => {
                    tracing::warn!(sensor = %kind, value, "Request timed out, serving cached value");
                    Ok(SensorValue::Number(Some(value)))
                }
                None => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the temperature.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn temperature(&self) -> Result<Option<f64>> {
        self.number(SensorKind::Temperature).await
    }

    /// Reads the relative humidity.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn humidity(&self) -> Result<Option<f64>> {
        self.number(SensorKind::Humidity).await
    }

    /// Reads the illuminance.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn light(&self) -> Result<Option<f64>> {
        self.number(SensorKind::Light).await
    }

    /// Reads whether motion was detected in the last five minutes.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn motion(&self) -> Result<bool> {
        let value = self.get(SensorKind::Motion).await?;
        Ok(value.as_motion().unwrap_or(false))
    }

    async fn number(&self, kind: SensorKind) -> Result<Option<f64>> {
        Ok(self.get(kind).await?.as_number())
    }

    /// Reads one sensor value and hands the result to `callback`.
    ///
    /// The read runs on a spawned task; the callback is invoked exactly once.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn get_with_callback<F>(&self, kind: SensorKind, callback: F)
    where
        F: FnOnce(Result<SensorValue>) + Send + 'static,
    {
        let sensor = self.clone();
        tokio::spawn(async move {
            callback(sensor.get(kind).await);
        });
    }

    /// Starts scheduled polling, publishing every cycle to `sink`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start_polling<S>(&self, sink: S) -> ScheduledPoller
    where
        S: ReadingSink + 'static,
    {
        ScheduledPoller::start(self.clone(), self.inner.schedule.clone(), sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn new_requires_access_token() {
        let err = RemoSensor::new(SensorConfig::new("")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingAccessToken)));
    }

    #[test]
    fn new_rejects_invalid_schedule() {
        let err = RemoSensor::new(SensorConfig::new("token").with_schedule("soon")).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn new_uses_configured_schedule() {
        let sensor =
            RemoSensor::new(SensorConfig::new("token").with_schedule("*/10 * * * *")).unwrap();
        assert_eq!(sensor.schedule().expression(), "*/10 * * * *");
        assert!(sensor.cache().get().is_none());
    }

    #[tokio::test]
    async fn disabled_sensor_is_rejected() {
        let sensor = RemoSensor::new(SensorConfig::new("token").with_mini(true)).unwrap();
        let err = sensor.get(SensorKind::Humidity).await.unwrap_err();
        assert!(matches!(err, Error::SensorDisabled(SensorKind::Humidity)));
        assert!(!sensor.requester().is_in_flight());
    }

    #[tokio::test]
    async fn cache_mode_skips_request() {
        let sensor = RemoSensor::with_api(
            SensorConfig::new("token").with_cache(true),
            ApiConfig::new().with_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        sensor
            .cache()
            .store(Reading::new(Some(55.0), Some(22.0), None, false));

        assert_eq!(sensor.humidity().await.unwrap(), Some(55.0));
        assert_eq!(sensor.temperature().await.unwrap(), Some(22.0));
        assert!(!sensor.requester().is_in_flight());
    }
}
