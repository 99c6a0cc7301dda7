// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduled polling of the device list.
//!
//! A [`ScheduledPoller`] runs one fetch cycle immediately and then one per
//! tick of its [`PollSchedule`]. Each cycle either stores the new reading and
//! publishes every enabled sensor value, or clears the cache and publishes
//! the error for every enabled sensor. A failed cycle never stops polling.
//!
//! Cycles run one after another inside a single task, so they can never
//! overlap. A tick that falls inside a running cycle is skipped; the next
//! tick is computed once the cycle ends.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::ConfigError;
use crate::event::ReadingSink;
use crate::protocol::FetchOptions;
use crate::sensor::RemoSensor;

// ============================================================================
// PollSchedule - Cron expression wrapper
// ============================================================================

/// A parsed cron schedule.
///
/// Five-field expressions (minute, hour, day of month, month, day of week)
/// fire at second zero. Six-field expressions carry a leading seconds
/// field. Both use crontab day-of-week numbering, where 0 and 7 are Sunday
/// and 1 is Monday. Seven-field expressions (with a year) are handed to the
/// `cron` crate as they are, in its own dialect (1 is Sunday).
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use remo_sensor::poller::PollSchedule;
///
/// let schedule = PollSchedule::parse("*/5 * * * *").unwrap();
/// let now: DateTime<Utc> = "2024-06-01T12:03:20Z".parse().unwrap();
///
/// assert_eq!(
///     schedule.next_after(now),
///     Some("2024-06-01T12:05:00Z".parse().unwrap())
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PollSchedule {
    expression: String,
    schedule: cron::Schedule,
}

impl PollSchedule {
    /// Parses a cron expression.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSchedule` if the expression is invalid.
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let expression = expression.trim();
        let invalid = |message: String| ConfigError::InvalidSchedule {
            expression: expression.to_string(),
            message,
        };

        let normalized = normalize_expression(expression).map_err(invalid)?;
        let schedule =
            cron::Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    /// Returns the expression as configured.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the first tick strictly after `after`.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Returns how long to wait from `now` until the next tick.
    #[must_use]
    pub fn until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_after(now)
            .map(|tick| (tick - now).to_std().unwrap_or(Duration::ZERO))
    }
}

/// Index of the day-of-week field once a seconds field is present.
const DAY_OF_WEEK_FIELD: usize = 5;

/// Rewrites a crontab expression into the `cron` crate's dialect.
fn normalize_expression(expression: &str) -> Result<String, String> {
    let mut fields: Vec<String> = expression.split_whitespace().map(str::to_string).collect();
    match fields.len() {
        5 => fields.insert(0, "0".to_string()),
        6 => {}
        _ => return Ok(expression.to_string()),
    }
    fields[DAY_OF_WEEK_FIELD] = crontab_days_of_week(&fields[DAY_OF_WEEK_FIELD])?;
    Ok(fields.join(" "))
}

/// Renumbers a crontab day-of-week field (0 and 7 are Sunday) for the
/// `cron` crate, which counts from 1 = Sunday.
///
/// Numeric items are expanded into explicit day lists. Day names and bare
/// wildcards pass through untouched.
fn crontab_days_of_week(field: &str) -> Result<String, String> {
    let mut items = Vec::new();

    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step = step
                    .parse::<usize>()
                    .ok()
                    .filter(|step| *step > 0)
                    .ok_or_else(|| format!("invalid day-of-week step in '{item}'"))?;
                (range, Some(step))
            }
            None => (item, None),
        };

        let bounds: Option<(u32, u32)> = if range == "*" {
            step.map(|_| (0, 6))
        } else if let Some((start, end)) = range.split_once('-') {
            start.parse().ok().zip(end.parse().ok())
        } else {
            range
                .parse()
                .ok()
                .map(|day| (day, if step.is_some() { 6 } else { day }))
        };

        let Some((start, end)) = bounds else {
            items.push(item.to_string());
            continue;
        };
        if start > end || end > 7 {
            return Err(format!("day-of-week out of range in '{item}'"));
        }

        let days: BTreeSet<u32> = (start..=end)
            .step_by(step.unwrap_or(1))
            .map(|day| day % 7 + 1)
            .collect();
        items.extend(days.iter().map(u32::to_string));
    }

    Ok(items.join(","))
}

// ============================================================================
// ScheduledPoller - Background polling task
// ============================================================================

/// Lifecycle state of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Waiting for the next tick.
    Idle,
    /// A fetch cycle is running.
    Fetching,
    /// The poller has stopped.
    Stopped,
}

/// Handle to a running poll loop.
///
/// The loop is aborted when the handle is stopped or dropped. Aborting
/// during a cycle does not cancel a request other callers are waiting on.
#[derive(Debug)]
pub struct ScheduledPoller {
    task: JoinHandle<()>,
    state: watch::Receiver<PollerState>,
}

impl ScheduledPoller {
    /// Starts polling for `sensor` on `schedule`, publishing to `sink`.
    ///
    /// The first cycle runs immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start<S>(sensor: RemoSensor, schedule: PollSchedule, sink: S) -> Self
    where
        S: ReadingSink + 'static,
    {
        let (state_tx, state) = watch::channel(PollerState::Idle);
        let sink: Arc<dyn ReadingSink> = Arc::new(sink);

        tracing::info!(schedule = %schedule.expression(), "Starting sensor poller");

        let task = tokio::spawn(async move {
            loop {
                state_tx.send_replace(PollerState::Fetching);
                run_cycle(&sensor, sink.as_ref()).await;
                state_tx.send_replace(PollerState::Idle);

                let Some(delay) = schedule.until_next(Utc::now()) else {
                    tracing::warn!(
                        schedule = %schedule.expression(),
                        "Schedule has no upcoming ticks, stopping poller"
                    );
                    break;
                };
                tokio::time::sleep(delay).await;
            }
            state_tx.send_replace(PollerState::Stopped);
        });

        Self { task, state }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> PollerState {
        if self.task.is_finished() {
            PollerState::Stopped
        } else {
            *self.state.borrow()
        }
    }

    /// Returns a receiver that observes state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<PollerState> {
        self.state.clone()
    }

    /// Returns true while the poll loop is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the poll loop.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ScheduledPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs one fetch-parse-cache-publish cycle.
async fn run_cycle(sensor: &RemoSensor, sink: &dyn ReadingSink) {
    tracing::debug!("Running scheduled sensor update");

    let kinds = sensor.config().enabled_kinds();
    match sensor.fetch_reading(FetchOptions::new()).await {
        Ok(reading) => {
            sensor.cache().store(reading);
            for kind in kinds {
                let value = reading.value(kind);
                tracing::debug!(sensor = %kind, %value, "Publishing scheduled update");
                sink.update_reading(kind, Ok(value));
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Scheduled sensor update failed");
            sensor.cache().clear();
            for kind in kinds {
                sink.update_reading(kind, Err(e.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn parse_default_schedule() {
        let schedule = PollSchedule::parse("*/5 * * * *").unwrap();
        assert_eq!(schedule.expression(), "*/5 * * * *");
        assert_eq!(
            schedule.next_after(at("2024-06-01T12:00:00Z")),
            Some(at("2024-06-01T12:05:00Z"))
        );
    }

    #[test]
    fn parse_ten_minute_schedule() {
        let schedule = PollSchedule::parse("*/10 * * * *").unwrap();
        assert_eq!(
            schedule.next_after(at("2024-06-01T12:31:59Z")),
            Some(at("2024-06-01T12:40:00Z"))
        );
    }

    #[test]
    fn parse_six_field_schedule() {
        let schedule = PollSchedule::parse("*/30 * * * * *").unwrap();
        assert_eq!(
            schedule.next_after(at("2024-06-01T12:00:10Z")),
            Some(at("2024-06-01T12:00:30Z"))
        );
    }

    #[test]
    fn parse_trims_whitespace() {
        let schedule = PollSchedule::parse("  0 * * * * ").unwrap();
        assert_eq!(schedule.expression(), "0 * * * *");
    }

    #[test]
    fn parse_invalid_schedule() {
        assert!(matches!(
            PollSchedule::parse("every five minutes"),
            Err(ConfigError::InvalidSchedule { .. })
        ));
        assert!(PollSchedule::parse("").is_err());
        assert!(PollSchedule::parse("61 * * * *").is_err());
    }

    #[test]
    fn weekday_range_uses_crontab_numbering() {
        // 2024-06-01 is a Saturday
        let schedule = PollSchedule::parse("0 9 * * 1-5").unwrap();
        assert_eq!(
            schedule.next_after(at("2024-06-01T12:00:00Z")),
            Some(at("2024-06-03T09:00:00Z"))
        );
        assert_eq!(
            schedule.next_after(at("2024-06-07T09:00:00Z")),
            Some(at("2024-06-10T09:00:00Z"))
        );
    }

    #[test]
    fn zero_and_seven_are_sunday() {
        for expression in ["0 9 * * 0", "0 9 * * 7", "0 9 * * SUN"] {
            let schedule = PollSchedule::parse(expression).unwrap();
            assert_eq!(
                schedule.next_after(at("2024-06-01T12:00:00Z")),
                Some(at("2024-06-02T09:00:00Z")),
                "{expression}"
            );
        }
    }

    #[test]
    fn weekday_range_ending_on_seven() {
        let schedule = PollSchedule::parse("0 9 * * 5-7").unwrap();
        // Friday, then Saturday and Sunday
        assert_eq!(
            schedule.next_after(at("2024-06-06T12:00:00Z")),
            Some(at("2024-06-07T09:00:00Z"))
        );
        assert_eq!(
            schedule.next_after(at("2024-06-01T12:00:00Z")),
            Some(at("2024-06-02T09:00:00Z"))
        );
        assert_eq!(
            schedule.next_after(at("2024-06-02T12:00:00Z")),
            Some(at("2024-06-07T09:00:00Z"))
        );
    }

    #[test]
    fn weekday_step_and_list() {
        // Sunday, Tuesday, Thursday, Saturday
        let schedule = PollSchedule::parse("0 9 * * */2").unwrap();
        assert_eq!(
            schedule.next_after(at("2024-06-02T12:00:00Z")),
            Some(at("2024-06-04T09:00:00Z"))
        );

        let schedule = PollSchedule::parse("0 9 * * 1,3").unwrap();
        assert_eq!(
            schedule.next_after(at("2024-06-03T12:00:00Z")),
            Some(at("2024-06-05T09:00:00Z"))
        );
    }

    #[test]
    fn six_field_weekday_uses_crontab_numbering() {
        let schedule = PollSchedule::parse("30 0 9 * * 1").unwrap();
        assert_eq!(
            schedule.next_after(at("2024-06-01T12:00:00Z")),
            Some(at("2024-06-03T09:00:30Z"))
        );
    }

    #[test]
    fn weekday_out_of_range_is_rejected() {
        assert!(matches!(
            PollSchedule::parse("0 9 * * 8"),
            Err(ConfigError::InvalidSchedule { .. })
        ));
        assert!(PollSchedule::parse("0 9 * * 5-2").is_err());
        assert!(PollSchedule::parse("0 9 * * */0").is_err());
    }

    #[test]
    fn crontab_day_field_rewrite() {
        assert_eq!(crontab_days_of_week("*").unwrap(), "*");
        assert_eq!(crontab_days_of_week("0").unwrap(), "1");
        assert_eq!(crontab_days_of_week("1-5").unwrap(), "2,3,4,5,6");
        assert_eq!(crontab_days_of_week("6-7").unwrap(), "1,7");
        assert_eq!(crontab_days_of_week("MON-FRI").unwrap(), "MON-FRI");
    }

    #[test]
    fn until_next_is_positive() {
        let schedule = PollSchedule::parse("*/5 * * * *").unwrap();
        assert_eq!(
            schedule.until_next(at("2024-06-01T12:04:30Z")),
            Some(Duration::from_secs(30))
        );
    }
}
