// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last-known reading cache.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::reading::{Reading, SensorKind};

/// Holds the most recent successfully parsed reading.
///
/// Cloning shares the same slot. The lock is never held across an await.
///
/// # Examples
///
/// ```
/// use remo_sensor::{Reading, ReadingCache, SensorKind};
///
/// let cache = ReadingCache::new();
/// assert!(cache.get().is_none());
///
/// cache.store(Reading::new(Some(40.0), Some(20.0), None, false));
/// assert_eq!(cache.number(SensorKind::Temperature), Some(20.0));
/// assert_eq!(cache.number(SensorKind::Light), None);
///
/// cache.clear();
/// assert!(cache.get().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReadingCache {
    slot: Arc<RwLock<Option<Reading>>>,
}

impl ReadingCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached reading.
    #[must_use]
    pub fn get(&self) -> Option<Reading> {
        *self.slot.read()
    }

    /// Replaces the cached reading.
    pub fn store(&self, reading: Reading) {
        *self.slot.write() = Some(reading);
    }

    /// Drops the cached reading.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Returns the cached numeric value for `kind`, if one was reported.
    ///
    /// Only numeric values are eligible for fallback, so this is always
    /// `None` for motion.
    #[must_use]
    pub fn number(&self, kind: SensorKind) -> Option<f64> {
        self.slot.read().and_then(|reading| reading.number(kind))
    }
}
