// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `remo_sensor` library.
//!
//! Failures fall into two families: fetch errors raised while talking to the
//! cloud API, and configuration errors raised while building a client.
//! Missing sensor fields in a response are never errors; they surface as
//! `None` (or `false` for motion) in a [`Reading`](crate::Reading).

use std::fmt;

use thiserror::Error;

use crate::reading::SensorKind;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching data from the cloud API failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The requested sensor kind is disabled by configuration.
    #[error("sensor {0} is disabled")]
    SensorDisabled(SensorKind),
}

impl Error {
    /// Returns true if this error is a fetch timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_timeout())
    }
}

/// Classification of a failed fetch, assigned by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connect or read timeout, or an on-demand wait that ran out.
    Timeout,
    /// The connection could not be established (refused, DNS, TLS).
    Connect,
    /// The server answered with a status other than 200.
    Status(u16),
    /// Any other transport failure (body read, protocol error).
    Transport,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Connect => f.write_str("connect"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Transport => f.write_str("transport"),
        }
    }
}

/// A failed request against the cloud API.
///
/// The error is `Clone` because a single in-flight request hands the same
/// outcome to every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    /// Creates a new fetch error.
    #[must_use]
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a timeout error for a wait that exceeded `millis`.
    #[must_use]
    pub fn timeout(millis: u128) -> Self {
        Self::new(
            FetchErrorKind::Timeout,
            format!("no response within {millis} ms"),
        )
    }

    /// Creates an error for a non-200 response.
    #[must_use]
    pub fn status(code: u16, reason: Option<&str>) -> Self {
        Self::new(FetchErrorKind::Status(code), reason.unwrap_or("Unknown"))
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the fetch failed with a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind == FetchErrorKind::Timeout
    }

    /// Returns the HTTP status code for status failures.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            FetchErrorKind::Status(code) => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest reports connect timeouts as both connect and timeout errors
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_connect() {
            FetchErrorKind::Connect
        } else if let Some(status) = err.status() {
            FetchErrorKind::Status(status.as_u16())
        } else {
            FetchErrorKind::Transport
        };
        Self::new(kind, err.to_string())
    }
}

/// Errors related to client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No access token was configured.
    #[error("access token is missing")]
    MissingAccessToken,

    /// The schedule is not a valid cron expression.
    #[error("invalid schedule {expression:?}: {message}")]
    InvalidSchedule {
        /// The rejected expression.
        expression: String,
        /// Description of the parse failure.
        message: String,
    },

    /// The configuration document is not valid JSON.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
