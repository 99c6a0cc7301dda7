// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collapses concurrent device list requests into one HTTP exchange.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::http::ApiClient;
use crate::error::{FetchError, FetchErrorKind};

/// Outcome shared by every caller of one exchange.
type FetchOutcome = Result<Arc<str>, FetchError>;

/// Per-call options for [`SingleFlightRequester::fetch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    timeout: Option<Duration>,
}

impl FetchOptions {
    /// Creates options with no per-call timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the call by the given timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Single-flight wrapper around [`ApiClient`].
///
/// While a request is in flight, further callers wait for that request
/// instead of starting their own. The exchange runs in its own task, so a
/// caller giving up early never cancels it for the others.
///
/// # Timeouts
///
/// The timeout of the caller that starts a request also bounds the HTTP
/// exchange itself. Every caller's wait is bounded by its own timeout; a
/// wait that runs out yields a timeout error for that caller only.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use remo_sensor::protocol::{ApiConfig, FetchOptions, SingleFlightRequester};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let requester = SingleFlightRequester::new(ApiConfig::new().into_client("token")?);
///
/// let options = FetchOptions::new().with_timeout(Duration::from_millis(2500));
/// let (a, b) = tokio::join!(requester.fetch(options), requester.fetch(options));
/// // Both calls were served by one HTTP request.
/// assert_eq!(a?, b?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SingleFlightRequester {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: ApiClient,
    /// Waiters of the request in flight; `None` when idle.
    in_flight: Mutex<Option<Vec<oneshot::Sender<FetchOutcome>>>>,
}

impl SingleFlightRequester {
    /// Creates a requester over the given client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Returns true while a request is in flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Fetches the raw device list body, joining a request already in flight.
    ///
    /// # Errors
    ///
    /// Returns the shared request's error, or a timeout error if this
    /// caller's wait exceeded its own timeout.
    pub async fn fetch(&self, options: FetchOptions) -> Result<Arc<str>, FetchError> {
        let (tx, rx) = oneshot::channel();

        let initiate = {
            let mut in_flight = self.inner.in_flight.lock();
            if let Some(waiters) = in_flight.as_mut() {
                waiters.push(tx);
                false
            } else {
                *in_flight = Some(vec![tx]);
                true
            }
        };

        if initiate {
            self.spawn_exchange(options.timeout);
        } else {
            tracing::trace!("Joining device list request in flight");
        }

        let wait = async {
            rx.await.unwrap_or_else(|_| {
                Err(FetchError::new(
                    FetchErrorKind::Transport,
                    "request task ended without a result",
                ))
            })
        };

        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .unwrap_or_else(|_| Err(FetchError::timeout(limit.as_millis()))),
            None => wait.await,
        }
    }

    fn spawn_exchange(&self, timeout: Option<Duration>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome: FetchOutcome = inner
                .client
                .fetch_devices(timeout)
                .await
                .map(Arc::from);

            // Clear the marker before resolving so a waiter that fetches
            // again starts a fresh request.
            let waiters = inner.in_flight.lock().take().unwrap_or_default();

            if let Err(e) = &outcome {
                tracing::debug!(error = %e, waiters = waiters.len(), "Device list request failed");
            }
            for waiter in waiters {
                // The receiver is gone if that caller already timed out.
                let _ = waiter.send(outcome.clone());
            }
        });
    }
}
