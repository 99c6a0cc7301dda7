// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTPS transport for the Nature Remo cloud API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{ConfigError, FetchError};

// ============================================================================
// ApiConfig - Connection parameters for the cloud API
// ============================================================================

/// Connection parameters for the cloud API.
///
/// # Examples
///
/// ```
/// use remo_sensor::protocol::ApiConfig;
/// use std::time::Duration;
///
/// // Defaults: public endpoint, 10 s client timeout, 2.5 s on-demand timeout
/// let config = ApiConfig::new();
/// assert_eq!(config.base_url(), "https://api.nature.global");
///
/// // Pointed at a local test server
/// let config = ApiConfig::new()
///     .with_base_url("http://127.0.0.1:8080")
///     .with_read_timeout(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
    timeout: Duration,
    read_timeout: Duration,
}

impl ApiConfig {
    /// Default API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.nature.global";
    /// Default timeout for every request made by the client.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default timeout for on-demand sensor reads.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2500);

    /// Creates a configuration for the public endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
        }
    }

    /// Sets a custom base URL.
    ///
    /// A trailing slash is ignored.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the client-wide request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the timeout applied to on-demand sensor reads.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the client-wide request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the on-demand read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the URL of the device list endpoint.
    #[must_use]
    pub fn devices_url(&self) -> String {
        format!("{}/1/devices", self.base_url)
    }

    /// Creates an `ApiClient` authorized with the given bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self, access_token: impl Into<String>) -> Result<ApiClient, ConfigError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(ApiClient {
            devices_url: self.devices_url(),
            access_token: access_token.into(),
            client,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ApiClient - Raw device list requests
// ============================================================================

/// HTTP client for the device list endpoint.
///
/// Each call is one independent request; see
/// [`SingleFlightRequester`](super::SingleFlightRequester) for sharing a
/// request between concurrent callers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    devices_url: String,
    access_token: String,
    client: Client,
}

impl ApiClient {
    /// Returns the URL of the device list endpoint.
    #[must_use]
    pub fn devices_url(&self) -> &str {
        &self.devices_url
    }

    /// Fetches the raw device list body.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Optional timeout overriding the client-wide one
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` classified as a timeout, connect failure,
    /// non-200 status or other transport failure.
    pub async fn fetch_devices(&self, timeout: Option<Duration>) -> Result<String, FetchError> {
        tracing::debug!(url = %self.devices_url, ?timeout, "Requesting device list");

        let mut request = self
            .client
            .get(&self.devices_url)
            .bearer_auth(&self.access_token);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        log_response(&response);

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::status(
                status.as_u16(),
                status.canonical_reason(),
            ));
        }

        Ok(response.text().await?)
    }
}

/// Logs the status and rate-limit headers of a response.
fn log_response(response: &Response) {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };

    tracing::debug!(
        status = response.status().as_u16(),
        rate_limit = %header("x-rate-limit-limit"),
        rate_remaining = %header("x-rate-limit-remaining"),
        rate_reset = %header("x-rate-limit-reset"),
        "Received device list response"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_config_defaults() {
        let config = ApiConfig::new();
        assert_eq!(config.base_url(), "https://api.nature.global");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.read_timeout(), Duration::from_millis(2500));
        assert_eq!(config.devices_url(), "https://api.nature.global/1/devices");
    }

    #[test]
    fn api_config_trims_trailing_slash() {
        let config = ApiConfig::new().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.devices_url(), "http://127.0.0.1:8080/1/devices");
    }

    #[test]
    fn api_config_builder_chain() {
        let config = ApiConfig::new()
            .with_timeout(Duration::from_secs(3))
            .with_read_timeout(Duration::from_millis(100));
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.read_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn api_config_into_client() {
        let client = ApiConfig::new()
            .with_base_url("http://localhost:1234")
            .into_client("token")
            .unwrap();
        assert_eq!(client.devices_url(), "http://localhost:1234/1/devices");
    }
}
