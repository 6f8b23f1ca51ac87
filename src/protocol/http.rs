// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the hub's `data_request` endpoint.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ProtocolError;
use crate::protocol::HubResponse;

// ============================================================================
// HttpConfig - Connection parameters for a hub
// ============================================================================

/// Configuration for reaching a hub over HTTP.
///
/// # Examples
///
/// ```
/// use vera_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.161");
/// assert_eq!(config.base_url(), "http://192.168.1.161:3480");
///
/// let config = HttpConfig::new("vera.local")
///     .with_port(80)
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url(), "http://vera.local");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    timeout: Duration,
}

impl HttpConfig {
    /// Port the hub's local API listens on.
    pub const DEFAULT_PORT: u16 = 3480;
    /// Default request timeout for short requests.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Creates a configuration from a full URL such as
    /// `http://192.168.1.161:3480`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the URL cannot be parsed,
    /// has no host, or uses a scheme other than http/https.
    pub fn from_url(url: &str) -> Result<Self, ProtocolError> {
        let parsed =
            Url::parse(url).map_err(|e| ProtocolError::InvalidAddress(format!("{url}: {e}")))?;

        let use_https = match parsed.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(ProtocolError::InvalidAddress(format!(
                    "unsupported scheme: {other}"
                )));
            }
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| ProtocolError::InvalidAddress(format!("{url}: missing host")))?;

        let port = parsed.port_or_known_default().unwrap_or(Self::DEFAULT_PORT);

        Ok(Self {
            host: host.to_string(),
            port,
            use_https,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        self
    }

    /// Sets the timeout for short requests. Long-polls use their own.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        let base_url = self.base_url();

        // The per-request timeout is set on each call so long-polls can
        // outlive the default.
        let client = Client::builder().build().map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            base_url,
            client,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// HttpClient - Request execution
// ============================================================================

/// HTTP client for the hub's `data_request` endpoint.
///
/// Cloning is cheap; clones share the underlying connection pool.
///
/// # Examples
///
/// ```no_run
/// use vera_lib::protocol::HttpConfig;
///
/// # async fn example() -> vera_lib::Result<()> {
/// let client = HttpConfig::new("192.168.1.161").into_client()?;
/// let response = client
///     .data_request(&[("id", "sdata".to_string())], None)
///     .await?;
/// println!("{}", response.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Returns the base URL of the hub.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the URL for a `data_request` call.
    fn build_url(&self, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/data_request?{query}", self.base_url)
    }

    /// Performs a GET against `/data_request` with the given parameters.
    ///
    /// `timeout` overrides the client's default for this request only.
    /// Non-success statuses are returned as-is; use
    /// [`HubResponse::error_for_status`] to reject them.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Http` if the request cannot be sent or the
    /// body cannot be read.
    pub async fn data_request(
        &self,
        params: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<HubResponse, ProtocolError> {
        let url = self.build_url(params);
        let timeout = timeout.unwrap_or(self.timeout);

        tracing::debug!(url = %url, ?timeout, "Sending hub request");

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(status, body_len = body.len(), "Received hub response");

        Ok(HubResponse::new(status, body))
    }
}
