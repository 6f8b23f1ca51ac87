// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll loop timing configuration.

use std::time::Duration;

/// Timing and policy knobs for the subscription poll loop.
///
/// # Examples
///
/// ```
/// use vera_lib::subscription::PollConfig;
/// use std::time::Duration;
///
/// let config = PollConfig::default()
///     .with_wait_timeout(Duration::from_secs(10))
///     .with_retry_delay(Duration::from_secs(5));
///
/// assert_eq!(config.transport_timeout(), Duration::from_secs(20));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    wait_timeout: Duration,
    min_delay: Duration,
    poll_interval: Duration,
    retry_delay: Duration,
    always_update: bool,
}

impl PollConfig {
    /// How long the hub may hold a long-poll open.
    pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Minimum delay the hub waits before answering a long-poll.
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(200);
    /// Idle wait between two poll cycles.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Back-off after the hub could not be reached.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wait hint sent with each long-poll.
    #[must_use]
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Sets the minimum delay hint sent with each long-poll.
    #[must_use]
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Sets the idle wait between poll cycles.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the back-off applied after a transport error.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Fetches alerts and dispatches on every cycle, even when the data
    /// version did not move.
    #[must_use]
    pub fn with_always_update(mut self, always_update: bool) -> Self {
        self.always_update = always_update;
        self
    }

    /// Returns the long-poll wait hint.
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Returns the long-poll minimum delay hint.
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Returns the idle wait between poll cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the back-off after a transport error.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Returns whether every cycle dispatches.
    #[must_use]
    pub fn always_update(&self) -> bool {
        self.always_update
    }

    /// Client-side timeout for a long-poll request: twice the wait hint, so
    /// the socket outlives a legitimate "nothing changed" answer.
    #[must_use]
    pub fn transport_timeout(&self) -> Duration {
        self.wait_timeout.saturating_mul(2)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Self::DEFAULT_WAIT_TIMEOUT,
            min_delay: Self::DEFAULT_MIN_DELAY,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            always_update: false,
        }
    }
}
