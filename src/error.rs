// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `vera_lib` library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, hub communication, response parsing and device operations.
//!
//! The poll loop relies on two classifications:
//!
//! - [`Error::is_transport`]: the hub could not be reached or the connection
//!   dropped. The loop backs off before retrying.
//! - [`Error::is_protocol`]: the hub answered, but with something unusable.
//!   The loop resets its cursor to force a full resync.

use thiserror::Error;

use crate::types::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during communication with the hub.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing hub data.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during device operations.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Device was not found on the hub.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    /// The background poll loop terminated abnormally.
    #[error("poll loop failed: {0}")]
    PollLoop(String),
}

impl Error {
    /// Returns `true` if the hub could not be contacted.
    ///
    /// Connection refused, DNS failures, timeouts and connections dropped
    /// while reading the body all fall in this category.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::Http(_)))
    }

    /// Returns `true` if the hub answered with an unusable response.
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::Protocol(
                ProtocolError::HttpStatus { .. }
                    | ProtocolError::EmptyResponse
                    | ProtocolError::MalformedResponse(_)
            )
        )
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An unknown HVAC operating mode was provided.
    #[error("invalid HVAC mode: {0}")]
    InvalidHvacMode(String),

    /// An unknown fan operating mode was provided.
    #[error("invalid fan mode: {0}")]
    InvalidFanMode(String),

    /// A device identifier could not be parsed.
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),
}

/// Errors related to communication with the hub.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed before a complete response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The hub answered with a non-success status code.
    #[error("hub returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// The hub closed the connection without sending a body.
    ///
    /// This happens routinely while the hub reloads its engine.
    #[error("empty response from hub")]
    EmptyResponse,

    /// The body could not be decoded or lacks required fields.
    #[error("unexpected or garbled response: {0}")]
    MalformedResponse(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing hub data.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Device does not support the requested capability.
    #[error("{device} does not support {capability}")]
    UnsupportedCapability {
        /// Name of the device.
        device: String,
        /// The capability that is not supported.
        capability: String,
    },

    /// The device does not expose the service variable a command needs.
    #[error("device {device} has no variable {variable}")]
    UnknownVariable {
        /// Name of the device.
        device: String,
        /// The missing variable.
        variable: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
