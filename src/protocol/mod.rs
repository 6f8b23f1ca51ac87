// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport for communicating with the hub.
//!
//! Every hub operation is an HTTP GET against `/data_request` with the
//! operation name and its arguments in the query string. [`HttpClient`]
//! wraps that single endpoint; [`HubResponse`] carries what came back.

mod http;

pub use http::{HttpClient, HttpConfig};

use serde::de::DeserializeOwned;

use crate::error::{ParseError, ProtocolError};

/// Raw response from a `data_request` call.
#[derive(Debug, Clone)]
pub struct HubResponse {
    status: u16,
    body: String,
}

impl HubResponse {
    /// Creates a response from a status code and body.
    #[must_use]
    pub fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns `true` for 2xx status codes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-success status into an error.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::HttpStatus` if the status is not 2xx.
    pub fn error_for_status(self) -> Result<Self, ProtocolError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProtocolError::HttpStatus {
                status: self.status,
            })
        }
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be parsed into the target type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}
