// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Changed-device records from the long-poll.

use serde_json::{Map, Value};

use crate::types::DeviceId;

/// One changed device from a long-poll response.
///
/// Besides the device id, a record carries the job fields `state` and
/// `comment` and any number of device attributes the hub wants merged into
/// the cached device info.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeRecord {
    fields: Map<String, Value>,
}

impl ChangeRecord {
    /// Creates a record from a JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Creates a record from any JSON value; returns `None` for non-objects.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Returns the device id, read from `id` or, failing that, `device`.
    #[must_use]
    pub fn id(&self) -> Option<DeviceId> {
        self.fields
            .get("id")
            .or_else(|| self.fields.get("device"))
            .and_then(DeviceId::from_json)
    }

    /// Returns the raw job `state` field, if present.
    #[must_use]
    pub fn state(&self) -> Option<&Value> {
        self.fields.get("state")
    }

    /// Returns the job comment, or an empty string.
    #[must_use]
    pub fn comment(&self) -> &str {
        self.fields
            .get("comment")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns all fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for ChangeRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
