// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alert records from the hub's `status` operation.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{value_as_i64, value_as_string};
use crate::types::DeviceId;

/// One alert fired on the hub, such as a PIN code being used or a low
/// battery warning.
///
/// A device only keeps the alerts seen in its most recent poll cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertRecord {
    fields: Map<String, Value>,
}

impl AlertRecord {
    /// Alert code for a lock being operated with a user code.
    pub const CODE_USER_CODE: &'static str = "DL_USERCODE";
    /// Alert code for a lock's battery running low.
    pub const CODE_LOW_BATTERY: &'static str = "DL_LOW_BATTERY";

    /// Creates an alert from a JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Creates an alert from any JSON value; returns `None` for non-objects.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Returns the device the alert belongs to (`PK_Device`).
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        self.fields.get("PK_Device").and_then(DeviceId::from_json)
    }

    /// Returns the alert code (`Code`).
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.fields.get("Code").and_then(Value::as_str)
    }

    /// Returns the severity (`Severity`).
    #[must_use]
    pub fn severity(&self) -> Option<i64> {
        self.fields.get("Severity").and_then(value_as_i64)
    }

    /// Returns the value at the time of the alert (`NewValue`).
    #[must_use]
    pub fn new_value(&self) -> Option<String> {
        self.fields.get("NewValue").and_then(value_as_string)
    }

    /// Returns the human-readable description (`Description`).
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.fields.get("Description").and_then(Value::as_str)
    }

    /// Returns when the alert fired, from the `LocalTimestamp` epoch seconds.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.fields
            .get("LocalTimestamp")
            .and_then(value_as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
