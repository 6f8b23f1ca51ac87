// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ValueError;

/// Identifier the hub uses for a device.
///
/// The hub reports ids as JSON numbers in most payloads but as strings in
/// some (`"PK_Device": "12"`), so [`DeviceId::from_json`] accepts both.
///
/// # Examples
///
/// ```
/// use vera_lib::types::DeviceId;
///
/// let id = DeviceId::new(10);
/// assert_eq!(id.value(), 10);
/// assert_eq!("10".parse::<DeviceId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Creates a device identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Reads an id from a JSON number or numeric string.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).map(Self),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| ValueError::InvalidDeviceId(s.to_string()))
    }
}

impl From<u32> for DeviceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_number() {
        assert_eq!(DeviceId::from_json(&json!(45)), Some(DeviceId::new(45)));
    }

    #[test]
    fn from_json_string() {
        assert_eq!(DeviceId::from_json(&json!("45")), Some(DeviceId::new(45)));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert_eq!(DeviceId::from_json(&json!(-1)), None);
        assert_eq!(DeviceId::from_json(&json!("abc")), None);
        assert_eq!(DeviceId::from_json(&json!(null)), None);
    }

    #[test]
    fn parse_invalid() {
        let err = "x1".parse::<DeviceId>().unwrap_err();
        assert_eq!(err, ValueError::InvalidDeviceId("x1".to_string()));
    }
}
