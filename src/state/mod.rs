// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub state records.
//!
//! This module provides the data exchanged with the hub while polling:
//!
//! - [`Cursor`] - Progress token threaded from one long-poll into the next
//! - [`ChangeRecord`] - One changed device as reported by a long-poll
//! - [`AlertRecord`] - One alert fired on the hub
//! - [`DeviceState`] - The cached state a device object holds
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use vera_lib::state::{ChangeRecord, DeviceState};
//!
//! let mut state = DeviceState::from_info(
//!     json!({"id": 10, "locked": "0"}).as_object().unwrap().clone(),
//!     Vec::new(),
//! );
//!
//! let record = ChangeRecord::from_value(json!({"id": 10, "locked": "1", "foo": 1})).unwrap();
//! state.merge(&record);
//!
//! assert_eq!(state.get("locked").and_then(|v| v.as_str()), Some("1"));
//! assert!(state.get("foo").is_none());
//! ```

mod alert;
mod change_record;
mod cursor;
mod device_state;

pub use alert::AlertRecord;
pub use change_record::ChangeRecord;
pub use cursor::Cursor;
pub use device_state::{DeviceState, StateVariable};

use serde_json::Value;

/// Reads an integer from a JSON number or numeric string.
///
/// The hub is inconsistent about quoting numbers, so every numeric field is
/// read through this.
pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a float from a JSON number or numeric string.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Renders a scalar JSON value the way the hub would send it as text.
pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}
