// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change feeds from the hub.
//!
//! The hub exposes two feeds the poll loop reads on every cycle:
//!
//! - `lu_sdata` - a long-poll that blocks until something changed and
//!   returns the changed devices plus a new [`Cursor`](crate::state::Cursor)
//! - `status` - an immediate request returning alerts fired since a cursor
//!
//! Both validate the response shape the same way: an empty body is
//! [`ProtocolError::EmptyResponse`], anything that is not a JSON object with
//! the expected cursor fields is [`ProtocolError::MalformedResponse`].
//!
//! # Examples
//!
//! ```
//! use vera_lib::telemetry::parse_changed_devices;
//! use vera_lib::state::Cursor;
//!
//! let body = r#"{"loadtime": 10, "dataversion": 2, "devices": [{"id": 10, "state": 4}]}"#;
//! let changed = parse_changed_devices(body).unwrap();
//!
//! assert_eq!(changed.cursor, Cursor::new(2, 10));
//! assert_eq!(changed.devices.len(), 1);
//! ```

mod alerts;
mod changes;

pub use alerts::{fetch_alerts, parse_alerts};
pub use changes::{ChangedDevices, long_poll, parse_changed_devices};

use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Parses a feed body into a JSON object, requiring the given fields.
fn parse_object(body: &str, required: &[&str]) -> Result<Map<String, Value>, ProtocolError> {
    if body.trim().is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProtocolError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let Value::Object(object) = value else {
        return Err(ProtocolError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    if let Some(missing) = required.iter().find(|field| !object.contains_key(**field)) {
        return Err(ProtocolError::MalformedResponse(format!(
            "missing field: {missing}"
        )));
    }

    Ok(object)
}

/// Takes an array field out of a parsed feed, keeping only object entries.
fn take_objects(object: &mut Map<String, Value>, field: &str) -> Vec<Map<String, Value>> {
    match object.remove(field) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(fields) => Some(fields),
                other => {
                    tracing::debug!(field, entry = %other, "Skipping non-object feed entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_empty_response() {
        assert!(matches!(
            parse_object("", &[]),
            Err(ProtocolError::EmptyResponse)
        ));
        assert!(matches!(
            parse_object("  \n", &[]),
            Err(ProtocolError::EmptyResponse)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_object("<html>", &[]),
            Err(ProtocolError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_object("[1]", &[]),
            Err(ProtocolError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = parse_object(r#"{"a": 1}"#, &["a", "b"]).unwrap_err();
        assert_eq!(err.to_string(), "unexpected or garbled response: missing field: b");
    }

    #[test]
    fn take_objects_skips_scalars() {
        let mut object = parse_object(r#"{"devices": [{"id": 1}, 2, "x"]}"#, &[]).unwrap();
        assert_eq!(take_objects(&mut object, "devices").len(), 1);
        assert!(take_objects(&mut object, "devices").is_empty());
    }
}
