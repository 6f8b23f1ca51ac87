// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `lu_sdata` long-poll.

use crate::error::ProtocolError;
use crate::protocol::HttpClient;
use crate::state::{ChangeRecord, Cursor};
use crate::subscription::PollConfig;

use super::{parse_object, take_objects};

/// Result of one long-poll.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangedDevices {
    /// Devices the hub reported as changed. Empty when nothing changed.
    pub devices: Vec<ChangeRecord>,
    /// Cursor to send with the next long-poll.
    pub cursor: Cursor,
}

/// Asks the hub what changed since `cursor`, blocking up to the configured
/// wait hint.
///
/// # Errors
///
/// Returns `ProtocolError::Http` if the hub cannot be reached, and any of
/// `HttpStatus`, `EmptyResponse` or `MalformedResponse` if it answers with
/// something unusable. After the latter the cursor must be reset.
pub async fn long_poll(
    client: &HttpClient,
    cursor: Cursor,
    config: &PollConfig,
) -> Result<ChangedDevices, ProtocolError> {
    let params = [
        ("id", "lu_sdata".to_string()),
        ("timeout", config.wait_timeout().as_secs().to_string()),
        ("minimumdelay", config.min_delay().as_millis().to_string()),
        ("loadtime", cursor.loadtime().to_string()),
        ("dataversion", cursor.dataversion().to_string()),
    ];

    let response = client
        .data_request(&params, Some(config.transport_timeout()))
        .await?
        .error_for_status()?;

    parse_changed_devices(response.body())
}

/// Parses an `lu_sdata` response body.
///
/// # Errors
///
/// Returns `EmptyResponse` for an empty body and `MalformedResponse` when the
/// body is not a JSON object carrying `loadtime` and `dataversion`.
pub fn parse_changed_devices(body: &str) -> Result<ChangedDevices, ProtocolError> {
    let mut object = parse_object(body, &["loadtime", "dataversion"])?;

    let cursor = Cursor::from_fields(object.get("dataversion"), object.get("loadtime"));
    let devices = take_objects(&mut object, "devices")
        .into_iter()
        .map(ChangeRecord::new)
        .collect();

    Ok(ChangedDevices { devices, cursor })
}
