// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alerts from the `status` operation.

use crate::error::ProtocolError;
use crate::protocol::HttpClient;
use crate::state::{AlertRecord, Cursor};

use super::{parse_object, take_objects};

/// Fetches the alerts fired since `cursor`.
///
/// Pass the cursor the previous long-poll was sent with, not the one it
/// returned, or the alerts of the current cycle are skipped.
///
/// # Errors
///
/// Same classification as [`long_poll`](super::long_poll).
pub async fn fetch_alerts(
    client: &HttpClient,
    cursor: Cursor,
) -> Result<Vec<AlertRecord>, ProtocolError> {
    let params = [
        ("id", "status".to_string()),
        ("LoadTime", cursor.loadtime().to_string()),
        ("DataVersion", cursor.dataversion().to_string()),
    ];

    let response = client.data_request(&params, None).await?.error_for_status()?;

    parse_alerts(response.body())
}

/// Parses a `status` response body into its alerts.
///
/// # Errors
///
/// Returns `EmptyResponse` for an empty body and `MalformedResponse` when the
/// body is not a JSON object carrying `LoadTime` and `DataVersion`.
pub fn parse_alerts(body: &str) -> Result<Vec<AlertRecord>, ProtocolError> {
    let mut object = parse_object(body, &["LoadTime", "DataVersion"])?;

    Ok(take_objects(&mut object, "alerts")
        .into_iter()
        .map(AlertRecord::new)
        .collect())
}
