// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub job status interpretation.
//!
//! Every changed device carries the status of the last job the hub ran for
//! it. A change is only worth delivering once that job has settled; while it
//! is still running the next poll cycle will report it again.

use std::fmt;

use crate::device::DeviceKind;
use crate::state::{ChangeRecord, value_as_i64};

/// Comment fragment the hub uses when it has just dispatched a job.
const SENDING_MARKER: &str = "Sending";

/// Comment fragment a lock reports once its job went through.
const LOCK_SUCCESS_MARKER: &str = "SUCCESS!";

/// Comment fragment of a job error that is safe to ignore.
const BENIGN_ERROR_MARKER: &str = "Setting user configuration";

/// Status of the hub job attached to a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// No job (`-1`).
    NoJob,
    /// Queued (`0`).
    WaitingToStart,
    /// Running (`1`).
    InProgress,
    /// Failed (`2`).
    Error,
    /// Aborted (`3`).
    Aborted,
    /// Finished (`4`).
    Done,
    /// Waiting for the device to answer (`5`).
    WaitingForCallback,
    /// Requeued (`6`).
    Requeue,
    /// Waiting for more data (`7`).
    PendingData,
    /// The record carried no usable `state` field.
    NotPresent,
    /// A code the hub is not documented to send.
    Unknown(i64),
}

impl JobStatus {
    /// Maps a raw hub code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::NoJob,
            0 => Self::WaitingToStart,
            1 => Self::InProgress,
            2 => Self::Error,
            3 => Self::Aborted,
            4 => Self::Done,
            5 => Self::WaitingForCallback,
            6 => Self::Requeue,
            7 => Self::PendingData,
            other => Self::Unknown(other),
        }
    }

    /// Reads the raw status of a record, without any correction.
    #[must_use]
    pub fn from_record(record: &ChangeRecord) -> Self {
        record
            .state()
            .and_then(value_as_i64)
            .map_or(Self::NotPresent, Self::from_code)
    }

    /// Returns the hub code, if the status has one.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::NoJob => Some(-1),
            Self::WaitingToStart => Some(0),
            Self::InProgress => Some(1),
            Self::Error => Some(2),
            Self::Aborted => Some(3),
            Self::Done => Some(4),
            Self::WaitingForCallback => Some(5),
            Self::Requeue => Some(6),
            Self::PendingData => Some(7),
            Self::NotPresent => None,
            Self::Unknown(code) => Some(*code),
        }
    }

    /// Returns `true` while the job has not settled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::WaitingToStart
                | Self::InProgress
                | Self::WaitingForCallback
                | Self::Requeue
                | Self::PendingData
        )
    }

    /// Returns `true` for the statuses that allow delivery outright.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Done | Self::NotPresent | Self::NoJob)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{self:?}({code})"),
            None => write!(f, "{self:?}"),
        }
    }
}

/// What to do with one change record for one device object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    /// Merge the record, attach alerts and run callbacks.
    Deliver,
    /// The job is still running; drop this record and wait for the next cycle.
    Defer,
    /// The job failed; log and drop this record.
    LogError,
}

/// Returns the record's status after the hub-quirk corrections.
///
/// - A "Sending" comment with no job means a job was just queued.
/// - A lock reporting a running job with "SUCCESS!" in the comment has
///   actually finished. This matches on hub-localized text, so a lock whose
///   name contains that literal is misread.
#[must_use]
pub fn effective_status(kind: DeviceKind, record: &ChangeRecord) -> JobStatus {
    let comment = record.comment();
    let mut status = JobStatus::from_record(record);

    if status == JobStatus::NoJob && comment.contains(SENDING_MARKER) {
        status = JobStatus::WaitingToStart;
    }

    if status == JobStatus::InProgress
        && kind == DeviceKind::Lock
        && comment.contains(LOCK_SUCCESS_MARKER)
    {
        status = JobStatus::Done;
    }

    status
}

/// Decides what to do with a record given its corrected status.
#[must_use]
pub fn outcome_for(status: JobStatus, comment: &str) -> JobOutcome {
    if status.is_pending() {
        JobOutcome::Defer
    } else if status.is_clean()
        || (status == JobStatus::Error && comment.contains(BENIGN_ERROR_MARKER))
    {
        JobOutcome::Deliver
    } else {
        JobOutcome::LogError
    }
}

/// Classifies one change record for a device of the given kind.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vera_lib::device::DeviceKind;
/// use vera_lib::state::ChangeRecord;
/// use vera_lib::subscription::{JobOutcome, classify};
///
/// let record = ChangeRecord::from_value(json!({"id": 10, "state": 1, "comment": "Lock: SUCCESS!"})).unwrap();
/// assert_eq!(classify(DeviceKind::Lock, &record), JobOutcome::Deliver);
/// assert_eq!(classify(DeviceKind::Switch, &record), JobOutcome::Defer);
/// ```
#[must_use]
pub fn classify(kind: DeviceKind, record: &ChangeRecord) -> JobOutcome {
    outcome_for(effective_status(kind, record), record.comment())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(fields: Value) -> ChangeRecord {
        ChangeRecord::from_value(fields).unwrap()
    }

    #[test]
    fn pending_states_are_deferred() {
        for code in [0, 1, 5, 6, 7] {
            let r = record(json!({"id": 1, "state": code}));
            assert_eq!(
                classify(DeviceKind::Switch, &r),
                JobOutcome::Defer,
                "state {code}"
            );
        }
    }

    #[test]
    fn clean_states_are_delivered() {
        for fields in [
            json!({"id": 1, "state": 4}),
            json!({"id": 1, "state": -1}),
            json!({"id": 1}),
            json!({"id": 1, "state": "4"}),
        ] {
            assert_eq!(classify(DeviceKind::Dimmer, &record(fields)), JobOutcome::Deliver);
        }
    }

    #[test]
    fn failed_states_are_errors() {
        assert_eq!(
            classify(DeviceKind::Switch, &record(json!({"id": 1, "state": 2, "comment": "No response"}))),
            JobOutcome::LogError
        );
        assert_eq!(
            classify(DeviceKind::Switch, &record(json!({"id": 1, "state": 3}))),
            JobOutcome::LogError
        );
        assert_eq!(
            classify(DeviceKind::Switch, &record(json!({"id": 1, "state": 42}))),
            JobOutcome::LogError
        );
    }

    #[test]
    fn benign_error_is_delivered() {
        let r = record(json!({"id": 1, "state": 2, "comment": "Setting user configuration..."}));
        assert_eq!(classify(DeviceKind::Lock, &r), JobOutcome::Deliver);
    }

    #[test]
    fn sending_comment_promotes_no_job() {
        let r = record(json!({"id": 1, "state": -1, "comment": "Front door: Sending the Z-Wave command"}));
        assert_eq!(effective_status(DeviceKind::Switch, &r), JobStatus::WaitingToStart);
        assert_eq!(classify(DeviceKind::Switch, &r), JobOutcome::Defer);

        // Only "no job" is promoted.
        let r = record(json!({"id": 1, "state": 4, "comment": "Sending"}));
        assert_eq!(classify(DeviceKind::Switch, &r), JobOutcome::Deliver);
    }

    #[test]
    fn lock_success_heuristic() {
        let success = record(json!({"id": 10, "state": 1, "comment": "Front door: SUCCESS! Successfully locked"}));
        assert_eq!(effective_status(DeviceKind::Lock, &success), JobStatus::Done);
        assert_eq!(classify(DeviceKind::Lock, &success), JobOutcome::Deliver);

        let running = record(json!({"id": 10, "state": 1, "comment": "Front door: Waiting"}));
        assert_eq!(classify(DeviceKind::Lock, &running), JobOutcome::Defer);
    }

    #[test]
    fn status_codes() {
        assert_eq!(JobStatus::from_code(-1), JobStatus::NoJob);
        assert_eq!(JobStatus::from_code(99).code(), Some(99));
        assert_eq!(JobStatus::NotPresent.code(), None);
        assert_eq!(JobStatus::Done.to_string(), "Done(4)");
        assert_eq!(
            JobStatus::from_record(&record(json!({"state": "garbage"}))),
            JobStatus::NotPresent
        );
    }
}
