// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Long-poll progress cursor.

use std::fmt;

use serde_json::Value;

use super::value_as_i64;

/// Progress token for the long-poll protocol.
///
/// The hub returns a `(dataversion, loadtime)` pair with every long-poll and
/// expects it back verbatim on the next one. Only `dataversion` is ever
/// compared, to decide whether anything changed.
///
/// # Examples
///
/// ```
/// use vera_lib::state::Cursor;
///
/// let cursor = Cursor::default();
/// assert_eq!(cursor, Cursor::INITIAL);
/// assert!(Cursor::new(2, 10).version_changed(&cursor));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    dataversion: i64,
    loadtime: i64,
}

impl Cursor {
    /// Cursor that asks the hub for a full resync.
    pub const INITIAL: Self = Self {
        dataversion: 1,
        loadtime: 0,
    };

    /// Creates a cursor from its two components.
    #[must_use]
    pub const fn new(dataversion: i64, loadtime: i64) -> Self {
        Self {
            dataversion,
            loadtime,
        }
    }

    /// Builds a cursor from raw response fields.
    ///
    /// A missing or non-numeric component falls back to the matching
    /// component of [`Cursor::INITIAL`].
    #[must_use]
    pub fn from_fields(dataversion: Option<&Value>, loadtime: Option<&Value>) -> Self {
        Self {
            dataversion: dataversion
                .and_then(value_as_i64)
                .unwrap_or(Self::INITIAL.dataversion),
            loadtime: loadtime
                .and_then(value_as_i64)
                .unwrap_or(Self::INITIAL.loadtime),
        }
    }

    /// Returns the data version component.
    #[must_use]
    pub const fn dataversion(&self) -> i64 {
        self.dataversion
    }

    /// Returns the load time component.
    #[must_use]
    pub const fn loadtime(&self) -> i64 {
        self.loadtime
    }

    /// Returns `true` if the data versions differ.
    #[must_use]
    pub const fn version_changed(&self, other: &Self) -> bool {
        self.dataversion != other.dataversion
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dataversion={} loadtime={}",
            self.dataversion, self.loadtime
        )
    }
}
