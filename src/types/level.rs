// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Level and brightness types for dimmers and window coverings.
//!
//! The hub stores load levels as a percentage (0-100). Applications usually
//! think of light brightness on a 0-255 scale, so [`Brightness`] converts
//! between the two the same way the hub's own UI does.

use std::fmt;

use crate::error::ValueError;

/// Load level as a percentage (0-100).
///
/// Used by dimmers (`level`) and curtains (open percentage).
///
/// # Examples
///
/// ```
/// use vera_lib::types::Level;
///
/// let half = Level::new(50).unwrap();
/// assert_eq!(half.value(), 50);
/// assert!(Level::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(u8);

impl Level {
    /// Fully closed / off.
    pub const MIN: Self = Self(0);

    /// Fully open / full power.
    pub const MAX: Self = Self(100);

    /// Creates a new level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a level, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Level {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Light brightness on a 0-255 scale.
///
/// # Examples
///
/// ```
/// use vera_lib::types::{Brightness, Level};
///
/// let b = Brightness::new(255);
/// assert_eq!(b.to_level(), Level::MAX);
/// assert_eq!(Brightness::from_level(Level::new(26).unwrap()).value(), 66);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Brightness(u8);

impl Brightness {
    /// Off.
    pub const MIN: Self = Self(0);

    /// Full brightness.
    pub const MAX: Self = Self(255);

    /// Creates a brightness value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw 0-255 value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Converts to the hub's percentage level (`round(value / 2.55)`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_level(self) -> Level {
        if self.0 == 0 {
            return Level::MIN;
        }
        Level::clamped((f64::from(self.0) / 2.55).round() as u8)
    }

    /// Converts from the hub's percentage level (`round(level * 2.55)`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_level(level: Level) -> Self {
        Self((f64::from(level.value()) * 2.55).round() as u8)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
