// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type for color-capable dimmers.
//!
//! The hub reports the current color through the `CurrentColor` variable as
//! a list of channel assignments (`"I=0,A=0,R=255,G=100,B=100"`) and accepts
//! new colors as a plain `"R,G,B"` triple.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use vera_lib::types::RgbColor;
///
/// let color: RgbColor = "I=0,A=0,R=255,G=100,B=100".parse().unwrap();
/// assert_eq!(color, RgbColor::new(255, 100, 100));
/// assert_eq!(color.to_command_value(), "255,100,100");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the `"R,G,B"` form used by the `SetColorRGB` action.
    #[must_use]
    pub fn to_command_value(&self) -> String {
        format!("{},{},{}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

impl FromStr for RgbColor {
    type Err = ParseError;

    /// Parses the hub's channel list. Channels other than R, G and B are
    /// ignored; all three of R, G and B must be present.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ParseError::InvalidValue {
            field: "CurrentColor".to_string(),
            message,
        };

        let (mut red, mut green, mut blue) = (None, None, None);
        for part in s.split(',') {
            let Some((channel, value)) = part.split_once('=') else {
                continue;
            };
            let slot = match channel.trim() {
                "R" => &mut red,
                "G" => &mut green,
                "B" => &mut blue,
                _ => continue,
            };
            let value = value
                .trim()
                .parse::<u8>()
                .map_err(|e| invalid(format!("channel {channel}: {e}")))?;
            *slot = Some(value);
        }

        match (red, green, blue) {
            (Some(r), Some(g), Some(b)) => Ok(Self::new(r, g, b)),
            _ => Err(invalid(format!("missing R, G or B channel in {s:?}"))),
        }
    }
}
