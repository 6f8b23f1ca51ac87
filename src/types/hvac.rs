// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat operating modes.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// HVAC operating mode of a thermostat.
///
/// # Examples
///
/// ```
/// use vera_lib::types::HvacMode;
///
/// assert_eq!(HvacMode::HeatOn.as_str(), "HeatOn");
/// assert_eq!("autochangeover".parse::<HvacMode>().unwrap(), HvacMode::AutoChangeOver);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HvacMode {
    /// System off.
    Off,
    /// Heating.
    HeatOn,
    /// Cooling.
    CoolOn,
    /// Automatic heat/cool change-over.
    AutoChangeOver,
}

impl HvacMode {
    /// Returns the string the hub uses for this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::HeatOn => "HeatOn",
            Self::CoolOn => "CoolOn",
            Self::AutoChangeOver => "AutoChangeOver",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "heaton" => Ok(Self::HeatOn),
            "coolon" => Ok(Self::CoolOn),
            "autochangeover" => Ok(Self::AutoChangeOver),
            _ => Err(ValueError::InvalidHvacMode(s.to_string())),
        }
    }
}

/// Fan operating mode of a thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanMode {
    /// Fan off.
    Off,
    /// Fan always running.
    ContinuousOn,
    /// Fan follows the HVAC cycle.
    Auto,
    /// Fan runs periodically.
    PeriodicOn,
}

impl FanMode {
    /// Returns the string the hub uses for this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::ContinuousOn => "ContinuousOn",
            Self::Auto => "Auto",
            Self::PeriodicOn => "PeriodicOn",
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "continuouson" => Ok(Self::ContinuousOn),
            "auto" => Ok(Self::Auto),
            "periodicon" => Ok(Self::PeriodicOn),
            _ => Err(ValueError::InvalidFanMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hvac_mode_round_trips_wire_names() {
        for mode in [
            HvacMode::Off,
            HvacMode::HeatOn,
            HvacMode::CoolOn,
            HvacMode::AutoChangeOver,
        ] {
            assert_eq!(mode.as_str().parse::<HvacMode>().unwrap(), mode);
        }
    }

    #[test]
    fn hvac_mode_invalid() {
        assert_eq!(
            "Turbo".parse::<HvacMode>(),
            Err(ValueError::InvalidHvacMode("Turbo".to_string()))
        );
    }

    #[test]
    fn fan_mode_parse_is_case_insensitive() {
        assert_eq!("CONTINUOUSON".parse::<FanMode>().unwrap(), FanMode::ContinuousOn);
        assert!("sideways".parse::<FanMode>().is_err());
    }
}
