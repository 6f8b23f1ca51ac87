// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device kinds and the hub's category table.

use std::fmt;

/// Hub category codes.
pub mod category {
    /// Dimmable light or switch.
    pub const DIMMER: i64 = 2;
    /// On/off switch.
    pub const SWITCH: i64 = 3;
    /// Security sensor (door, motion), optionally armable.
    pub const ARMABLE: i64 = 4;
    /// HVAC thermostat.
    pub const THERMOSTAT: i64 = 5;
    /// Door lock.
    pub const LOCK: i64 = 7;
    /// Window covering.
    pub const CURTAIN: i64 = 8;
    /// Generic I/O.
    pub const GENERIC: i64 = 11;
    /// Generic sensor.
    pub const SENSOR: i64 = 12;
    /// Scene controller.
    pub const SCENE_CONTROLLER: i64 = 14;
    /// Humidity sensor.
    pub const HUMIDITY_SENSOR: i64 = 16;
    /// Temperature sensor.
    pub const TEMPERATURE_SENSOR: i64 = 17;
    /// Light sensor.
    pub const LIGHT_SENSOR: i64 = 18;
    /// Power meter.
    pub const POWER_METER: i64 = 21;
    /// Siren, driven like a switch.
    pub const SIREN: i64 = 24;
    /// UV sensor.
    pub const UV_SENSOR: i64 = 28;
    /// Garage door opener.
    pub const GARAGE_DOOR: i64 = 32;
}

/// Service ids used by device commands.
pub mod service {
    /// On/off control.
    pub const SWITCH_POWER: &str = "urn:upnp-org:serviceId:SwitchPower1";
    /// Load level control for dimmers and curtains.
    pub const DIMMING: &str = "urn:upnp-org:serviceId:Dimming1";
    /// Arming of security sensors.
    pub const SECURITY_SENSOR: &str = "urn:micasaverde-com:serviceId:SecuritySensor1";
    /// Window covering movement.
    pub const WINDOW_COVERING: &str = "urn:upnp-org:serviceId:WindowCovering1";
    /// Door locks and their PIN codes.
    pub const DOOR_LOCK: &str = "urn:micasaverde-com:serviceId:DoorLock1";
    /// Thermostat operating mode.
    pub const HVAC_OPERATING_MODE: &str = "urn:upnp-org:serviceId:HVAC_UserOperatingMode1";
    /// Thermostat fan mode.
    pub const HVAC_FAN_MODE: &str = "urn:upnp-org:serviceId:HVAC_FanOperatingMode1";
    /// Thermostat setpoint.
    pub const TEMPERATURE_SETPOINT: &str = "urn:upnp-org:serviceId:TemperatureSetpoint1";
    /// Color-capable lights.
    pub const COLOR: &str = "urn:micasaverde-com:serviceId:Color1";
    /// Hub-wide actions such as running scenes.
    pub const HOME_AUTOMATION_GATEWAY: &str =
        "urn:micasaverde-com:serviceId:HomeAutomationGateway1";
}

/// Kind of a device, deciding which commands it accepts.
///
/// One hub device may be exposed under more than one kind: a security
/// sensor with an `armed` variable is both a [`DeviceKind::BinarySensor`]
/// and a [`DeviceKind::ArmableSensor`].
///
/// # Examples
///
/// ```
/// use vera_lib::device::{DeviceKind, category};
///
/// assert_eq!(DeviceKind::from_category(category::LOCK), DeviceKind::Lock);
/// assert_eq!(DeviceKind::from_category(1234), DeviceKind::Generic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// On/off switch.
    Switch,
    /// Dimmable light.
    Dimmer,
    /// Armable view of a security sensor.
    ArmableSensor,
    /// Tripped/untripped security sensor.
    BinarySensor,
    /// Measuring sensor (temperature, humidity, light, power, UV).
    Sensor,
    /// Door lock.
    Lock,
    /// Window covering.
    Curtain,
    /// HVAC thermostat.
    Thermostat,
    /// Scene controller.
    SceneController,
    /// Garage door opener.
    GarageDoor,
    /// Anything without a dedicated kind.
    Generic,
}

/// Category code to kind. Codes not listed map to [`DeviceKind::Generic`].
const CATEGORY_TABLE: &[(i64, DeviceKind)] = &[
    (category::DIMMER, DeviceKind::Dimmer),
    (category::SWITCH, DeviceKind::Switch),
    (category::SIREN, DeviceKind::Switch),
    (category::ARMABLE, DeviceKind::BinarySensor),
    (category::THERMOSTAT, DeviceKind::Thermostat),
    (category::LOCK, DeviceKind::Lock),
    (category::CURTAIN, DeviceKind::Curtain),
    (category::SENSOR, DeviceKind::Sensor),
    (category::HUMIDITY_SENSOR, DeviceKind::Sensor),
    (category::TEMPERATURE_SENSOR, DeviceKind::Sensor),
    (category::LIGHT_SENSOR, DeviceKind::Sensor),
    (category::POWER_METER, DeviceKind::Sensor),
    (category::UV_SENSOR, DeviceKind::Sensor),
    (category::SCENE_CONTROLLER, DeviceKind::SceneController),
    (category::GARAGE_DOOR, DeviceKind::GarageDoor),
];

impl DeviceKind {
    /// Looks up the kind for a hub category code.
    #[must_use]
    pub fn from_category(code: i64) -> Self {
        CATEGORY_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Self::Generic, |(_, kind)| *kind)
    }

    /// Returns a short name for the kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Dimmer => "dimmer",
            Self::ArmableSensor => "armable sensor",
            Self::BinarySensor => "binary sensor",
            Self::Sensor => "sensor",
            Self::Lock => "lock",
            Self::Curtain => "curtain",
            Self::Thermostat => "thermostat",
            Self::SceneController => "scene controller",
            Self::GarageDoor => "garage door",
            Self::Generic => "generic device",
        }
    }

    /// Returns `true` if the kind can be switched on and off.
    #[must_use]
    pub const fn supports_switching(&self) -> bool {
        matches!(
            self,
            Self::Switch | Self::Dimmer | Self::ArmableSensor | Self::Curtain | Self::GarageDoor
        )
    }

    /// Returns `true` if the kind accepts a brightness or color.
    #[must_use]
    pub const fn supports_dimming(&self) -> bool {
        matches!(self, Self::Dimmer)
    }

    /// Returns `true` if the kind can be armed.
    #[must_use]
    pub const fn supports_arming(&self) -> bool {
        matches!(self, Self::ArmableSensor)
    }

    /// Returns `true` if the kind moves to a level and can be stopped.
    #[must_use]
    pub const fn supports_covering(&self) -> bool {
        matches!(self, Self::Curtain)
    }

    /// Returns `true` if the kind can be locked.
    #[must_use]
    pub const fn supports_locking(&self) -> bool {
        matches!(self, Self::Lock)
    }

    /// Returns `true` if the kind has setpoints and operating modes.
    #[must_use]
    pub const fn supports_climate(&self) -> bool {
        matches!(self, Self::Thermostat)
    }

    /// Returns `true` if the kind reports scene activations.
    #[must_use]
    pub const fn supports_scene_reporting(&self) -> bool {
        matches!(self, Self::SceneController)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_table_lookups() {
        assert_eq!(DeviceKind::from_category(category::DIMMER), DeviceKind::Dimmer);
        assert_eq!(DeviceKind::from_category(category::SIREN), DeviceKind::Switch);
        assert_eq!(
            DeviceKind::from_category(category::ARMABLE),
            DeviceKind::BinarySensor
        );
        assert_eq!(DeviceKind::from_category(category::UV_SENSOR), DeviceKind::Sensor);
        assert_eq!(
            DeviceKind::from_category(category::GARAGE_DOOR),
            DeviceKind::GarageDoor
        );
    }

    #[test]
    fn generic_category_and_unknown_codes_are_generic() {
        assert_eq!(DeviceKind::from_category(category::GENERIC), DeviceKind::Generic);
        assert_eq!(DeviceKind::from_category(-5), DeviceKind::Generic);
    }

    #[test]
    fn capability_predicates() {
        assert!(DeviceKind::Dimmer.supports_switching());
        assert!(DeviceKind::Dimmer.supports_dimming());
        assert!(!DeviceKind::Lock.supports_switching());
        assert!(DeviceKind::Lock.supports_locking());
        assert!(!DeviceKind::BinarySensor.supports_arming());
        assert!(DeviceKind::ArmableSensor.supports_arming());
    }
}
