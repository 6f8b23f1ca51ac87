// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device commands.
//!
//! Each command performs one immediate request and, on success, writes the
//! expected value into the cache so getters reflect it before the poll loop
//! confirms the change.

use serde_json::Value;

use super::{DeviceKind, VeraDevice, service};
use crate::error::Error;
use crate::types::{Brightness, FanMode, HvacMode, Level, RgbColor};

impl VeraDevice {
    // ========== Switching ==========

    /// Turns the device on.
    ///
    /// Dimmers go to full brightness, curtains open fully and armable
    /// sensors are armed.
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be switched or the request fails.
    pub async fn switch_on(&self) -> Result<(), Error> {
        match self.kind() {
            DeviceKind::Dimmer => self.set_brightness(Brightness::MAX).await,
            DeviceKind::Curtain => self.open().await,
            DeviceKind::ArmableSensor => self.arm().await,
            _ => self.set_switch(true).await,
        }
    }

    /// Turns the device off.
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be switched or the request fails.
    pub async fn switch_off(&self) -> Result<(), Error> {
        match self.kind() {
            DeviceKind::Dimmer => self.set_brightness(Brightness::MIN).await,
            DeviceKind::Curtain => self.close().await,
            DeviceKind::ArmableSensor => self.disarm().await,
            _ => self.set_switch(false).await,
        }
    }

    /// Returns the cached on/off state, interpreted for the device kind.
    #[must_use]
    pub fn is_switched_on(&self) -> bool {
        match self.kind() {
            DeviceKind::Dimmer => self.get_brightness() > Brightness::MIN,
            DeviceKind::Curtain => self.is_open(),
            DeviceKind::ArmableSensor => self.is_armed(),
            DeviceKind::BinarySensor => self.is_tripped(),
            _ => self.get_str("Status").is_some_and(|v| v == "1"),
        }
    }

    async fn set_switch(&self, on: bool) -> Result<(), Error> {
        self.check_capability("switching", self.kind().supports_switching())?;
        let value = u8::from(on);
        self.set_service_value(service::SWITCH_POWER, "Target", "newTargetValue", value)
            .await?;
        self.set_cache_value("Status", value);
        Ok(())
    }

    // ========== Dimming ==========

    /// Returns the cached brightness, converted from the hub's percentage.
    #[must_use]
    pub fn get_brightness(&self) -> Brightness {
        Brightness::from_level(self.cached_level())
    }

    /// Sets the brightness.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a dimmer or the request fails.
    pub async fn set_brightness(&self, brightness: Brightness) -> Result<(), Error> {
        self.check_capability("dimming", self.kind().supports_dimming())?;
        let level = brightness.to_level();
        // The hub's parameter name is case sensitive: "Loadlevel", not "LoadLevel".
        self.set_service_value(
            service::DIMMING,
            "LoadLevelTarget",
            "newLoadlevelTarget",
            level.value(),
        )
        .await?;
        self.set_cache_value("level", level.value());
        Ok(())
    }

    /// Returns the cached color of a color-capable dimmer.
    #[must_use]
    pub fn get_color(&self) -> Option<RgbColor> {
        self.get_complex_value("CurrentColor")?.parse().ok()
    }

    /// Sets the color of a color-capable dimmer.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a dimmer or the request fails.
    pub async fn set_color(&self, color: RgbColor) -> Result<(), Error> {
        self.check_capability("color", self.kind().supports_dimming())?;
        self.set_service_value(
            service::COLOR,
            "ColorRGB",
            "newColorRGBTarget",
            color.to_command_value(),
        )
        .await?;

        let current = format!(
            "I=0,A=0,R={},G={},B={}",
            color.red(),
            color.green(),
            color.blue()
        );
        self.inner
            .state
            .write()
            .upsert_state_value(service::COLOR, "CurrentColor", Value::String(current));
        Ok(())
    }

    // ========== Arming ==========

    /// Arms a security sensor.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not armable or the request fails.
    pub async fn arm(&self) -> Result<(), Error> {
        self.set_armed(true).await
    }

    /// Disarms a security sensor.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not armable or the request fails.
    pub async fn disarm(&self) -> Result<(), Error> {
        self.set_armed(false).await
    }

    async fn set_armed(&self, armed: bool) -> Result<(), Error> {
        self.check_capability("arming", self.kind().supports_arming())?;
        let value = u8::from(armed);
        self.set_service_value(service::SECURITY_SENSOR, "Armed", "newArmedValue", value)
            .await?;
        self.set_cache_value("Armed", value);
        Ok(())
    }

    // ========== Window coverings ==========

    /// Opens the curtain fully.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a curtain or the request fails.
    pub async fn open(&self) -> Result<(), Error> {
        self.set_level(Level::MAX).await
    }

    /// Closes the curtain fully.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a curtain or the request fails.
    pub async fn close(&self) -> Result<(), Error> {
        self.set_level(Level::MIN).await
    }

    /// Stops a moving curtain.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a curtain or the request fails.
    pub async fn stop(&self) -> Result<(), Error> {
        self.check_capability("covering", self.kind().supports_covering())?;
        self.call_service(service::WINDOW_COVERING, "Stop", &[])
            .await?;
        Ok(())
    }

    /// Moves the curtain to an open percentage.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a curtain or the request fails.
    pub async fn set_level(&self, level: Level) -> Result<(), Error> {
        self.check_capability("covering", self.kind().supports_covering())?;
        self.set_service_value(
            service::DIMMING,
            "LoadLevelTarget",
            "newLoadlevelTarget",
            level.value(),
        )
        .await?;
        self.set_cache_value("level", level.value());
        Ok(())
    }

    /// Returns the cached open percentage.
    #[must_use]
    pub fn get_level(&self) -> Level {
        self.cached_level()
    }

    /// Returns `true` if the curtain is at least partly open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.get_level() > Level::MIN
    }

    fn cached_level(&self) -> Level {
        self.get_str("level")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .map_or(Level::MIN, Level::clamped)
    }

    // ========== Thermostats ==========

    /// Sets the target temperature.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a thermostat or the request fails.
    pub async fn set_temperature(&self, temperature: f64) -> Result<(), Error> {
        self.check_capability("climate control", self.kind().supports_climate())?;
        self.set_service_value(
            service::TEMPERATURE_SETPOINT,
            "CurrentSetpoint",
            "NewCurrentSetpoint",
            temperature,
        )
        .await?;
        self.set_cache_value("setpoint", temperature);
        Ok(())
    }

    /// Returns the cached target temperature.
    #[must_use]
    pub fn get_current_goal_temperature(&self) -> Option<f64> {
        self.float("setpoint")
    }

    /// Returns the cached measured temperature.
    #[must_use]
    pub fn get_current_temperature(&self) -> Option<f64> {
        self.temperature()
    }

    /// Sets the HVAC operating mode.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a thermostat or the request fails.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<(), Error> {
        self.check_capability("climate control", self.kind().supports_climate())?;
        self.set_service_value(
            service::HVAC_OPERATING_MODE,
            "ModeTarget",
            "NewModeTarget",
            mode,
        )
        .await?;
        self.set_cache_value("mode", mode);
        Ok(())
    }

    /// Returns the cached HVAC operating mode.
    #[must_use]
    pub fn get_hvac_mode(&self) -> Option<HvacMode> {
        self.get_str("mode")?.parse().ok()
    }

    /// Sets the fan mode.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a thermostat or the request fails.
    pub async fn set_fan_mode(&self, mode: FanMode) -> Result<(), Error> {
        self.check_capability("climate control", self.kind().supports_climate())?;
        self.set_service_value(service::HVAC_FAN_MODE, "Mode", "NewMode", mode)
            .await?;
        self.set_cache_value("fanmode", mode);
        Ok(())
    }

    /// Returns the cached fan mode.
    #[must_use]
    pub fn get_fan_mode(&self) -> Option<FanMode> {
        self.get_str("fanmode")?.parse().ok()
    }

    /// Returns what the HVAC is currently doing (`Idle`, `Heating`, ...).
    #[must_use]
    pub fn get_hvac_state(&self) -> Option<String> {
        self.get_str("hvacstate")
    }

    /// Switches the HVAC off.
    ///
    /// # Errors
    ///
    /// See [`VeraDevice::set_hvac_mode`].
    pub async fn turn_off(&self) -> Result<(), Error> {
        self.set_hvac_mode(HvacMode::Off).await
    }

    /// Switches the HVAC to heating.
    ///
    /// # Errors
    ///
    /// See [`VeraDevice::set_hvac_mode`].
    pub async fn turn_heat_on(&self) -> Result<(), Error> {
        self.set_hvac_mode(HvacMode::HeatOn).await
    }

    /// Switches the HVAC to cooling.
    ///
    /// # Errors
    ///
    /// See [`VeraDevice::set_hvac_mode`].
    pub async fn turn_cool_on(&self) -> Result<(), Error> {
        self.set_hvac_mode(HvacMode::CoolOn).await
    }

    /// Switches the HVAC to automatic change-over.
    ///
    /// # Errors
    ///
    /// See [`VeraDevice::set_hvac_mode`].
    pub async fn turn_auto_on(&self) -> Result<(), Error> {
        self.set_hvac_mode(HvacMode::AutoChangeOver).await
    }

    // ========== Scene controllers ==========

    /// Returns the id of the last scene triggered from this controller.
    #[must_use]
    pub fn get_last_scene_id(&self) -> Option<String> {
        self.get_complex_value("LastSceneID")
            .or_else(|| self.get_complex_value("sl_CentralScene"))
    }

    /// Returns when the last scene was triggered, as hub epoch seconds.
    #[must_use]
    pub fn get_last_scene_time(&self) -> Option<String> {
        self.get_complex_value("LastSceneTime")
    }

    /// Re-reads the scene variables the controller exposes.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a scene controller or a request
    /// fails.
    pub async fn refresh_scene_state(&self) -> Result<(), Error> {
        self.check_capability("scene reporting", self.kind().supports_scene_reporting())?;
        for variable in ["LastSceneID", "sl_CentralScene", "LastSceneTime"] {
            if self.get_complex_value(variable).is_some() {
                self.refresh_complex_value(variable).await?;
            }
        }
        Ok(())
    }
}
