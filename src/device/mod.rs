// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub devices and scenes.
//!
//! A [`VeraDevice`] is a cheap, clonable handle on one device's cached
//! state. Its [`DeviceKind`] decides which commands it accepts; commands on
//! an unsupporting kind fail with
//! [`DeviceError::UnsupportedCapability`](crate::error::DeviceError) before
//! any request is sent.
//!
//! Getters read the cache only. The subscription poll loop keeps the cache
//! current; without it, call [`VeraDevice::refresh`] first.
//!
//! ```no_run
//! use vera_lib::VeraController;
//! use vera_lib::device::DeviceKind;
//! use vera_lib::protocol::HttpConfig;
//!
//! # async fn example() -> vera_lib::Result<()> {
//! let controller = VeraController::new(HttpConfig::new("192.168.1.161"))?;
//!
//! for lock in controller.get_devices_of_kind(&[DeviceKind::Lock]).await? {
//!     if !lock.is_locked() {
//!         lock.lock().await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod commands;
mod kind;
mod lock;
mod scene;

pub use kind::{DeviceKind, category, service};
pub use lock::{LockUser, PinCode};
pub use scene::VeraScene;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{DeviceError, Error, ParseError};
use crate::protocol::{HttpClient, HubResponse};
use crate::state::{
    AlertRecord, ChangeRecord, DeviceState, StateVariable, value_as_f64, value_as_i64,
    value_as_string,
};
use crate::types::DeviceId;

/// A device on the hub.
///
/// Clones and kind views created with [`VeraDevice::view_as`] share one
/// cached state. Two handles are equal when they share that state and have
/// the same kind, which is how the subscription registry tells device
/// objects apart.
#[derive(Clone)]
pub struct VeraDevice {
    kind: DeviceKind,
    inner: Arc<DeviceInner>,
}

struct DeviceInner {
    id: DeviceId,
    name: String,
    category: Option<i64>,
    category_name: Option<String>,
    state: RwLock<DeviceState>,
    client: HttpClient,
}

impl VeraDevice {
    /// Creates a device from its `sdata` device-info mapping and `status`
    /// service variables.
    ///
    /// A `categoryName` key in `info` is taken out and kept as the category
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if `info` has no usable `id`.
    pub fn new(
        kind: DeviceKind,
        mut info: Map<String, Value>,
        states: Vec<StateVariable>,
        client: HttpClient,
    ) -> Result<Self, ParseError> {
        let id = info
            .get("id")
            .and_then(DeviceId::from_json)
            .ok_or_else(|| ParseError::MissingField("id".to_string()))?;

        let category_name = info
            .remove("categoryName")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty());
        let category = info.get("category").and_then(value_as_i64);

        let name = info
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map_or_else(
                || match &category_name {
                    Some(category_name) => format!("Vera {category_name} {id}"),
                    None => format!("Vera Device {id}"),
                },
                str::to_string,
            );

        Ok(Self {
            kind,
            inner: Arc::new(DeviceInner {
                id,
                name,
                category,
                category_name,
                state: RwLock::new(DeviceState::from_info(info, states)),
                client,
            }),
        })
    }

    /// Returns another view of this device, sharing its cached state.
    #[must_use]
    pub fn view_as(&self, kind: DeviceKind) -> Self {
        Self {
            kind,
            inner: Arc::clone(&self.inner),
        }
    }

    // ========== Identity ==========

    /// Returns the hub's id for this device.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.inner.id
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the device kind.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Returns the hub category code.
    #[must_use]
    pub fn category(&self) -> Option<i64> {
        self.inner.category
    }

    /// Returns the hub's name for the category.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.inner.category_name.as_deref()
    }

    /// Returns the room id the device is assigned to.
    #[must_use]
    pub fn room_id(&self) -> Option<i64> {
        self.inner.state.read().get("room").and_then(value_as_i64)
    }

    /// Returns `true` if the hub lost contact with the device.
    #[must_use]
    pub fn comm_failure(&self) -> bool {
        let state = self.inner.state.read();
        state
            .info()
            .get("commFailure")
            .or_else(|| state.get("commFailure"))
            .and_then(value_as_string)
            .is_some_and(|v| v != "0")
    }

    // ========== Cached state ==========

    /// Returns a snapshot of the cached state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.inner.state.read().clone()
    }

    /// Returns a device-info value. `name` is matched case-insensitively.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.inner.state.read().get(name).cloned()
    }

    /// Returns a device-info value rendered as text.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.inner.state.read().get(name).and_then(value_as_string)
    }

    /// Returns the whole device-info mapping.
    #[must_use]
    pub fn get_all_values(&self) -> Map<String, Value> {
        self.inner.state.read().info().clone()
    }

    /// Returns a service variable's value as text.
    ///
    /// Service variables are not fed by the subscription; prefer
    /// [`VeraDevice::get_value`] when the device info carries the data.
    #[must_use]
    pub fn get_complex_value(&self, variable: &str) -> Option<String> {
        self.inner
            .state
            .read()
            .state_variable(variable)
            .and_then(|s| value_as_string(&s.value))
    }

    /// Returns the alerts of the most recent poll cycle.
    #[must_use]
    pub fn alerts(&self) -> Vec<AlertRecord> {
        self.inner.state.read().alerts().to_vec()
    }

    /// Merges a change record into the cached device info. Keys the device
    /// does not already have are ignored.
    pub fn update(&self, record: &ChangeRecord) {
        let written = self.inner.state.write().merge(record);
        tracing::trace!(device_id = %self.id(), written, "Merged change record");
    }

    /// Sets a cached device-info value without contacting the hub.
    ///
    /// Only existing keys are written; anything else is logged and dropped.
    pub fn set_cache_value(&self, name: &str, value: impl fmt::Display) {
        if !self.inner.state.write().set_cached(name, value.to_string()) {
            tracing::error!(
                device_id = %self.id(),
                name = %self.name(),
                key = name,
                "Could not set cache value (key does not exist)"
            );
        }
    }

    /// Replaces the attached alerts.
    pub fn set_alerts(&self, alerts: Vec<AlertRecord>) {
        self.inner.state.write().set_alerts(alerts);
    }

    // ========== Sensor helpers ==========

    /// Returns `true` if the device has an `armed` variable.
    #[must_use]
    pub fn is_armable(&self) -> bool {
        self.get_value("Armed").is_some()
    }

    /// Returns `true` if the device is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.flag("Armed")
    }

    /// Returns `true` if the device has a `tripped` variable.
    #[must_use]
    pub fn is_trippable(&self) -> bool {
        self.get_value("Tripped").is_some()
    }

    /// Returns `true` if the device is tripped.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.flag("Tripped")
    }

    /// Returns `true` if the device reports a battery level.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.get_value("BatteryLevel").is_some()
    }

    /// Returns the battery level in percent.
    #[must_use]
    pub fn battery_level(&self) -> Option<i64> {
        self.number("BatteryLevel")
    }

    /// Returns when the device last tripped.
    #[must_use]
    pub fn last_trip(&self) -> Option<DateTime<Utc>> {
        self.number("LastTrip")
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Returns the light level in lux.
    #[must_use]
    pub fn light(&self) -> Option<f64> {
        self.float("Light")
    }

    /// Returns the temperature, in the controller's temperature units.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.float("Temperature")
    }

    /// Returns the relative humidity in percent.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.float("Humidity")
    }

    /// Returns the current power usage in watts.
    #[must_use]
    pub fn power(&self) -> Option<f64> {
        self.float("Watts")
    }

    /// Returns `true` if the device can be dimmed.
    #[must_use]
    pub fn is_dimmable(&self) -> bool {
        self.kind.supports_dimming()
            || self
                .category_name()
                .is_some_and(|c| c.to_lowercase().contains("dimmable"))
    }

    fn flag(&self, name: &str) -> bool {
        self.get_str(name).is_some_and(|v| v == "1")
    }

    fn number(&self, name: &str) -> Option<i64> {
        self.inner.state.read().get(name).and_then(value_as_i64)
    }

    fn float(&self, name: &str) -> Option<f64> {
        self.inner.state.read().get(name).and_then(value_as_f64)
    }

    // ========== Hub requests ==========

    /// Re-reads the device info from the hub's `sdata`.
    ///
    /// Only needed when the subscription poll loop is not running.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    pub async fn refresh(&self) -> Result<(), Error> {
        let response = self
            .request(&[("id", "sdata".to_string())])
            .await?;
        let data: Value = response.json()?;

        let fields = data
            .get("devices")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .find(|d| d.get("id").and_then(DeviceId::from_json) == Some(self.id()));

        match fields {
            Some(fields) => {
                self.inner.state.write().merge_map(fields);
                Ok(())
            }
            None => Err(Error::DeviceNotFound(self.id())),
        }
    }

    /// Re-reads one service variable through `variableget` and returns its
    /// new value.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnknownVariable` if the device does not expose
    /// the variable, or an error if the request fails.
    pub async fn refresh_complex_value(&self, variable: &str) -> Result<String, Error> {
        let service = self
            .inner
            .state
            .read()
            .service_of(variable)
            .map(str::to_string)
            .ok_or_else(|| self.unknown_variable(variable))?;

        let response = self
            .request(&[
                ("id", "variableget".to_string()),
                ("serviceId", service),
                ("Variable", variable.to_string()),
            ])
            .await?;

        let value = response.body().to_string();
        self.inner
            .state
            .write()
            .set_state_value(variable, Value::String(value.clone()));
        Ok(value)
    }

    /// Sets a service variable through `lu_action`, issuing action
    /// `Set<variable>` with `value` under `parameter`.
    ///
    /// The cache is not touched; commands update it themselves.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_service_value(
        &self,
        service_id: &str,
        variable: &str,
        parameter: &str,
        value: impl fmt::Display,
    ) -> Result<(), Error> {
        let response = self
            .request(&[
                ("id", "lu_action".to_string()),
                ("serviceId", service_id.to_string()),
                ("action", format!("Set{variable}")),
                (parameter, value.to_string()),
            ])
            .await?;

        tracing::debug!(
            device_id = %self.id(),
            service = service_id,
            variable,
            body = response.body(),
            "Set service value"
        );
        Ok(())
    }

    /// Calls a service action through the `action` operation.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn call_service(
        &self,
        service_id: &str,
        action: &str,
        arguments: &[(&str, String)],
    ) -> Result<HubResponse, Error> {
        let mut params = vec![
            ("id", "action".to_string()),
            ("serviceId", service_id.to_string()),
            ("action", action.to_string()),
        ];
        params.extend(arguments.iter().cloned());
        self.request(&params).await
    }

    /// Calls a service action through `lu_action`.
    pub(crate) async fn lu_action(
        &self,
        service_id: &str,
        action: &str,
        arguments: &[(&str, String)],
    ) -> Result<HubResponse, Error> {
        let mut params = vec![
            ("id", "lu_action".to_string()),
            ("serviceId", service_id.to_string()),
            ("action", action.to_string()),
        ];
        params.extend(arguments.iter().cloned());
        self.request(&params).await
    }

    /// Sends a device-scoped `data_request`, adding `output_format` and
    /// `DeviceNum`.
    async fn request(&self, params: &[(&str, String)]) -> Result<HubResponse, Error> {
        let mut full = vec![
            ("output_format", "json".to_string()),
            ("DeviceNum", self.id().to_string()),
        ];
        full.extend(params.iter().cloned());

        let response = self
            .inner
            .client
            .data_request(&full, None)
            .await
            .and_then(HubResponse::error_for_status)
            .map_err(Error::Protocol)?;
        Ok(response)
    }

    fn unknown_variable(&self, variable: &str) -> Error {
        Error::Device(DeviceError::UnknownVariable {
            device: self.name().to_string(),
            variable: variable.to_string(),
        })
    }

    fn unsupported(&self, capability: &str) -> Error {
        Error::Device(DeviceError::UnsupportedCapability {
            device: self.name().to_string(),
            capability: capability.to_string(),
        })
    }

    /// Checks if the device kind supports a capability.
    fn check_capability(&self, capability: &str, supported: bool) -> Result<(), Error> {
        if supported {
            Ok(())
        } else {
            Err(self.unsupported(capability))
        }
    }
}

impl PartialEq for VeraDevice {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) && self.kind == other.kind
    }
}

impl Eq for VeraDevice {}

impl fmt::Debug for VeraDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeraDevice")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::HttpConfig;
    use serde_json::json;

    pub(crate) fn offline_client() -> HttpClient {
        HttpConfig::new("127.0.0.1").with_port(9).into_client().unwrap()
    }

    pub(crate) fn device(kind: DeviceKind, info: Value) -> VeraDevice {
        VeraDevice::new(
            kind,
            info.as_object().unwrap().clone(),
            Vec::new(),
            offline_client(),
        )
        .unwrap()
    }

    #[test]
    fn name_falls_back_to_category() {
        let dev = device(
            DeviceKind::Switch,
            json!({"id": 44, "categoryName": "On/Off Switch"}),
        );
        assert_eq!(dev.name(), "Vera On/Off Switch 44");
        assert_eq!(dev.category_name(), Some("On/Off Switch"));

        let dev = device(DeviceKind::Generic, json!({"id": "7", "name": ""}));
        assert_eq!(dev.name(), "Vera Device 7");
    }

    #[test]
    fn missing_id_is_an_error() {
        let result = VeraDevice::new(
            DeviceKind::Generic,
            Map::new(),
            Vec::new(),
            offline_client(),
        );
        assert!(matches!(result, Err(ParseError::MissingField(_))));
    }

    #[test]
    fn views_share_state_but_are_distinct() {
        let sensor = device(
            DeviceKind::BinarySensor,
            json!({"id": 20, "armed": "0", "tripped": "0"}),
        );
        let armable = sensor.view_as(DeviceKind::ArmableSensor);

        assert_ne!(sensor, armable);
        assert_eq!(sensor, sensor.clone());

        let record = ChangeRecord::from_value(json!({"id": 20, "armed": "1"})).unwrap();
        sensor.update(&record);
        assert!(armable.is_armed());
    }

    #[test]
    fn separately_built_devices_are_not_equal() {
        let a = device(DeviceKind::Switch, json!({"id": 1}));
        let b = device(DeviceKind::Switch, json!({"id": 1}));
        assert_ne!(a, b);
    }

    #[test]
    fn sensor_helpers() {
        let dev = device(
            DeviceKind::Sensor,
            json!({
                "id": 52,
                "temperature": "21.5",
                "batterylevel": "87",
                "lasttrip": "1571790666",
                "humidity": 40,
                "commFailure": "0"
            }),
        );
        assert_eq!(dev.temperature(), Some(21.5));
        assert_eq!(dev.humidity(), Some(40.0));
        assert_eq!(dev.battery_level(), Some(87));
        assert!(dev.has_battery());
        assert_eq!(dev.last_trip().unwrap().timestamp(), 1_571_790_666);
        assert!(!dev.comm_failure());
        assert!(dev.light().is_none());
        assert!(!dev.is_armable());
    }

    #[test]
    fn set_cache_value_only_touches_known_keys() {
        let dev = device(DeviceKind::Switch, json!({"id": 1, "status": "0"}));
        dev.set_cache_value("Status", 1);
        dev.set_cache_value("level", 50);
        assert_eq!(dev.get_str("status").as_deref(), Some("1"));
        assert!(dev.get_value("level").is_none());
    }
}
