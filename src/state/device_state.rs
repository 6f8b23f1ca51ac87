// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached device state.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{AlertRecord, ChangeRecord};

/// One `(service, variable, value)` triple from the hub's `status` data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateVariable {
    /// Service id, e.g. `urn:upnp-org:serviceId:SwitchPower1`.
    pub service: String,
    /// Variable name within the service.
    pub variable: String,
    /// Raw value as reported by the hub.
    #[serde(default)]
    pub value: Value,
}

/// Cached state of one hub device.
///
/// - `info` is the flat device-info mapping from `sdata`. Keys are lower
///   case. The subscription feed keeps it current.
/// - `states` is the service variable list from `status`. It is only
///   refreshed by explicit queries and commands.
/// - `alerts` holds the alerts of the most recent poll cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    info: Map<String, Value>,
    states: Vec<StateVariable>,
    alerts: Vec<AlertRecord>,
}

impl DeviceState {
    /// Creates a state from a device-info mapping and service variables.
    #[must_use]
    pub fn from_info(info: Map<String, Value>, states: Vec<StateVariable>) -> Self {
        Self {
            info,
            states,
            alerts: Vec::new(),
        }
    }

    // ========== Device info ==========

    /// Returns a device-info value. The lookup is case-insensitive on the
    /// caller's side: `name` is lower-cased first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.info.get(&name.to_lowercase())
    }

    /// Returns the whole device-info mapping.
    #[must_use]
    pub fn info(&self) -> &Map<String, Value> {
        &self.info
    }

    /// Merges a change record into the device info.
    ///
    /// Only keys the mapping already has are written; unknown keys are
    /// dropped. Returns the number of keys written.
    pub fn merge(&mut self, record: &ChangeRecord) -> usize {
        self.merge_map(record.fields())
    }

    /// Merges a raw mapping with the same known-keys-only rule as
    /// [`DeviceState::merge`].
    pub fn merge_map(&mut self, fields: &Map<String, Value>) -> usize {
        let mut written = 0;
        for (key, value) in fields {
            if let Some(slot) = self.info.get_mut(key) {
                *slot = value.clone();
                written += 1;
            }
        }
        written
    }

    /// Sets a device-info value as a string if the key already exists.
    ///
    /// Returns `false` (and leaves the mapping untouched) if it does not.
    pub fn set_cached(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.info.get_mut(&name.to_lowercase()) {
            Some(slot) => {
                *slot = Value::String(value.into());
                true
            }
            None => false,
        }
    }

    // ========== Service variables ==========

    /// Returns all service variables.
    #[must_use]
    pub fn states(&self) -> &[StateVariable] {
        &self.states
    }

    /// Returns the first service variable with the given name.
    #[must_use]
    pub fn state_variable(&self, variable: &str) -> Option<&StateVariable> {
        self.states.iter().find(|s| s.variable == variable)
    }

    /// Returns the service that owns a variable.
    #[must_use]
    pub fn service_of(&self, variable: &str) -> Option<&str> {
        self.state_variable(variable).map(|s| s.service.as_str())
    }

    /// Replaces the value of every service variable with the given name.
    ///
    /// Returns `false` if no such variable exists.
    pub fn set_state_value(&mut self, variable: &str, value: Value) -> bool {
        let mut found = false;
        for state in self.states.iter_mut().filter(|s| s.variable == variable) {
            state.value = value.clone();
            found = true;
        }
        found
    }

    /// Sets a service variable, adding it if the device did not report it.
    pub fn upsert_state_value(&mut self, service: &str, variable: &str, value: Value) {
        if let Some(state) = self
            .states
            .iter_mut()
            .find(|s| s.service == service && s.variable == variable)
        {
            state.value = value;
        } else {
            self.states.push(StateVariable {
                service: service.to_string(),
                variable: variable.to_string(),
                value,
            });
        }
    }

    // ========== Alerts ==========

    /// Returns the alerts of the most recent poll cycle.
    #[must_use]
    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    /// Replaces the stored alerts.
    pub fn set_alerts(&mut self, alerts: Vec<AlertRecord>) {
        self.alerts = alerts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lock_state() -> DeviceState {
        let info = json!({"id": 10, "name": "Front Door", "locked": "0", "batterylevel": "87"});
        let states = serde_json::from_value(json!([
            {"service": "urn:micasaverde-com:serviceId:DoorLock1", "variable": "Status", "value": "0"}
        ]))
        .unwrap();
        DeviceState::from_info(info.as_object().unwrap().clone(), states)
    }

    #[test]
    fn merge_ignores_unknown_keys() {
        let mut state = lock_state();
        let record =
            ChangeRecord::from_value(json!({"id": 10, "locked": "1", "unrelated": "x"})).unwrap();

        assert_eq!(state.merge(&record), 2);
        assert_eq!(state.get("locked"), Some(&json!("1")));
        assert!(state.get("unrelated").is_none());
        assert!(!state.info().contains_key("unrelated"));
    }

    #[test]
    fn merge_overwrites_falsy_existing_values() {
        let mut state = DeviceState::from_info(
            json!({"status": ""}).as_object().unwrap().clone(),
            Vec::new(),
        );
        let record = ChangeRecord::from_value(json!({"status": "1"})).unwrap();
        state.merge(&record);
        assert_eq!(state.get("Status"), Some(&json!("1")));
    }

    #[test]
    fn set_cached_requires_existing_key() {
        let mut state = lock_state();
        assert!(state.set_cached("Locked", "1"));
        assert_eq!(state.get("locked"), Some(&json!("1")));
        assert!(!state.set_cached("level", "50"));
        assert!(state.get("level").is_none());
    }

    #[test]
    fn state_variables() {
        let mut state = lock_state();
        assert_eq!(
            state.service_of("Status"),
            Some("urn:micasaverde-com:serviceId:DoorLock1")
        );
        assert!(state.set_state_value("Status", json!("1")));
        assert_eq!(state.state_variable("Status").unwrap().value, json!("1"));
        assert!(!state.set_state_value("Missing", json!("1")));

        state.upsert_state_value("urn:x", "New", json!(5));
        assert_eq!(state.states().len(), 2);
    }

    #[test]
    fn alerts_are_replaced() {
        let mut state = lock_state();
        state.set_alerts(vec![AlertRecord::default(), AlertRecord::default()]);
        assert_eq!(state.alerts().len(), 2);
        state.set_alerts(Vec::new());
        assert!(state.alerts().is_empty());
    }
}
