// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entry point for talking to a hub.
//!
//! A [`VeraController`] owns the HTTP client and the subscription registry.
//! Devices and scenes it returns keep a clone of the client, so they can be
//! commanded on their own once fetched.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::device::{DeviceKind, VeraDevice, VeraScene};
use crate::error::{Error, ParseError};
use crate::protocol::{HttpClient, HttpConfig, HubResponse};
use crate::state::{Cursor, StateVariable, value_as_i64, value_as_string};
use crate::subscription::{PollConfig, SubscriptionId, SubscriptionRegistry};
use crate::types::DeviceId;

/// Temperature unit assumed when the hub does not report one.
const DEFAULT_TEMPERATURE_UNITS: &str = "C";

/// Hub-wide metadata read from `sdata`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HubInfo {
    model: Option<String>,
    version: Option<String>,
    serial_number: Option<String>,
    temperature_units: String,
}

impl Default for HubInfo {
    fn default() -> Self {
        Self {
            model: None,
            version: None,
            serial_number: None,
            temperature_units: DEFAULT_TEMPERATURE_UNITS.to_string(),
        }
    }
}

/// Client for one hub.
///
/// # Examples
///
/// ```no_run
/// use vera_lib::VeraController;
/// use vera_lib::device::DeviceKind;
/// use vera_lib::protocol::HttpConfig;
///
/// # async fn example() -> vera_lib::Result<()> {
/// let controller = VeraController::new(HttpConfig::from_url("http://192.168.1.50:3480")?)?;
///
/// for light in controller.get_devices_of_kind(&[DeviceKind::Dimmer]).await? {
///     light.switch_on().await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct VeraController {
    client: HttpClient,
    registry: SubscriptionRegistry,
    info: RwLock<HubInfo>,
    devices: RwLock<Option<Vec<VeraDevice>>>,
}

impl VeraController {
    /// Creates a controller with the default poll settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let client = config.into_client()?;
        Ok(Self {
            registry: SubscriptionRegistry::new(client.clone(), PollConfig::default()),
            client,
            info: RwLock::new(HubInfo::default()),
            devices: RwLock::new(None),
        })
    }

    /// Replaces the poll settings. Registrations made so far are dropped.
    #[must_use]
    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.registry = SubscriptionRegistry::new(self.client.clone(), config);
        self
    }

    /// Returns the HTTP client.
    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Returns the subscription registry.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    // ========== Hub metadata ==========

    /// Returns the hub model, once [`refresh_data`](Self::refresh_data) ran.
    #[must_use]
    pub fn model(&self) -> Option<String> {
        self.info.read().model.clone()
    }

    /// Returns the firmware version.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        self.info.read().version.clone()
    }

    /// Returns the hub serial number.
    #[must_use]
    pub fn serial_number(&self) -> Option<String> {
        self.info.read().serial_number.clone()
    }

    /// Returns the temperature unit the hub reports values in (`C` or `F`).
    #[must_use]
    pub fn temperature_units(&self) -> String {
        self.info.read().temperature_units.clone()
    }

    /// Reads `sdata`, updates the hub metadata and returns the device-info
    /// mapping of every device, keyed by id.
    ///
    /// Each mapping gains a `categoryName` key when the hub names its
    /// category.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not a JSON
    /// object.
    pub async fn refresh_data(&self) -> Result<HashMap<DeviceId, Map<String, Value>>, Error> {
        let data = self.fetch_object(&[("id", "sdata".to_string())], "sdata").await?;

        let text = |key: &str| data.get(key).and_then(value_as_string);
        *self.info.write() = HubInfo {
            model: text("model"),
            version: text("version"),
            serial_number: text("serial_number"),
            temperature_units: text("temperature")
                .filter(|units| !units.is_empty())
                .unwrap_or_else(|| DEFAULT_TEMPERATURE_UNITS.to_string()),
        };

        let categories: HashMap<i64, String> = objects(&data, "categories")
            .filter_map(|cat| {
                let id = cat.get("id").and_then(value_as_i64)?;
                let name = cat.get("name").and_then(Value::as_str)?;
                Some((id, name.to_string()))
            })
            .collect();

        let mut devices = HashMap::new();
        for device in objects(&data, "devices") {
            let Some(id) = device.get("id").and_then(DeviceId::from_json) else {
                tracing::debug!("Skipping sdata device without id");
                continue;
            };

            let mut info = device.clone();
            if let Some(name) = info
                .get("category")
                .and_then(value_as_i64)
                .and_then(|code| categories.get(&code))
            {
                info.insert("categoryName".to_string(), Value::String(name.clone()));
            }
            devices.insert(id, info);
        }

        tracing::debug!(
            devices = devices.len(),
            categories = categories.len(),
            "Refreshed hub data"
        );
        Ok(devices)
    }

    // ========== Devices ==========

    /// Returns every device on the hub.
    ///
    /// The list is fetched once and then served from memory, so the same
    /// device objects are handed out on every call. Binary sensors that can
    /// be armed appear twice: once as the sensor and once as an
    /// [`DeviceKind::ArmableSensor`] view sharing its state.
    ///
    /// # Errors
    ///
    /// Returns error if the list has to be fetched and that fails.
    pub async fn get_devices(&self) -> Result<Vec<VeraDevice>, Error> {
        if let Some(devices) = self.devices.read().as_ref() {
            return Ok(devices.clone());
        }
        self.reload_devices().await
    }

    /// Fetches the device list again, replacing the cached objects.
    ///
    /// Subscriptions stay attached to the old objects.
    ///
    /// # Errors
    ///
    /// Returns error if a request fails or a response cannot be parsed.
    pub async fn reload_devices(&self) -> Result<Vec<VeraDevice>, Error> {
        let mut info_by_id = self.refresh_data().await?;
        let status = self
            .fetch_object(
                &[
                    ("id", "status".to_string()),
                    ("output_format", "json".to_string()),
                ],
                "status",
            )
            .await?;

        let mut devices = Vec::new();
        for item in objects(&status, "devices") {
            let Some(id) = item.get("id").and_then(DeviceId::from_json) else {
                continue;
            };

            let states = item.get("states").map_or_else(Vec::new, |states| {
                serde_json::from_value::<Vec<StateVariable>>(states.clone()).unwrap_or_else(|e| {
                    tracing::warn!(device_id = %id, error = %e, "Ignoring malformed device states");
                    Vec::new()
                })
            });

            let info = info_by_id.remove(&id).unwrap_or_else(|| {
                tracing::debug!(device_id = %id, "Device missing from sdata");
                let mut info = Map::new();
                info.insert("id".to_string(), Value::from(id.value()));
                info
            });

            let kind = info
                .get("category")
                .and_then(value_as_i64)
                .map_or(DeviceKind::Generic, DeviceKind::from_category);
            let armable = kind == DeviceKind::BinarySensor && info.contains_key("armed");

            let device = VeraDevice::new(kind, info, states, self.client.clone())?;
            if armable {
                let view = device.view_as(DeviceKind::ArmableSensor);
                devices.push(device);
                devices.push(view);
            } else {
                devices.push(device);
            }
        }

        tracing::info!(count = devices.len(), "Loaded devices from hub");
        *self.devices.write() = Some(devices.clone());
        Ok(devices)
    }

    /// Returns the devices of the given kinds. An empty filter returns all.
    ///
    /// # Errors
    ///
    /// Same as [`get_devices`](Self::get_devices).
    pub async fn get_devices_of_kind(&self, kinds: &[DeviceKind]) -> Result<Vec<VeraDevice>, Error> {
        let devices = self.get_devices().await?;
        if kinds.is_empty() {
            return Ok(devices);
        }
        Ok(devices
            .into_iter()
            .filter(|device| kinds.contains(&device.kind()))
            .collect())
    }

    /// Returns the first device object with the given id.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the hub has no such device.
    pub async fn get_device_by_id(&self, id: DeviceId) -> Result<VeraDevice, Error> {
        self.get_devices()
            .await?
            .into_iter()
            .find(|device| device.id() == id)
            .ok_or(Error::DeviceNotFound(id))
    }

    /// Returns the first device object with the given name.
    ///
    /// # Errors
    ///
    /// Same as [`get_devices`](Self::get_devices).
    pub async fn get_device_by_name(&self, name: &str) -> Result<Option<VeraDevice>, Error> {
        Ok(self
            .get_devices()
            .await?
            .into_iter()
            .find(|device| device.name() == name))
    }

    // ========== Scenes ==========

    /// Returns the scenes defined on the hub.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    pub async fn get_scenes(&self) -> Result<Vec<VeraScene>, Error> {
        let data = self.fetch_object(&[("id", "sdata".to_string())], "sdata").await?;

        objects(&data, "scenes")
            .map(|scene| VeraScene::new(scene.clone(), self.client.clone()).map_err(Error::from))
            .collect()
    }

    // ========== Subscriptions ==========

    /// Registers a callback for a device object.
    ///
    /// See [`SubscriptionRegistry::register`].
    pub fn register<F>(&self, device: &VeraDevice, callback: F) -> SubscriptionId
    where
        F: Fn(&VeraDevice) + Send + Sync + 'static,
    {
        self.registry.register(device, callback)
    }

    /// Removes one registration.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.registry.unregister(id)
    }

    /// Removes every registration of a device object.
    pub fn unregister_device(&self, device: &VeraDevice) -> usize {
        self.registry.unregister_device(device)
    }

    /// Starts the background poll loop.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        self.registry.start();
    }

    /// Stops the background poll loop and waits for it.
    ///
    /// # Errors
    ///
    /// See [`SubscriptionRegistry::stop`].
    pub async fn stop(&self) -> Result<(), Error> {
        self.registry.stop().await
    }

    /// Runs one poll cycle in the caller's task.
    ///
    /// # Errors
    ///
    /// See [`SubscriptionRegistry::poll_once`].
    pub async fn poll_once(&self) -> Result<bool, Error> {
        self.registry.poll_once().await
    }

    /// Returns the current long-poll cursor.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.registry.cursor()
    }

    // ========== Helpers ==========

    async fn fetch_object(
        &self,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<Map<String, Value>, Error> {
        let response = self
            .client
            .data_request(params, None)
            .await
            .and_then(HubResponse::error_for_status)?;

        match response.json::<Value>()? {
            Value::Object(object) => Ok(object),
            _ => Err(ParseError::InvalidValue {
                field: what.to_string(),
                message: "expected a JSON object".to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for VeraController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeraController")
            .field("base_url", &self.client.base_url())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Iterates the JSON objects of an array field, skipping anything else.
fn objects<'a>(
    data: &'a Map<String, Value>,
    field: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    data.get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}
