// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub scenes.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::service;
use crate::error::{Error, ParseError};
use crate::protocol::{HttpClient, HubResponse};
use crate::state::{value_as_i64, value_as_string};

/// A scene defined on the hub.
///
/// Clones share state, so a refresh through one handle is seen by all.
#[derive(Clone)]
pub struct VeraScene {
    id: u32,
    inner: Arc<SceneInner>,
}

struct SceneInner {
    info: RwLock<Map<String, Value>>,
    client: HttpClient,
}

impl VeraScene {
    /// Creates a scene from its `sdata` entry.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the entry has no usable `id`.
    pub fn new(info: Map<String, Value>, client: HttpClient) -> Result<Self, ParseError> {
        let id = info
            .get("id")
            .and_then(value_as_i64)
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| ParseError::MissingField("id".to_string()))?;

        Ok(Self {
            id,
            inner: Arc::new(SceneInner {
                info: RwLock::new(info),
                client,
            }),
        })
    }

    /// Returns the scene id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the scene name, or `Vera Scene <id>` if it has none.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner
            .info
            .read()
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("Vera Scene {}", self.id), str::to_string)
    }

    /// Returns the room the scene belongs to.
    #[must_use]
    pub fn room_id(&self) -> Option<i64> {
        self.inner.info.read().get("room").and_then(value_as_i64)
    }

    /// Returns `true` if the hub reports the scene as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner
            .info
            .read()
            .get("active")
            .and_then(value_as_string)
            .is_some_and(|v| v != "0" && v != "false")
    }

    /// Runs the scene.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn activate(&self) -> Result<(), Error> {
        let params = [
            ("id", "lu_action".to_string()),
            ("output_format", "json".to_string()),
            ("serviceId", service::HOME_AUTOMATION_GATEWAY.to_string()),
            ("action", "RunScene".to_string()),
            ("SceneNum", self.id.to_string()),
        ];

        self.inner
            .client
            .data_request(&params, None)
            .await
            .and_then(HubResponse::error_for_status)?;

        tracing::info!(scene_id = self.id, name = %self.name(), "Activated scene");

        if let Some(active) = self.inner.info.write().get_mut("active") {
            *active = Value::from(1);
        }
        Ok(())
    }

    /// Re-reads the scene from the hub's `sdata`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    pub async fn refresh(&self) -> Result<(), Error> {
        let response = self
            .inner
            .client
            .data_request(&[("id", "sdata".to_string())], None)
            .await
            .and_then(HubResponse::error_for_status)?;
        let data: Value = response.json()?;

        let scene = data
            .get("scenes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .find(|s| {
                s.get("id")
                    .and_then(value_as_i64)
                    .is_some_and(|id| id == i64::from(self.id))
            });

        if let Some(scene) = scene {
            let mut info = self.inner.info.write();
            for (key, value) in scene {
                info.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

impl PartialEq for VeraScene {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for VeraScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeraScene")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
