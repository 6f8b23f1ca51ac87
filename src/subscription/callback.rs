// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback storage for device subscriptions.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registrations keyed by device id

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::device::VeraDevice;
use crate::types::DeviceId;

/// Unique identifier for a subscription.
///
/// Returned by `register`; pass it to `unregister` to remove exactly that
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Callback invoked with the device object it was registered against.
pub type DeviceCallback = Arc<dyn Fn(&VeraDevice) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    device: VeraDevice,
    callback: DeviceCallback,
}

/// Registry of device callbacks.
///
/// Several device objects may share one device id (a sensor and its
/// armable view); each keeps its own callbacks. Registering the same
/// callback twice yields two registrations and two calls per delivery.
///
/// # Thread Safety
///
/// All methods take `&self`. Reads return owned snapshots so no lock is
/// held while callbacks run.
pub struct CallbackRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Registrations in registration order, per device id.
    subscriptions: RwLock<HashMap<DeviceId, Vec<Subscription>>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a callback for a device object.
    pub fn add(&self, device: &VeraDevice, callback: DeviceCallback) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .entry(device.id())
            .or_default()
            .push(Subscription {
                id,
                device: device.clone(),
                callback,
            });
        id
    }

    /// Removes one registration. Returns `false` if it was not registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();

        let Some(device_id) = subscriptions
            .iter()
            .find(|(_, subs)| subs.iter().any(|s| s.id == id))
            .map(|(device_id, _)| *device_id)
        else {
            return false;
        };

        if let Some(subs) = subscriptions.get_mut(&device_id) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                subscriptions.remove(&device_id);
            }
        }
        true
    }

    /// Removes every registration of one device object. Other objects
    /// sharing its id are kept. Returns how many were removed.
    pub fn remove_device(&self, device: &VeraDevice) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let Some(subs) = subscriptions.get_mut(&device.id()) else {
            return 0;
        };

        let before = subs.len();
        subs.retain(|s| s.device != *device);
        let removed = before - subs.len();

        if subs.is_empty() {
            subscriptions.remove(&device.id());
        }
        removed
    }

    /// Returns the device objects registered under an id, each with its
    /// callbacks in registration order.
    #[must_use]
    pub fn listeners(&self, device_id: DeviceId) -> Vec<(VeraDevice, Vec<DeviceCallback>)> {
        let subscriptions = self.subscriptions.read();
        let Some(subs) = subscriptions.get(&device_id) else {
            return Vec::new();
        };

        let mut grouped: Vec<(VeraDevice, Vec<DeviceCallback>)> = Vec::new();
        for sub in subs {
            match grouped.iter_mut().find(|(device, _)| *device == sub.device) {
                Some((_, callbacks)) => callbacks.push(Arc::clone(&sub.callback)),
                None => grouped.push((sub.device.clone(), vec![Arc::clone(&sub.callback)])),
            }
        }
        grouped
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.read().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.subscriptions.write().clear();
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("subscriptions", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::device::tests::device;
    use serde_json::json;

    fn noop() -> DeviceCallback {
        Arc::new(|_: &VeraDevice| {})
    }

    #[test]
    fn ids_are_unique() {
        let registry = CallbackRegistry::new();
        let dev = device(DeviceKind::Switch, json!({"id": 1}));
        let a = registry.add(&dev, noop());
        let b = registry.add(&dev, noop());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_takes_exactly_one() {
        let registry = CallbackRegistry::new();
        let dev = device(DeviceKind::Switch, json!({"id": 1}));
        let callback = noop();
        let first = registry.add(&dev, Arc::clone(&callback));
        registry.add(&dev, callback);

        assert!(registry.remove(first));
        assert!(!registry.remove(first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn listeners_group_by_device_object() {
        let registry = CallbackRegistry::new();
        let sensor = device(DeviceKind::BinarySensor, json!({"id": 20, "armed": "0"}));
        let armable = sensor.view_as(DeviceKind::ArmableSensor);

        registry.add(&sensor, noop());
        registry.add(&armable, noop());
        registry.add(&sensor, noop());

        let listeners = registry.listeners(DeviceId::new(20));
        assert_eq!(listeners.len(), 2);
        assert_eq!(listeners[0].0, sensor);
        assert_eq!(listeners[0].1.len(), 2);
        assert_eq!(listeners[1].0, armable);
        assert_eq!(listeners[1].1.len(), 1);

        assert!(registry.listeners(DeviceId::new(21)).is_empty());
    }

    #[test]
    fn remove_device_keeps_other_views() {
        let registry = CallbackRegistry::new();
        let sensor = device(DeviceKind::BinarySensor, json!({"id": 20}));
        let armable = sensor.view_as(DeviceKind::ArmableSensor);
        registry.add(&sensor, noop());
        registry.add(&sensor, noop());
        registry.add(&armable, noop());

        assert_eq!(registry.remove_device(&sensor), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove_device(&sensor), 0);

        registry.clear();
        assert!(registry.is_empty());
    }
}
