// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription registry and the background poll loop.
//!
//! The registry owns the long-poll [`Cursor`] and the callback registrations.
//! Each poll cycle asks the hub what changed since the cursor, fetches the
//! alerts of the same window, merges every settled change into the cached
//! device state and then runs the callbacks registered for that device.
//!
//! Callbacks run on the poll task, one at a time, after the device's cache
//! has been updated. A panicking callback is logged and does not stop the
//! others.

use std::collections::HashSet;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::callback::{CallbackRegistry, DeviceCallback, SubscriptionId};
use super::config::PollConfig;
use super::job::{self, JobOutcome};
use crate::device::VeraDevice;
use crate::error::Error;
use crate::protocol::HttpClient;
use crate::state::{AlertRecord, ChangeRecord, Cursor};
use crate::telemetry;
use crate::types::DeviceId;

/// Registry of device callbacks fed by a long-poll loop.
///
/// # Examples
///
/// ```no_run
/// use vera_lib::VeraController;
/// use vera_lib::protocol::HttpConfig;
///
/// # async fn example() -> vera_lib::Result<()> {
/// let controller = VeraController::new(HttpConfig::new("192.168.1.50"))?;
/// let devices = controller.get_devices().await?;
///
/// for device in &devices {
///     controller.register(device, |device| {
///         println!("{} changed", device.name());
///     });
/// }
///
/// controller.start();
/// // ...
/// controller.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionRegistry {
    poller: Arc<Poller>,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), Error>>,
}

struct Poller {
    client: HttpClient,
    config: PollConfig,
    callbacks: CallbackRegistry,
    cursor: Mutex<Cursor>,
}

impl SubscriptionRegistry {
    /// Creates a registry polling through `client`.
    #[must_use]
    pub fn new(client: HttpClient, config: PollConfig) -> Self {
        Self {
            poller: Arc::new(Poller {
                client,
                config,
                callbacks: CallbackRegistry::new(),
                cursor: Mutex::new(Cursor::INITIAL),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Returns the poll configuration.
    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.poller.config
    }

    /// Returns the cursor the next long-poll will be sent with.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        *self.poller.cursor.lock()
    }

    /// Returns the number of active registrations.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.poller.callbacks.len()
    }

    // ===== Registrations =====

    /// Registers a callback for a device object.
    ///
    /// The callback receives the same object once its cache reflects a
    /// delivered change. Registering twice yields two calls per delivery.
    pub fn register<F>(&self, device: &VeraDevice, callback: F) -> SubscriptionId
    where
        F: Fn(&VeraDevice) + Send + Sync + 'static,
    {
        let callback: DeviceCallback = Arc::new(callback);
        let id = self.poller.callbacks.add(device, callback);
        tracing::info!(
            device_id = %device.id(),
            name = %device.name(),
            subscription = %id,
            "Subscribing to events"
        );
        id
    }

    /// Removes one registration.
    ///
    /// Returns `false`, and logs, if it was not registered.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let removed = self.poller.callbacks.remove(id);
        if removed {
            tracing::debug!(subscription = %id, "Unsubscribed");
        } else {
            tracing::info!(subscription = %id, "Subscription not found, nothing to remove");
        }
        removed
    }

    /// Removes every registration of a device object.
    pub fn unregister_device(&self, device: &VeraDevice) -> usize {
        let removed = self.poller.callbacks.remove_device(device);
        if removed == 0 {
            tracing::info!(device_id = %device.id(), "Device has no subscriptions");
        }
        removed
    }

    // ===== Poll loop =====

    /// Returns `true` while a poll loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Resets the cursor and spawns the poll loop.
    ///
    /// Starting a running registry replaces the loop; the old one is
    /// cancelled but not awaited.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        *self.poller.cursor.lock() = Cursor::INITIAL;

        let cancel = CancellationToken::new();
        let poller = Arc::clone(&self.poller);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { poller.run(token).await });

        if let Some(previous) = self.worker.lock().replace(Worker { cancel, handle }) {
            tracing::warn!("Poll loop already running, replacing it");
            previous.cancel.cancel();
        }
    }

    /// Stops the poll loop and waits for it to exit.
    ///
    /// An in-flight long-poll is abandoned. Once this returns no callback
    /// runs until the next [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns the error the loop terminated with, or `Error::PollLoop` if
    /// the task could not be joined.
    pub async fn stop(&self) -> Result<(), Error> {
        let Some(worker) = self.worker.lock().take() else {
            tracing::debug!("Poll loop not running");
            return Ok(());
        };

        worker.cancel.cancel();
        worker
            .handle
            .await
            .map_err(|e| Error::PollLoop(e.to_string()))?
    }

    /// Runs one poll cycle.
    ///
    /// Returns whether the hub reported new data. On an unusable response
    /// the cursor is reset before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns error if the hub cannot be reached or its response is
    /// unusable.
    pub async fn poll_once(&self) -> Result<bool, Error> {
        self.poller.poll_once().await
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancel.cancel();
        }
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("cursor", &self.cursor())
            .field("subscriptions", &self.subscription_count())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Poller {
    async fn run(&self, cancel: CancellationToken) -> Result<(), Error> {
        tracing::info!("Poll loop started");

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };

            let pause = match outcome {
                Ok(_) => self.config.poll_interval(),
                Err(e) if e.is_transport() => {
                    tracing::info!(
                        error = %e,
                        retry_in = ?self.config.retry_delay(),
                        "Could not contact hub, will retry"
                    );
                    self.config.retry_delay()
                }
                Err(e) if e.is_protocol() => self.config.poll_interval(),
                Err(e) => {
                    tracing::error!(error = %e, "Poll loop terminated");
                    return Err(e);
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Poll loop stopped");
        Ok(())
    }

    async fn poll_once(&self) -> Result<bool, Error> {
        let cursor = *self.cursor.lock();

        match self.cycle(cursor).await {
            Ok(changed) => Ok(changed),
            Err(e) => {
                if e.is_protocol() {
                    tracing::warn!(error = %e, "Unusable response from hub, resetting cursor");
                    *self.cursor.lock() = Cursor::INITIAL;
                }
                Err(e)
            }
        }
    }

    async fn cycle(&self, cursor: Cursor) -> Result<bool, Error> {
        let changes = telemetry::long_poll(&self.client, cursor, &self.config).await?;
        let changed = changes.cursor.version_changed(&cursor) || self.config.always_update();

        // Alerts are windowed by the cursor the long-poll was sent with.
        let alerts = if changed {
            telemetry::fetch_alerts(&self.client, cursor).await?
        } else {
            Vec::new()
        };

        *self.cursor.lock() = changes.cursor;

        tracing::debug!(
            cursor = %changes.cursor,
            changed,
            devices = changes.devices.len(),
            alerts = alerts.len(),
            "Poll cycle complete"
        );

        if changed {
            let summary = self.dispatch(&changes.devices, &alerts);
            tracing::trace!(?summary, "Dispatched changes");
        }
        Ok(changed)
    }

    fn dispatch(&self, devices: &[ChangeRecord], alerts: &[AlertRecord]) -> DispatchSummary {
        let mut seen = HashSet::new();
        let ids: Vec<DeviceId> = devices
            .iter()
            .filter_map(ChangeRecord::id)
            .chain(alerts.iter().filter_map(AlertRecord::device_id))
            .filter(|id| seen.insert(*id))
            .collect();

        let empty = ChangeRecord::default();
        let mut summary = DispatchSummary::default();

        for id in ids {
            let listeners = self.callbacks.listeners(id);
            if listeners.is_empty() {
                continue;
            }

            let record = devices
                .iter()
                .find(|record| record.id() == Some(id))
                .unwrap_or(&empty);
            let device_alerts: Vec<AlertRecord> = alerts
                .iter()
                .filter(|alert| alert.device_id() == Some(id))
                .cloned()
                .collect();

            // Views of one id share the record, so a held-back job is
            // reported once per id.
            let mut reported = false;
            for (device, callbacks) in listeners {
                let status = job::effective_status(device.kind(), record);
                match job::outcome_for(status, record.comment()) {
                    JobOutcome::Deliver => {
                        deliver(&device, record, &device_alerts, &callbacks);
                        summary.delivered += 1;
                    }
                    JobOutcome::Defer if !reported => {
                        reported = true;
                        summary.deferred += 1;
                        tracing::debug!(
                            device_id = %id,
                            name = %device.name(),
                            %status,
                            "Job pending, waiting for it to settle"
                        );
                    }
                    JobOutcome::LogError if !reported => {
                        reported = true;
                        summary.failed += 1;
                        tracing::error!(
                            device_id = %id,
                            name = %device.name(),
                            %status,
                            comment = record.comment(),
                            "Device job failed"
                        );
                    }
                    JobOutcome::Defer | JobOutcome::LogError => {}
                }
            }
        }
        summary
    }
}

/// Per-cycle dispatch counts. Held-back jobs count once per device id,
/// deliveries once per device object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DispatchSummary {
    delivered: usize,
    deferred: usize,
    failed: usize,
}

fn deliver(
    device: &VeraDevice,
    record: &ChangeRecord,
    alerts: &[AlertRecord],
    callbacks: &[DeviceCallback],
) {
    device.update(record);
    device.set_alerts(alerts.to_vec());

    for callback in callbacks {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(device))) {
            tracing::error!(
                device_id = %device.id(),
                name = %device.name(),
                panic = panic_message(panic.as_ref()),
                "Subscription callback panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::device::tests::{device, offline_client};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(offline_client(), PollConfig::default())
    }

    fn record(fields: Value) -> ChangeRecord {
        ChangeRecord::from_value(fields).unwrap()
    }

    fn counter(registry: &SubscriptionRegistry, device: &VeraDevice) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        registry.register(device, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        calls
    }

    #[test]
    fn pending_job_is_held_until_done() {
        let registry = registry();
        let switch = device(DeviceKind::Switch, json!({"id": 5, "status": "0"}));
        let calls = counter(&registry, &switch);

        registry.poller.dispatch(&[record(json!({"id": 5, "state": 1, "status": "1"}))], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(switch.get_str("status").as_deref(), Some("0"));

        registry.poller.dispatch(&[record(json!({"id": 5, "state": 4, "status": "1"}))], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(switch.get_str("status").as_deref(), Some("1"));
    }

    #[test]
    fn failed_job_is_not_delivered() {
        let registry = registry();
        let switch = device(DeviceKind::Switch, json!({"id": 5, "status": "0"}));
        let calls = counter(&registry, &switch);

        registry.poller.dispatch(
            &[record(json!({"id": 5, "state": 2, "comment": "No response", "status": "1"}))],
            &[],
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(switch.get_str("status").as_deref(), Some("0"));
    }

    #[test]
    fn callback_sees_updated_cache() {
        let registry = registry();
        let lock = device(DeviceKind::Lock, json!({"id": 10, "locked": "0"}));
        let observed = Arc::new(parking_lot::Mutex::new(None));
        let slot = Arc::clone(&observed);
        registry.register(&lock, move |dev| {
            *slot.lock() = Some(dev.is_locked());
        });

        registry.poller.dispatch(
            &[record(json!({"id": 10, "state": 1, "comment": "SUCCESS! Locked", "locked": "1"}))],
            &[],
        );
        assert_eq!(*observed.lock(), Some(true));
    }

    #[test]
    fn panicking_callback_does_not_block_others() {
        let registry = registry();
        let switch = device(DeviceKind::Switch, json!({"id": 5}));
        registry.register(&switch, |_| panic!("boom"));
        let calls = counter(&registry, &switch);

        registry.poller.dispatch(&[record(json!({"id": 5, "state": 4}))], &[]);
        registry.poller.dispatch(&[record(json!({"id": 5, "state": 4}))], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn each_callback_on_a_device_runs_once_with_that_device() {
        let registry = registry();
        let lamp = device(DeviceKind::Switch, json!({"id": 5, "status": "0"}));

        let seen_a = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_b = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for seen in [&seen_a, &seen_b] {
            let seen = Arc::clone(seen);
            registry.register(&lamp, move |dev| seen.lock().push(dev.clone()));
        }

        let summary = registry.poller.dispatch(
            &[record(json!({"id": 5, "state": 4, "status": "1", "bogus": true}))],
            &[],
        );

        assert_eq!(summary.delivered, 1);
        for seen in [&seen_a, &seen_b] {
            let seen = seen.lock();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0], lamp);
        }
        assert_eq!(lamp.get_str("status").as_deref(), Some("1"));
        assert!(lamp.get_value("bogus").is_none());
    }

    #[test]
    fn held_back_job_is_reported_once_per_id() {
        let registry = registry();
        let sensor = device(DeviceKind::BinarySensor, json!({"id": 20, "armed": "0"}));
        let armable = sensor.view_as(DeviceKind::ArmableSensor);
        let sensor_calls = counter(&registry, &sensor);
        let armable_calls = counter(&registry, &armable);

        let failed = registry.poller.dispatch(
            &[record(json!({"id": 20, "state": 2, "comment": "No response"}))],
            &[],
        );
        assert_eq!(
            failed,
            DispatchSummary {
                delivered: 0,
                deferred: 0,
                failed: 1
            }
        );

        let pending = registry
            .poller
            .dispatch(&[record(json!({"id": 20, "state": 1}))], &[]);
        assert_eq!(pending.deferred, 1);
        assert_eq!(pending.delivered, 0);

        let done = registry
            .poller
            .dispatch(&[record(json!({"id": 20, "state": 4, "armed": "1"}))], &[]);
        assert_eq!(done.delivered, 2);
        assert_eq!(sensor_calls.load(Ordering::SeqCst), 1);
        assert_eq!(armable_calls.load(Ordering::SeqCst), 1);
        assert!(armable.is_armed());
    }

    #[test]
    fn alert_without_change_record_is_delivered() {
        let registry = registry();
        let lock = device(DeviceKind::Lock, json!({"id": 10}));
        let calls = counter(&registry, &lock);
        let alert =
            AlertRecord::from_value(json!({"PK_Device": 10, "Code": "DL_LOW_BATTERY"})).unwrap();

        registry.poller.dispatch(&[], &[alert.clone()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lock.get_low_battery_alert(), Some(alert));

        // The next delivery replaces the alerts.
        registry.poller.dispatch(&[record(json!({"id": 10, "state": 4}))], &[]);
        assert!(lock.alerts().is_empty());
    }

    #[test]
    fn every_view_of_a_device_is_notified() {
        let registry = registry();
        let sensor = device(DeviceKind::BinarySensor, json!({"id": 20, "tripped": "0"}));
        let armable = sensor.view_as(DeviceKind::ArmableSensor);
        let sensor_calls = counter(&registry, &sensor);
        let armable_calls = counter(&registry, &armable);

        registry.poller.dispatch(&[record(json!({"id": 20, "tripped": "1"}))], &[]);
        assert_eq!(sensor_calls.load(Ordering::SeqCst), 1);
        assert_eq!(armable_calls.load(Ordering::SeqCst), 1);
        assert!(armable.is_tripped());
    }

    #[test]
    fn unregister_stops_delivery() {
        let registry = registry();
        let switch = device(DeviceKind::Switch, json!({"id": 5}));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = registry.register(&switch, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        registry.poller.dispatch(&[record(json!({"id": 5, "state": 4}))], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn unrelated_ids_are_ignored() {
        let registry = registry();
        let switch = device(DeviceKind::Switch, json!({"id": 5}));
        let calls = counter(&registry, &switch);

        registry.poller.dispatch(&[record(json!({"id": 6, "state": 4})), record(json!({"state": 4}))], &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let registry = registry();
        assert!(!registry.is_running());
        registry.stop().await.unwrap();
        assert_eq!(registry.cursor(), Cursor::INITIAL);
    }
}
