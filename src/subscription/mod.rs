// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for device state changes.
//!
//! The hub has no push channel. Change notification is built on its
//! `lu_sdata` long-poll: a background task keeps one request outstanding,
//! and whenever the hub reports a new data version the changed devices are
//! merged into their cached state and the registered callbacks run.
//!
//! # Overview
//!
//! - [`SubscriptionRegistry`] - Owns the cursor, the callbacks and the poll task
//! - [`SubscriptionId`] - A unique identifier for a registration, used to unregister
//! - [`CallbackRegistry`] - Callback storage keyed by device id
//! - [`PollConfig`] - Long-poll and retry timings
//! - [`classify`] - Decides whether a change record is ready for delivery
//!
//! # Usage
//!
//! ```no_run
//! use vera_lib::VeraController;
//! use vera_lib::protocol::HttpConfig;
//!
//! # async fn example() -> vera_lib::Result<()> {
//! let controller = VeraController::new(HttpConfig::new("192.168.1.50"))?;
//! let Some(lock) = controller.get_device_by_name("Front door").await? else {
//!     return Ok(());
//! };
//!
//! let sub_id = controller.register(&lock, |lock| {
//!     println!("Front door locked: {}", lock.is_locked());
//! });
//! controller.start();
//!
//! // Later, unsubscribe
//! controller.unregister(sub_id);
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Job states
//!
//! A change is delivered only once the hub job attached to it has settled.
//! Pending jobs are skipped silently and picked up again on a later cycle;
//! failed jobs are logged and dropped.

mod callback;
mod config;
mod job;
mod registry;

pub use callback::{CallbackRegistry, DeviceCallback, SubscriptionId};
pub use config::PollConfig;
pub use job::{JobOutcome, JobStatus, classify, effective_status, outcome_for};
pub use registry::SubscriptionRegistry;
