// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vera Lib - A Rust library to mirror and control Vera home-automation hubs.
//!
//! This library provides async APIs to read the devices of a Vera hub, send
//! them commands, and follow their state changes through the hub's
//! long-poll interface.
//!
//! # Supported Features
//!
//! - **Device discovery**: Bulk fetch and categorisation of every device
//! - **Device control**: Switches, dimmers, RGB lights, curtains, locks,
//!   thermostats, armable sensors and scenes
//! - **Change notification**: Per-device callbacks fed by a background
//!   long-poll loop that tracks hub job status
//! - **Alerts**: Lock user codes and low battery events attached to devices
//!
//! # Quick Start
//!
//! ## Listing and Controlling Devices
//!
//! ```no_run
//! use vera_lib::{HttpConfig, VeraController};
//! use vera_lib::device::DeviceKind;
//!
//! #[tokio::main]
//! async fn main() -> vera_lib::Result<()> {
//!     let controller = VeraController::new(HttpConfig::new("192.168.1.50"))?;
//!
//!     for device in controller.get_devices().await? {
//!         println!("{} ({})", device.name(), device.kind());
//!     }
//!
//!     for switch in controller.get_devices_of_kind(&[DeviceKind::Switch]).await? {
//!         switch.switch_on().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Following Changes
//!
//! ```no_run
//! use vera_lib::{HttpConfig, PollConfig, VeraController};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> vera_lib::Result<()> {
//!     let controller = VeraController::new(HttpConfig::new("192.168.1.50"))?
//!         .with_poll_config(PollConfig::new().with_wait_timeout(Duration::from_secs(20)));
//!
//!     for device in controller.get_devices().await? {
//!         controller.register(&device, |device| {
//!             println!("{} is now {:?}", device.name(), device.get_str("status"));
//!         });
//!     }
//!
//!     controller.start();
//!     tokio::time::sleep(Duration::from_secs(3600)).await;
//!     controller.stop().await
//! }
//! ```
//!
//! # Logging
//!
//! The library emits [`tracing`] events. Install a subscriber in the
//! application to see them.

mod controller;
pub mod device;
pub mod error;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod telemetry;
pub mod types;

pub use controller::VeraController;
pub use device::{DeviceKind, LockUser, PinCode, VeraDevice, VeraScene};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use protocol::{HttpClient, HttpConfig, HubResponse};
pub use state::{AlertRecord, ChangeRecord, Cursor};
pub use subscription::{PollConfig, SubscriptionId, SubscriptionRegistry};
pub use types::{Brightness, DeviceId, FanMode, HvacMode, Level, RgbColor};
