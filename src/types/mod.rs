// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for hub device control.
//!
//! Each type validates its range at construction time, so commands built
//! from them never carry values the hub would reject.
//!
//! # Types
//!
//! - [`DeviceId`] - Numeric device identifier assigned by the hub
//! - [`Level`] - Load level (0-100%) for dimmers and curtains
//! - [`Brightness`] - Light brightness on a 0-255 scale
//! - [`HvacMode`] / [`FanMode`] - Thermostat operating modes
//! - [`RgbColor`] - Color for color-capable dimmers

mod device_id;
mod hvac;
mod level;
mod rgb_color;

pub use device_id::DeviceId;
pub use hvac::{FanMode, HvacMode};
pub use level::{Brightness, Level};
pub use rgb_color::RgbColor;
