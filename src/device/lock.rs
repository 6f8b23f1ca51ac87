// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door lock commands and the lock's PIN code bookkeeping.

use super::{VeraDevice, service};
use crate::error::Error;
use crate::state::AlertRecord;

/// A PIN code slot programmed into a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinCode {
    /// Slot number on the lock.
    pub slot: u32,
    /// Name the code was stored under.
    pub name: String,
    /// The PIN itself.
    pub pin: String,
}

/// The user who last operated a lock with a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockUser {
    /// Slot number of the code that was used.
    pub id: String,
    /// Name stored with the code.
    pub name: String,
}

impl VeraDevice {
    /// Locks the door.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a lock or the request fails.
    pub async fn lock(&self) -> Result<(), Error> {
        self.set_lock_state(true).await
    }

    /// Unlocks the door.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a lock or the request fails.
    pub async fn unlock(&self) -> Result<(), Error> {
        self.set_lock_state(false).await
    }

    async fn set_lock_state(&self, locked: bool) -> Result<(), Error> {
        self.check_capability("locking", self.kind().supports_locking())?;
        let value = u8::from(locked);
        self.set_service_value(service::DOOR_LOCK, "Target", "newTargetValue", value)
            .await?;
        self.set_cache_value("locked", value);
        Ok(())
    }

    /// Returns the cached locked state.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.get_str("locked").is_some_and(|v| v == "1")
    }

    /// Returns the active PIN codes from the cached `pincodes` value.
    ///
    /// Slots that fail to parse are logged and skipped.
    #[must_use]
    pub fn get_pin_codes(&self) -> Vec<PinCode> {
        let Some(raw) = self.get_str("pincodes") else {
            return Vec::new();
        };

        parse_pin_codes(&raw)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(code) => code,
                Err(entry) => {
                    tracing::error!(
                        device_id = %self.id(),
                        name = %self.name(),
                        entry = %entry,
                        "Could not parse PIN code entry"
                    );
                    None
                }
            })
            .collect()
    }

    /// Stores a new PIN code on the lock.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a lock or the request fails.
    pub async fn set_new_pin(&self, name: &str, pin: &str) -> Result<(), Error> {
        self.check_capability("PIN codes", self.kind().supports_locking())?;
        self.lu_action(
            service::DOOR_LOCK,
            "SetPin",
            &[("UserCodeName", name.to_string()), ("newPin", pin.to_string())],
        )
        .await?;
        Ok(())
    }

    /// Clears the PIN code in a slot.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not a lock or the request fails.
    pub async fn clear_slot_pin(&self, slot: u32) -> Result<(), Error> {
        self.check_capability("PIN codes", self.kind().supports_locking())?;
        self.lu_action(
            service::DOOR_LOCK,
            "ClearPin",
            &[("UserCode", slot.to_string())],
        )
        .await?;
        Ok(())
    }

    /// Returns the user who last operated the lock, from `sl_UserCode`.
    #[must_use]
    pub fn get_last_user(&self) -> Option<LockUser> {
        parse_user_code(&self.get_complex_value("sl_UserCode")?)
    }

    /// Returns `true` if a wrong PIN was entered.
    #[must_use]
    pub fn get_pin_failed(&self) -> bool {
        self.complex_flag("sl_PinFailed")
    }

    /// Returns `true` if the lock reported a mechanical failure.
    #[must_use]
    pub fn get_lock_failure(&self) -> bool {
        self.complex_flag("sl_LockFailure")
    }

    /// Returns `true` if an unknown user operated the lock.
    #[must_use]
    pub fn get_unauth_user(&self) -> bool {
        self.complex_flag("sl_UnauthUser")
    }

    /// Returns this cycle's "user code used" alert, if any.
    #[must_use]
    pub fn get_last_user_alert(&self) -> Option<AlertRecord> {
        self.find_alert(AlertRecord::CODE_USER_CODE)
    }

    /// Returns this cycle's low battery alert, if any.
    #[must_use]
    pub fn get_low_battery_alert(&self) -> Option<AlertRecord> {
        self.find_alert(AlertRecord::CODE_LOW_BATTERY)
    }

    fn find_alert(&self, code: &str) -> Option<AlertRecord> {
        self.inner
            .state
            .read()
            .alerts()
            .iter()
            .find(|alert| alert.code() == Some(code))
            .cloned()
    }

    fn complex_flag(&self, variable: &str) -> bool {
        self.get_complex_value(variable).is_some_and(|v| v == "1")
    }
}

/// Parses `<VERSION=3>next\tslot,active,added,used,pin,name;\t...`.
///
/// Inactive slots yield `Ok(None)`; malformed entries yield `Err(entry)`.
fn parse_pin_codes(raw: &str) -> Vec<Result<Option<PinCode>, String>> {
    raw.trim_end()
        .split('\t')
        .skip(1)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let fields: Vec<&str> = entry
                .split(';')
                .next()
                .unwrap_or_default()
                .split(',')
                .collect();

            let slot = fields.first().and_then(|s| s.trim().parse::<u32>().ok());
            let active = fields.get(1).and_then(|s| s.trim().parse::<i64>().ok());

            match (slot, active, fields.as_slice()) {
                (Some(_), Some(0), _) => Ok(None),
                (Some(slot), Some(_), [_, _, _, _, pin, name]) => Ok(Some(PinCode {
                    slot,
                    name: (*name).to_string(),
                    pin: (*pin).to_string(),
                })),
                _ => Err(entry.to_string()),
            }
        })
        .collect()
}

/// Parses `UserID="3" UserName="John"`.
fn parse_user_code(raw: &str) -> Option<LockUser> {
    let quoted = |key: &str| -> Option<String> {
        let start = raw.find(&format!("{key}=\""))? + key.len() + 2;
        let len = raw[start..].find('"')?;
        Some(raw[start..start + len].to_string())
    };

    Some(LockUser {
        id: quoted("UserID")?,
        name: quoted("UserName")?,
    })
}
