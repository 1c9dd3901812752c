//! Typed device capabilities.
//!
//! [`DeviceInfo`] is the parsed form of `RID_DEVICE_INFO` (`RIDI_DEVICEINFO`).
//! The registry keeps the raw bytes alongside it as the opaque capability
//! blob; this view is what UIs and logs usually want.
//!
//! # Conventions
//! - `usage_page` / `usage` for HID follow the HID Usage Tables (e.g. page
//!   `0x01` Generic Desktop, usage `0x05` Gamepad).
//! - Keyboard `kind` / `subtype` are the legacy `dwType` / `dwSubType` codes
//!   (4 = enhanced 101/102-key, 7 = Japanese, 81 = USB).

use crate::layout::{RidDeviceInfo, RIM_TYPEHID, RIM_TYPEKEYBOARD, RIM_TYPEMOUSE};
use serde::{Deserialize, Serialize};
use zerocopy::FromBytes;

/// Capabilities of a raw input device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceInfo {
    Mouse {
        id: u32,
        buttons: u32,
        sample_rate: u32,
        has_horizontal_wheel: bool,
    },
    Keyboard {
        kind: u32,
        subtype: u32,
        mode: u32,
        function_keys: u32,
        indicators: u32,
        keys_total: u32,
    },
    Hid {
        vendor_id: u32,
        product_id: u32,
        version: u32,
        usage_page: u16,
        usage: u16,
    },
}

impl DeviceInfo {
    /// Parse a `RID_DEVICE_INFO` blob.
    ///
    /// Returns `None` when the blob is shorter than the struct or carries an
    /// unknown `dwType`.
    pub fn parse(blob: &[u8]) -> Option<Self> {
        let (raw, _) = RidDeviceInfo::read_from_prefix(blob).ok()?;
        let w = raw.words.map(|x| x.get());
        match raw.kind.get() {
            RIM_TYPEMOUSE => Some(DeviceInfo::Mouse {
                id: w[0],
                buttons: w[1],
                sample_rate: w[2],
                has_horizontal_wheel: w[3] != 0,
            }),
            RIM_TYPEKEYBOARD => Some(DeviceInfo::Keyboard {
                kind: w[0],
                subtype: w[1],
                mode: w[2],
                function_keys: w[3],
                indicators: w[4],
                keys_total: w[5],
            }),
            RIM_TYPEHID => Some(DeviceInfo::Hid {
                vendor_id: w[0],
                product_id: w[1],
                version: w[2],
                // usUsagePage / usUsage share the fourth DWORD
                usage_page: (w[3] & 0xFFFF) as u16,
                usage: (w[3] >> 16) as u16,
            }),
            _ => None,
        }
    }

    /// Vendor/product pair for HID devices.
    pub fn vid_pid(&self) -> Option<(u16, u16)> {
        match *self {
            DeviceInfo::Hid {
                vendor_id,
                product_id,
                ..
            } => Some((vendor_id as u16, product_id as u16)),
            _ => None,
        }
    }

    /// `true` for Generic Desktop joystick / gamepad / multi-axis collections.
    pub fn is_game_controller(&self) -> bool {
        matches!(
            *self,
            DeviceInfo::Hid {
                usage_page: 0x01,
                usage: 0x04 | 0x05 | 0x08,
                ..
            }
        )
    }
}
