//! Device identity.
//!
//! A [`DeviceHandle`] is the OS's `hDevice`: a weak reference that is only
//! meaningful while the device stays attached. Handles can be reused after a
//! detach/reattach cycle, so descriptors are tied to the registry generation
//! that produced them and are never patched in place.

use crate::layout::{RIM_TYPEHID, RIM_TYPEKEYBOARD, RIM_TYPEMOUSE};
use crate::metadata::DeviceInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque OS-assigned device handle (`RAWINPUTHEADER::hDevice`).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceHandle(pub usize);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque per-message token (`HRAWINPUT`, the `lParam` of `WM_INPUT`).
///
/// Only valid while the message that carried it is being handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawInputToken(pub isize);

/// Device class as reported by `RAWINPUTDEVICELIST::dwType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    Hid,
}

impl DeviceKind {
    pub fn from_raw(kind: u32) -> Option<Self> {
        match kind {
            RIM_TYPEMOUSE => Some(DeviceKind::Mouse),
            RIM_TYPEKEYBOARD => Some(DeviceKind::Keyboard),
            RIM_TYPEHID => Some(DeviceKind::Hid),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            DeviceKind::Mouse => RIM_TYPEMOUSE,
            DeviceKind::Keyboard => RIM_TYPEKEYBOARD,
            DeviceKind::Hid => RIM_TYPEHID,
        }
    }
}

/// One entry of the device registry.
///
/// Built once per refresh and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub handle: DeviceHandle,
    pub kind: DeviceKind,
    /// Device interface path (`RIDI_DEVICENAME`), e.g. `\\?\HID#VID_046D&PID_C52B#...`.
    pub name: String,
    /// Friendly name for display.
    pub display_name: String,
    /// Typed view of `RIDI_DEVICEINFO`, when the query succeeded.
    pub info: Option<DeviceInfo>,
    /// Raw `RID_DEVICE_INFO` bytes as returned by the OS.
    #[serde(skip)]
    pub capability_blob: Vec<u8>,
    /// Length of the HID preparsed data blob (`RIDI_PREPARSEDDATA`), HID only.
    pub preparsed_len: Option<u32>,
    /// Registry generation that produced this descriptor.
    pub generation: u64,
}

/// What an event's source device resolved to.
///
/// `Unknown` is a normal outcome: the device may have gone away between the
/// OS generating the event and the application processing it.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceIdentity {
    Known(Arc<DeviceDescriptor>),
    Unknown,
}

impl DeviceIdentity {
    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        match self {
            DeviceIdentity::Known(d) => Some(d),
            DeviceIdentity::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, DeviceIdentity::Known(_))
    }

    /// Display name, or `"unknown"`.
    pub fn display_name(&self) -> &str {
        match self {
            DeviceIdentity::Known(d) => &d.display_name,
            DeviceIdentity::Unknown => "unknown",
        }
    }
}

impl From<Option<Arc<DeviceDescriptor>>> for DeviceIdentity {
    fn from(d: Option<Arc<DeviceDescriptor>>) -> Self {
        d.map_or(DeviceIdentity::Unknown, DeviceIdentity::Known)
    }
}

/// Best-effort friendly name from a device interface path.
///
/// `\\?\HID#VID_046D&PID_C52B&MI_01#7&...` becomes `HID 046D:C52B`. Paths
/// without a VID/PID fall back to their second `#` segment.
pub fn display_name_from_path(kind: DeviceKind, path: &str) -> String {
    let prefix = match kind {
        DeviceKind::Mouse => "Mouse",
        DeviceKind::Keyboard => "Keyboard",
        DeviceKind::Hid => "HID",
    };
    if let Some((vid, pid)) = parse_vid_pid(path) {
        return format!("{prefix} {vid:04X}:{pid:04X}");
    }
    match path.split('#').nth(1) {
        Some(seg) if !seg.is_empty() => format!("{prefix} {}", seg.replace('_', " ")),
        _ => format!("{prefix} device"),
    }
}

/// Parse `VID_xxxx` / `PID_xxxx` out of a device interface path.
pub fn parse_vid_pid(path: &str) -> Option<(u16, u16)> {
    let upper = path.to_ascii_uppercase();
    let field = |tag: &str| -> Option<u16> {
        let start = upper.find(tag)? + tag.len();
        let digits = upper[start..].split(&['&', '#', '\\'][..]).next()?;
        u16::from_str_radix(digits, 16).ok()
    };
    Some((field("VID_")?, field("PID_")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vid_pid_from_hid_path() {
        let p = r"\\?\HID#VID_046D&PID_C52B&MI_01&Col01#7&1a2b3c&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}";
        assert_eq!(parse_vid_pid(p), Some((0x046D, 0xC52B)));
        assert_eq!(display_name_from_path(DeviceKind::Hid, p), "HID 046D:C52B");
    }

    #[test]
    fn lowercase_path_still_parses() {
        assert_eq!(
            parse_vid_pid(r"\\?\hid#vid_045e&pid_028e#abc"),
            Some((0x045E, 0x028E))
        );
    }

    #[test]
    fn path_without_ids_uses_segment() {
        let p = r"\\?\ACPI#PNP0303#4&abc#{884b96c3-56ef-11d1-bc8c-00a0c91405dd}";
        assert_eq!(display_name_from_path(DeviceKind::Keyboard, p), "Keyboard PNP0303");
        assert_eq!(display_name_from_path(DeviceKind::Mouse, ""), "Mouse device");
    }

    #[test]
    fn identity_from_option() {
        assert_eq!(DeviceIdentity::from(None), DeviceIdentity::Unknown);
        assert_eq!(DeviceIdentity::Unknown.display_name(), "unknown");
    }

    #[test]
    fn kind_raw_values() {
        for k in [DeviceKind::Mouse, DeviceKind::Keyboard, DeviceKind::Hid] {
            assert_eq!(DeviceKind::from_raw(k.as_raw()), Some(k));
        }
        assert_eq!(DeviceKind::from_raw(3), None);
    }
}
