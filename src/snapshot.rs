//! Point-in-time view of the device registry.
//!
//! [`RegistrySnapshot`] is an **owned**, read-only copy of one registry
//! generation. It is produced by [`DeviceRegistry::snapshot`](crate::registry::DeviceRegistry::snapshot)
//! and can be cloned, serialized, or handed to another thread.
//!
//! # Semantics
//! - Devices are ordered by handle.
//! - The raw `RID_DEVICE_INFO` blob is not serialized; the typed
//!   [`DeviceInfo`](crate::metadata::DeviceInfo) is.
//! - A snapshot does **not** track later refreshes. Take a new one after
//!   `on_device_list_changed`.
//!
//! # Examples
//! ```no_run
//! use rawinput_core::{DeviceRegistry, ReplaySource};
//!
//! let mut registry = DeviceRegistry::new();
//! registry.refresh(&ReplaySource::new()).unwrap();
//! println!("{}", registry.snapshot().to_json_pretty().unwrap());
//! ```

use crate::device::{DeviceDescriptor, DeviceHandle, DeviceKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub generation: u64,
    pub devices: Vec<DeviceDescriptor>,
}

impl RegistrySnapshot {
    #[inline]
    pub fn get(&self, handle: DeviceHandle) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.handle == handle)
    }

    pub fn of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.iter().filter(move |d| d.kind == kind)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeviceRegistry;
    use crate::replay::{ReplayDevice, ReplaySource};

    #[test]
    fn json_shape() {
        let src = ReplaySource::new();
        src.attach(ReplayDevice::hid(
            DeviceHandle(0x40),
            r"\\?\HID#VID_045E&PID_028E#1",
            (0x045E, 0x028E),
            (0x01, 0x05),
        ));
        src.attach(ReplayDevice::mouse(DeviceHandle(0x20), r"\\?\HID#VID_046D&PID_C077#2"));
        let mut reg = DeviceRegistry::new();
        reg.refresh(&src).unwrap();

        let snap = reg.snapshot();
        assert_eq!(snap.devices[0].handle, DeviceHandle(0x20));
        assert_eq!(snap.of_kind(DeviceKind::Hid).count(), 1);

        let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(value["generation"], 1);
        assert_eq!(value["devices"][1]["handle"], 0x40);
        assert_eq!(value["devices"][1]["kind"], "hid");
        assert_eq!(value["devices"][1]["info"]["type"], "hid");
        assert_eq!(value["devices"][1]["info"]["vendor_id"], 0x045E);
        assert!(value["devices"][1].get("capability_blob").is_none());

        let back = RegistrySnapshot::from_json(&snap.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back.get(DeviceHandle(0x40)).unwrap().display_name, "HID 045E:028E");
        assert!(back.devices[1].capability_blob.is_empty());
    }
}
