//! The OS seam.
//!
//! Everything that talks to `user32` goes through these two traits, one
//! method per underlying call shape. The Windows implementation lives in
//! [`backends::windows`](crate::backends); [`ReplaySource`](crate::replay::ReplaySource)
//! implements both from memory.
//!
//! All sizes are in **bytes**, including device names (the Windows backend
//! converts from the UTF-16 character counts `RIDI_DEVICENAME` uses).

use crate::device::{DeviceHandle, RawInputToken};
use crate::error::OsError;

/// Result of a fill call that can report "buffer too small".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    /// The call succeeded and wrote this many bytes (or entries).
    Written(u32),
    /// The destination was too small; the OS now wants this many.
    TooSmall(u32),
}

/// Per-device query selector (`RIDI_*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InfoQuery {
    /// `RIDI_DEVICENAME`: UTF-16 interface path.
    Name,
    /// `RIDI_DEVICEINFO`: `RID_DEVICE_INFO`.
    Info,
    /// `RIDI_PREPARSEDDATA`: HID preparsed data blob.
    PreparsedData,
}

/// `RAWINPUTDEVICELIST`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceListEntry {
    pub handle: DeviceHandle,
    /// Raw `dwType`.
    pub kind: u32,
}

/// `GetRawInputData` / `GetRawInputBuffer`.
pub trait RawInputSource {
    /// Size in bytes of the record behind `token` (null destination).
    fn input_size(&self, token: RawInputToken) -> Result<u32, OsError>;

    /// Copy the record behind `token` into `buf`; returns the bytes written.
    fn read_input(&self, token: RawInputToken, buf: &mut [u8]) -> Result<u32, OsError>;

    /// Minimum buffer size for one pending buffered record (null destination).
    /// `0` means nothing is pending.
    fn buffer_size(&self) -> Result<u32, OsError>;

    /// Copy as many pending records as fit into `buf` (pointer-aligned);
    /// returns the number of **records** written.
    fn read_buffer(&self, buf: &mut [u8]) -> Result<u32, OsError>;
}

/// `GetRawInputDeviceList` / `GetRawInputDeviceInfoW`.
pub trait DeviceSource {
    /// Number of attached raw input devices.
    fn device_count(&self) -> Result<u32, OsError>;

    /// Fill `out` with device entries; returns the number written, or the
    /// required count if the list grew since [`DeviceSource::device_count`].
    fn device_list(&self, out: &mut [DeviceListEntry]) -> Result<Fill, OsError>;

    /// Required size in bytes for `query` on `handle`.
    fn device_info_size(&self, handle: DeviceHandle, query: InfoQuery) -> Result<u32, OsError>;

    /// Fill `buf` with `query` on `handle`.
    fn device_info(
        &self,
        handle: DeviceHandle,
        query: InfoQuery,
        buf: &mut [u8],
    ) -> Result<Fill, OsError>;

    /// Friendly product name for the device at `path`, if the platform knows one.
    fn product_name(&self, _handle: DeviceHandle, _path: &str) -> Option<String> {
        None
    }
}

impl<T: RawInputSource + ?Sized> RawInputSource for &T {
    fn input_size(&self, token: RawInputToken) -> Result<u32, OsError> {
        (**self).input_size(token)
    }
    fn read_input(&self, token: RawInputToken, buf: &mut [u8]) -> Result<u32, OsError> {
        (**self).read_input(token, buf)
    }
    fn buffer_size(&self) -> Result<u32, OsError> {
        (**self).buffer_size()
    }
    fn read_buffer(&self, buf: &mut [u8]) -> Result<u32, OsError> {
        (**self).read_buffer(buf)
    }
}

impl<T: DeviceSource + ?Sized> DeviceSource for &T {
    fn device_count(&self) -> Result<u32, OsError> {
        (**self).device_count()
    }
    fn device_list(&self, out: &mut [DeviceListEntry]) -> Result<Fill, OsError> {
        (**self).device_list(out)
    }
    fn device_info_size(&self, handle: DeviceHandle, query: InfoQuery) -> Result<u32, OsError> {
        (**self).device_info_size(handle, query)
    }
    fn device_info(
        &self,
        handle: DeviceHandle,
        query: InfoQuery,
        buf: &mut [u8],
    ) -> Result<Fill, OsError> {
        (**self).device_info(handle, query, buf)
    }
    fn product_name(&self, handle: DeviceHandle, path: &str) -> Option<String> {
        (**self).product_name(handle, path)
    }
}
