//! `user32` implementation of [`RawInputSource`] and [`DeviceSource`].
//!
//! Every fill goes through an 8-aligned scratch buffer before being copied
//! into the caller's bytes, so callers never have to care about the
//! alignment `RAWINPUT` / `RID_DEVICE_INFO` expect.
//!
//! ## Conventions
//! - `RIDI_DEVICENAME` sizes are in UTF-16 units; they are converted to bytes
//!   here so the trait stays byte-based.
//! - `RIDI_DEVICEINFO` requires `cbSize` to be preset; done here.
//! - Keyboard identity can be normalised with [`scancode_for`] when `MakeCode`
//!   is zero (some virtual keyboards), then packed with
//!   [`pack_key_index`](crate::event::pack_key_index).

#![cfg(target_os = "windows")]

use crate::device::{DeviceHandle, RawInputToken};
use crate::error::OsError;
use crate::event::KeyboardEvent;
use crate::layout::DEVICE_INFO_SIZE;
use crate::registration::UsageRegistration;
use crate::source::{DeviceListEntry, DeviceSource, Fill, InfoQuery, RawInputSource};
use core::ffi::c_void;
use windows_sys::Win32::Foundation::{GetLastError, ERROR_INSUFFICIENT_BUFFER, HANDLE, HWND};
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{MapVirtualKeyW, MAPVK_VK_TO_VSC_EX};
use windows_sys::Win32::UI::Input::*;
use zerocopy::IntoBytes;

#[cfg(feature = "hid")]
use super::hid_names::ProductNames;

const HEADER_CB: u32 = core::mem::size_of::<RAWINPUTHEADER>() as u32;
const FAILED: u32 = u32::MAX;

#[inline]
fn last_error() -> OsError {
    OsError(unsafe { GetLastError() })
}

#[inline]
fn hdevice(handle: DeviceHandle) -> HANDLE {
    handle.0 as HANDLE
}

fn ridi(query: InfoQuery) -> RAW_INPUT_DEVICE_INFO_COMMAND {
    match query {
        InfoQuery::Name => RIDI_DEVICENAME,
        InfoQuery::Info => RIDI_DEVICEINFO,
        InfoQuery::PreparsedData => RIDI_PREPARSEDDATA,
    }
}

/// `RIDI_DEVICENAME` counts characters; everything else counts bytes.
#[inline]
fn unit(query: InfoQuery) -> u32 {
    if query == InfoQuery::Name {
        2
    } else {
        1
    }
}

fn scratch(bytes: usize) -> Vec<u64> {
    vec![0u64; bytes.div_ceil(8).max(1)]
}

/// Live Raw Input source.
pub struct WinRawInput {
    #[cfg(feature = "hid")]
    names: ProductNames,
}

impl Default for WinRawInput {
    fn default() -> Self {
        Self::new()
    }
}

impl WinRawInput {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "hid")]
            names: ProductNames::new(),
        }
    }

    /// `RegisterRawInputDevices` for every entry, targeting `hwnd`.
    ///
    /// `hwnd` may be null only if no entry needs a window.
    pub fn register_usages(hwnd: HWND, usages: &[UsageRegistration]) -> Result<(), OsError> {
        let devices: Vec<RAWINPUTDEVICE> = usages
            .iter()
            .map(|u| RAWINPUTDEVICE {
                usUsagePage: u.usage_page,
                usUsage: u.usage,
                dwFlags: u.flags.bits(),
                hwndTarget: if u.needs_window() { hwnd } else { core::ptr::null_mut() },
            })
            .collect();
        let ok = unsafe {
            RegisterRawInputDevices(
                devices.as_ptr(),
                devices.len() as u32,
                core::mem::size_of::<RAWINPUTDEVICE>() as u32,
            )
        };
        if ok == 0 {
            return Err(last_error());
        }
        Ok(())
    }
}

impl RawInputSource for WinRawInput {
    fn input_size(&self, token: RawInputToken) -> Result<u32, OsError> {
        let mut size = 0u32;
        let r = unsafe {
            GetRawInputData(
                token.0 as HRAWINPUT,
                RID_INPUT,
                core::ptr::null_mut(),
                &mut size,
                HEADER_CB,
            )
        };
        if r == FAILED {
            return Err(last_error());
        }
        Ok(size)
    }

    fn read_input(&self, token: RawInputToken, buf: &mut [u8]) -> Result<u32, OsError> {
        let mut words = scratch(buf.len());
        let mut size = buf.len() as u32;
        let r = unsafe {
            GetRawInputData(
                token.0 as HRAWINPUT,
                RID_INPUT,
                words.as_mut_ptr().cast::<c_void>(),
                &mut size,
                HEADER_CB,
            )
        };
        if r == FAILED {
            return Err(last_error());
        }
        let n = (r as usize).min(buf.len());
        buf[..n].copy_from_slice(&words.as_bytes()[..n]);
        Ok(r)
    }

    fn buffer_size(&self) -> Result<u32, OsError> {
        let mut size = 0u32;
        let r = unsafe { GetRawInputBuffer(core::ptr::null_mut(), &mut size, HEADER_CB) };
        if r == FAILED {
            return Err(last_error());
        }
        Ok(size)
    }

    fn read_buffer(&self, buf: &mut [u8]) -> Result<u32, OsError> {
        let mut words = scratch(buf.len());
        let mut size = buf.len() as u32;
        let r = unsafe {
            GetRawInputBuffer(words.as_mut_ptr().cast::<RAWINPUT>(), &mut size, HEADER_CB)
        };
        if r == FAILED {
            return Err(last_error());
        }
        buf.copy_from_slice(&words.as_bytes()[..buf.len()]);
        Ok(r)
    }
}

impl DeviceSource for WinRawInput {
    fn device_count(&self) -> Result<u32, OsError> {
        #[cfg(feature = "hid")]
        self.names.mark_stale();

        let mut count = 0u32;
        let r = unsafe {
            GetRawInputDeviceList(
                core::ptr::null_mut(),
                &mut count,
                core::mem::size_of::<RAWINPUTDEVICELIST>() as u32,
            )
        };
        if r == FAILED {
            return Err(last_error());
        }
        Ok(count)
    }

    fn device_list(&self, out: &mut [DeviceListEntry]) -> Result<Fill, OsError> {
        let mut entries: Vec<RAWINPUTDEVICELIST> = (0..out.len())
            .map(|_| RAWINPUTDEVICELIST {
                hDevice: core::ptr::null_mut(),
                dwType: 0,
            })
            .collect();
        let mut count = out.len() as u32;
        let r = unsafe {
            GetRawInputDeviceList(
                entries.as_mut_ptr(),
                &mut count,
                core::mem::size_of::<RAWINPUTDEVICELIST>() as u32,
            )
        };
        if r == FAILED {
            let err = last_error();
            if err.0 == ERROR_INSUFFICIENT_BUFFER {
                return Ok(Fill::TooSmall(count));
            }
            return Err(err);
        }
        for (slot, entry) in out.iter_mut().zip(&entries[..r as usize]) {
            *slot = DeviceListEntry {
                handle: DeviceHandle(entry.hDevice as usize),
                kind: entry.dwType,
            };
        }
        Ok(Fill::Written(r))
    }

    fn device_info_size(&self, handle: DeviceHandle, query: InfoQuery) -> Result<u32, OsError> {
        let mut size = 0u32;
        let r = unsafe {
            GetRawInputDeviceInfoW(hdevice(handle), ridi(query), core::ptr::null_mut(), &mut size)
        };
        if r == FAILED {
            return Err(last_error());
        }
        Ok(size * unit(query))
    }

    fn device_info(
        &self,
        handle: DeviceHandle,
        query: InfoQuery,
        buf: &mut [u8],
    ) -> Result<Fill, OsError> {
        let unit = unit(query);
        let mut words = scratch(buf.len());
        if query == InfoQuery::Info && buf.len() >= DEVICE_INFO_SIZE {
            // RID_DEVICE_INFO::cbSize
            words[0] = DEVICE_INFO_SIZE as u64;
        }
        let mut size = buf.len() as u32 / unit;
        let r = unsafe {
            GetRawInputDeviceInfoW(
                hdevice(handle),
                ridi(query),
                words.as_mut_ptr().cast::<c_void>(),
                &mut size,
            )
        };
        if r == FAILED {
            let err = last_error();
            if err.0 == ERROR_INSUFFICIENT_BUFFER {
                return Ok(Fill::TooSmall(size * unit));
            }
            return Err(err);
        }
        let written = (r * unit) as usize;
        let n = written.min(buf.len());
        buf[..n].copy_from_slice(&words.as_bytes()[..n]);
        Ok(Fill::Written(written as u32))
    }

    #[cfg(feature = "hid")]
    fn product_name(&self, _handle: DeviceHandle, path: &str) -> Option<String> {
        self.names.lookup(path)
    }
}

/// Scancode for a virtual key via `MapVirtualKeyW(MAPVK_VK_TO_VSC_EX)`.
///
/// Returns `(scancode, extended)`.
#[inline]
pub fn scancode_for(vkey: u16) -> Option<(u16, bool)> {
    // MAPVK_VK_TO_VSC_EX encodes extended keys as 0xE0xx.
    let sc = unsafe { MapVirtualKeyW(u32::from(vkey), MAPVK_VK_TO_VSC_EX) };
    if sc == 0 {
        return None;
    }
    if (sc & 0xFF00) == 0xE000 {
        Some(((sc & 0x00FF) as u16, true))
    } else {
        Some((sc as u16, false))
    }
}

/// `(scancode, extended)` for a keyboard event, falling back to the virtual
/// key when the device reported no make code.
pub fn key_identity(event: &KeyboardEvent) -> Option<(u16, bool)> {
    if event.scan_code != 0 {
        return Some((event.scan_code, event.is_extended()));
    }
    scancode_for(event.virtual_key).map(|(sc, ext)| (sc, ext || event.is_extended()))
}
