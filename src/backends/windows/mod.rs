#![cfg(target_os = "windows")]

//! Windows Raw Input backend.
//!
//! - [`WinRawInput`]: `user32` calls behind the source traits
//! - `hid_names`: `hidapi` product strings for display names (`hid` feature)
//!
//! Most users should not call into this directly. Create a `WinRawInput`,
//! register usages against your window, and hand it to
//! [`RawInputManager`](crate::manager::RawInputManager):
//! - `WinRawInput::register_usages(hwnd, &UsageRegistration::background_set())`
//! - `RawInputManager::discover(WinRawInput::new(), &config)`
//! - forward `WM_INPUT` / `WM_INPUT_DEVICE_CHANGE` to `handle_message`

#[cfg(feature = "hid")]
mod hid_names;
pub mod raw_input;

pub use raw_input::{key_identity, scancode_for, WinRawInput};
