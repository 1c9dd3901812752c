//! Window message classification for hosts that own the window procedure.

use crate::device::{DeviceHandle, RawInputToken};
use crate::event::InputOrigin;

pub const WM_INPUT_DEVICE_CHANGE: u32 = 0x00FE;
pub const WM_INPUT: u32 = 0x00FF;

pub const GIDC_ARRIVAL: usize = 1;
pub const GIDC_REMOVAL: usize = 2;

/// A raw input related window message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawInputMessage {
    /// `WM_INPUT`; `lParam` is the token for `GetRawInputData`.
    Input {
        token: RawInputToken,
        origin: InputOrigin,
    },
    /// `WM_INPUT_DEVICE_CHANGE` / `GIDC_ARRIVAL`.
    DeviceArrived(DeviceHandle),
    /// `WM_INPUT_DEVICE_CHANGE` / `GIDC_REMOVAL`.
    DeviceRemoved(DeviceHandle),
}

impl RawInputMessage {
    /// Classify a window message. `None` for anything unrelated.
    pub fn classify(msg: u32, wparam: usize, lparam: isize) -> Option<Self> {
        match msg {
            WM_INPUT => Some(RawInputMessage::Input {
                token: RawInputToken(lparam),
                // GET_RAWINPUT_CODE_WPARAM
                origin: InputOrigin::from_wparam(wparam & 0xFF),
            }),
            WM_INPUT_DEVICE_CHANGE => {
                let handle = DeviceHandle(lparam as usize);
                match wparam {
                    GIDC_ARRIVAL => Some(RawInputMessage::DeviceArrived(handle)),
                    GIDC_REMOVAL => Some(RawInputMessage::DeviceRemoved(handle)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn is_device_change(&self) -> bool {
        matches!(
            self,
            RawInputMessage::DeviceArrived(_) | RawInputMessage::DeviceRemoved(_)
        )
    }
}
