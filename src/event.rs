//! Decoded input events.
//!
//! A [`DecodedInput`] is what one raw input record turns into: the source
//! device handle, its resolved identity, whether the window was in the
//! foreground, and a kind-specific [`InputEvent`].
//!
//! ## Value conventions
//! - Mouse deltas are **raw OS units** (counts), or absolute coordinates in
//!   `0..=65535` when [`MouseStateFlags::MOVE_ABSOLUTE`] is set.
//! - Wheel deltas are **raw `WHEEL_DELTA` units** (typically ±120 per notch).
//! - Keyboard identity is `(scan_code, extended)`; see [`pack_key_index`].
//!   No character translation happens here.
//! - HID payloads are copied verbatim; report decoding is the application's job.

use crate::device::{DeviceHandle, DeviceIdentity};
use crate::layout::{RIM_INPUTSINK, RIM_TYPEHID, RIM_TYPEKEYBOARD, RIM_TYPEMOUSE};

/// `RAWINPUTHEADER::dwType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Mouse,
    Keyboard,
    Hid,
}

impl RecordKind {
    pub fn from_raw(kind: u32) -> Option<Self> {
        match kind {
            RIM_TYPEMOUSE => Some(RecordKind::Mouse),
            RIM_TYPEKEYBOARD => Some(RecordKind::Keyboard),
            RIM_TYPEHID => Some(RecordKind::Hid),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            RecordKind::Mouse => RIM_TYPEMOUSE,
            RecordKind::Keyboard => RIM_TYPEKEYBOARD,
            RecordKind::Hid => RIM_TYPEHID,
        }
    }
}

/// Whether the input arrived while the registered window had focus
/// (`RIM_INPUT`) or through `RIDEV_INPUTSINK` (`RIM_INPUTSINK`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InputOrigin {
    #[default]
    Foreground,
    Background,
}

impl InputOrigin {
    pub fn from_wparam(wparam: usize) -> Self {
        if wparam == RIM_INPUTSINK {
            InputOrigin::Background
        } else {
            InputOrigin::Foreground
        }
    }

    pub fn as_wparam(self) -> usize {
        match self {
            InputOrigin::Foreground => 0,
            InputOrigin::Background => RIM_INPUTSINK,
        }
    }
}

bitflags::bitflags! {
    /// `RAWMOUSE::usButtonFlags` (`RI_MOUSE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtonFlags: u16 {
        const LEFT_DOWN = 0x0001;
        const LEFT_UP = 0x0002;
        const RIGHT_DOWN = 0x0004;
        const RIGHT_UP = 0x0008;
        const MIDDLE_DOWN = 0x0010;
        const MIDDLE_UP = 0x0020;
        const BUTTON_4_DOWN = 0x0040;
        const BUTTON_4_UP = 0x0080;
        const BUTTON_5_DOWN = 0x0100;
        const BUTTON_5_UP = 0x0200;
        const WHEEL = 0x0400;
        const HWHEEL = 0x0800;
    }
}

bitflags::bitflags! {
    /// `RAWMOUSE::usFlags` (`MOUSE_MOVE_*`). Zero means relative motion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseStateFlags: u16 {
        const MOVE_ABSOLUTE = 0x0001;
        const VIRTUAL_DESKTOP = 0x0002;
        const ATTRIBUTES_CHANGED = 0x0004;
        const MOVE_NOCOALESCE = 0x0008;
    }
}

bitflags::bitflags! {
    /// `RAWKEYBOARD::Flags` (`RI_KEY_*`). Zero means make (key down).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u16 {
        const BREAK = 0x0001;
        const E0 = 0x0002;
        const E1 = 0x0004;
    }
}

/// `RAWMOUSE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MouseEvent {
    pub dx: i32,
    pub dy: i32,
    pub button_flags: MouseButtonFlags,
    /// `usButtonData`: the wheel delta when a wheel flag is set.
    pub button_data: u16,
    pub state: MouseStateFlags,
    pub raw_buttons: u32,
    pub extra: u32,
}

impl MouseEvent {
    /// Vertical wheel delta, `0` unless [`MouseButtonFlags::WHEEL`] is set.
    pub fn wheel_delta(&self) -> i16 {
        if self.button_flags.contains(MouseButtonFlags::WHEEL) {
            self.button_data as i16
        } else {
            0
        }
    }

    /// Horizontal wheel delta, `0` unless [`MouseButtonFlags::HWHEEL`] is set.
    pub fn hwheel_delta(&self) -> i16 {
        if self.button_flags.contains(MouseButtonFlags::HWHEEL) {
            self.button_data as i16
        } else {
            0
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.state.contains(MouseStateFlags::MOVE_ABSOLUTE)
    }
}

/// `RAWKEYBOARD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct KeyboardEvent {
    pub virtual_key: u16,
    /// `MakeCode`. Can be `0` for synthesized input.
    pub scan_code: u16,
    pub flags: KeyFlags,
    /// Corresponding window message (`WM_KEYDOWN`, `WM_SYSKEYUP`, ...).
    pub message: u32,
    pub extra: u32,
}

impl KeyboardEvent {
    /// `true` for key-up (break).
    pub fn is_break(&self) -> bool {
        self.flags.contains(KeyFlags::BREAK)
    }

    /// `true` when the E0 or E1 prefix was present.
    pub fn is_extended(&self) -> bool {
        self.flags.intersects(KeyFlags::E0 | KeyFlags::E1)
    }

    /// Stable binding key for this key; see [`pack_key_index`].
    pub fn key_index(&self) -> u16 {
        pack_key_index(self.scan_code, self.is_extended())
    }
}

/// `RAWHID`: `report_count` reports of `report_size` bytes each.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct HidEvent {
    pub report_size: u32,
    pub report_count: u32,
    pub raw: Vec<u8>,
}

impl HidEvent {
    /// Iterate the individual reports.
    pub fn reports(&self) -> impl Iterator<Item = &[u8]> {
        let take = if self.report_size == 0 {
            0
        } else {
            self.report_count as usize
        };
        self.raw
            .chunks(self.report_size.max(1) as usize)
            .take(take)
    }
}

/// Kind-specific payload of a decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    Hid(HidEvent),
}

impl InputEvent {
    pub fn kind(&self) -> RecordKind {
        match self {
            InputEvent::Mouse(_) => RecordKind::Mouse,
            InputEvent::Keyboard(_) => RecordKind::Keyboard,
            InputEvent::Hid(_) => RecordKind::Hid,
        }
    }
}

/// One fully decoded raw input record.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedInput {
    pub device: DeviceHandle,
    pub identity: DeviceIdentity,
    pub origin: InputOrigin,
    pub event: InputEvent,
}

/// Pack a keyboard key identity into a stable `u16` index.
///
/// Layout:
/// - low 15 bits = scancode
/// - high bit    = extended flag
///
/// Intended for stable bindings (`key_1E` vs `key_801D`), not text.
#[inline]
pub fn pack_key_index(scancode: u16, is_extended: bool) -> u16 {
    let mut idx = scancode & 0x7FFF;
    if is_extended {
        idx |= 0x8000;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_delta_only_with_flag() {
        let mut m = MouseEvent {
            button_data: (-120i16) as u16,
            ..Default::default()
        };
        assert_eq!(m.wheel_delta(), 0);
        m.button_flags = MouseButtonFlags::WHEEL;
        assert_eq!(m.wheel_delta(), -120);
        assert_eq!(m.hwheel_delta(), 0);
    }

    #[test]
    fn key_index_marks_extended() {
        let k = KeyboardEvent {
            scan_code: 0x1D,
            flags: KeyFlags::E0 | KeyFlags::BREAK,
            ..Default::default()
        };
        assert!(k.is_break());
        assert_eq!(k.key_index(), 0x801D);
        assert_eq!(pack_key_index(0xFFFF, false), 0x7FFF);
    }

    #[test]
    fn hid_reports_split_by_size() {
        let h = HidEvent {
            report_size: 3,
            report_count: 2,
            raw: vec![1, 2, 3, 4, 5, 6],
        };
        let r: Vec<&[u8]> = h.reports().collect();
        assert_eq!(r, vec![&[1, 2, 3][..], &[4, 5, 6][..]]);

        let empty = HidEvent {
            report_size: 0,
            report_count: 4,
            raw: vec![],
        };
        assert_eq!(empty.reports().count(), 0);
    }

    #[test]
    fn origin_from_wparam() {
        assert_eq!(InputOrigin::from_wparam(0), InputOrigin::Foreground);
        assert_eq!(InputOrigin::from_wparam(1), InputOrigin::Background);
        assert_eq!(InputOrigin::Background.as_wparam(), 1);
    }
}
