//! Building records in the native layout.
//!
//! The inverse of [`Decoder::decode_record`](crate::decoder::Decoder::decode_record):
//! useful for replaying captured input and for feeding
//! [`ReplaySource`](crate::replay::ReplaySource).

use crate::device::DeviceHandle;
use crate::event::{InputEvent, InputOrigin};
use crate::layout::{
    RawHidPrefix, RawInputHeader, RawKeyboard, RawMouse, RidDeviceInfo, DEVICE_INFO_SIZE,
    HEADER_SIZE, RIM_TYPEHID, RIM_TYPEKEYBOARD, RIM_TYPEMOUSE,
};
use crate::metadata::DeviceInfo;
use zerocopy::little_endian::{I32, U16, U32};
use zerocopy::IntoBytes;

/// Encode one event as a complete `RAWINPUT` record (`dwSize` bytes, no
/// trailing padding).
///
/// For HID events the header declares `header + 8 + raw.len()`; callers that
/// want a consistent record keep `raw.len() == report_size * report_count`.
pub fn encode_record(device: DeviceHandle, origin: InputOrigin, event: &InputEvent) -> Vec<u8> {
    let mut payload = Vec::new();
    let kind = match event {
        InputEvent::Mouse(m) => {
            let raw = RawMouse {
                flags: U16::new(m.state.bits()),
                _pad: U16::new(0),
                button_flags: U16::new(m.button_flags.bits()),
                button_data: U16::new(m.button_data),
                raw_buttons: U32::new(m.raw_buttons),
                last_x: I32::new(m.dx),
                last_y: I32::new(m.dy),
                extra: U32::new(m.extra),
            };
            payload.extend_from_slice(raw.as_bytes());
            RIM_TYPEMOUSE
        }
        InputEvent::Keyboard(k) => {
            let raw = RawKeyboard {
                make_code: U16::new(k.scan_code),
                flags: U16::new(k.flags.bits()),
                reserved: U16::new(0),
                vkey: U16::new(k.virtual_key),
                message: U32::new(k.message),
                extra: U32::new(k.extra),
            };
            payload.extend_from_slice(raw.as_bytes());
            RIM_TYPEKEYBOARD
        }
        InputEvent::Hid(h) => {
            let prefix = RawHidPrefix {
                size_hid: U32::new(h.report_size),
                count: U32::new(h.report_count),
            };
            payload.extend_from_slice(prefix.as_bytes());
            payload.extend_from_slice(&h.raw);
            RIM_TYPEHID
        }
    };

    let total = HEADER_SIZE + payload.len();
    let header = RawInputHeader::new(kind, total as u32, device.0, origin.as_wparam());
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Encode a [`DeviceInfo`] as a `RID_DEVICE_INFO` blob.
pub fn encode_device_info(info: &DeviceInfo) -> Vec<u8> {
    let (kind, words) = match *info {
        DeviceInfo::Mouse {
            id,
            buttons,
            sample_rate,
            has_horizontal_wheel,
        } => (
            RIM_TYPEMOUSE,
            [id, buttons, sample_rate, u32::from(has_horizontal_wheel), 0, 0],
        ),
        DeviceInfo::Keyboard {
            kind,
            subtype,
            mode,
            function_keys,
            indicators,
            keys_total,
        } => (
            RIM_TYPEKEYBOARD,
            [kind, subtype, mode, function_keys, indicators, keys_total],
        ),
        DeviceInfo::Hid {
            vendor_id,
            product_id,
            version,
            usage_page,
            usage,
        } => (
            RIM_TYPEHID,
            [
                vendor_id,
                product_id,
                version,
                u32::from(usage_page) | (u32::from(usage) << 16),
                0,
                0,
            ],
        ),
    };
    let raw = RidDeviceInfo {
        cb_size: U32::new(DEVICE_INFO_SIZE as u32),
        kind: U32::new(kind),
        words: words.map(U32::new),
    };
    raw.as_bytes().to_vec()
}
