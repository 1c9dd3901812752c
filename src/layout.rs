//! Bit-exact wire layouts of the records `user32` hands back.
//!
//! All structs are `#[repr(C)]` over little-endian byte types, so they have
//! alignment 1 and can be read out of any byte slice with a length check.
//! Pointer-sized header fields follow the target's pointer width, which is
//! what `GetRawInputData` / `GetRawInputBuffer` produce for the calling
//! process.
//!
//! | record        | x64 size | x86 size |
//! |---------------|----------|----------|
//! | `RAWINPUTHEADER` | 24    | 16       |
//! | `RAWMOUSE`    | 24       | 24       |
//! | `RAWKEYBOARD` | 16       | 16       |
//! | `RAWHID` prefix | 8      | 8        |
//! | `RID_DEVICE_INFO` | 32   | 32       |

use zerocopy::little_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(target_pointer_width = "64")]
pub(crate) type PtrField = zerocopy::little_endian::U64;
#[cfg(target_pointer_width = "32")]
pub(crate) type PtrField = zerocopy::little_endian::U32;

// dwType values
pub const RIM_TYPEMOUSE: u32 = 0;
pub const RIM_TYPEKEYBOARD: u32 = 1;
pub const RIM_TYPEHID: u32 = 2;

// header wParam values
pub const RIM_INPUT: usize = 0;
pub const RIM_INPUTSINK: usize = 1;

/// `RAWINPUTHEADER`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawInputHeader {
    pub kind: U32,
    pub size: U32,
    pub device: PtrField,
    pub wparam: PtrField,
}

impl RawInputHeader {
    pub fn new(kind: u32, size: u32, device: usize, wparam: usize) -> Self {
        Self {
            kind: U32::new(kind),
            size: U32::new(size),
            device: PtrField::new(device as _),
            wparam: PtrField::new(wparam as _),
        }
    }

    #[inline]
    pub fn device(&self) -> usize {
        self.device.get() as usize
    }

    #[inline]
    pub fn wparam(&self) -> usize {
        self.wparam.get() as usize
    }
}

/// `RAWMOUSE`. The button union sits at offset 4 after two bytes of padding.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawMouse {
    pub flags: U16,
    pub _pad: U16,
    pub button_flags: U16,
    pub button_data: U16,
    pub raw_buttons: U32,
    pub last_x: I32,
    pub last_y: I32,
    pub extra: U32,
}

/// `RAWKEYBOARD`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawKeyboard {
    pub make_code: U16,
    pub flags: U16,
    pub reserved: U16,
    pub vkey: U16,
    pub message: U32,
    pub extra: U32,
}

/// Fixed prefix of `RAWHID`; `size_hid * count` raw bytes follow.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawHidPrefix {
    pub size_hid: U32,
    pub count: U32,
}

/// `RID_DEVICE_INFO` with its union kept as raw words.
///
/// The keyboard arm is the largest (six `DWORD`s), so the union is 24 bytes.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RidDeviceInfo {
    pub cb_size: U32,
    pub kind: U32,
    pub words: [U32; 6],
}

pub const HEADER_SIZE: usize = core::mem::size_of::<RawInputHeader>();
pub const MOUSE_SIZE: usize = core::mem::size_of::<RawMouse>();
pub const KEYBOARD_SIZE: usize = core::mem::size_of::<RawKeyboard>();
pub const HID_PREFIX_SIZE: usize = core::mem::size_of::<RawHidPrefix>();
pub const DEVICE_INFO_SIZE: usize = core::mem::size_of::<RidDeviceInfo>();

/// Natural alignment of batched records (`NEXTRAWINPUTBLOCK`).
pub const POINTER_ALIGN: usize = core::mem::size_of::<usize>();

/// Round `n` up to a multiple of `align`.
///
/// Returns `None` on overflow or when `align` is not a power of two.
#[inline]
pub fn align_up(n: usize, align: usize) -> Option<usize> {
    if !align.is_power_of_two() {
        return None;
    }
    n.checked_add(align - 1).map(|v| v & !(align - 1))
}

/// `align` if it is usable as a batch stride, otherwise [`POINTER_ALIGN`].
#[inline]
pub fn stride_alignment(align: usize) -> usize {
    if align.is_power_of_two() {
        align
    } else {
        POINTER_ALIGN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_win32() {
        assert_eq!(MOUSE_SIZE, 24);
        assert_eq!(KEYBOARD_SIZE, 16);
        assert_eq!(HID_PREFIX_SIZE, 8);
        assert_eq!(DEVICE_INFO_SIZE, 32);
        assert_eq!(HEADER_SIZE, 8 + 2 * core::mem::size_of::<usize>());
    }

    #[test]
    fn header_field_offsets() {
        let h = RawInputHeader::new(RIM_TYPEHID, 0x1234, 0xABCD, RIM_INPUTSINK);
        let b = h.as_bytes();
        assert_eq!(&b[0..4], &2u32.to_le_bytes());
        assert_eq!(&b[4..8], &0x1234u32.to_le_bytes());
        assert_eq!(b[8], 0xCD);
        assert_eq!(b[9], 0xAB);
        assert_eq!(b[8 + POINTER_ALIGN], 1);
    }

    #[test]
    fn mouse_union_at_offset_four() {
        let m = RawMouse {
            flags: U16::new(1),
            _pad: U16::new(0),
            button_flags: U16::new(0x0400),
            button_data: U16::new(120),
            raw_buttons: U32::new(0),
            last_x: I32::new(-1),
            last_y: I32::new(2),
            extra: U32::new(0),
        };
        let b = m.as_bytes();
        assert_eq!(&b[4..6], &0x0400u16.to_le_bytes());
        assert_eq!(&b[12..16], &(-1i32).to_le_bytes());
    }

    #[test]
    fn align_up_rounds_to_pointer() {
        assert_eq!(align_up(37, 8), Some(40));
        assert_eq!(align_up(40, 8), Some(40));
        assert_eq!(align_up(0, 8), Some(0));
        assert_eq!(align_up(37, 4), Some(40));
        assert_eq!(align_up(usize::MAX, 8), None);
    }

    #[test]
    fn align_up_rejects_non_power_of_two() {
        assert_eq!(align_up(37, 0), None);
        assert_eq!(align_up(37, 3), None);
        assert_eq!(align_up(37, 6), None);
        assert_eq!(stride_alignment(0), POINTER_ALIGN);
        assert_eq!(stride_alignment(3), POINTER_ALIGN);
        assert_eq!(stride_alignment(4), 4);
    }
}
