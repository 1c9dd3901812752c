//! `WM_INPUT` record decoding.
//!
//! One notification goes through a fixed sequence:
//!
//! 1. size query (`GetRawInputData` with a null destination)
//! 2. allocate a buffer of exactly that size, scoped to the call
//! 3. fetch, requiring the OS to report the same byte count
//! 4. classify the header and check `dwSize` against the bytes we hold
//! 5. reinterpret the payload as mouse / keyboard / HID, with length checks
//! 6. resolve the device handle against the registry
//!
//! Steps 4–6 are also what [`BatchReader`](crate::batch::BatchReader) runs
//! for each record of a buffered read, via [`Decoder::decode_record`].
//!
//! Nothing here logs or retries. Every failure is returned to the caller,
//! which decides whether to drop it, log it, or surface it.

use crate::config::DecodeLimits;
use crate::device::{DeviceHandle, RawInputToken};
use crate::error::DecodeError;
use crate::event::{
    DecodedInput, HidEvent, InputEvent, InputOrigin, KeyFlags, KeyboardEvent, MouseButtonFlags,
    MouseEvent, MouseStateFlags, RecordKind,
};
use crate::layout::{
    RawHidPrefix, RawInputHeader, RawKeyboard, RawMouse, HEADER_SIZE, HID_PREFIX_SIZE,
    KEYBOARD_SIZE, MOUSE_SIZE,
};
use crate::registry::DeviceLookup;
use crate::source::RawInputSource;
use zerocopy::FromBytes;

/// One undecoded record: header fields plus the kind-specific payload bytes.
///
/// Borrowed from the decode buffer and only lives for the duration of one
/// decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawInputEnvelope<'a> {
    pub kind: RecordKind,
    pub total_size: u32,
    pub header_size: u32,
    pub device: DeviceHandle,
    pub origin: InputOrigin,
    pub payload: &'a [u8],
}

impl<'a> RawInputEnvelope<'a> {
    /// Read and validate the header of `record`, which must hold exactly one
    /// record (`dwSize` bytes).
    pub fn classify(record: &'a [u8]) -> Result<Self, DecodeError> {
        let actual = record.len() as u32;
        let (header, payload) = match RawInputHeader::read_from_prefix(record) {
            Ok(split) => split,
            Err(_) => {
                return Err(DecodeError::HeaderInconsistent {
                    declared: 0,
                    actual,
                })
            }
        };

        let declared = header.size.get();
        if declared != actual {
            return Err(DecodeError::HeaderInconsistent { declared, actual });
        }

        let kind = RecordKind::from_raw(header.kind.get())
            .ok_or(DecodeError::UnknownRecordKind(header.kind.get()))?;

        Ok(Self {
            kind,
            total_size: declared,
            header_size: HEADER_SIZE as u32,
            device: DeviceHandle(header.device()),
            origin: InputOrigin::from_wparam(header.wparam()),
            payload,
        })
    }

    /// Reinterpret the payload according to `kind`.
    pub fn reinterpret(&self, limits: &DecodeLimits) -> Result<InputEvent, DecodeError> {
        match self.kind {
            RecordKind::Mouse => {
                let m = RawMouse::read_from_bytes(self.payload)
                    .map_err(|_| self.payload_mismatch(MOUSE_SIZE))?;
                Ok(InputEvent::Mouse(MouseEvent {
                    dx: m.last_x.get(),
                    dy: m.last_y.get(),
                    button_flags: MouseButtonFlags::from_bits_retain(m.button_flags.get()),
                    button_data: m.button_data.get(),
                    state: MouseStateFlags::from_bits_retain(m.flags.get()),
                    raw_buttons: m.raw_buttons.get(),
                    extra: m.extra.get(),
                }))
            }
            RecordKind::Keyboard => {
                let k = RawKeyboard::read_from_bytes(self.payload)
                    .map_err(|_| self.payload_mismatch(KEYBOARD_SIZE))?;
                Ok(InputEvent::Keyboard(KeyboardEvent {
                    virtual_key: k.vkey.get(),
                    scan_code: k.make_code.get(),
                    flags: KeyFlags::from_bits_retain(k.flags.get()),
                    message: k.message.get(),
                    extra: k.extra.get(),
                }))
            }
            RecordKind::Hid => self.reinterpret_hid(limits),
        }
    }

    fn reinterpret_hid(&self, limits: &DecodeLimits) -> Result<InputEvent, DecodeError> {
        let Ok((prefix, data)) = RawHidPrefix::read_from_prefix(self.payload) else {
            return Err(DecodeError::HidLengthInconsistent {
                declared: self.total_size,
                report_size: 0,
                report_count: 0,
                computed: u64::from(self.header_size) + HID_PREFIX_SIZE as u64,
            });
        };
        let report_size = prefix.size_hid.get();
        let report_count = prefix.count.get();

        // u32 * u32 always fits in u64.
        let data_len = u64::from(report_size) * u64::from(report_count);
        let computed = u64::from(self.header_size) + HID_PREFIX_SIZE as u64 + data_len;
        if computed > limits.max_record_bytes {
            return Err(DecodeError::SizeUnreasonable {
                size: computed,
                limit: limits.max_record_bytes,
            });
        }
        if computed != u64::from(self.total_size) || data_len != data.len() as u64 {
            return Err(DecodeError::HidLengthInconsistent {
                declared: self.total_size,
                report_size,
                report_count,
                computed,
            });
        }

        Ok(InputEvent::Hid(HidEvent {
            report_size,
            report_count,
            raw: data.to_vec(),
        }))
    }

    /// Mouse and keyboard records are exactly header + payload.
    fn payload_mismatch(&self, need: usize) -> DecodeError {
        DecodeError::PayloadTruncated {
            kind: self.kind,
            need: (HEADER_SIZE + need) as u32,
            have: self.total_size,
        }
    }
}

/// Decodes raw input records into [`DecodedInput`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder {
    limits: DecodeLimits,
}

impl Decoder {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Decode the record behind a `WM_INPUT` token.
    pub fn decode<S, L>(
        &self,
        source: &S,
        token: RawInputToken,
        devices: &L,
    ) -> Result<DecodedInput, DecodeError>
    where
        S: RawInputSource + ?Sized,
        L: DeviceLookup + ?Sized,
    {
        let size = source.input_size(token).map_err(DecodeError::QuerySize)?;
        self.check_size(u64::from(size))?;

        // Dropped on every return path below, read or not.
        let mut buf = vec![0u8; size as usize];
        let written = source
            .read_input(token, &mut buf)
            .map_err(DecodeError::FetchFailed)?;
        if written != size {
            return Err(DecodeError::SizeMismatch {
                expected: size,
                actual: written,
            });
        }

        self.decode_record(&buf, devices)
    }

    /// Decode one complete record already in memory (classify, reinterpret,
    /// resolve).
    pub fn decode_record<L>(&self, record: &[u8], devices: &L) -> Result<DecodedInput, DecodeError>
    where
        L: DeviceLookup + ?Sized,
    {
        self.check_size(record.len() as u64)?;
        let envelope = RawInputEnvelope::classify(record)?;
        let event = envelope.reinterpret(&self.limits)?;
        Ok(DecodedInput {
            device: envelope.device,
            identity: devices.lookup(envelope.device).into(),
            origin: envelope.origin,
            event,
        })
    }

    fn check_size(&self, size: u64) -> Result<(), DecodeError> {
        if size > self.limits.max_record_bytes {
            return Err(DecodeError::SizeUnreasonable {
                size,
                limit: self.limits.max_record_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_record;
    use crate::error::OsError;
    use crate::registry::DeviceRegistry;
    use crate::replay::ReplaySource;

    fn mouse(dx: i32, dy: i32, flags: MouseButtonFlags) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            dx,
            dy,
            button_flags: flags,
            ..Default::default()
        })
    }

    fn set_declared_size(rec: &mut [u8], size: u32) {
        rec[4..8].copy_from_slice(&size.to_le_bytes());
    }

    #[test]
    fn fixed_size_round_trip() {
        let decoder = Decoder::default();
        let registry = DeviceRegistry::new();
        let events = [
            mouse(5, -3, MouseButtonFlags::LEFT_DOWN),
            mouse(i32::MIN, i32::MAX, MouseButtonFlags::empty()),
            InputEvent::Mouse(MouseEvent {
                dx: 32000,
                dy: 100,
                button_flags: MouseButtonFlags::WHEEL | MouseButtonFlags::RIGHT_UP,
                button_data: (-240i16) as u16,
                state: MouseStateFlags::MOVE_ABSOLUTE | MouseStateFlags::VIRTUAL_DESKTOP,
                raw_buttons: 0xDEAD_BEEF,
                extra: 7,
            }),
            InputEvent::Keyboard(KeyboardEvent {
                virtual_key: 0x41,
                scan_code: 0x1E,
                flags: KeyFlags::empty(),
                message: 0x0100,
                extra: 0,
            }),
            InputEvent::Keyboard(KeyboardEvent {
                virtual_key: 0x11,
                scan_code: 0x1D,
                flags: KeyFlags::BREAK | KeyFlags::E0,
                message: 0x0101,
                extra: 0xFFFF_FFFF,
            }),
        ];
        for (i, ev) in events.iter().enumerate() {
            let origin = if i % 2 == 0 {
                InputOrigin::Foreground
            } else {
                InputOrigin::Background
            };
            let rec = encode_record(DeviceHandle(0x10 + i), origin, ev);
            let out = decoder.decode_record(&rec, &registry).unwrap();
            assert_eq!(&out.event, ev);
            assert_eq!(out.device, DeviceHandle(0x10 + i));
            assert_eq!(out.origin, origin);
        }
    }

    #[test]
    fn record_sizes_follow_native_layout() {
        let m = encode_record(DeviceHandle(1), InputOrigin::Foreground, &mouse(0, 0, MouseButtonFlags::empty()));
        assert_eq!(m.len(), HEADER_SIZE + 24);
        let k = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &InputEvent::Keyboard(KeyboardEvent::default()),
        );
        assert_eq!(k.len(), HEADER_SIZE + 16);
    }

    #[test]
    fn hid_short_by_one_byte_is_inconsistent() {
        let ev = InputEvent::Hid(HidEvent {
            report_size: 4,
            report_count: 3,
            raw: (0u8..12).collect(),
        });
        let mut rec = encode_record(DeviceHandle(2), InputOrigin::Foreground, &ev);
        assert_eq!(rec.len(), HEADER_SIZE + 8 + 12);
        rec.pop();
        let total = rec.len() as u32;
        set_declared_size(&mut rec, total);

        let err = Decoder::default()
            .decode_record(&rec, &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::HidLengthInconsistent {
                declared: total,
                report_size: 4,
                report_count: 3,
                computed: (HEADER_SIZE + 8 + 12) as u64,
            }
        );
    }

    #[test]
    fn hid_decodes_reports() {
        let ev = InputEvent::Hid(HidEvent {
            report_size: 5,
            report_count: 1,
            raw: vec![1, 2, 3, 4, 5],
        });
        let rec = encode_record(DeviceHandle(3), InputOrigin::Background, &ev);
        assert_eq!(rec.len(), HEADER_SIZE + 13);
        let out = Decoder::default()
            .decode_record(&rec, &DeviceRegistry::new())
            .unwrap();
        assert_eq!(out.event, ev);
        assert!(!out.identity.is_known());
    }

    #[test]
    fn hid_product_overflow_is_unreasonable() {
        let ev = InputEvent::Hid(HidEvent {
            report_size: 1,
            report_count: 1,
            raw: vec![0],
        });
        let mut rec = encode_record(DeviceHandle(3), InputOrigin::Foreground, &ev);
        // 65536 * 65536 would wrap a u32 product back to zero.
        rec[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&65536u32.to_le_bytes());
        rec[HEADER_SIZE + 4..HEADER_SIZE + 8].copy_from_slice(&65536u32.to_le_bytes());
        let err = Decoder::default()
            .decode_record(&rec, &DeviceRegistry::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::SizeUnreasonable { .. }));
    }

    #[test]
    fn large_but_sane_hid_batch_fits_u64_math() {
        let limits = DecodeLimits {
            max_record_bytes: 64 * 1024 * 1024,
            ..Default::default()
        };
        let ev = InputEvent::Hid(HidEvent {
            report_size: 65536,
            report_count: 256,
            raw: vec![0xA5; 65536 * 256],
        });
        let rec = encode_record(DeviceHandle(3), InputOrigin::Foreground, &ev);
        let out = Decoder::new(limits)
            .decode_record(&rec, &DeviceRegistry::new())
            .unwrap();
        assert_eq!(out.event, ev);
    }

    #[test]
    fn header_size_must_match_buffer() {
        let mut rec = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(1, 1, MouseButtonFlags::empty()),
        );
        set_declared_size(&mut rec, 999);
        let err = Decoder::default()
            .decode_record(&rec, &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::HeaderInconsistent {
                declared: 999,
                actual: rec.len() as u32
            }
        );

        let err = Decoder::default()
            .decode_record(&rec[..10], &DeviceRegistry::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::HeaderInconsistent { actual: 10, .. }));
    }

    #[test]
    fn truncated_mouse_payload() {
        let rec = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(1, 1, MouseButtonFlags::empty()),
        );
        let mut short = rec[..HEADER_SIZE + 10].to_vec();
        set_declared_size(&mut short, (HEADER_SIZE + 10) as u32);
        let err = Decoder::default()
            .decode_record(&short, &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::PayloadTruncated {
                kind: RecordKind::Mouse,
                need: (HEADER_SIZE + 24) as u32,
                have: (HEADER_SIZE + 10) as u32,
            }
        );
    }

    #[test]
    fn trailing_bytes_after_fixed_payload_rejected() {
        let mut long = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(1, 1, MouseButtonFlags::empty()),
        );
        long.extend_from_slice(&[0; 8]);
        set_declared_size(&mut long, (HEADER_SIZE + 32) as u32);
        let err = Decoder::default()
            .decode_record(&long, &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::PayloadTruncated {
                kind: RecordKind::Mouse,
                need: (HEADER_SIZE + 24) as u32,
                have: (HEADER_SIZE + 32) as u32,
            }
        );

        let mut long = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &InputEvent::Keyboard(KeyboardEvent::default()),
        );
        long.push(0);
        set_declared_size(&mut long, (HEADER_SIZE + 17) as u32);
        let err = Decoder::default()
            .decode_record(&long, &DeviceRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::PayloadTruncated { kind: RecordKind::Keyboard, .. }
        ));
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut rec = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(0, 0, MouseButtonFlags::empty()),
        );
        rec[0..4].copy_from_slice(&7u32.to_le_bytes());
        let err = Decoder::default()
            .decode_record(&rec, &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(err, DecodeError::UnknownRecordKind(7));
    }

    #[test]
    fn size_query_failure() {
        let src = ReplaySource::new();
        src.fail_size_query(OsError::INVALID_HANDLE);
        let err = Decoder::default()
            .decode(&src, RawInputToken(1), &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(err, DecodeError::QuerySize(OsError::INVALID_HANDLE));
    }

    #[test]
    fn fetch_failure_is_fetch_failed() {
        let src = ReplaySource::new();
        let rec = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(5, -3, MouseButtonFlags::LEFT_DOWN),
        );
        src.push_record(RawInputToken(4), rec);
        src.fail_fetch(OsError(31));
        let decoder = Decoder::default();
        let registry = DeviceRegistry::new();
        let err = decoder.decode(&src, RawInputToken(4), &registry).unwrap_err();
        assert_eq!(err, DecodeError::FetchFailed(OsError(31)));
        assert!(err.is_transport());

        // The fault is one-shot; the record is still there.
        let out = decoder.decode(&src, RawInputToken(4), &registry).unwrap();
        assert_eq!(out.event, mouse(5, -3, MouseButtonFlags::LEFT_DOWN));
    }

    #[test]
    fn fetch_count_mismatch_never_reads_buffer() {
        // A record of poison bytes: if anything interpreted it we would see a
        // header or kind error instead of SizeMismatch.
        let src = ReplaySource::new();
        src.push_record(RawInputToken(9), vec![0xDE; 48]);
        src.misreport_fetch(47);
        let err = Decoder::default()
            .decode(&src, RawInputToken(9), &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::SizeMismatch {
                expected: 48,
                actual: 47
            }
        );

        // Same outcome for a perfectly valid record.
        let rec = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(5, -3, MouseButtonFlags::LEFT_DOWN),
        );
        let len = rec.len() as u32;
        src.push_record(RawInputToken(10), rec);
        src.misreport_fetch(len + 8);
        let err = Decoder::default()
            .decode(&src, RawInputToken(10), &DeviceRegistry::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::SizeMismatch { .. }));
    }

    #[test]
    fn oversized_record_rejected_before_allocation() {
        let limits = DecodeLimits {
            max_record_bytes: 32,
            ..Default::default()
        };
        let src = ReplaySource::new();
        let rec = encode_record(
            DeviceHandle(1),
            InputOrigin::Foreground,
            &mouse(0, 0, MouseButtonFlags::empty()),
        );
        src.push_record(RawInputToken(1), rec);
        let err = Decoder::new(limits)
            .decode(&src, RawInputToken(1), &DeviceRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::SizeUnreasonable {
                size: (HEADER_SIZE + 24) as u64,
                limit: 32
            }
        );
    }

    #[test]
    fn missing_token_is_query_error() {
        let src = ReplaySource::new();
        let err = Decoder::default()
            .decode(&src, RawInputToken(404), &DeviceRegistry::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::QuerySize(_)));
    }
}
