use rawinput_core::{
    encode_record, BatchReader, Config, DecodeError, Decoder, DeviceHandle, DeviceKind,
    DeviceRegistry, HidEvent, InputEvent, InputOrigin, KeyFlags, KeyboardEvent, MouseButtonFlags,
    MouseEvent, RawInputManager, RawInputToken, ReplayDevice, ReplaySource, SharedRegistry,
};
use rawinput_core::layout::HEADER_SIZE;

const MOUSE: DeviceHandle = DeviceHandle(0x0001_0041);
const KEYBOARD: DeviceHandle = DeviceHandle(0x0001_0043);
const PAD: DeviceHandle = DeviceHandle(0x0002_0057);

fn desk() -> ReplaySource {
    let src = ReplaySource::new();
    src.attach(
        ReplayDevice::mouse(MOUSE, r"\\?\HID#VID_046D&PID_C077#7&1c2&0&0000").with_product("USB Mouse"),
    );
    src.attach(ReplayDevice::keyboard(KEYBOARD, r"\\?\ACPI#PNP0303#4&2b7a&0"));
    src.attach(ReplayDevice::hid(
        PAD,
        r"\\?\HID#VID_054C&PID_09CC#8&3d4&0&0000",
        (0x054C, 0x09CC),
        (0x01, 0x05),
    ));
    src
}

fn left_click() -> InputEvent {
    InputEvent::Mouse(MouseEvent {
        dx: 5,
        dy: -3,
        button_flags: MouseButtonFlags::LEFT_DOWN,
        ..Default::default()
    })
}

#[test]
fn usb_mouse_click_decodes_with_identity() {
    let src = desk();
    let mut registry = DeviceRegistry::new();
    registry.refresh(&src).unwrap();

    let record = encode_record(MOUSE, InputOrigin::Foreground, &left_click());
    assert_eq!(record.len(), HEADER_SIZE + 24);
    src.push_record(RawInputToken(0x7f01), record);

    let out = Decoder::default()
        .decode(&src, RawInputToken(0x7f01), &registry)
        .unwrap();
    let InputEvent::Mouse(m) = &out.event else {
        panic!("expected mouse, got {:?}", out.event);
    };
    assert_eq!((m.dx, m.dy), (5, -3));
    assert_eq!(m.button_flags, MouseButtonFlags::LEFT_DOWN);
    assert_eq!(m.wheel_delta(), 0);
    assert_eq!(out.identity.display_name(), "USB Mouse");
    assert_eq!(out.identity.descriptor().unwrap().kind, DeviceKind::Mouse);
}

#[test]
fn mixed_batch_matches_single_record_decodes() {
    let src = desk();
    let registry = SharedRegistry::default();
    registry.refresh(&src).unwrap();

    let records = vec![
        encode_record(MOUSE, InputOrigin::Foreground, &left_click()),
        // 24 + 8 + 3*3 = 41 bytes: odd length, padded to 48 in the batch
        encode_record(
            PAD,
            InputOrigin::Background,
            &InputEvent::Hid(HidEvent {
                report_size: 3,
                report_count: 3,
                raw: vec![0x01, 0x80, 0x7f, 0x01, 0x81, 0x7e, 0x01, 0x82, 0x7d],
            }),
        ),
        encode_record(
            KEYBOARD,
            InputOrigin::Foreground,
            &InputEvent::Keyboard(KeyboardEvent {
                virtual_key: 0x41,
                scan_code: 0x1E,
                flags: KeyFlags::empty(),
                message: 0x0100,
                extra: 0,
            }),
        ),
        // second odd HID record right after a padded one
        encode_record(
            PAD,
            InputOrigin::Background,
            &InputEvent::Hid(HidEvent {
                report_size: 5,
                report_count: 1,
                raw: vec![9, 9, 9, 9, 9],
            }),
        ),
        encode_record(
            KEYBOARD,
            InputOrigin::Foreground,
            &InputEvent::Keyboard(KeyboardEvent {
                virtual_key: 0x41,
                scan_code: 0x1E,
                flags: KeyFlags::BREAK,
                message: 0x0101,
                extra: 0,
            }),
        ),
    ];
    for r in &records {
        src.queue_record(r.clone());
    }

    let decoder = Decoder::default();
    let batch = BatchReader::default().fetch_batch(&src).unwrap();
    assert_eq!(batch.len(), records.len());

    let decoded = batch.decode_all(&decoder, &registry);
    assert_eq!(decoded.len(), records.len());
    for (got, rec) in decoded.iter().zip(&records) {
        let single = decoder.decode_record(rec, &registry).unwrap();
        assert_eq!(got.as_ref().unwrap(), &single);
        assert!(single.identity.is_known());
    }
    let kinds: Vec<_> = decoded
        .iter()
        .map(|d| d.as_ref().unwrap().event.kind())
        .collect();
    assert_eq!(
        format!("{kinds:?}"),
        "[Mouse, Hid, Keyboard, Hid, Keyboard]"
    );
}

#[test]
fn removed_device_resolves_to_not_found() {
    let src = desk();
    let mut registry = DeviceRegistry::new();
    registry.refresh(&src).unwrap();
    assert_eq!(registry.resolve(PAD).unwrap().display_name, "HID 054C:09CC");

    src.detach(PAD);
    registry.refresh(&src).unwrap();
    assert!(registry.resolve(PAD).is_none());

    // Events from the departed device still decode, with an unknown identity.
    let rec = encode_record(
        PAD,
        InputOrigin::Background,
        &InputEvent::Hid(HidEvent {
            report_size: 2,
            report_count: 1,
            raw: vec![1, 2],
        }),
    );
    let out = Decoder::default().decode_record(&rec, &registry).unwrap();
    assert!(!out.identity.is_known());
    assert_eq!(out.identity.display_name(), "unknown");
}

#[test]
fn short_fetch_on_poisoned_buffer_is_size_mismatch() {
    let src = desk();
    src.push_record(RawInputToken(3), vec![0xCC; HEADER_SIZE + 24]);
    src.misreport_fetch(HEADER_SIZE as u32);
    let err = Decoder::default()
        .decode(&src, RawInputToken(3), &DeviceRegistry::new())
        .unwrap_err();
    assert_eq!(
        err,
        DecodeError::SizeMismatch {
            expected: (HEADER_SIZE + 24) as u32,
            actual: HEADER_SIZE as u32,
        }
    );
}

#[test]
fn manager_honours_toml_config() {
    let config = Config::from_toml_str(
        r#"
        [limits]
        max_record_bytes = 64

        [batch]
        capacity_records = 1

        [registry]
        kinds = ["mouse"]
        "#,
    )
    .unwrap();

    let src = desk();
    let big = encode_record(
        PAD,
        InputOrigin::Foreground,
        &InputEvent::Hid(HidEvent {
            report_size: 64,
            report_count: 1,
            raw: vec![0; 64],
        }),
    );
    src.push_record(RawInputToken(1), big);
    src.queue_record(encode_record(MOUSE, InputOrigin::Foreground, &left_click()));
    src.queue_record(encode_record(MOUSE, InputOrigin::Foreground, &left_click()));

    let mut manager = RawInputManager::discover(src, &config).unwrap();
    assert_eq!(manager.registry().len(), 1);

    assert!(matches!(
        manager.on_raw_input(RawInputToken(1)),
        Err(DecodeError::SizeUnreasonable { limit: 64, .. })
    ));
    assert_eq!(manager.drain_buffered().unwrap(), 2);
    assert_eq!(manager.stats().batches, 2);
}
