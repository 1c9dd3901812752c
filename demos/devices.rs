//! Enumerate raw input devices once and print the registry as JSON.
//!
//! `cargo run --example devices [config.toml]`
//!
//! On non-Windows hosts a few simulated devices are listed instead.

use rawinput_core::{Config, DeviceRegistry, DeviceSource};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).expect("load config"),
        None => Config::default(),
    };

    #[cfg(target_os = "windows")]
    let source = rawinput_core::backends::windows::WinRawInput::new();
    #[cfg(not(target_os = "windows"))]
    let source = simulated();

    run(&source, &config);
}

fn run<S: DeviceSource>(source: &S, config: &Config) {
    let mut registry = DeviceRegistry::with_config(config.registry.clone());
    let summary = registry.refresh(source).expect("enumerate devices");

    println!(
        "Discovered {} device(s) ({} listed, {} filtered, {} failed)",
        summary.kept,
        summary.listed,
        summary.filtered,
        summary.failed.len()
    );
    for d in registry.descriptors() {
        let ids = d
            .info
            .as_ref()
            .and_then(|i| i.vid_pid())
            .map(|(v, p)| format!(" {v:04x}:{p:04x}"))
            .unwrap_or_default();
        println!("  {} {:?} {}{} path={}", d.handle, d.kind, d.display_name, ids, d.name);
    }

    println!(
        "{}",
        registry.snapshot().to_json_pretty().expect("serialize snapshot")
    );
}

#[cfg(not(target_os = "windows"))]
fn simulated() -> rawinput_core::ReplaySource {
    use rawinput_core::{DeviceHandle, ReplayDevice, ReplaySource};

    let src = ReplaySource::new();
    src.attach(
        ReplayDevice::mouse(DeviceHandle(0x1001), r"\\?\HID#VID_046D&PID_C077#7&1c2&0&0000")
            .with_product("USB Mouse"),
    );
    src.attach(ReplayDevice::keyboard(
        DeviceHandle(0x1002),
        r"\\?\ACPI#PNP0303#4&2b7a&0",
    ));
    src.attach(ReplayDevice::hid(
        DeviceHandle(0x1003),
        r"\\?\HID#VID_231D&PID_011F#8&3d4&0&0000",
        (0x231D, 0x011F),
        (0x01, 0x04),
    ));
    src
}
