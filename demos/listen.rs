//! Print raw input from every mouse, keyboard and game controller.
//!
//! `RUST_LOG=info cargo run --example listen`
//!
//! Creates a message-only window, registers for background input and device
//! notifications, and forwards `WM_INPUT` / `WM_INPUT_DEVICE_CHANGE` to a
//! `RawInputManager`.

#[cfg(target_os = "windows")]
mod app {
    use core::ptr::null_mut;
    use rawinput_core::backends::windows::{key_identity, WinRawInput};
    use rawinput_core::{
        pack_key_index, Config, DecodedInput, EventFilter, InputEvent, InputListener, Logger,
        RawInputManager, UsageRegistration,
    };
    use std::cell::RefCell;
    use tracing_subscriber::EnvFilter;
    use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows_sys::Win32::UI::WindowsAndMessaging::*;

    thread_local! {
        static MANAGER: RefCell<Option<RawInputManager<WinRawInput>>> = const { RefCell::new(None) };
    }

    /// Prints packed key indices for key-down events.
    struct KeyIndices;

    impl InputListener for KeyIndices {
        fn on_input(&mut self, input: &DecodedInput) {
            if let InputEvent::Keyboard(k) = &input.event {
                if k.is_break() {
                    return;
                }
                if let Some((sc, ext)) = key_identity(k) {
                    println!(
                        "{}: key_{:X}",
                        input.identity.display_name(),
                        pack_key_index(sc, ext)
                    );
                }
            }
        }
    }

    unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        MANAGER.with(|m| {
            if let Some(manager) = m.borrow_mut().as_mut() {
                manager.handle_message(msg, wparam, lparam);
            }
        });
        // WM_INPUT still needs DefWindowProc for cleanup.
        DefWindowProcW(hwnd, msg, wparam, lparam)
    }

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    pub fn run() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init();

        let class = wide("rawinput_core_listen");
        let hwnd = unsafe {
            let hinstance = GetModuleHandleW(null_mut());
            let mut wc: WNDCLASSW = core::mem::zeroed();
            wc.lpfnWndProc = Some(wnd_proc);
            wc.hInstance = hinstance;
            wc.lpszClassName = class.as_ptr();
            if RegisterClassW(&wc) == 0 {
                panic!("RegisterClassW failed");
            }
            CreateWindowExW(
                0,
                class.as_ptr(),
                class.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                null_mut(),
                hinstance,
                null_mut(),
            )
        };
        assert!(!hwnd.is_null(), "CreateWindowExW failed");

        WinRawInput::register_usages(hwnd, &UsageRegistration::background_set())
            .expect("register raw input devices");

        let mut manager =
            RawInputManager::discover(WinRawInput::new(), &Config::default()).expect("enumerate devices");
        println!("Listening on {} device(s). Ctrl+C to quit.", manager.registry().len());
        manager.add_listener(Logger::new(), EventFilter::All, None);
        manager.add_listener(KeyIndices, EventFilter::KeyboardOnly, None);
        MANAGER.with(|m| *m.borrow_mut() = Some(manager));

        unsafe {
            let mut msg: MSG = core::mem::zeroed();
            while GetMessageW(&mut msg, null_mut(), 0, 0) > 0 {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn main() {
    app::run();
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("listen needs Windows Raw Input; try `cargo run --example devices` instead");
}
