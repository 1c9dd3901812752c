use crate::error::DecodeError;
use crate::event::{DecodedInput, InputEvent};
use crate::eventbus::InputListener;
use tracing::{info, warn};

/// A simple listener that logs every decoded event through `tracing`.
#[derive(Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Logger
    }
}

impl InputListener for Logger {
    fn on_input(&mut self, input: &DecodedInput) {
        let device = input.identity.display_name();
        match &input.event {
            InputEvent::Mouse(m) => info!(
                device,
                handle = %input.device,
                dx = m.dx,
                dy = m.dy,
                buttons = ?m.button_flags,
                wheel = m.wheel_delta(),
                "mouse"
            ),
            InputEvent::Keyboard(k) => info!(
                device,
                handle = %input.device,
                vkey = k.virtual_key,
                scan = k.scan_code,
                up = k.is_break(),
                "keyboard"
            ),
            InputEvent::Hid(h) => info!(
                device,
                handle = %input.device,
                report_size = h.report_size,
                report_count = h.report_count,
                "hid"
            ),
        }
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        warn!(%error, "raw input decode failed");
    }
}
