//! `RAWINPUTDEVICE` requests for `RegisterRawInputDevices`.
//!
//! Platform-neutral description; the Windows backend turns these into the
//! actual call.

use bitflags::bitflags;

bitflags! {
    /// `RIDEV_*` flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegistrationFlags: u32 {
        const REMOVE = 0x0000_0001;
        const EXCLUDE = 0x0000_0010;
        const PAGEONLY = 0x0000_0020;
        const NOLEGACY = 0x0000_0030;
        /// Receive input while not in the foreground (requires a target window).
        const INPUTSINK = 0x0000_0100;
        const CAPTUREMOUSE = 0x0000_0200;
        const NOHOTKEYS = 0x0000_0200;
        const APPKEYS = 0x0000_0400;
        const EXINPUTSINK = 0x0000_1000;
        /// Deliver `WM_INPUT_DEVICE_CHANGE` (requires a target window).
        const DEVNOTIFY = 0x0000_2000;
    }
}

// HID usage pages / usages (Generic Desktop)
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
pub const USAGE_MOUSE: u16 = 0x02;
pub const USAGE_JOYSTICK: u16 = 0x04;
pub const USAGE_GAMEPAD: u16 = 0x05;
pub const USAGE_KEYBOARD: u16 = 0x06;
pub const USAGE_MULTI_AXIS: u16 = 0x08;

/// One top-level collection to register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRegistration {
    pub usage_page: u16,
    pub usage: u16,
    pub flags: RegistrationFlags,
}

impl UsageRegistration {
    pub const fn new(usage_page: u16, usage: u16, flags: RegistrationFlags) -> Self {
        Self {
            usage_page,
            usage,
            flags,
        }
    }

    pub const fn mouse(flags: RegistrationFlags) -> Self {
        Self::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_MOUSE, flags)
    }

    pub const fn keyboard(flags: RegistrationFlags) -> Self {
        Self::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_KEYBOARD, flags)
    }

    pub const fn joystick(flags: RegistrationFlags) -> Self {
        Self::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_JOYSTICK, flags)
    }

    pub const fn gamepad(flags: RegistrationFlags) -> Self {
        Self::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_GAMEPAD, flags)
    }

    /// Mouse, keyboard, joystick and gamepad, all background + device notifications.
    pub fn background_set() -> [Self; 4] {
        let f = RegistrationFlags::INPUTSINK | RegistrationFlags::DEVNOTIFY;
        [
            Self::mouse(f),
            Self::keyboard(f),
            Self::joystick(f),
            Self::gamepad(f),
        ]
    }

    /// `RIDEV_INPUTSINK` and `RIDEV_DEVNOTIFY` need a target window;
    /// `RIDEV_REMOVE` must not have one.
    pub fn needs_window(&self) -> bool {
        self.flags
            .intersects(RegistrationFlags::INPUTSINK | RegistrationFlags::DEVNOTIFY | RegistrationFlags::EXINPUTSINK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_set_needs_window() {
        let set = UsageRegistration::background_set();
        assert!(set.iter().all(UsageRegistration::needs_window));
        assert_eq!(set[1].usage, USAGE_KEYBOARD);
        assert!(!UsageRegistration::mouse(RegistrationFlags::REMOVE).needs_window());
        assert_eq!(
            (RegistrationFlags::INPUTSINK | RegistrationFlags::DEVNOTIFY).bits(),
            0x2100
        );
    }
}
