//! Platform sources.
//!
//! Implementations of [`RawInputSource`](crate::source::RawInputSource) and
//! [`DeviceSource`](crate::source::DeviceSource) for real operating systems.
//!
//! # Feature flags
//! - **`hid`**: resolve friendly product names through `hidapi` (default).
//!
//! Raw Input only exists on Windows; on other targets this module is empty
//! and [`ReplaySource`](crate::replay::ReplaySource) is the only source.

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;
