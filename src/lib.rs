//! Raw Input ingestion core.
//!
//! Turns `WM_INPUT` notifications into typed [`DecodedInput`] values tagged
//! with the device that produced them:
//!
//! - [`Decoder`]: two-phase fetch of one record, validated reinterpretation
//!   of the mouse / keyboard / HID payload
//! - [`BatchReader`]: `GetRawInputBuffer` reads iterated by each record's own
//!   declared size
//! - [`DeviceRegistry`] / [`SharedRegistry`]: handle → descriptor map,
//!   rebuilt wholesale on device arrival/removal
//! - [`RawInputManager`]: wires the above to an [`InputEventBus`]
//!
//! All OS access goes through [`RawInputSource`] and [`DeviceSource`]. The
//! Windows implementation is [`backends::windows::WinRawInput`];
//! [`ReplaySource`] serves records from memory on any platform.

pub mod backends;
pub mod batch;
pub mod config;
pub mod decoder;
pub mod device;
pub mod encode;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod layout;
pub mod logger;
pub mod manager;
pub mod message;
pub mod metadata;
pub mod registration;
pub mod registry;
pub mod replay;
pub mod snapshot;
pub mod source;

pub use batch::{Batch, BatchReader};
pub use config::{BatchConfig, Config, DecodeLimits, RegistryConfig};
pub use decoder::{Decoder, RawInputEnvelope};
pub use device::*;
pub use encode::{encode_device_info, encode_record};
pub use error::{ConfigError, DecodeError, ManagerError, OsError, RegistryError};
pub use event::*;
pub use eventbus::{DeviceTag, EventFilter, InputEventBus, InputListener};
pub use filtered_listener::FilteredListener;
pub use logger::Logger;
pub use manager::{ManagerStats, RawInputManager};
pub use message::RawInputMessage;
pub use metadata::DeviceInfo;
pub use registration::{RegistrationFlags, UsageRegistration};
pub use registry::{DeviceLookup, DeviceRegistry, RefreshSummary, SharedRegistry};
pub use replay::{ReplayDevice, ReplaySource};
pub use snapshot::RegistrySnapshot;
pub use source::{DeviceListEntry, DeviceSource, Fill, InfoQuery, RawInputSource};
