//! Error types.
//!
//! Decode failures are local: each one ends the decode of a single record and
//! is handed back to the caller. None of them touch registry state.

use crate::device::DeviceHandle;
use crate::event::RecordKind;
use thiserror::Error;

/// A Win32 error code as reported by `GetLastError`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("os error {0}")]
pub struct OsError(pub u32);

impl OsError {
    /// `ERROR_INSUFFICIENT_BUFFER`.
    pub const INSUFFICIENT_BUFFER: OsError = OsError(122);
    /// `ERROR_INVALID_HANDLE`.
    pub const INVALID_HANDLE: OsError = OsError(6);
}

/// Why a single raw input record could not be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The size query (`GetRawInputData` / `GetRawInputBuffer` with a null
    /// destination) failed.
    #[error("raw input size query failed: {0}")]
    QuerySize(OsError),

    /// The fill call itself failed.
    #[error("raw input fetch failed: {0}")]
    FetchFailed(OsError),

    /// The fill call wrote a different number of bytes than the size query
    /// promised. The buffer is discarded unread.
    #[error("raw input fetch wrote {actual} bytes, size query reported {expected}")]
    SizeMismatch { expected: u32, actual: u32 },

    /// The header's `dwSize` disagrees with the number of bytes available.
    #[error("record header declares {declared} bytes, {actual} available")]
    HeaderInconsistent { declared: u32, actual: u32 },

    /// A HID record whose `dwSizeHid * dwCount` does not account for the
    /// declared record size.
    #[error(
        "HID record declares {declared} bytes but {report_size} x {report_count} reports need {computed}"
    )]
    HidLengthInconsistent {
        declared: u32,
        report_size: u32,
        report_count: u32,
        computed: u64,
    },

    /// A computed or reported size above the configured ceiling.
    #[error("record size {size} exceeds limit {limit}")]
    SizeUnreasonable { size: u64, limit: u64 },

    /// A mouse/keyboard record whose size is not exactly header plus the
    /// fixed payload (short, or with trailing bytes).
    #[error("{kind:?} record must be {need} bytes, record has {have}")]
    PayloadTruncated { kind: RecordKind, need: u32, have: u32 },

    /// `dwType` outside the three known kinds.
    #[error("unknown raw input record type {0}")]
    UnknownRecordKind(u32),

    /// A batch record whose declared size cannot be used to locate the next
    /// record. Iteration of the batch stops here.
    #[error("batch record at offset {offset} declares {declared} bytes, cannot advance")]
    BatchFraming { offset: usize, declared: u32 },
}

impl DecodeError {
    /// `true` for the failures that happen before any byte is read.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DecodeError::QuerySize(_) | DecodeError::FetchFailed(_) | DecodeError::SizeMismatch { .. }
        )
    }
}

/// Failures while (re)building the device registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `GetRawInputDeviceList` failed outright.
    #[error("device enumeration failed: {0}")]
    Enumerate(OsError),

    /// The device list kept changing size between the count query and the
    /// fill, even after a retry.
    #[error("device list changed during enumeration (expected {expected}, got {actual})")]
    ListUnstable { expected: u32, actual: u32 },

    /// A per-device query failed twice. Only reported through logging; the
    /// device is left out of the map.
    #[error("device {handle} query failed: {source}")]
    DeviceQuery {
        handle: DeviceHandle,
        #[source]
        source: OsError,
    },
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures while setting up a [`RawInputManager`](crate::RawInputManager).
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
