//! Device registry: `hDevice` → [`DeviceDescriptor`].
//!
//! The registry is rebuilt wholesale on every [`refresh`](DeviceRegistry::refresh)
//! (device arrival/removal). Entries are never patched: a handle that was
//! not enumerated by the latest refresh resolves to nothing, even if an older
//! generation knew it. Handles can be recycled by the OS after a detach, so a
//! stale descriptor would silently mislabel a different device.
//!
//! Every per-device OS query is two-phase (size, then fill). If the size
//! changes between the two calls the query is retried once; a second
//! mismatch leaves the device out of the map.
//!
//! [`resolve`](DeviceRegistry::resolve) never calls the OS.

use crate::config::RegistryConfig;
use crate::device::{display_name_from_path, DeviceDescriptor, DeviceHandle, DeviceKind};
use crate::error::{OsError, RegistryError};
use crate::metadata::DeviceInfo;
use crate::snapshot::RegistrySnapshot;
use crate::source::{DeviceListEntry, DeviceSource, Fill, InfoQuery};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-device queries larger than this are treated as failed.
const MAX_QUERY_BYTES: u32 = 1 << 20;

/// Anything that can map a device handle to its descriptor without an OS call.
pub trait DeviceLookup {
    fn lookup(&self, handle: DeviceHandle) -> Option<Arc<DeviceDescriptor>>;
}

/// What a refresh changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub generation: u64,
    /// Entries reported by `GetRawInputDeviceList`.
    pub listed: usize,
    /// Entries now in the map.
    pub kept: usize,
    /// Entries skipped because their kind is filtered out by config.
    pub filtered: usize,
    /// Entries whose queries failed (left out, resolve to nothing).
    pub failed: Vec<DeviceHandle>,
    /// Handles not present in the previous generation.
    pub added: Vec<DeviceHandle>,
    /// Handles present in the previous generation but not this one.
    pub removed: Vec<DeviceHandle>,
}

/// Single-owner registry.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceHandle, Arc<DeviceDescriptor>>,
    generation: u64,
    config: RegistryConfig,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Re-enumerate all attached devices and replace the map.
    ///
    /// On error the previous generation stays in place.
    pub fn refresh<S: DeviceSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<RefreshSummary, RegistryError> {
        let generation = self.generation + 1;
        let built = enumerate(source, &self.config, generation)?;
        Ok(self.install(built))
    }

    /// Pure lookup. `None` is a normal outcome.
    pub fn resolve(&self, handle: DeviceHandle) -> Option<Arc<DeviceDescriptor>> {
        self.devices.get(&handle).cloned()
    }

    /// Number of completed refreshes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Descriptors ordered by handle.
    pub fn descriptors(&self) -> Vec<Arc<DeviceDescriptor>> {
        let mut v: Vec<_> = self.devices.values().cloned().collect();
        v.sort_by_key(|d| d.handle);
        v
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            generation: self.generation,
            devices: self.descriptors().iter().map(|d| (**d).clone()).collect(),
        }
    }

    fn install(&mut self, built: Enumerated) -> RefreshSummary {
        let mut added: Vec<_> = built
            .devices
            .keys()
            .filter(|h| !self.devices.contains_key(h))
            .copied()
            .collect();
        let mut removed: Vec<_> = self
            .devices
            .keys()
            .filter(|h| !built.devices.contains_key(h))
            .copied()
            .collect();
        added.sort();
        removed.sort();

        self.devices = built.devices;
        self.generation = built.generation;

        let summary = RefreshSummary {
            generation: built.generation,
            listed: built.listed,
            kept: self.devices.len(),
            filtered: built.filtered,
            failed: built.failed,
            added,
            removed,
        };
        debug!(
            generation = summary.generation,
            listed = summary.listed,
            kept = summary.kept,
            failed = summary.failed.len(),
            added = summary.added.len(),
            removed = summary.removed.len(),
            "device registry refreshed"
        );
        summary
    }
}

impl DeviceLookup for DeviceRegistry {
    fn lookup(&self, handle: DeviceHandle) -> Option<Arc<DeviceDescriptor>> {
        self.resolve(handle)
    }
}

/// A registry that can be refreshed from one thread while others resolve.
///
/// The new map is built without holding the lock and swapped in under the
/// write lock, so `resolve` only ever sees a complete generation.
/// Concurrent refreshes are serialized.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<DeviceRegistry>>,
    refreshing: Arc<Mutex<()>>,
}

impl SharedRegistry {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
            refreshing: Arc::new(Mutex::new(())),
        }
    }

    pub fn refresh<S: DeviceSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<RefreshSummary, RegistryError> {
        let _serial = self.refreshing.lock();
        let (config, generation) = {
            let r = self.inner.read();
            (r.config.clone(), r.generation + 1)
        };
        let built = enumerate(source, &config, generation)?;
        Ok(self.inner.write().install(built))
    }

    pub fn resolve(&self, handle: DeviceHandle) -> Option<Arc<DeviceDescriptor>> {
        self.inner.read().resolve(handle)
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.read().snapshot()
    }
}

impl DeviceLookup for SharedRegistry {
    fn lookup(&self, handle: DeviceHandle) -> Option<Arc<DeviceDescriptor>> {
        self.resolve(handle)
    }
}

struct Enumerated {
    devices: HashMap<DeviceHandle, Arc<DeviceDescriptor>>,
    generation: u64,
    listed: usize,
    filtered: usize,
    failed: Vec<DeviceHandle>,
}

fn enumerate<S: DeviceSource + ?Sized>(
    source: &S,
    config: &RegistryConfig,
    generation: u64,
) -> Result<Enumerated, RegistryError> {
    let entries = list_devices(source)?;
    let mut out = Enumerated {
        devices: HashMap::with_capacity(entries.len()),
        generation,
        listed: entries.len(),
        filtered: 0,
        failed: Vec::new(),
    };

    for entry in entries {
        let Some(kind) = DeviceKind::from_raw(entry.kind) else {
            trace!(handle = %entry.handle, kind = entry.kind, "skipping device of unknown type");
            out.filtered += 1;
            continue;
        };
        if !config.keeps(kind) {
            out.filtered += 1;
            continue;
        }
        match describe(source, entry.handle, kind, generation) {
            Ok(desc) => {
                out.devices.insert(entry.handle, Arc::new(desc));
            }
            Err(e) => {
                debug!("{}", e);
                out.failed.push(entry.handle);
            }
        }
    }
    Ok(out)
}

/// `GetRawInputDeviceList`, count then fill, retrying once if the list grew.
fn list_devices<S: DeviceSource + ?Sized>(
    source: &S,
) -> Result<Vec<DeviceListEntry>, RegistryError> {
    let first = source.device_count().map_err(RegistryError::Enumerate)?;
    let mut count = first;
    for _attempt in 0..2 {
        let mut out = vec![DeviceListEntry::default(); count as usize];
        match source.device_list(&mut out).map_err(RegistryError::Enumerate)? {
            Fill::Written(n) if n <= count => {
                out.truncate(n as usize);
                return Ok(out);
            }
            Fill::Written(n) | Fill::TooSmall(n) => {
                trace!(expected = count, actual = n, "device list changed, retrying");
                count = n;
            }
        }
    }
    Err(RegistryError::ListUnstable {
        expected: first,
        actual: count,
    })
}

fn describe<S: DeviceSource + ?Sized>(
    source: &S,
    handle: DeviceHandle,
    kind: DeviceKind,
    generation: u64,
) -> Result<DeviceDescriptor, RegistryError> {
    let query_err = |source_err: OsError| RegistryError::DeviceQuery {
        handle,
        source: source_err,
    };

    let name_bytes = query_two_phase(source, handle, InfoQuery::Name).map_err(query_err)?;
    let name = decode_wide(&name_bytes);

    let capability_blob = query_two_phase(source, handle, InfoQuery::Info).map_err(query_err)?;
    let info = DeviceInfo::parse(&capability_blob);

    let preparsed_len = if kind == DeviceKind::Hid {
        match query_two_phase(source, handle, InfoQuery::PreparsedData) {
            Ok(blob) => Some(blob.len() as u32),
            Err(e) => {
                trace!(%handle, error = %e, "no preparsed data");
                None
            }
        }
    } else {
        None
    };

    let display_name = source
        .product_name(handle, &name)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| display_name_from_path(kind, &name));

    Ok(DeviceDescriptor {
        handle,
        kind,
        name,
        display_name,
        info,
        capability_blob,
        preparsed_len,
        generation,
    })
}

/// Size query then fill, retried once on a size change.
fn query_two_phase<S: DeviceSource + ?Sized>(
    source: &S,
    handle: DeviceHandle,
    query: InfoQuery,
) -> Result<Vec<u8>, OsError> {
    for attempt in 0..2 {
        let size = source.device_info_size(handle, query)?;
        if size > MAX_QUERY_BYTES {
            return Err(OsError::INSUFFICIENT_BUFFER);
        }
        let mut buf = vec![0u8; size as usize];
        match source.device_info(handle, query, &mut buf)? {
            Fill::Written(n) if n == size => return Ok(buf),
            Fill::Written(n) | Fill::TooSmall(n) => {
                trace!(%handle, ?query, attempt, expected = size, actual = n, "device info size changed");
            }
        }
    }
    Err(OsError::INSUFFICIENT_BUFFER)
}

/// UTF-16LE bytes to a `String`, dropping trailing NULs.
fn decode_wide(bytes: &[u8]) -> String {
    let mut wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    while wide.last() == Some(&0) {
        wide.pop();
    }
    String::from_utf16_lossy(&wide)
}
