//! In-memory [`RawInputSource`] + [`DeviceSource`].
//!
//! Serves records and devices from memory and can be told to misbehave the
//! way `user32` occasionally does: failed size queries, fills that report a
//! different byte count, device lists that grow mid-enumeration and info
//! queries whose size changes between calls. Faults are one-shot unless a
//! count is given.
//!
//! Used by the tests and by `demos/devices.rs` on non-Windows hosts.

use crate::device::{DeviceHandle, DeviceKind, RawInputToken};
use crate::encode::encode_device_info;
use crate::error::OsError;
use crate::layout::{align_up, POINTER_ALIGN};
use crate::metadata::DeviceInfo;
use crate::source::{DeviceListEntry, DeviceSource, Fill, InfoQuery, RawInputSource};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// `ERROR_INVALID_PARAMETER`.
const INVALID_PARAMETER: OsError = OsError(87);

/// One simulated device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayDevice {
    pub handle: DeviceHandle,
    pub kind: DeviceKind,
    pub path: String,
    pub info: Vec<u8>,
    pub preparsed: Option<Vec<u8>>,
    pub product: Option<String>,
}

impl ReplayDevice {
    pub fn mouse(handle: DeviceHandle, path: &str) -> Self {
        Self::new(
            handle,
            DeviceKind::Mouse,
            path,
            &DeviceInfo::Mouse {
                id: 256,
                buttons: 5,
                sample_rate: 0,
                has_horizontal_wheel: true,
            },
        )
    }

    pub fn keyboard(handle: DeviceHandle, path: &str) -> Self {
        Self::new(
            handle,
            DeviceKind::Keyboard,
            path,
            &DeviceInfo::Keyboard {
                kind: 81,
                subtype: 0,
                mode: 1,
                function_keys: 12,
                indicators: 3,
                keys_total: 101,
            },
        )
    }

    /// A HID collection with the given `(vid, pid)` and `(usage_page, usage)`.
    pub fn hid(handle: DeviceHandle, path: &str, ids: (u16, u16), usage: (u16, u16)) -> Self {
        let mut dev = Self::new(
            handle,
            DeviceKind::Hid,
            path,
            &DeviceInfo::Hid {
                vendor_id: u32::from(ids.0),
                product_id: u32::from(ids.1),
                version: 0x0100,
                usage_page: usage.0,
                usage: usage.1,
            },
        );
        let mut blob = b"HidP KDR".to_vec();
        blob.resize(96, 0);
        dev.preparsed = Some(blob);
        dev
    }

    pub fn new(handle: DeviceHandle, kind: DeviceKind, path: &str, info: &DeviceInfo) -> Self {
        Self {
            handle,
            kind,
            path: path.to_owned(),
            info: encode_device_info(info),
            preparsed: None,
            product: None,
        }
    }

    /// Friendly name returned from [`DeviceSource::product_name`].
    pub fn with_product(mut self, product: &str) -> Self {
        self.product = Some(product.to_owned());
        self
    }

    fn query_bytes(&self, query: InfoQuery) -> Option<Vec<u8>> {
        match query {
            InfoQuery::Name => Some(
                self.path
                    .encode_utf16()
                    .chain(std::iter::once(0))
                    .flat_map(u16::to_le_bytes)
                    .collect(),
            ),
            InfoQuery::Info => Some(self.info.clone()),
            InfoQuery::PreparsedData => self.preparsed.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<isize, Vec<u8>>,
    buffered: VecDeque<Vec<u8>>,
    devices: Vec<ReplayDevice>,

    size_query_fault: Option<OsError>,
    fetch_fault: Option<OsError>,
    misreported_fetch: Option<u32>,
    buffer_fault: Option<OsError>,
    list_fault: Option<OsError>,
    list_growth: u32,
    unstable_info: HashMap<DeviceHandle, u32>,
}

/// Scriptable stand-in for `user32`.
#[derive(Debug, Default)]
pub struct ReplaySource {
    state: Mutex<State>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `record` available behind `token` for [`RawInputSource::read_input`].
    pub fn push_record(&self, token: RawInputToken, record: Vec<u8>) {
        self.state.lock().records.insert(token.0, record);
    }

    /// Queue `record` for the next buffered read.
    pub fn queue_record(&self, record: Vec<u8>) {
        self.state.lock().buffered.push_back(record);
    }

    /// Records still waiting for a buffered read.
    pub fn pending(&self) -> usize {
        self.state.lock().buffered.len()
    }

    /// Attach a device, replacing any device with the same handle.
    pub fn attach(&self, device: ReplayDevice) {
        let mut st = self.state.lock();
        st.devices.retain(|d| d.handle != device.handle);
        st.devices.push(device);
    }

    pub fn detach(&self, handle: DeviceHandle) {
        self.state.lock().devices.retain(|d| d.handle != handle);
    }

    /// The next size query fails with `err`.
    pub fn fail_size_query(&self, err: OsError) {
        self.state.lock().size_query_fault = Some(err);
    }

    /// The next fill fails with `err`.
    pub fn fail_fetch(&self, err: OsError) {
        self.state.lock().fetch_fault = Some(err);
    }

    /// The next fill copies the record but reports `written` bytes.
    pub fn misreport_fetch(&self, written: u32) {
        self.state.lock().misreported_fetch = Some(written);
    }

    /// The next buffered read fails with `err`.
    pub fn fail_buffer_read(&self, err: OsError) {
        self.state.lock().buffer_fault = Some(err);
    }

    /// The next device count query fails with `err`.
    pub fn fail_device_list(&self, err: OsError) {
        self.state.lock().list_fault = Some(err);
    }

    /// The next `times` list fills report that one more device appeared.
    pub fn grow_list(&self, times: u32) {
        self.state.lock().list_growth = times;
    }

    /// The next `times` info fills for `handle` report a larger size than
    /// the preceding size query.
    pub fn destabilize_info(&self, handle: DeviceHandle, times: u32) {
        self.state.lock().unstable_info.insert(handle, times);
    }
}

impl RawInputSource for ReplaySource {
    fn input_size(&self, token: RawInputToken) -> Result<u32, OsError> {
        let mut st = self.state.lock();
        if let Some(err) = st.size_query_fault.take() {
            return Err(err);
        }
        st.records
            .get(&token.0)
            .map(|r| r.len() as u32)
            .ok_or(OsError::INVALID_HANDLE)
    }

    fn read_input(&self, token: RawInputToken, buf: &mut [u8]) -> Result<u32, OsError> {
        let mut st = self.state.lock();
        if let Some(err) = st.fetch_fault.take() {
            return Err(err);
        }
        let misreport = st.misreported_fetch.take();
        let record = st.records.get(&token.0).ok_or(OsError::INVALID_HANDLE)?;
        if buf.len() < record.len() {
            return Err(OsError::INSUFFICIENT_BUFFER);
        }
        buf[..record.len()].copy_from_slice(record);
        Ok(misreport.unwrap_or(record.len() as u32))
    }

    fn buffer_size(&self) -> Result<u32, OsError> {
        let mut st = self.state.lock();
        if let Some(err) = st.size_query_fault.take() {
            return Err(err);
        }
        Ok(st.buffered.front().map_or(0, |r| r.len() as u32))
    }

    fn read_buffer(&self, buf: &mut [u8]) -> Result<u32, OsError> {
        let mut st = self.state.lock();
        if let Some(err) = st.buffer_fault.take() {
            return Err(err);
        }
        let mut offset = 0usize;
        let mut count = 0u32;
        while let Some(rec) = st.buffered.front() {
            let end = offset + rec.len();
            if end > buf.len() {
                break;
            }
            buf[offset..end].copy_from_slice(rec);
            st.buffered.pop_front();
            count += 1;
            match align_up(end, POINTER_ALIGN) {
                Some(next) => offset = next,
                None => break,
            }
        }
        if count == 0 && !st.buffered.is_empty() {
            return Err(OsError::INSUFFICIENT_BUFFER);
        }
        Ok(count)
    }
}

impl DeviceSource for ReplaySource {
    fn device_count(&self) -> Result<u32, OsError> {
        let mut st = self.state.lock();
        if let Some(err) = st.list_fault.take() {
            return Err(err);
        }
        Ok(st.devices.len() as u32)
    }

    fn device_list(&self, out: &mut [DeviceListEntry]) -> Result<Fill, OsError> {
        let mut st = self.state.lock();
        let mut needed = st.devices.len();
        if st.list_growth > 0 {
            st.list_growth -= 1;
            needed = out.len().max(needed) + 1;
        }
        if out.len() < needed {
            return Ok(Fill::TooSmall(needed as u32));
        }
        for (slot, dev) in out.iter_mut().zip(&st.devices) {
            *slot = DeviceListEntry {
                handle: dev.handle,
                kind: dev.kind.as_raw(),
            };
        }
        Ok(Fill::Written(st.devices.len() as u32))
    }

    fn device_info_size(&self, handle: DeviceHandle, query: InfoQuery) -> Result<u32, OsError> {
        let st = self.state.lock();
        let dev = st
            .devices
            .iter()
            .find(|d| d.handle == handle)
            .ok_or(OsError::INVALID_HANDLE)?;
        dev.query_bytes(query)
            .map(|b| b.len() as u32)
            .ok_or(INVALID_PARAMETER)
    }

    fn device_info(
        &self,
        handle: DeviceHandle,
        query: InfoQuery,
        buf: &mut [u8],
    ) -> Result<Fill, OsError> {
        let mut st = self.state.lock();
        let bytes = st
            .devices
            .iter()
            .find(|d| d.handle == handle)
            .ok_or(OsError::INVALID_HANDLE)?
            .query_bytes(query)
            .ok_or(INVALID_PARAMETER)?;

        if let Some(left) = st.unstable_info.get_mut(&handle) {
            if *left > 0 {
                *left -= 1;
                return Ok(Fill::TooSmall(bytes.len() as u32 + 2));
            }
        }
        if buf.len() < bytes.len() {
            return Ok(Fill::TooSmall(bytes.len() as u32));
        }
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(Fill::Written(bytes.len() as u32))
    }

    fn product_name(&self, handle: DeviceHandle, _path: &str) -> Option<String> {
        self.state
            .lock()
            .devices
            .iter()
            .find(|d| d.handle == handle)
            .and_then(|d| d.product.clone())
    }
}
