//! Product strings from `hidapi`, keyed by device interface path.
//!
//! Raw Input and `hidapi` report the same interface path for a HID top-level
//! collection, except that Raw Input mice/keyboards carry their own class
//! GUID suffix. Paths are compared case-insensitively with the trailing
//! `#{guid}` stripped.
//!
//! The `hidapi` device list is rebuilt lazily after [`ProductNames::mark_stale`],
//! which the source calls at the start of every registry refresh.

#![cfg(all(feature = "hid", target_os = "windows"))]

use hidapi::HidApi;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Default)]
struct Cache {
    api: Option<HidApi>,
    names: HashMap<String, String>,
    stale: bool,
}

pub(crate) struct ProductNames {
    cache: Mutex<Cache>,
}

impl ProductNames {
    pub(crate) fn new() -> Self {
        Self {
            cache: Mutex::new(Cache {
                stale: true,
                ..Cache::default()
            }),
        }
    }

    pub(crate) fn mark_stale(&self) {
        self.cache.lock().stale = true;
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<String> {
        let mut cache = self.cache.lock();
        if cache.stale {
            rebuild(&mut cache);
        }
        cache.names.get(&interface_key(path)).cloned()
    }
}

fn rebuild(cache: &mut Cache) {
    cache.stale = false;
    cache.names.clear();

    if cache.api.is_none() {
        match HidApi::new() {
            Ok(api) => cache.api = Some(api),
            Err(e) => {
                debug!(error = %e, "hidapi unavailable, using path-derived names");
                return;
            }
        }
    } else if let Some(api) = cache.api.as_mut() {
        if let Err(e) = api.refresh_devices() {
            debug!(error = %e, "hidapi refresh failed");
        }
    }

    let Some(api) = cache.api.as_ref() else {
        return;
    };
    let mut names = HashMap::new();
    for info in api.device_list() {
        let Some(product) = info.product_string().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let path = info.path().to_string_lossy();
        names.insert(interface_key(&path), product.to_string());
    }
    trace!(count = names.len(), "hidapi product names loaded");
    cache.names = names;
}

fn interface_key(path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    match lower.rfind("#{") {
        Some(i) => lower[..i].to_string(),
        None => lower,
    }
}
