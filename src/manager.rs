use crate::batch::BatchReader;
use crate::config::Config;
use crate::decoder::Decoder;
use crate::device::RawInputToken;
use crate::error::{ConfigError, DecodeError, ManagerError, RegistryError};
use crate::event::DecodedInput;
use crate::eventbus::{EventFilter, DeviceTag, InputEventBus, InputListener};
use crate::message::RawInputMessage;
use crate::registry::{DeviceRegistry, RefreshSummary, SharedRegistry};
use crate::source::{DeviceSource, RawInputSource};
use tracing::{debug, warn};

/// Upper bound on `GetRawInputBuffer` rounds per drain, so a device that
/// floods the queue cannot pin the message loop.
const MAX_DRAIN_ROUNDS: usize = 64;

/// Running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub decoded: u64,
    pub failed: u64,
    pub unknown_device: u64,
    pub batches: u64,
    pub refreshes: u64,
}

/// Ties an OS source, the device registry, the decoders and the event bus
/// together. Drive it from the window procedure that receives `WM_INPUT`.
pub struct RawInputManager<S> {
    source: S,
    registry: SharedRegistry,
    decoder: Decoder,
    batch: BatchReader,
    bus: InputEventBus,
    stats: ManagerStats,
}

impl<S> RawInputManager<S>
where
    S: RawInputSource + DeviceSource,
{
    /// Build without enumerating devices. Every event resolves to
    /// `Unknown` until the first [`on_device_list_changed`](Self::on_device_list_changed).
    pub fn new(source: S, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            registry: SharedRegistry::new(DeviceRegistry::with_config(config.registry.clone())),
            decoder: Decoder::new(config.limits),
            batch: BatchReader::new(config.limits, &config.batch),
            bus: InputEventBus::new(),
            stats: ManagerStats::default(),
        })
    }

    /// Build and run the initial device enumeration.
    pub fn discover(source: S, config: &Config) -> Result<Self, ManagerError> {
        let mut manager = Self::new(source, config)?;
        manager.on_device_list_changed()?;
        Ok(manager)
    }

    /// One `WM_INPUT`: decode, dispatch, and hand the result back.
    pub fn on_raw_input(&mut self, token: RawInputToken) -> Result<DecodedInput, DecodeError> {
        let result = self.decoder.decode(&self.source, token, &self.registry);
        self.dispatch(&result);
        result
    }

    /// Arrival or removal: rebuild the registry.
    ///
    /// On failure the previous generation stays active.
    pub fn on_device_list_changed(&mut self) -> Result<RefreshSummary, RegistryError> {
        match self.registry.refresh(&self.source) {
            Ok(summary) => {
                self.stats.refreshes += 1;
                for handle in &summary.failed {
                    debug!(%handle, "device left out of registry");
                }
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "device registry refresh failed");
                Err(e)
            }
        }
    }

    /// Pull and dispatch everything pending in the buffered queue.
    ///
    /// Returns the number of records processed (decoded or failed).
    pub fn drain_buffered(&mut self) -> Result<usize, DecodeError> {
        let mut processed = 0;
        for _ in 0..MAX_DRAIN_ROUNDS {
            let batch = match self.batch.fetch_batch(&self.source) {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, "buffered raw input read failed");
                    self.stats.failed += 1;
                    self.bus.emit_error(&e);
                    return Err(e);
                }
            };
            if batch.is_empty() {
                break;
            }
            self.stats.batches += 1;
            for result in batch.decode_all(&self.decoder, &self.registry) {
                self.dispatch(&result);
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// Route a window message. Returns `false` for messages that are not
    /// raw input related.
    pub fn handle_message(&mut self, msg: u32, wparam: usize, lparam: isize) -> bool {
        match RawInputMessage::classify(msg, wparam, lparam) {
            Some(RawInputMessage::Input { token, .. }) => {
                // Errors are already logged and dispatched.
                let _ = self.on_raw_input(token);
                true
            }
            Some(m) if m.is_device_change() => {
                debug!(?m, "device change");
                let _ = self.on_device_list_changed();
                true
            }
            _ => false,
        }
    }

    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        tag: Option<DeviceTag>,
    ) -> u64 {
        self.bus.add_listener(listener, filter, tag)
    }

    fn dispatch(&mut self, result: &Result<DecodedInput, DecodeError>) {
        match result {
            Ok(input) => {
                self.stats.decoded += 1;
                if !input.identity.is_known() {
                    self.stats.unknown_device += 1;
                }
                self.bus.emit(input);
            }
            Err(e) => {
                self.stats.failed += 1;
                if e.is_transport() {
                    warn!(error = %e, "raw input fetch failed");
                } else {
                    debug!(error = %e, "dropping malformed raw input record");
                }
                self.bus.emit_error(e);
            }
        }
    }
}

impl<S> RawInputManager<S> {
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn bus_mut(&mut self) -> &mut InputEventBus {
        &mut self.bus
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }
}
