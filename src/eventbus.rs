use crate::device::DeviceHandle;
use crate::error::DecodeError;
use crate::event::{DecodedInput, InputEvent};
use std::collections::BTreeMap;

/// Trait for reacting to decoded raw input.
pub trait InputListener: Send {
    fn on_input(&mut self, input: &DecodedInput);

    /// Called for records that failed to decode. Ignored by default.
    fn on_decode_error(&mut self, _error: &DecodeError) {}
}

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    All,
    MouseOnly,
    KeyboardOnly,
    HidOnly,
    Custom(fn(&DecodedInput) -> bool),
}

impl EventFilter {
    pub fn matches(&self, input: &DecodedInput) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::MouseOnly => matches!(input.event, InputEvent::Mouse(_)),
            EventFilter::KeyboardOnly => matches!(input.event, InputEvent::Keyboard(_)),
            EventFilter::HidOnly => matches!(input.event, InputEvent::Hid(_)),
            EventFilter::Custom(f) => f(input),
        }
    }
}

/// Restricts a listener to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTag {
    Handle(DeviceHandle),
    /// Matches the resolved display name. Unknown devices never match.
    Name(String),
}

impl DeviceTag {
    fn matches(&self, input: &DecodedInput) -> bool {
        match self {
            DeviceTag::Handle(h) => input.device == *h,
            DeviceTag::Name(name) => input
                .identity
                .descriptor()
                .is_some_and(|d| d.display_name == *name),
        }
    }
}

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: Box<dyn InputListener>,
    enabled: bool,
    filter: EventFilter,
    tag: Option<DeviceTag>,
}

/// Fans decoded input out to listeners in registration order.
#[derive(Default)]
pub struct InputEventBus {
    next_id: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
}

impl InputEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with optional filtering and tag.
    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        tag: Option<DeviceTag>,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                tag,
            },
        );
        self.next_id += 1;
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely.
    pub fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one event to all active and matching listeners.
    pub fn emit(&mut self, input: &DecodedInput) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }
            if let Some(tag) = &entry.tag {
                if !tag.matches(input) {
                    continue;
                }
            }
            if entry.filter.matches(input) {
                entry.listener.on_input(input);
            }
        }
    }

    /// Reports a decode failure to every enabled listener.
    pub fn emit_error(&mut self, error: &DecodeError) {
        for entry in self.listeners.values_mut().filter(|e| e.enabled) {
            entry.listener.on_decode_error(error);
        }
    }
}
