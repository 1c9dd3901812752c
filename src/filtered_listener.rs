use crate::error::DecodeError;
use crate::event::DecodedInput;
use crate::eventbus::InputListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
///
/// Decode errors are always forwarded.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&DecodedInput) -> bool + Send + Sync>,
    inner: Box<dyn InputListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&DecodedInput) -> bool + Send + Sync + 'static,
        inner: Box<dyn InputListener>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }
}

impl InputListener for FilteredListener {
    fn on_input(&mut self, input: &DecodedInput) {
        if (self.predicate)(input) {
            self.inner.on_input(input);
        }
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        self.inner.on_decode_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceHandle, DeviceIdentity};
    use crate::event::{InputEvent, InputOrigin, KeyboardEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Count(Arc<AtomicUsize>);

    impl InputListener for Count {
        fn on_input(&mut self, _: &DecodedInput) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn only_key_releases_pass() {
        let n = Arc::new(AtomicUsize::new(0));
        let mut l = FilteredListener::new(
            |i| matches!(&i.event, InputEvent::Keyboard(k) if k.is_break()),
            Box::new(Count(n.clone())),
        );
        let mut key = KeyboardEvent::default();
        let mut input = DecodedInput {
            device: DeviceHandle(1),
            identity: DeviceIdentity::Unknown,
            origin: InputOrigin::Foreground,
            event: InputEvent::Keyboard(key),
        };
        l.on_input(&input);
        key.flags = crate::event::KeyFlags::BREAK;
        input.event = InputEvent::Keyboard(key);
        l.on_input(&input);
        assert_eq!(n.load(Ordering::Relaxed), 1);
    }
}
