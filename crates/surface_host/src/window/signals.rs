//! Surface signals
//!
//! A surface announces focus loss, capture loss and its own destruction to
//! whoever subscribed. Popups subscribe to their parent while they are live
//! and close themselves when the parent loses focus or capture.

use std::cell::{Cell, RefCell};
use std::rc::Weak;

use host_state::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSignal {
    CaptureLost,
    FocusLost,
    Destroyed,
}

pub trait SurfaceObserver {
    fn on_surface_signal(&self, source: SurfaceId, signal: SurfaceSignal);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct SignalHub {
    observers: RefCell<Vec<(SubscriptionId, Weak<dyn SurfaceObserver>)>>,
    next_id: Cell<u64>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Weak<dyn SurfaceObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers.borrow_mut().push((id, observer));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify live observers. Observers may subscribe or unsubscribe while
    /// being notified.
    pub fn emit(&self, source: SurfaceId, signal: SurfaceSignal) {
        let observers: Vec<_> = {
            let mut list = self.observers.borrow_mut();
            list.retain(|(_, observer)| observer.strong_count() > 0);
            list.iter().map(|(_, observer)| observer.clone()).collect()
        };
        for observer in observers.iter().filter_map(Weak::upgrade) {
            observer.on_surface_signal(source, signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Recorder {
        seen: RefCell<Vec<SurfaceSignal>>,
    }

    impl SurfaceObserver for Recorder {
        fn on_surface_signal(&self, _source: SurfaceId, signal: SurfaceSignal) {
            self.seen.borrow_mut().push(signal);
        }
    }

    #[test]
    fn test_emit_and_unsubscribe() {
        let hub = SignalHub::new();
        let recorder = Rc::new(Recorder {
            seen: RefCell::new(Vec::new()),
        });
        let weak: Weak<dyn SurfaceObserver> = Rc::downgrade(&recorder) as Weak<dyn SurfaceObserver>;
        let id = hub.subscribe(weak);

        hub.emit(SurfaceId(1), SurfaceSignal::FocusLost);
        hub.unsubscribe(id);
        hub.emit(SurfaceId(1), SurfaceSignal::CaptureLost);

        assert_eq!(*recorder.seen.borrow(), vec![SurfaceSignal::FocusLost]);
        assert!(hub.is_empty());
    }

    #[test]
    fn test_dead_observers_are_pruned() {
        let hub = SignalHub::new();
        let recorder = Rc::new(Recorder {
            seen: RefCell::new(Vec::new()),
        });
        hub.subscribe(Rc::downgrade(&recorder) as Weak<dyn SurfaceObserver>);
        drop(recorder);

        hub.emit(SurfaceId(1), SurfaceSignal::Destroyed);
        assert!(hub.is_empty());
    }
}
