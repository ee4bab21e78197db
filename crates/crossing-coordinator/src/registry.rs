//! Listener registration and event fan-out.
//!
//! Listeners are keyed by [`EventCategory`]. Dispatch snapshots the
//! registered set first, so a listener that unregisters itself (or
//! registers another) during a notification does not affect the
//! in-flight dispatch.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use crossing_types::{CrossingEvent, EventCategory};
use tracing::warn;

/// A registered event listener.
///
/// Held behind an [`Arc`] so a caller can keep a handle for targeted
/// removal via [`ListenerRegistry::off`].
pub type CrossingListener = Arc<dyn Fn(&CrossingEvent) + Send + Sync>;

#[derive(Default)]
struct Sets {
    coordination: Vec<CrossingListener>,
    drag: Vec<CrossingListener>,
}

impl Sets {
    fn category(&self, category: EventCategory) -> &Vec<CrossingListener> {
        match category {
            EventCategory::Coordination => &self.coordination,
            EventCategory::Drag => &self.drag,
        }
    }

    fn category_mut(&mut self, category: EventCategory) -> &mut Vec<CrossingListener> {
        match category {
            EventCategory::Coordination => &mut self.coordination,
            EventCategory::Drag => &mut self.drag,
        }
    }
}

/// Per-category listener sets with snapshot-at-dispatch fan-out.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Mutex<Sets>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `category`. The same handle may be
    /// registered more than once; each registration is invoked.
    pub fn on(&self, category: EventCategory, listener: CrossingListener) {
        self.lock().category_mut(category).push(listener);
    }

    /// Remove `listener` from `category`, or every listener for the
    /// category when `listener` is `None`. Removing a handle that was
    /// never registered is a no-op.
    pub fn off(&self, category: EventCategory, listener: Option<&CrossingListener>) {
        let mut sets = self.lock();
        match listener {
            Some(target) => sets
                .category_mut(category)
                .retain(|l| !Arc::ptr_eq(l, target)),
            None => sets.category_mut(category).clear(),
        }
    }

    /// Number of registrations for `category`.
    pub fn listener_count(&self, category: EventCategory) -> usize {
        self.lock().category(category).len()
    }

    /// Notify every listener registered for the event's category, in
    /// registration order. A panicking listener is logged and skipped;
    /// the rest still run.
    pub(crate) fn emit(&self, event: &CrossingEvent) {
        let snapshot: Vec<CrossingListener> = self.lock().category(event.category()).clone();
        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(category = %event.category(), "event listener panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sets> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossing_types::{CoordinationMsg, CoordinationNotice, DragState};

    fn coordination_event() -> CrossingEvent {
        CrossingEvent::Coordination(CoordinationNotice::local(CoordinationMsg::Prepare))
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            registry.on(
                EventCategory::Coordination,
                Arc::new(move |_| order.lock().unwrap().push(tag)),
            );
        }

        registry.emit(&coordination_event());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_registration_fires_twice() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(Mutex::new(0));

        let hits_in = Arc::clone(&hits);
        let listener: CrossingListener = Arc::new(move |_| *hits_in.lock().unwrap() += 1);
        registry.on(EventCategory::Coordination, Arc::clone(&listener));
        registry.on(EventCategory::Coordination, Arc::clone(&listener));

        registry.emit(&coordination_event());
        assert_eq!(*hits.lock().unwrap(), 2);
    }

    #[test]
    fn off_removes_only_the_given_listener() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let hits_a = Arc::clone(&hits);
        let a: CrossingListener = Arc::new(move |_| hits_a.lock().unwrap().push("a"));
        let hits_b = Arc::clone(&hits);
        let b: CrossingListener = Arc::new(move |_| hits_b.lock().unwrap().push("b"));

        registry.on(EventCategory::Drag, Arc::clone(&a));
        registry.on(EventCategory::Drag, Arc::clone(&b));
        registry.off(EventCategory::Drag, Some(&a));

        registry.emit(&CrossingEvent::Drag(DragState::Start));
        assert_eq!(*hits.lock().unwrap(), vec!["b"]);
        assert_eq!(registry.listener_count(EventCategory::Drag), 1);
    }

    #[test]
    fn off_none_clears_the_category() {
        let registry = ListenerRegistry::new();
        registry.on(EventCategory::Drag, Arc::new(|_| {}));
        registry.on(EventCategory::Drag, Arc::new(|_| {}));
        registry.on(EventCategory::Coordination, Arc::new(|_| {}));

        registry.off(EventCategory::Drag, None);

        assert_eq!(registry.listener_count(EventCategory::Drag), 0);
        assert_eq!(registry.listener_count(EventCategory::Coordination), 1);
    }

    #[test]
    fn off_unknown_listener_is_a_noop() {
        let registry = ListenerRegistry::new();
        registry.on(EventCategory::Coordination, Arc::new(|_| {}));

        let stranger: CrossingListener = Arc::new(|_| {});
        registry.off(EventCategory::Coordination, Some(&stranger));

        assert_eq!(registry.listener_count(EventCategory::Coordination), 1);
    }

    #[test]
    fn dispatch_uses_a_snapshot() {
        let registry = Arc::new(ListenerRegistry::new());
        let hits = Arc::new(Mutex::new(0));

        // Registers a second listener during dispatch; the new listener
        // must not observe the event that triggered its registration.
        let registry_in = Arc::clone(&registry);
        let hits_in = Arc::clone(&hits);
        registry.on(
            EventCategory::Coordination,
            Arc::new(move |_| {
                let hits_new = Arc::clone(&hits_in);
                registry_in.on(
                    EventCategory::Coordination,
                    Arc::new(move |_| *hits_new.lock().unwrap() += 1),
                );
            }),
        );

        registry.emit(&coordination_event());
        assert_eq!(*hits.lock().unwrap(), 0);

        registry.emit(&coordination_event());
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn panicking_listener_does_not_stop_fanout() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(Mutex::new(0));

        registry.on(EventCategory::Coordination, Arc::new(|_| panic!("boom")));
        let hits_in = Arc::clone(&hits);
        registry.on(
            EventCategory::Coordination,
            Arc::new(move |_| *hits_in.lock().unwrap() += 1),
        );

        registry.emit(&coordination_event());
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn reregister_after_off() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(Mutex::new(0));

        let hits_in = Arc::clone(&hits);
        let listener: CrossingListener = Arc::new(move |_| *hits_in.lock().unwrap() += 1);

        registry.on(EventCategory::Coordination, Arc::clone(&listener));
        registry.off(EventCategory::Coordination, Some(&listener));
        registry.on(EventCategory::Coordination, Arc::clone(&listener));

        registry.emit(&coordination_event());
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
