use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::event::EventData;

/// A subscribed callback. Identity (the `Rc` allocation) is what `off` matches on.
pub type Listener = Rc<dyn Fn(&EventData) -> anyhow::Result<()>>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&EventData) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

#[derive(Clone)]
struct Subscription {
    listener: Listener,
    once: bool,
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Single-threaded publish/subscribe bus.
///
/// All methods take `&self` so the bus can be shared through an `Rc` and used
/// re-entrantly from inside listeners.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RefCell<HashMap<String, Vec<Subscription>>>,
    emitting: Cell<u32>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to `event`.
    pub fn on(&self, event: impl Into<String>, listener: Listener) {
        self.subscribe(event.into(), listener, false);
    }

    /// Subscribe `listener` for a single delivery.
    pub fn once(&self, event: impl Into<String>, listener: Listener) {
        self.subscribe(event.into(), listener, true);
    }

    fn subscribe(&self, event: String, listener: Listener, once: bool) {
        trace!(event = %event, once, "listener subscribed");
        self.subscriptions
            .borrow_mut()
            .entry(event)
            .or_default()
            .push(Subscription { listener, once });
    }

    /// Remove the first subscription of `listener` to `event`.
    ///
    /// Returns false when nothing matched.
    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let Some(list) = subscriptions.get_mut(event) else {
            return false;
        };
        let Some(index) = list
            .iter()
            .position(|s| same_listener(&s.listener, listener))
        else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            subscriptions.remove(event);
        }
        true
    }

    /// Deliver `data` to every listener currently subscribed to `event`.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, data: &EventData) -> usize {
        let delivery = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let Some(list) = subscriptions.get_mut(event) else {
                return 0;
            };
            let delivery = list.clone();
            list.retain(|s| !s.once);
            if list.is_empty() {
                subscriptions.remove(event);
            }
            delivery
        };

        self.emitting.set(self.emitting.get() + 1);
        for subscription in &delivery {
            if let Err(err) = (subscription.listener)(data) {
                warn!(event, error = %err, "event listener failed");
            }
        }
        self.emitting.set(self.emitting.get() - 1);
        delivery.len()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.subscriptions.borrow_mut().clear();
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.subscriptions
            .borrow()
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Whether an `emit` is currently running on this bus.
    pub fn is_emitting(&self) -> bool {
        self.emitting.get() > 0
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriptions = self.subscriptions.borrow();
        let mut events: Vec<(&String, usize)> =
            subscriptions.iter().map(|(k, v)| (k, v.len())).collect();
        events.sort();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}
