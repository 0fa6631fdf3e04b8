#![forbid(unsafe_code)]

//! Shared handler registry with synchronous, in-order dispatch.
//!
//! # Design
//!
//! [`Bus<E, P>`] keeps a map from event identifier to an ordered list of
//! [`Handler`]s in shared, reference-counted storage (`Rc<RefCell<..>>`).
//! Cloning a bus yields another handle to the same registry.
//!
//! # Performance
//!
//! | Operation       | Complexity                     |
//! |-----------------|--------------------------------|
//! | `subscribe()`   | O(1) amortized                 |
//! | `unsubscribe()` | O(H) where H = handlers/event  |
//! | `publish()`     | O(H) (snapshot + calls)        |
//!
//! # Dispatch and reentrancy
//!
//! `publish()` clones the handler list for the event, releases its borrow
//! and only then invokes the handlers, in registration order. Consequences:
//!
//! - Handlers may subscribe, unsubscribe or publish from inside a callback
//!   without tripping `RefCell` borrow rules.
//! - A handler removed while a publish is in flight is still called in that
//!   round if it was part of the snapshot. A handler added during the round
//!   is not called until the next publish.
//! - A nested publish sees the registry as mutated so far.
//!
//! # Failure Modes
//!
//! - **Panicking handler**: the bus does not isolate handlers. A panic
//!   unwinds out of `publish()` and the handlers after it receive nothing
//!   for that call. No borrow is held during dispatch, so the bus remains
//!   fully usable after the unwind is caught.
//! - **Handler leak**: handlers that are never unsubscribed accumulate. A
//!   `warn` is logged once per event when its handler count crosses
//!   [`BusConfig::leak_warn_threshold`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::EventId;
use crate::config::BusConfig;
use crate::error::BusError;
use crate::handler::Handler;

/// Shared interior for [`Bus<E, P>`].
struct BusInner<E, P> {
    config: BusConfig,
    handlers: HashMap<E, Vec<Handler<P>>>,
    /// Events that already triggered a leak warning.
    warned: HashSet<E>,
}

/// A single-threaded publish/subscribe registry.
///
/// # Invariants
///
/// 1. Handlers for one event are invoked in registration order.
/// 2. An event with no handlers has no entry in the registry.
/// 3. No borrow of the registry is held while a handler runs.
pub struct Bus<E, P> {
    inner: Rc<RefCell<BusInner<E, P>>>,
}

// Manual Clone: shares the same Rc.
impl<E, P> Clone for Bus<E, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: fmt::Debug, P> fmt::Debug for Bus<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let counts: Vec<(&E, usize)> = inner
            .handlers
            .iter()
            .map(|(event, list)| (event, list.len()))
            .collect();
        f.debug_struct("Bus")
            .field("config", &inner.config)
            .field("handlers", &counts)
            .finish()
    }
}

impl<E: EventId, P: 'static> Default for Bus<E, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EventId, P: 'static> Bus<E, P> {
    /// Create an empty bus with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create an empty bus with the given configuration.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                config,
                handlers: HashMap::new(),
                warned: HashSet::new(),
            })),
        }
    }

    /// Configuration this bus was created with.
    #[must_use]
    pub fn config(&self) -> BusConfig {
        self.inner.borrow().config
    }

    /// Append `handler` to the list for `event`.
    ///
    /// The bus does not suppress duplicates: subscribing the same handler
    /// twice makes it run twice per publish. Owners that need idempotent
    /// registration go through a ledger.
    pub fn subscribe(&self, event: E, handler: Handler<P>) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let threshold = inner.config.leak_warn_threshold;
        let list = inner.handlers.entry(event.clone()).or_default();
        list.push(handler);
        let count = list.len();
        if threshold > 0 && count > threshold && inner.warned.insert(event.clone()) {
            warn!(
                event = ?event,
                count,
                threshold,
                "handler count above threshold; possible subscription leak"
            );
        }
    }

    /// Remove the first registration of `handler` for `event`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NotSubscribed`] if the handler is not registered
    /// for the event. The registry is unchanged in that case.
    pub fn unsubscribe(&self, event: &E, handler: &Handler<P>) -> Result<(), BusError> {
        let removed = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let Some(list) = inner.handlers.get_mut(event) else {
                return Err(BusError::not_subscribed(event, handler.id()));
            };
            let Some(pos) = list.iter().position(|h| h.same(handler)) else {
                return Err(BusError::not_subscribed(event, handler.id()));
            };
            let removed = list.remove(pos);
            if list.is_empty() {
                inner.handlers.remove(event);
                inner.warned.remove(event);
            }
            removed
        };
        // Released after the borrow ends: the callback's captures may touch the bus.
        drop(removed);
        Ok(())
    }

    /// Remove every handler registered for `event`, returning how many
    /// registrations were dropped.
    pub fn unsubscribe_all(&self, event: &E) -> usize {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.warned.remove(event);
            inner.handlers.remove(event)
        };
        removed.map_or(0, |list| list.len())
    }

    /// Invoke every handler registered for `event`, in registration order.
    ///
    /// `payload` is passed through unchanged; `None` is the explicit
    /// absent-value marker. Publishing an event nobody listens to is a
    /// no-op.
    ///
    /// # Panics
    ///
    /// Propagates any panic raised by a handler. Handlers registered after
    /// the panicking one are not invoked for this call.
    pub fn publish(&self, event: &E, payload: Option<&P>) {
        let inner = self.inner.borrow();
        let Some(list) = inner.handlers.get(event) else {
            return;
        };
        let snapshot = list.clone();
        let trace_dispatch = inner.config.trace_dispatch;
        drop(inner);

        if trace_dispatch {
            trace!(
                event = ?event,
                handlers = snapshot.len(),
                has_payload = payload.is_some(),
                "dispatch"
            );
        }

        for handler in &snapshot {
            handler.call(payload);
        }
    }

    /// Number of registrations for `event`.
    #[must_use]
    pub fn handler_count(&self, event: &E) -> usize {
        self.inner.borrow().handlers.get(event).map_or(0, Vec::len)
    }

    /// Whether `handler` is registered for `event`.
    #[must_use]
    pub fn is_subscribed(&self, event: &E, handler: &Handler<P>) -> bool {
        self.inner
            .borrow()
            .handlers
            .get(event)
            .is_some_and(|list| list.iter().any(|h| h.same(handler)))
    }

    /// Number of events with at least one handler.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    /// Whether no handlers are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().handlers.is_empty()
    }

    /// Whether `other` is a handle to the same registry.
    #[must_use]
    pub fn same_bus(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn counter() -> (Rc<Cell<u32>>, Handler<u32>) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let handler = Handler::new(move |_| count_clone.set(count_clone.get() + 1));
        (count, handler)
    }

    #[test]
    fn publish_reaches_subscribers() {
        let bus = Bus::<&str, u32>::new();
        let last = Rc::new(Cell::new(None));
        let last_clone = Rc::clone(&last);
        bus.subscribe("x", Handler::new(move |p| last_clone.set(p.copied())));

        bus.publish(&"x", Some(&5));
        assert_eq!(last.get(), Some(5));

        bus.publish(&"x", None);
        assert_eq!(last.get(), None);
    }

    #[test]
    fn publish_without_handlers_is_noop() {
        let bus = Bus::<&str, u32>::new();
        bus.publish(&"nobody", Some(&1));
        assert!(bus.is_empty());
    }

    #[test]
    fn other_events_not_notified() {
        let bus = Bus::<&str, u32>::new();
        let (count, h) = counter();
        bus.subscribe("a", h);
        bus.publish(&"b", Some(&1));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let bus = Bus::<&str, ()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ['A', 'B', 'C'] {
            let log = Rc::clone(&log);
            bus.subscribe("x", Handler::new(move |_| log.borrow_mut().push(tag)));
        }

        bus.publish(&"x", None);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn duplicates_run_twice_at_bus_level() {
        let bus = Bus::<&str, u32>::new();
        let (count, h) = counter();
        bus.subscribe("x", h.clone());
        bus.subscribe("x", h.clone());
        bus.publish(&"x", None);
        assert_eq!(count.get(), 2);

        bus.unsubscribe(&"x", &h).unwrap();
        bus.publish(&"x", None);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn unsubscribe_absent_reports_not_subscribed() {
        let bus = Bus::<&str, u32>::new();
        let (_, h) = counter();
        let err = bus.unsubscribe(&"x", &h).unwrap_err();
        assert!(matches!(err, BusError::NotSubscribed { .. }));

        bus.subscribe("x", Handler::new(|_| {}));
        assert!(bus.unsubscribe(&"x", &h).is_err());
        assert_eq!(bus.handler_count(&"x"), 1);
    }

    #[test]
    fn empty_event_lists_are_dropped() {
        let bus = Bus::<&str, u32>::new();
        let (_, h) = counter();
        bus.subscribe("x", h.clone());
        assert_eq!(bus.event_count(), 1);
        bus.unsubscribe(&"x", &h).unwrap();
        assert_eq!(bus.event_count(), 0);
        assert!(bus.is_empty());
    }

    #[test]
    fn unsubscribe_all_clears_one_event() {
        let bus = Bus::<&str, u32>::new();
        bus.subscribe("x", Handler::new(|_| {}));
        bus.subscribe("x", Handler::new(|_| {}));
        bus.subscribe("y", Handler::new(|_| {}));
        assert_eq!(bus.unsubscribe_all(&"x"), 2);
        assert_eq!(bus.unsubscribe_all(&"x"), 0);
        assert_eq!(bus.handler_count(&"y"), 1);
    }

    #[test]
    fn clone_shares_registry() {
        let bus = Bus::<&str, u32>::new();
        let other = bus.clone();
        let (count, h) = counter();
        bus.subscribe("x", h.clone());

        other.publish(&"x", None);
        assert_eq!(count.get(), 1);
        assert!(other.is_subscribed(&"x", &h));
        assert!(bus.same_bus(&other));
        assert!(!bus.same_bus(&Bus::new()));
    }

    #[test]
    fn handler_removed_mid_dispatch_still_runs_this_round() {
        let bus = Bus::<&str, ()>::new();
        let (count, second) = counter_unit();

        let bus_clone = bus.clone();
        let second_clone = second.clone();
        bus.subscribe(
            "x",
            Handler::new(move |_| {
                let _ = bus_clone.unsubscribe(&"x", &second_clone);
            }),
        );
        bus.subscribe("x", second.clone());

        bus.publish(&"x", None);
        assert_eq!(count.get(), 1);
        assert!(!bus.is_subscribed(&"x", &second));

        bus.publish(&"x", None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_added_mid_dispatch_waits_for_next_round() {
        let bus = Bus::<&str, ()>::new();
        let (count, late) = counter_unit();

        let bus_clone = bus.clone();
        let added = Cell::new(false);
        bus.subscribe(
            "x",
            Handler::new(move |_| {
                if !added.replace(true) {
                    bus_clone.subscribe("x", late.clone());
                }
            }),
        );

        bus.publish(&"x", None);
        assert_eq!(count.get(), 0);
        bus.publish(&"x", None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn nested_publish_is_allowed() {
        let bus = Bus::<&str, u32>::new();
        let (count, h) = counter();
        bus.subscribe("inner", h);

        let bus_clone = bus.clone();
        bus.subscribe(
            "outer",
            Handler::new(move |p| bus_clone.publish(&"inner", p)),
        );

        bus.publish(&"outer", Some(&3));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn panicking_handler_stops_later_handlers_and_propagates() {
        let bus = Bus::<&str, ()>::new();
        let (before, first) = counter_unit();
        let (after, last) = counter_unit();
        bus.subscribe("x", first);
        bus.subscribe("x", Handler::new(|_| panic!("handler failure")));
        bus.subscribe("x", last);

        let result = catch_unwind(AssertUnwindSafe(|| bus.publish(&"x", None)));
        assert!(result.is_err());
        assert_eq!(before.get(), 1);
        assert_eq!(after.get(), 0);

        // Registry is still usable after the unwind.
        assert_eq!(bus.handler_count(&"x"), 3);
        bus.subscribe("y", Handler::new(|_| {}));
        assert_eq!(bus.event_count(), 2);
    }

    #[test]
    fn leak_warning_does_not_change_dispatch() {
        let bus = Bus::<&str, u32>::with_config(BusConfig::default().with_leak_warn_threshold(1));
        let (count, h) = counter();
        bus.subscribe("x", h.clone());
        bus.subscribe("x", h.clone());
        bus.subscribe("x", h);
        bus.publish(&"x", None);
        assert_eq!(count.get(), 3);
        assert_eq!(bus.config().leak_warn_threshold, 1);
    }

    #[test]
    fn debug_format() {
        let bus = Bus::<&str, u32>::new();
        bus.subscribe("x", Handler::new(|_| {}));
        let dbg = format!("{bus:?}");
        assert!(dbg.contains("Bus"));
        assert!(dbg.contains("\"x\""));
    }

    fn counter_unit() -> (Rc<Cell<u32>>, Handler<()>) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let handler = Handler::new(move |_| count_clone.set(count_clone.get() + 1));
        (count, handler)
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever subset is unsubscribed, survivors keep their
            /// relative registration order.
            #[test]
            fn survivors_keep_registration_order(removals in proptest::collection::vec(any::<bool>(), 1..24)) {
                let bus = Bus::<u8, ()>::new();
                let log = Rc::new(RefCell::new(Vec::new()));
                let handlers: Vec<Handler<()>> = (0..removals.len())
                    .map(|i| {
                        let log = Rc::clone(&log);
                        Handler::new(move |_| log.borrow_mut().push(i))
                    })
                    .collect();
                for h in &handlers {
                    bus.subscribe(0, h.clone());
                }
                for (h, remove) in handlers.iter().zip(&removals) {
                    if *remove {
                        prop_assert!(bus.unsubscribe(&0, h).is_ok());
                    }
                }

                bus.publish(&0, None);

                let expected: Vec<usize> = removals
                    .iter()
                    .enumerate()
                    .filter(|(_, remove)| !**remove)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(log.borrow().clone(), expected);
            }
        }
    }
}
