#![forbid(unsafe_code)]

//! Per-owner registration ledger.
//!
//! # Design
//!
//! A [`Ledger`] is a secondary index over a [`Bus`]: the bus decides who
//! gets called, the ledger only remembers which `(event, handler)` pairs
//! its owner is responsible for removing. Every accepted operation is
//! mirrored onto the bus immediately.
//!
//! # Invariants
//!
//! 1. No two entries share both event (by equality) and handler (by
//!    identity).
//! 2. Removal keeps the relative order of the entries it does not match.
//! 3. Every removed entry is unsubscribed with its own stored event and
//!    handler, once.
//! 4. Dropping the ledger disposes it; afterwards none of its handlers
//!    remain on the bus through this ledger.
//!
//! # Failure Modes
//!
//! - **Entry already gone from the bus** (removed through the bus
//!   directly, or via `unsubscribe_all`): removal and disposal ignore the
//!   `NotSubscribed` error and carry on with the remaining entries.

use std::fmt;
use std::mem;

use scopebus_core::{Bus, EventId, Handler};
use tracing::{debug, trace};

use crate::filter::Match;
use crate::shared::shared;

struct Registration<E, P> {
    event: E,
    handler: Handler<P>,
}

/// The set of handlers one owner has registered on a bus.
///
/// Mutation takes `&mut self`: a ledger has a single writer, its owner.
#[must_use = "dropping a Ledger unregisters everything it tracks"]
pub struct Ledger<E: EventId, P: 'static> {
    bus: Bus<E, P>,
    entries: Vec<Registration<E, P>>,
}

impl<E: EventId, P: 'static> fmt::Debug for Ledger<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|r| (&r.event, r.handler.id())))
            .finish()
    }
}

impl<E: EventId, P: 'static> Ledger<E, P> {
    /// Create an empty ledger over `bus`.
    pub fn new(bus: Bus<E, P>) -> Self {
        Self {
            bus,
            entries: Vec::new(),
        }
    }

    /// Create an empty ledger over this thread's shared bus for `(E, P)`.
    pub fn shared() -> Self {
        Self::new(shared())
    }

    /// The bus this ledger mirrors onto.
    #[must_use]
    pub fn bus(&self) -> &Bus<E, P> {
        &self.bus
    }

    /// Register `handler` for `event`.
    ///
    /// Registering a pair this ledger already tracks does nothing, so at
    /// most one bus subscription is added per call.
    pub fn register(&mut self, event: E, handler: &Handler<P>) {
        if self.contains(&event, handler) {
            trace!(event = ?event, handler = %handler.id(), "duplicate registration ignored");
            return;
        }
        self.bus.subscribe(event.clone(), handler.clone());
        self.entries.push(Registration {
            event,
            handler: handler.clone(),
        });
    }

    /// Remove every entry matched by both filters and unsubscribe it from
    /// the bus. Returns the number of entries removed.
    ///
    /// | `event`   | `handler` | removes                          |
    /// |-----------|-----------|----------------------------------|
    /// | `Any`     | `Any`     | everything                       |
    /// | `Only(e)` | `Any`     | every handler for `e`            |
    /// | `Any`     | `Only(h)` | `h` for every event              |
    /// | `Only(e)` | `Only(h)` | the exact pair                   |
    ///
    /// Matching nothing is a no-op.
    pub fn remove(&mut self, event: Match<&E>, handler: Match<&Handler<P>>) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) =
            mem::take(&mut self.entries).into_iter().partition(|r| {
                event.accepts(|e| **e == r.event) && handler.accepts(|h| h.same(&r.handler))
            });
        self.entries = kept;

        let count = removed.len();
        for r in removed {
            if let Err(err) = self.bus.unsubscribe(&r.event, &r.handler) {
                trace!(%err, "removed entry was no longer on the bus");
            }
        }
        if count > 0 {
            debug!(removed = count, remaining = self.entries.len(), "ledger entries removed");
        }
        count
    }

    /// Remove every handler this ledger registered for `event`.
    pub fn remove_event(&mut self, event: &E) -> usize {
        self.remove(Match::Only(event), Match::Any)
    }

    /// Remove `handler` from every event this ledger registered it for.
    pub fn remove_handler(&mut self, handler: &Handler<P>) -> usize {
        self.remove(Match::Any, Match::Only(handler))
    }

    /// Remove the exact `(event, handler)` pair.
    pub fn remove_pair(&mut self, event: &E, handler: &Handler<P>) -> usize {
        self.remove(Match::Only(event), Match::Only(handler))
    }

    /// Remove everything. Same result as `remove(Match::Any, Match::Any)`.
    pub fn clear(&mut self) -> usize {
        self.remove(Match::Any, Match::Any)
    }

    /// Publish through this ledger's bus.
    ///
    /// # Panics
    ///
    /// Propagates handler panics; see [`Bus::publish`].
    pub fn publish(&self, event: &E, payload: Option<&P>) {
        self.bus.publish(event, payload);
    }

    /// Unsubscribe every tracked entry and empty the ledger.
    ///
    /// Each entry is attempted on its own; one that is already gone from
    /// the bus is skipped without affecting the rest. Called from `Drop`,
    /// so owners only need it to release early. Running it again finds
    /// nothing to do.
    pub fn dispose_all(&mut self) {
        let entries = mem::take(&mut self.entries);
        if entries.is_empty() {
            return;
        }
        let total = entries.len();
        let mut missing = 0usize;
        for r in entries {
            if let Err(err) = self.bus.unsubscribe(&r.event, &r.handler) {
                missing += 1;
                debug!(%err, "disposal skipped registration already gone from bus");
            }
        }
        debug!(total, missing, "ledger disposed");
    }

    /// Whether the exact pair is tracked.
    #[must_use]
    pub fn contains(&self, event: &E, handler: &Handler<P>) -> bool {
        self.entries
            .iter()
            .any(|r| r.event == *event && r.handler.same(handler))
    }

    /// Tracked pairs in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&E, &Handler<P>)> {
        self.entries.iter().map(|r| (&r.event, &r.handler))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: EventId, P: 'static> Drop for Ledger<E, P> {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

/// Run `f` with a fresh ledger over `bus`, disposing it when `f` returns
/// or unwinds.
pub fn with_ledger<E, P, R>(bus: Bus<E, P>, f: impl FnOnce(&mut Ledger<E, P>) -> R) -> R
where
    E: EventId,
    P: 'static,
{
    let mut ledger = Ledger::new(bus);
    f(&mut ledger)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
