#![forbid(unsafe_code)]

//! Shared bus facade.
//!
//! Each thread owns at most one bus per `(E, P)` type pair. It is created
//! on first use, configured from the environment (see
//! [`BusConfig::from_env`]), and lives as long as the thread. Since buses
//! are `!Send`, "process-wide" for a single-threaded UI means "this
//! thread".
//!
//! Code that wants isolation (tests, embedded sub-applications) should
//! build its own [`Bus`] and pass it to [`Ledger::new`](crate::Ledger::new)
//! instead of going through this module.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;

use scopebus_core::{Bus, BusConfig, EventId};
use tracing::{debug, warn};

thread_local! {
    /// Lazily created shared buses, keyed by the `TypeId` of `Bus<E, P>`.
    static SHARED_BUSES: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Handle to this thread's shared bus for `(E, P)`, creating it on first
/// use.
#[must_use]
pub fn shared<E: EventId, P: 'static>() -> Bus<E, P> {
    SHARED_BUSES.with(|buses| {
        let mut buses = buses.borrow_mut();
        let slot = buses
            .entry(TypeId::of::<Bus<E, P>>())
            .or_insert_with(|| Box::new(create_shared::<E, P>()) as Box<dyn Any>);
        slot.downcast_ref::<Bus<E, P>>()
            .cloned()
            .unwrap_or_else(|| unreachable!("shared bus slot is keyed by its own TypeId"))
    })
}

fn create_shared<E: EventId, P: 'static>() -> Bus<E, P> {
    let parsed = BusConfig::from_env_with_diagnostics();
    for err in &parsed.errors {
        warn!(%err, "ignoring invalid bus configuration");
    }
    debug!(
        event_type = type_name::<E>(),
        payload_type = type_name::<P>(),
        config = ?parsed.config,
        "shared bus created"
    );
    Bus::with_config(parsed.config)
}

/// Publish on this thread's shared bus without going through an owner.
///
/// # Panics
///
/// Propagates handler panics; see [`Bus::publish`].
pub fn global_publish<E: EventId, P: 'static>(event: &E, payload: Option<&P>) {
    shared::<E, P>().publish(event, payload);
}
