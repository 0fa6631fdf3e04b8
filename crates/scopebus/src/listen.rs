#![forbid(unsafe_code)]

//! Fire-and-forget registration tied to an external scope.
//!
//! [`Listen`] holds at most one `(event, handler)` registration. The
//! external lifecycle drives it: call [`Listen::sync`] with the current
//! event and handler whenever the scope re-renders, and drop the value
//! when the scope ends.
//!
//! - Same event and same handler identity as last time: nothing happens.
//! - Either changed: the old pair is unsubscribed, then the new one is
//!   subscribed.
//! - No handler: nothing is subscribed and there is nothing to clean up.

use std::fmt;

use scopebus_core::{Bus, EventId, Handler};
use tracing::trace;

use crate::shared::shared;

/// Guard for a single registration following an external scope.
#[must_use = "dropping a Listen unsubscribes its handler"]
pub struct Listen<E: EventId, P: 'static> {
    bus: Bus<E, P>,
    current: Option<(E, Handler<P>)>,
}

impl<E: EventId, P: 'static> fmt::Debug for Listen<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listen")
            .field("event", &self.current.as_ref().map(|(e, _)| e))
            .field("handler", &self.current.as_ref().map(|(_, h)| h.id()))
            .finish()
    }
}

impl<E: EventId, P: 'static> Listen<E, P> {
    /// Register `handler` for `event` on `bus`, if a handler is given.
    pub fn new(bus: Bus<E, P>, event: E, handler: Option<Handler<P>>) -> Self {
        let mut listen = Self { bus, current: None };
        listen.sync(event, handler);
        listen
    }

    /// Follow the scope's current event and handler.
    pub fn sync(&mut self, event: E, handler: Option<Handler<P>>) {
        let unchanged = match (&self.current, &handler) {
            (Some((cur_event, cur_handler)), Some(next)) => {
                *cur_event == event && cur_handler.same(next)
            }
            _ => false,
        };
        if unchanged {
            return;
        }
        self.release();
        if let Some(handler) = handler {
            trace!(event = ?event, handler = %handler.id(), "listen registered");
            self.bus.subscribe(event.clone(), handler.clone());
            self.current = Some((event, handler));
        }
    }

    /// Unsubscribe now instead of at drop.
    pub fn release(&mut self) {
        let Some((event, handler)) = self.current.take() else {
            return;
        };
        if let Err(err) = self.bus.unsubscribe(&event, &handler) {
            trace!(%err, "listen registration already gone from bus");
        }
    }

    /// Whether a registration is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Event of the held registration.
    #[must_use]
    pub fn event(&self) -> Option<&E> {
        self.current.as_ref().map(|(event, _)| event)
    }

    /// Handler of the held registration.
    #[must_use]
    pub fn handler(&self) -> Option<&Handler<P>> {
        self.current.as_ref().map(|(_, handler)| handler)
    }
}

impl<E: EventId, P: 'static> Drop for Listen<E, P> {
    fn drop(&mut self) {
        self.release();
    }
}

/// [`Listen::new`] on this thread's shared bus.
pub fn direct_listen<E: EventId, P: 'static>(event: E, handler: Option<Handler<P>>) -> Listen<E, P> {
    Listen::new(shared(), event, handler)
}
