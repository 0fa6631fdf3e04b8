#![forbid(unsafe_code)]

//! Test harness for scopebus.
//!
//! - [`Recorder`]: one handler identity that records every payload it
//!   receives.
//! - [`CallLog`]: a shared log of tags, for asserting delivery order
//!   across several handlers.
//! - [`isolated_bus`]: a fresh bus with dispatch tracing enabled, never
//!   the thread's shared one.
//! - [`init_tracing`]: installs a test-friendly `tracing` subscriber,
//!   filtered by `RUST_LOG`.

use std::cell::RefCell;
use std::rc::Rc;

use scopebus_core::{Bus, BusConfig, EventId, Handler};
use tracing_subscriber::EnvFilter;

/// A handler that records the payloads it is called with.
///
/// Clones share both the log and the handler identity.
pub struct Recorder<P: Clone + 'static> {
    calls: Rc<RefCell<Vec<Option<P>>>>,
    handler: Handler<P>,
}

impl<P: Clone + 'static> Clone for Recorder<P> {
    fn clone(&self) -> Self {
        Self {
            calls: Rc::clone(&self.calls),
            handler: self.handler.clone(),
        }
    }
}

impl<P: Clone + 'static> Default for Recorder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone + 'static> Recorder<P> {
    #[must_use]
    pub fn new() -> Self {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let handler = Handler::new(move |payload: Option<&P>| {
            sink.borrow_mut().push(payload.cloned());
        });
        Self { calls, handler }
    }

    /// The recording handler. Always the same identity.
    #[must_use]
    pub fn handler(&self) -> &Handler<P> {
        &self.handler
    }

    /// Payloads received so far, `None` for payload-less publishes.
    #[must_use]
    pub fn calls(&self) -> Vec<Option<P>> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }

    #[must_use]
    pub fn last(&self) -> Option<Option<P>> {
        self.calls.borrow().last().cloned()
    }

    pub fn reset(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl<P: Clone + std::fmt::Debug + 'static> std::fmt::Debug for Recorder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("handler", &self.handler.id())
            .field("calls", &*self.calls.borrow())
            .finish()
    }
}

/// Shared log of tags written by [`CallLog::handler`]s.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<&'static str>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A new handler that appends `tag` to this log when called.
    #[must_use]
    pub fn handler<P: 'static>(&self, tag: &'static str) -> Handler<P> {
        let entries = Rc::clone(&self.entries);
        Handler::new(move |_| entries.borrow_mut().push(tag))
    }

    #[must_use]
    pub fn entries(&self) -> Vec<&'static str> {
        self.entries.borrow().clone()
    }
}

/// A fresh bus, independent of the thread's shared one.
#[must_use]
pub fn isolated_bus<E: EventId, P: 'static>() -> Bus<E, P> {
    Bus::with_config(BusConfig::default().with_trace_dispatch(true))
}

/// Install a `tracing` subscriber writing through the test harness.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
