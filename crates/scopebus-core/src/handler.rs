#![forbid(unsafe_code)]

//! Identity-compared event handlers.
//!
//! Closures have no usable notion of identity in Rust, so every
//! [`Handler`] is stamped with a [`HandlerId`] when it is created. Clones
//! share the stamp; two handlers wrapping byte-identical closures do not.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a [`Handler`], shared by all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, useful in log fields.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

type Callback<P> = Rc<dyn Fn(Option<&P>)>;

/// A callable invoked with the payload of a published event.
///
/// The payload is `None` when the event was published without one.
/// Equality and hashing look only at the [`HandlerId`].
pub struct Handler<P> {
    id: HandlerId,
    callback: Callback<P>,
}

// Manual Clone: shares the callback and the identity.
impl<P> Clone for Handler<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<P: 'static> Handler<P> {
    /// Wrap a callback, minting a fresh identity.
    pub fn new(callback: impl Fn(Option<&P>) + 'static) -> Self {
        Self {
            id: HandlerId::next(),
            callback: Rc::new(callback),
        }
    }
}

impl<P> Handler<P> {
    /// Identity of this handler.
    #[must_use]
    pub const fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the callback.
    pub fn call(&self, payload: Option<&P>) {
        (self.callback)(payload);
    }

    /// Whether `other` is this handler or a clone of it.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> PartialEq for Handler<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<P> Eq for Handler<P> {}

impl<P> Hash for Handler<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<P> fmt::Debug for Handler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
