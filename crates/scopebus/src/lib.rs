#![forbid(unsafe_code)]

//! Lifecycle-scoped event handler registration.
//!
//! # Role in scopebus
//! UI components register handlers through a [`Ledger`]. The ledger
//! mirrors each registration onto a shared [`Bus`] and remembers it, so
//! that when the component goes away every handler it registered is
//! removed without the component keeping handler references around.
//!
//! # Primary responsibilities
//! - **Ledger**: idempotent register, filtered remove, clear, dispose on
//!   drop.
//! - **Match**: the "any" / "only this value" filter used by removal.
//! - **Shared facade**: one lazily created bus per `(event, payload)` type
//!   pair on the current thread, plus [`global_publish`].
//! - **Listen**: a single registration that follows an external scope and
//!   re-registers when its event or handler changes.
//!
//! # Example
//!
//! ```
//! use scopebus::{Bus, EventKey, Handler, Ledger};
//!
//! let bus = Bus::<EventKey, u32>::new();
//! let mut ledger = Ledger::new(bus.clone());
//!
//! let on_resize = Handler::new(|width: Option<&u32>| {
//!     let _ = width;
//! });
//! ledger.register("resize".into(), &on_resize);
//! ledger.register("resize".into(), &on_resize); // no-op
//! assert_eq!(bus.handler_count(&"resize".into()), 1);
//!
//! drop(ledger);
//! assert!(bus.is_empty());
//! ```

pub mod filter;
pub mod ledger;
pub mod listen;
pub mod shared;

pub use filter::Match;
pub use ledger::{Ledger, with_ledger};
pub use listen::{Listen, direct_listen};
pub use shared::{global_publish, shared};

pub use scopebus_core::{
    Bus, BusConfig, BusConfigParse, BusError, ConfigError, EventId, EventKey, Handler, HandlerId,
    Symbol,
};
