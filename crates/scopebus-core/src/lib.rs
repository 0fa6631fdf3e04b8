#![forbid(unsafe_code)]

//! Core: the synchronous publish/subscribe primitive behind scopebus.
//!
//! # Role in scopebus
//! `scopebus-core` owns dispatch. It knows nothing about owners or
//! lifetimes; it maps event identifiers to ordered handler lists and
//! invokes them in-line when an event is published.
//!
//! # Primary responsibilities
//! - **Handler**: a reference-counted callback with a generated identity.
//! - **Bus**: shared, single-threaded handler registry and dispatcher.
//! - **EventKey / Symbol**: ready-made event identifiers (names, numbers,
//!   unique symbols).
//! - **BusConfig**: env-overridable diagnostics settings.
//!
//! # How it fits in the system
//! The `scopebus` crate layers per-owner ledgers and the shared-bus facade
//! on top of [`Bus`]. Everything here is `!Send`: one bus serves one UI
//! thread, so no locking is involved.

pub mod bus;
pub mod config;
pub mod error;
pub mod event_key;
pub mod handler;

pub use bus::Bus;
pub use config::{BusConfig, BusConfigParse, ConfigError};
pub use error::BusError;
pub use event_key::{EventKey, Symbol};
pub use handler::{Handler, HandlerId};

use std::fmt::Debug;
use std::hash::Hash;

/// Bound shared by every event identifier type.
///
/// Identifiers are opaque: only equality and hashing matter. Blanket
/// implemented for every type meeting the bounds.
pub trait EventId: Eq + Hash + Clone + Debug + 'static {}

impl<T> EventId for T where T: Eq + Hash + Clone + Debug + 'static {}
