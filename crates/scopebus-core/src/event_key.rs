#![forbid(unsafe_code)]

//! Ready-made event identifiers.
//!
//! Any [`EventId`](crate::EventId) type works as an event identifier;
//! [`EventKey`] covers the common cases of named, numbered and symbolic
//! events. Numbered events have no falsy special case: `Number(0)` is an
//! ordinary key.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// A unique event identifier.
///
/// Two symbols are equal only if one is a copy of the other. The
/// description is for display and never takes part in comparison.
#[derive(Clone, Copy)]
pub struct Symbol {
    id: u64,
    description: &'static str,
}

impl Symbol {
    /// Mint a new symbol. Every call yields a distinct value, even for the
    /// same description.
    #[must_use]
    pub fn new(description: &'static str) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}#{})", self.description, self.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Event identifier covering names, numbers and symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    Name(Cow<'static, str>),
    Number(i64),
    Symbol(Symbol),
}

impl EventKey {
    /// Shorthand for a statically named event.
    #[must_use]
    pub const fn name(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<&'static str> for EventKey {
    fn from(name: &'static str) -> Self {
        Self::name(name)
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl From<i64> for EventKey {
    fn from(number: i64) -> Self {
        Self::Number(number)
    }
}

impl From<Symbol> for EventKey {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Number(number) => write!(f, "{number}"),
            Self::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_and_owned_names_compare_equal() {
        assert_eq!(EventKey::from("resize"), EventKey::from("resize".to_string()));
        assert_ne!(EventKey::from("resize"), EventKey::from("focus"));
    }

    #[test]
    fn symbols_with_same_description_differ() {
        let a = Symbol::new("tick");
        let b = Symbol::new("tick");
        assert_ne!(a, b);
        let copy = a;
        assert_eq!(a, copy);
        assert_ne!(EventKey::from(a), EventKey::from(b));
    }

    #[test]
    fn number_zero_is_an_ordinary_key() {
        assert_eq!(EventKey::from(0_i64), EventKey::Number(0));
        assert_ne!(EventKey::from(0_i64), EventKey::from("0"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(EventKey::from("x").to_string(), "x");
        assert_eq!(EventKey::from(42_i64).to_string(), "42");
        assert_eq!(EventKey::from(Symbol::new("s")).to_string(), "Symbol(s)");
    }
}
