#![forbid(unsafe_code)]

//! Removal filters.
//!
//! A [`Match`] is either "anything" or one specific value. The wildcard is
//! its own variant: no identifier value (numeric `0`, an empty name) ever
//! means "no filter".

/// Filter criterion for one field of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Match<T> {
    /// Matches every value.
    #[default]
    Any,
    /// Matches only this value (equality for events, identity for handlers).
    Only(T),
}

impl<T> Match<T> {
    /// Whether this is the wildcard.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Borrow the inner value.
    #[must_use]
    pub const fn as_ref(&self) -> Match<&T> {
        match self {
            Self::Any => Match::Any,
            Self::Only(value) => Match::Only(value),
        }
    }

    /// `true` for [`Match::Any`], otherwise the result of `cmp` on the
    /// held value.
    pub fn accepts(&self, cmp: impl FnOnce(&T) -> bool) -> bool {
        match self {
            Self::Any => true,
            Self::Only(value) => cmp(value),
        }
    }
}

impl<T> From<Option<T>> for Match<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Any, Self::Only)
    }
}
