#![forbid(unsafe_code)]

//! Bus error types.

use std::fmt;

use crate::handler::HandlerId;

/// Errors reported by [`Bus`](crate::Bus) operations.
///
/// None of these indicate corruption. Callers that tolerate absent
/// registrations (ledgers, listeners) discard them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The handler is not registered for the event.
    NotSubscribed {
        /// Debug rendering of the event identifier.
        event: String,
        /// Identity of the handler that was looked up.
        handler: HandlerId,
    },
}

impl BusError {
    pub(crate) fn not_subscribed(event: &impl fmt::Debug, handler: HandlerId) -> Self {
        Self::NotSubscribed {
            event: format!("{event:?}"),
            handler,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSubscribed { event, handler } => {
                write!(f, "{handler} is not subscribed to {event}")
            }
        }
    }
}

impl std::error::Error for BusError {}
