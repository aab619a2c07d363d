//! Reactive values held in memory
//!
//! [`ObservableValue`] wraps one value and notifies observers on `set` and
//! `reset`. [`ObservableObject`] lifts every field of a record into its own
//! `ObservableValue`. Neither writes back to storage on its own; use
//! [`LiveObject`](crate::LiveObject) for that.

mod object;
mod value;

use thiserror::Error;

pub use object::ObservableObject;
pub use value::{EventKind, ObservableValue, SameValue, Subscription};

/// Errors raised when registering observers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    /// Unknown event name or unusable callback
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
