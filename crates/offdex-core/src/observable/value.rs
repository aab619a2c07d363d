//! Single observable value

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::ObserveError;
use crate::record::json_eq;

/// Which change an observer is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The value was replaced with a different one via `set`
    Set,
    /// The value was restored to its fallback via `reset`
    Reset,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Set => "set",
            EventKind::Reset => "reset",
        }
    }
}

impl FromStr for EventKind {
    type Err = ObserveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(EventKind::Set),
            "reset" => Ok(EventKind::Reset),
            other => Err(ObserveError::InvalidArgument(format!(
                "unsupported event '{}', expected one of [set, reset]",
                other
            ))),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality that decides whether [`ObservableValue::set`] changed anything.
///
/// Follows JavaScript's `===` for the values an observable holds: JSON
/// numbers compare by numeric value, so `1` and `1.0` are the same value.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

macro_rules! same_value_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_value_by_eq!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str,
);

impl SameValue for Value {
    fn same_value(&self, other: &Self) -> bool {
        json_eq(self, other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: SameValue> SameValue for Vec<T> {
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Observer<T> {
    id: u64,
    event: EventKind,
    callback: Callback<T>,
}

struct Observers<T> {
    next_id: u64,
    list: Vec<Observer<T>>,
}

impl<T> Observers<T> {
    /// Callbacks registered for `event`, in registration order.
    fn snapshot(&self, event: EventKind) -> Vec<Callback<T>> {
        self.list
            .iter()
            .filter(|o| o.event == event)
            .map(|o| o.callback.clone())
            .collect()
    }
}

/// Type-erased handle back to an observer set.
trait Registry: Send + Sync {
    fn remove(&self, id: u64);
}

impl<T> Registry for Mutex<Observers<T>> {
    fn remove(&self, id: u64) {
        self.lock().list.retain(|o| o.id != id);
    }
}

/// Handle returned by [`ObservableValue::observe`].
///
/// Dropping the handle keeps the observer registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Registry>,
}

impl Subscription {
    /// Remove this observer. Calling it again (or after the value is gone)
    /// does nothing.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// A value that notifies observers when it is replaced or reset.
///
/// Notifications run synchronously on the caller's thread, in registration
/// order, against a snapshot of the observer list taken before the first
/// callback runs. No lock is held while callbacks execute, so a callback may
/// read or change the value and register or remove observers; such changes
/// take effect from the next notification on.
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use offdex_core::{EventKind, ObservableValue};
///
/// let value = ObservableValue::new(1);
/// let calls = Arc::new(AtomicUsize::new(0));
///
/// let counter = calls.clone();
/// let sub = value.observe(EventKind::Set, move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// value.set(2);
/// value.set(2); // unchanged, no notification
/// sub.unsubscribe();
/// value.set(3);
///
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// assert_eq!(value.get(), 3);
/// ```
pub struct ObservableValue<T> {
    value: RwLock<T>,
    fallback: RwLock<T>,
    observers: Arc<Mutex<Observers<T>>>,
}

impl<T: Clone + SameValue + Default + 'static> ObservableValue<T> {
    /// Wrap `value`; `reset` restores `T::default()`.
    pub fn new(value: T) -> Self {
        Self::with_fallback(value, T::default())
    }
}

impl<T: Default + Clone + SameValue + 'static> Default for ObservableValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + SameValue + 'static> ObservableValue<T> {
    /// Wrap `value`; `reset` restores `fallback`.
    pub fn with_fallback(value: T, fallback: T) -> Self {
        Self {
            value: RwLock::new(value),
            fallback: RwLock::new(fallback),
            observers: Arc::new(Mutex::new(Observers {
                next_id: 0,
                list: Vec::new(),
            })),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Value restored by `reset`.
    pub fn fallback(&self) -> T {
        self.fallback.read().clone()
    }

    /// Change the value restored by `reset`. Does not notify.
    pub fn set_fallback(&self, fallback: T) {
        *self.fallback.write() = fallback;
    }

    /// Replace the value and notify `Set` observers with the new value.
    ///
    /// Does nothing if `new_value` is the [same value](SameValue) as the
    /// current one.
    pub fn set(&self, new_value: T) {
        {
            let mut value = self.value.write();
            if value.same_value(&new_value) {
                return;
            }
            *value = new_value.clone();
        }
        self.notify(EventKind::Set, &new_value);
    }

    /// Restore the fallback and notify `Reset` observers with it, even when
    /// the value already equals the fallback.
    pub fn reset(&self) {
        let fallback = self.fallback();
        *self.value.write() = fallback.clone();
        self.notify(EventKind::Reset, &fallback);
    }

    /// Register `callback` for `event`.
    pub fn observe<F>(&self, event: EventKind, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut observers = self.observers.lock();
        let id = observers.next_id;
        observers.next_id += 1;
        observers.list.push(Observer {
            id,
            event,
            callback: Arc::new(callback),
        });

        let registry: Arc<dyn Registry> = self.observers.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
        }
    }

    /// Register `callback` for an event given by name (`"set"` or `"reset"`).
    ///
    /// Fails with `ObserveError::InvalidArgument` for any other name.
    pub fn observe_named<F>(&self, event: &str, callback: F) -> Result<Subscription, ObserveError>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let event = event.parse::<EventKind>()?;
        Ok(self.observe(event, callback))
    }

    /// Number of registered observers across both event kinds.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().list.len()
    }

    fn notify(&self, event: EventKind, value: &T) {
        let callbacks = self.observers.lock().snapshot(event);
        for callback in callbacks {
            callback(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &*self.value.read())
            .field("fallback", &*self.fallback.read())
            .field("observers", &self.observers.lock().list.len())
            .finish()
    }
}
