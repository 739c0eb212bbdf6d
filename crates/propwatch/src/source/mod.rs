//! The change-source capability observers are built on.
//!
//! An observer never inspects concrete object types. It talks to its target
//! through the [`Observable`] trait, which bundles the two capabilities the
//! engine needs: reading and writing values by key path, and subscribing to
//! structured change events for a key path.
//!
//! # Built-in Sources
//!
//! - [`ObservableObject`] - a dynamic property bag with nested maps and
//!   ordered/unordered relationships
//! - [`Observed`] - wraps any struct deriving [`KeyValue`](crate::KeyValue)
//!
//! # Custom Sources
//!
//! Implement [`Observable`] and keep a [`SubscriberRegistry`] to do the
//! bookkeeping:
//!
//! ```rust,ignore
//! use propwatch::{ChangeSink, KeyPath, Observable, ObserveError, SubscriberRegistry, SubscriptionId, Value};
//!
//! struct Thermometer {
//!     celsius: parking_lot::RwLock<f64>,
//!     registry: SubscriberRegistry,
//! }
//!
//! impl Observable for Thermometer {
//!     fn value_at(&self, key_path: &KeyPath) -> Result<Option<Value>, ObserveError> {
//!         match key_path.as_str() {
//!             "celsius" => Ok(Some(Value::Float(*self.celsius.read()))),
//!             other => Err(ObserveError::unknown_key(other)),
//!         }
//!     }
//!     // ...
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  perform()  ┌────────────────────┐  receive()  ┌──────────────────┐
//! │  mutation    │────────────▶│ SubscriberRegistry │────────────▶│ PropertyObserver │
//! │ (set/insert) │             │  (Weak sinks)      │             │  (ChangeSink)    │
//! └──────────────┘             └────────────────────┘             └──────────────────┘
//! ```

mod object;
mod observed;
mod registry;

use std::fmt;
use std::sync::Weak;

pub use object::ObservableObject;
pub use observed::{KeyValue, Observed};
pub use registry::{PendingChange, SubscriberRegistry};

use crate::change::ChangeEvent;
use crate::error::ObserveError;
use crate::key_path::KeyPath;
use crate::value::Value;

/// Opaque handle identifying one subscription on one source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receiver of raw change events.
///
/// Sources hold sinks only through [`Weak`] references, so a subscription
/// never keeps its observer alive. `receive` is called synchronously on the
/// thread performing the mutation, with no source lock held.
pub trait ChangeSink: Send + Sync {
    /// Handles one raw change event.
    fn receive(&self, event: &ChangeEvent);
}

/// An object whose properties can be read, written and observed by key path.
///
/// This is the capability interface the observation engine is polymorphic
/// over. Implementations decide how key paths map onto their state.
pub trait Observable: Send + Sync + 'static {
    /// Reads the value at `key_path`. `Ok(None)` means the property exists
    /// but has no value.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::UnknownKey`] when the key path does not name a
    /// property of this object.
    fn value_at(&self, key_path: &KeyPath) -> Result<Option<Value>, ObserveError>;

    /// Writes the value at `key_path`, notifying subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error when the key path is unknown, read-only, or the value
    /// has the wrong shape for the property.
    fn set_value_at(&self, key_path: &KeyPath, value: Option<Value>) -> Result<(), ObserveError>;

    /// Subscribes `sink` to changes at `key_path`.
    ///
    /// Prior events are delivered only when `wants_prior` is set.
    ///
    /// # Errors
    ///
    /// Implementations may reject key paths they cannot observe.
    fn subscribe(
        &self,
        key_path: &KeyPath,
        wants_prior: bool,
        sink: Weak<dyn ChangeSink>,
    ) -> Result<SubscriptionId, ObserveError>;

    /// Removes a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
