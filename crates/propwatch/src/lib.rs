//! # propwatch
//!
//! Key-path property observation with structured change records.
//!
//! `propwatch` lets you watch a property of an object by key path
//! (`"count"`, `"address.city"`) and react to its changes. Each change is
//! described by an immutable [`ChangeRecord`]: its kind (setting, insertion,
//! removal, replacement), current and previous values, the affected indexes
//! of ordered collections, and whether the record is a prior or initial one.
//!
//! ## Features
//!
//! - **Typed reactions** - receive changes as raw records, values, `bool`,
//!   `i64`, `f64` or geometry types ([`Point`], [`Size`], [`Rect`],
//!   [`EdgeInsets`]); mismatches are reported, never panics
//! - **Fluent chaining** - every registration returns the observer again
//! - **Filtering options** - skip the initial value, receive prior changes,
//!   include equal settings, report only wholesale collection settings
//! - **Reentrant suppression** - [`PropertyObserver::disable_in`] drops
//!   changes made while a closure runs, and nests
//! - **Derived properties** - [`map_property`] keeps one key path in sync
//!   with another, optionally through a transform
//! - **Notifications** - post named notifications to a [`NotificationCenter`]
//! - **Typed models** - `#[derive(KeyValue)]` makes a plain struct observable
//!   through [`Observed`]
//! - **Rich diagnostics** - errors implement [`miette::Diagnostic`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use propwatch::{ObservableObject, ObserverOptions, PropertyObserver};
//!
//! let model = Arc::new(ObservableObject::new().with("count", 0));
//!
//! let observer = PropertyObserver::new(&model, "count", ObserverOptions::new())?;
//! observer.report_current_and_previous_values(|current, previous| {
//!     println!("count: {previous:?} -> {current:?}");
//! })?;
//!
//! model.set("count", 5)?;
//!
//! // Changes made inside the closure are not reported.
//! observer.disable_in(|| model.set("count", 10))?;
//! # Ok::<(), propwatch::ObserveError>(())
//! ```
//!
//! ## Typed Models
//!
//! ```rust,ignore
//! use propwatch::{KeyValue, Observed, ObserveExt};
//!
//! #[derive(Clone, KeyValue)]
//! struct Player {
//!     name: String,
//!     score: i64,
//! }
//!
//! let player = Arc::new(Observed::new(Player { name: "Ada".into(), score: 0 }));
//! let observer = player.observe("score")?;
//! observer.report_integer(|score| println!("score: {score}"))?;
//!
//! player.update(|p| p.score += 10);
//! ```
//!
//! ## Threading
//!
//! Changes are delivered synchronously on the thread performing the mutation,
//! in mutation order; reactions run in registration order. Observers hold
//! their target weakly and stop on their own when it is dropped.
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `serde` | Serialize values, geometry, key paths and options; convert JSON into [`Value`] | No |

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

// Re-export derive macro
pub use propwatch_macro::KeyValue;

// Re-export miette for users
pub use miette;

// Re-export serde_json when the feature is enabled
#[cfg(feature = "serde")]
pub use serde_json;

// ============================================================================
// Modules
// ============================================================================

pub mod change;
pub mod error;
pub mod key_path;
pub mod notification;
pub mod observer;
pub mod options;
pub mod source;
pub mod value;

pub use change::{ChangeEvent, ChangeKind, ChangeRecord, IndexSet, Mutation};
pub use error::{BoxError, ObserveError, Result};
pub use key_path::KeyPath;
pub use notification::{Notification, NotificationCenter, NotificationToken};
pub use observer::{
    ActionKind, ErrorCallback, Mapping, ObserveExt, ObserverSet, PropertyObserver, map_property,
    transforms,
};
pub use options::ObserverOptions;
pub use source::{
    ChangeSink, KeyValue, Observable, ObservableObject, Observed, PendingChange,
    SubscriberRegistry, SubscriptionId,
};
pub use value::{EdgeInsets, Point, PropertyValue, Rect, Size, Value, decode};
