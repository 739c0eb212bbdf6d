//! Observation of one key path on one object.
//!
//! A [`PropertyObserver`] subscribes to its target's change source, filters
//! raw events according to its [`ObserverOptions`], builds a
//! [`ChangeRecord`] and runs its reactions in registration order.
//!
//! # Dispatch
//!
//! For every raw event the observer checks, in order:
//!
//! 1. removed observers ignore everything
//! 2. if the target is gone, the observer removes itself
//! 3. disabled observers ignore the event
//! 4. prior events are dropped unless `prior_change` is set
//! 5. settings that leave the value unchanged are dropped unless
//!    `include_equal_changes` is set
//! 6. relationship mutations are dropped when `relationship_settings_only`
//!    is set
//!
//! The surviving record goes through the [`ActionPipeline`]. Reaction
//! failures go to the callback registered with
//! [`on_error`](PropertyObserver::on_error) and to `tracing`.

mod action;
mod holder;
mod mapping;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

pub use action::{Action, ActionKind, ActionPipeline, Reaction};
pub use holder::ObserverSet;
pub use mapping::{Mapping, ObserveExt, Transform, map_property, transforms};

use crate::change::{ChangeEvent, ChangeRecord, Mutation};
use crate::error::{BoxError, ObserveError, Result};
use crate::key_path::KeyPath;
use crate::notification::{Notification, NotificationCenter};
use crate::options::ObserverOptions;
use crate::source::{ChangeSink, Observable, SubscriptionId};
use crate::value::{EdgeInsets, Point, Rect, Size, Value};

/// Callback type for reaction failures.
pub type ErrorCallback = Arc<dyn Fn(&ObserveError) + Send + Sync + 'static>;

/// Observes one key path on one target and runs reactions for its changes.
///
/// The observer holds its target weakly: dropping the target stops all
/// dispatch. The handle is cheaply cloneable; all clones share the same
/// state, and the subscription ends when the last clone is dropped or
/// [`remove_from_target`](Self::remove_from_target) is called.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use propwatch::{ObservableObject, ObserverOptions, PropertyObserver};
///
/// let counter = Arc::new(ObservableObject::new().with("count", 0));
/// let observer = PropertyObserver::new(&counter, "count", ObserverOptions::new())?;
///
/// observer
///     .report_change(|change| println!("{change:?}"))?
///     .report_integer(|count| println!("count is now {count}"))?;
///
/// counter.set("count", 5)?;
/// # Ok::<(), propwatch::ObserveError>(())
/// ```
#[derive(Clone)]
pub struct PropertyObserver {
    inner: Arc<ObserverInner>,
}

struct ObserverInner {
    target: Weak<dyn Observable>,
    key_path: KeyPath,
    options: ObserverOptions,

    /// The flag set through `set_enabled`.
    enabled: AtomicBool,

    /// Number of active `disable_in` calls.
    depth: AtomicUsize,

    removed: AtomicBool,
    pipeline: ActionPipeline,
    subscription: Mutex<Option<SubscriptionId>>,
    on_error: RwLock<Option<ErrorCallback>>,
}

impl PropertyObserver {
    /// Starts observing `key_path` on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::InvalidKeyPath`] for a malformed key path, or
    /// the target's error when it cannot read or subscribe to the key path.
    pub fn new<T: Observable>(
        target: &Arc<T>,
        key_path: &str,
        options: ObserverOptions,
    ) -> Result<Self> {
        let target: Arc<dyn Observable> = Arc::clone(target) as Arc<dyn Observable>;
        Self::from_target(&target, key_path, options)
    }

    /// Like [`new`](Self::new), for a type-erased target.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_target(
        target: &Arc<dyn Observable>,
        key_path: &str,
        options: ObserverOptions,
    ) -> Result<Self> {
        let key_path = KeyPath::parse(key_path)?;
        target.value_at(&key_path)?;

        let inner = Arc::new(ObserverInner {
            target: Arc::downgrade(target),
            key_path,
            options,
            enabled: AtomicBool::new(true),
            depth: AtomicUsize::new(0),
            removed: AtomicBool::new(false),
            pipeline: ActionPipeline::new(),
            subscription: Mutex::new(None),
            on_error: RwLock::new(None),
        });

        let weak_inner: Weak<ObserverInner> = Arc::downgrade(&inner);
        let sink: Weak<dyn ChangeSink> = weak_inner;
        let id = target.subscribe(&inner.key_path, options.prior_change, sink)?;
        *inner.subscription.lock() = Some(id);

        tracing::debug!(key_path = %inner.key_path, ?options, "observer created");

        Ok(Self { inner })
    }

    // ========================================================================
    // State
    // ========================================================================

    /// The observed object, if it is still alive.
    #[must_use]
    pub fn target(&self) -> Option<Arc<dyn Observable>> {
        self.inner.target.upgrade()
    }

    /// Returns `true` if this observer watches `target`.
    pub fn is_observing<T: Observable + ?Sized>(&self, target: &Arc<T>) -> bool {
        std::ptr::addr_eq(self.inner.target.as_ptr(), Arc::as_ptr(target))
    }

    /// The observed key path.
    #[must_use]
    pub fn key_path(&self) -> &KeyPath {
        &self.inner.key_path
    }

    /// The options the observer was created with.
    #[must_use]
    pub fn options(&self) -> ObserverOptions {
        self.inner.options
    }

    /// Number of registered reactions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.inner.pipeline.len()
    }

    /// Unwrap strategies of the registered reactions, in order.
    #[must_use]
    pub fn action_kinds(&self) -> Vec<ActionKind> {
        self.inner.pipeline.kinds()
    }

    /// Whether changes are currently dispatched.
    ///
    /// `false` while [`set_enabled(false)`](Self::set_enabled) is in effect or
    /// while any [`disable_in`](Self::disable_in) call is running.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Turns dispatch on or off. The subscription is kept either way.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Runs `f` with this observer disabled.
    ///
    /// Changes made while `f` runs, including changes made by `f` itself,
    /// are dropped rather than queued. Calls nest: the observer stays
    /// disabled until the outermost call returns or unwinds.
    pub fn disable_in<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore<'a>(&'a AtomicUsize);

        impl Drop for Restore<'_> {
            fn drop(&mut self) {
                self.0.fetch_sub(1, Ordering::SeqCst);
            }
        }

        self.inner.depth.fetch_add(1, Ordering::SeqCst);
        let _restore = Restore(&self.inner.depth);
        f()
    }

    /// Whether [`remove_from_target`](Self::remove_from_target) was called or
    /// the target went away.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.inner.removed.load(Ordering::SeqCst)
    }

    /// Stops observing for good. Idempotent.
    ///
    /// Afterwards no record is dispatched and every registration method
    /// fails with [`ObserveError::InvalidState`].
    pub fn remove_from_target(&self) {
        self.inner.detach("removed");
    }

    /// Registers a callback for reaction failures, replacing any previous one.
    ///
    /// Failures are type mismatches of typed reactions, transform errors,
    /// failed writes of set actions, and panics.
    pub fn on_error<F>(&self, callback: F) -> &Self
    where
        F: Fn(&ObserveError) + Send + Sync + 'static,
    {
        *self.inner.on_error.write() = Some(Arc::new(callback));
        self
    }

    // ========================================================================
    // Reactions
    // ========================================================================

    /// Registers a reaction receiving the raw [`ChangeRecord`].
    ///
    /// Unless `skip_initial` is set, the reaction is called once right away
    /// with an initial record carrying the current value.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::InvalidState`] if the observer was removed or
    /// the target is gone.
    pub fn report_change<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(&ChangeRecord) + Send + Sync + 'static,
    {
        self.register(
            ActionKind::Change,
            Box::new(move |record| {
                reaction(record);
                Ok(())
            }),
        )
    }

    /// Registers a reaction receiving the current value.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_current_value<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.register(
            ActionKind::CurrentValue,
            Box::new(move |record| {
                reaction(record.current_value());
                Ok(())
            }),
        )
    }

    /// Registers a reaction receiving the current and previous values.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_current_and_previous_values<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(Option<&Value>, Option<&Value>) + Send + Sync + 'static,
    {
        self.register(
            ActionKind::CurrentAndPrevious,
            Box::new(move |record| {
                reaction(record.current_value(), record.previous_value());
                Ok(())
            }),
        )
    }

    /// Registers a reaction receiving the current value as `bool`.
    ///
    /// An absent value is reported as `false`. A value that cannot be
    /// coerced is reported as [`ObserveError::TypeMismatch`] to the error
    /// callback and the reaction is skipped.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_bool<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.report_typed(ActionKind::Boolean, "bool", Value::to_bool, reaction)
    }

    /// Registers a reaction receiving the current value as `i64`.
    ///
    /// Absent values are reported as `0`; see [`report_bool`](Self::report_bool)
    /// for coercion failures.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_integer<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        self.report_typed(ActionKind::Integer, "integer", Value::to_i64, reaction)
    }

    /// Registers a reaction receiving the current value as `f64`.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_float<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.report_typed(ActionKind::Floating, "float", Value::to_f64, reaction)
    }

    /// Registers a reaction receiving the current value as a [`Point`].
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_point<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(Point) + Send + Sync + 'static,
    {
        self.report_typed(ActionKind::Point, "point", Value::to_point, reaction)
    }

    /// Registers a reaction receiving the current value as a [`Size`].
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_size<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(Size) + Send + Sync + 'static,
    {
        self.report_typed(ActionKind::Size, "size", Value::to_size, reaction)
    }

    /// Registers a reaction receiving the current value as a [`Rect`].
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_rect<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(Rect) + Send + Sync + 'static,
    {
        self.report_typed(ActionKind::Rect, "rect", Value::to_rect, reaction)
    }

    /// Registers a reaction receiving the current value as [`EdgeInsets`].
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn report_edge_insets<F>(&self, reaction: F) -> Result<&Self>
    where
        F: Fn(EdgeInsets) + Send + Sync + 'static,
    {
        self.report_typed(
            ActionKind::EdgeInsets,
            "edge insets",
            Value::to_edge_insets,
            reaction,
        )
    }

    /// Posts a notification named `name` to the global
    /// [`NotificationCenter`] for every change. The target is the sender.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn post_notification(&self, name: &str) -> Result<&Self> {
        self.post_notification_in(&NotificationCenter::global(), name, None)
    }

    /// Like [`post_notification`](Self::post_notification), with the current
    /// value in the payload under `value_key`.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn post_notification_with_key(&self, name: &str, value_key: &str) -> Result<&Self> {
        self.post_notification_in(&NotificationCenter::global(), name, Some(value_key))
    }

    /// Posts to an explicit center, optionally with the current value in the
    /// payload under `value_key`.
    ///
    /// # Errors
    ///
    /// See [`report_change`](Self::report_change).
    pub fn post_notification_in(
        &self,
        center: &Arc<NotificationCenter>,
        name: &str,
        value_key: Option<&str>,
    ) -> Result<&Self> {
        let center = Arc::clone(center);
        let name = name.to_string();
        let value_key = value_key.map(str::to_string);

        self.register(
            ActionKind::PostNotification,
            Box::new(move |record| {
                let mut user_info = BTreeMap::new();
                if let (Some(key), Some(value)) = (&value_key, record.current_value()) {
                    user_info.insert(key.clone(), value.clone());
                }

                center.post(&Notification {
                    name: name.clone(),
                    sender: record.target(),
                    user_info,
                });
                Ok(())
            }),
        )
    }

    /// Writes the current value to `key_path` on `destination` for every
    /// change. An absent value is replaced by `null_replacement`.
    ///
    /// The destination is held weakly; once it is gone the write is skipped.
    /// Prior records never write.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::InvalidKeyPath`] for a malformed destination
    /// key path; see also [`report_change`](Self::report_change).
    pub fn set_value_on<D: Observable>(
        &self,
        destination: &Arc<D>,
        key_path: &str,
        null_replacement: Option<Value>,
    ) -> Result<&Self> {
        self.set_transformed_on(destination, key_path, move |value| {
            Ok(value.cloned().or_else(|| null_replacement.clone()))
        })
    }

    /// Writes `transform(current value)` to `key_path` on `destination` for
    /// every change.
    ///
    /// A transform error is reported as [`ObserveError::Transform`] to the
    /// error callback; the other reactions still run.
    ///
    /// # Errors
    ///
    /// See [`set_value_on`](Self::set_value_on).
    pub fn set_transformed_on<D, F>(
        &self,
        destination: &Arc<D>,
        key_path: &str,
        transform: F,
    ) -> Result<&Self>
    where
        D: Observable,
        F: Fn(Option<&Value>) -> std::result::Result<Option<Value>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        let path = KeyPath::parse(key_path)?;
        let destination: Weak<dyn Observable> = Arc::downgrade(destination) as Weak<dyn Observable>;

        self.register(
            ActionKind::SetValue,
            Box::new(move |record| {
                if record.is_prior() {
                    return Ok(());
                }

                let Some(destination) = destination.upgrade() else {
                    tracing::trace!(destination = %path, "destination gone, skipping write");
                    return Ok(());
                };

                let value = transform(record.current_value())
                    .map_err(|source| ObserveError::transform(path.as_str(), source))?;
                destination.set_value_at(&path, value)
            }),
        )
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn report_typed<V, F>(
        &self,
        kind: ActionKind,
        expected: &'static str,
        coerce: fn(&Value) -> Option<V>,
        reaction: F,
    ) -> Result<&Self>
    where
        V: Default + 'static,
        F: Fn(V) + Send + Sync + 'static,
    {
        self.register(
            kind,
            Box::new(move |record| {
                let value = match record.current_value() {
                    None => V::default(),
                    Some(value) => coerce(value).ok_or_else(|| {
                        ObserveError::type_mismatch(
                            record.key_path().as_str(),
                            expected,
                            value.type_name(),
                        )
                    })?,
                };
                reaction(value);
                Ok(())
            }),
        )
    }

    fn register(&self, kind: ActionKind, reaction: Reaction) -> Result<&Self> {
        const OPERATION: &str = "register a reaction on";

        if self.is_removed() {
            return Err(ObserveError::invalid_state(
                self.inner.key_path.as_str(),
                OPERATION,
            ));
        }

        let Some(target) = self.inner.target.upgrade() else {
            self.inner.detach("target dropped");
            return Err(ObserveError::invalid_state(
                self.inner.key_path.as_str(),
                OPERATION,
            ));
        };

        let action = Action::new(kind, reaction);

        if !self.inner.options.skip_initial {
            match target.value_at(&self.inner.key_path) {
                Ok(current) => {
                    let record =
                        ChangeRecord::initial(&target, self.inner.key_path.clone(), current);
                    if let Err(err) = action.run(&record) {
                        self.inner.report(&err);
                    }
                }
                Err(err) => self.inner.report(&err),
            }
        }

        self.inner.pipeline.push(action);
        tracing::trace!(key_path = %self.inner.key_path, %kind, "reaction registered");

        Ok(self)
    }
}

impl ObserverInner {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst) && self.depth.load(Ordering::SeqCst) == 0
    }

    /// Marks the observer removed and drops its subscription.
    fn detach(&self, reason: &'static str) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }

        let subscription = self.subscription.lock().take();
        if let (Some(id), Some(target)) = (subscription, self.target.upgrade()) {
            target.unsubscribe(id);
        }
        self.pipeline.clear();

        tracing::debug!(key_path = %self.key_path, reason, "observer detached");
    }

    fn report(&self, err: &ObserveError) {
        tracing::warn!(key_path = %self.key_path, error = %err, "reaction failed");

        let callback = self.on_error.read().clone();
        if let Some(callback) = callback {
            callback(err);
        }
    }

    /// Returns `true` if the event passes the option filters.
    fn accepts(&self, event: &ChangeEvent) -> bool {
        if event.is_prior && !self.options.prior_change {
            return false;
        }

        if !self.options.include_equal_changes
            && matches!(event.mutation, Mutation::Setting)
            && event.previous == event.current
        {
            tracing::trace!(key_path = %self.key_path, "equal setting suppressed");
            return false;
        }

        if self.options.relationship_settings_only && event.kind().is_relationship_mutation() {
            tracing::trace!(
                key_path = %self.key_path,
                kind = %event.kind(),
                "relationship mutation suppressed"
            );
            return false;
        }

        true
    }
}

impl ChangeSink for ObserverInner {
    fn receive(&self, event: &ChangeEvent) {
        if self.removed.load(Ordering::SeqCst) {
            return;
        }

        let Some(target) = self.target.upgrade() else {
            self.detach("target dropped");
            return;
        };

        if !self.is_enabled() {
            tracing::trace!(key_path = %self.key_path, "observer disabled, change dropped");
            return;
        }

        if !self.accepts(event) {
            return;
        }

        let record = ChangeRecord::from_event(&target, event);
        tracing::trace!(key_path = %self.key_path, kind = %record.kind(), prior = record.is_prior(), "dispatching");

        for err in self.pipeline.dispatch(&record) {
            self.report(&err);
        }
    }
}

impl Drop for ObserverInner {
    fn drop(&mut self) {
        if self.removed.load(Ordering::SeqCst) {
            return;
        }
        if let (Some(id), Some(target)) = (self.subscription.get_mut().take(), self.target.upgrade()) {
            target.unsubscribe(id);
        }
    }
}

// Manual Debug impl: reactions and the target are not Debug
impl fmt::Debug for PropertyObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyObserver")
            .field("key_path", &self.inner.key_path)
            .field("options", &self.inner.options)
            .field("enabled", &self.is_enabled())
            .field("removed", &self.is_removed())
            .field("actions", &self.inner.pipeline)
            .finish_non_exhaustive()
    }
}
