//! The ordered list of reactions attached to one observer.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::change::ChangeRecord;
use crate::error::{ObserveError, Result};

/// Callback type for reactions.
///
/// Every registration method of [`PropertyObserver`](crate::PropertyObserver)
/// is an adapter producing one of these.
pub type Reaction = Box<dyn Fn(&ChangeRecord) -> Result<()> + Send + Sync + 'static>;

/// The unwrap strategy of a registered reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ActionKind {
    /// The raw [`ChangeRecord`].
    Change,
    /// The current value.
    CurrentValue,
    /// The current and previous values.
    CurrentAndPrevious,
    /// The current value as `bool`.
    Boolean,
    /// The current value as `i64`.
    Integer,
    /// The current value as `f64`.
    Floating,
    /// The current value as a [`Point`](crate::Point).
    Point,
    /// The current value as a [`Size`](crate::Size).
    Size,
    /// The current value as a [`Rect`](crate::Rect).
    Rect,
    /// The current value as [`EdgeInsets`](crate::EdgeInsets).
    EdgeInsets,
    /// Posts a notification.
    PostNotification,
    /// Writes a value to a key path on another object.
    SetValue,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Change => "change",
            Self::CurrentValue => "current-value",
            Self::CurrentAndPrevious => "current-and-previous",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Floating => "floating",
            Self::Point => "point",
            Self::Size => "size",
            Self::Rect => "rect",
            Self::EdgeInsets => "edge-insets",
            Self::PostNotification => "post-notification",
            Self::SetValue => "set-value",
        })
    }
}

/// A reaction tagged with its unwrap strategy.
pub struct Action {
    kind: ActionKind,
    reaction: Reaction,
}

impl Action {
    /// Creates an action.
    pub fn new(kind: ActionKind, reaction: Reaction) -> Self {
        Self { kind, reaction }
    }

    /// The unwrap strategy.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Runs the reaction, converting a panic into
    /// [`ObserveError::ReactionPanicked`].
    ///
    /// # Errors
    ///
    /// Returns the reaction's error, or the panic it raised.
    pub fn run(&self, record: &ChangeRecord) -> Result<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.reaction)(record))) {
            Ok(result) => result,
            Err(payload) => Err(ObserveError::reaction_panicked(
                record.key_path().as_str(),
                panic_message(payload.as_ref()),
            )),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Ordered sequence of reactions.
///
/// Dispatch runs every reaction once per record, in registration order. A
/// reaction that fails or panics does not stop the ones after it; its
/// failure is returned to the caller.
#[derive(Default)]
pub struct ActionPipeline {
    actions: RwLock<Vec<Arc<Action>>>,
}

impl ActionPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action.
    pub fn push(&self, action: Action) -> Arc<Action> {
        let action = Arc::new(action);
        self.actions.write().push(Arc::clone(&action));
        action
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    /// Returns `true` if no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }

    /// Unwrap strategies of the registered actions, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.read().iter().map(|a| a.kind()).collect()
    }

    /// Drops every action.
    pub fn clear(&self) {
        self.actions.write().clear();
    }

    /// Runs every action against `record` and collects the failures.
    ///
    /// The action list is snapshotted first, so reactions may register more
    /// actions; those take part from the next dispatch on.
    pub fn dispatch(&self, record: &ChangeRecord) -> Vec<ObserveError> {
        let snapshot: Vec<Arc<Action>> = self.actions.read().clone();

        snapshot
            .iter()
            .filter_map(|action| action.run(record).err())
            .collect()
    }
}

impl fmt::Debug for ActionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
