//! Change events and change records.
//!
//! This module contains the data model of a single observed change:
//! - [`ChangeEvent`] - the raw event a change source delivers to a sink
//! - [`ChangeRecord`] - the immutable description handed to reactions
//! - [`Mutation`] - the kind-specific payload shared by both
//! - [`ChangeKind`] - setting, insertion, removal or replacement

use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Weak};

use crate::key_path::KeyPath;
use crate::source::Observable;
use crate::value::Value;

/// Positions affected by a mutation of an ordered relationship.
pub type IndexSet = BTreeSet<usize>;

/// The kind of change a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeKind {
    /// The whole value was set. Applies to every property.
    Setting,
    /// Elements were added to a relationship.
    Insertion,
    /// Elements were removed from a relationship.
    Removal,
    /// Elements of a relationship were replaced by others.
    Replacement,
}

impl ChangeKind {
    /// Returns `true` for insertion, removal and replacement.
    #[must_use]
    pub const fn is_relationship_mutation(self) -> bool {
        !matches!(self, Self::Setting)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setting => "setting",
            Self::Insertion => "insertion",
            Self::Removal => "removal",
            Self::Replacement => "replacement",
        })
    }
}

/// Kind-specific payload of a change.
///
/// Index sets are `Some` only when the relationship is ordered.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// The whole value was set.
    Setting,

    /// Elements were inserted.
    Insertion {
        /// The inserted elements.
        inserted: Vec<Value>,
        /// Positions of the inserted elements in the new list.
        indexes: Option<IndexSet>,
    },

    /// Elements were removed.
    Removal {
        /// The removed elements.
        removed: Vec<Value>,
        /// Positions the removed elements had in the old list.
        indexes: Option<IndexSet>,
    },

    /// Elements were replaced.
    Replacement {
        /// The old elements.
        replaced: Vec<Value>,
        /// The new elements.
        replacements: Vec<Value>,
        /// Positions at which the replacement occurred.
        indexes: Option<IndexSet>,
    },
}

impl Mutation {
    /// The kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Setting => ChangeKind::Setting,
            Self::Insertion { .. } => ChangeKind::Insertion,
            Self::Removal { .. } => ChangeKind::Removal,
            Self::Replacement { .. } => ChangeKind::Replacement,
        }
    }
}

/// A raw change event delivered by a change source to a [`ChangeSink`](crate::ChangeSink).
///
/// For prior events `current` carries the value the property is about to
/// take; it is used for equality filtering and is not exposed to reactions.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    /// The key path the receiving sink subscribed to.
    pub key_path: KeyPath,

    /// Whether the change has not happened yet.
    pub is_prior: bool,

    /// Value after the change (pending value for prior events).
    pub current: Option<Value>,

    /// Value before the change.
    pub previous: Option<Value>,

    /// Kind-specific payload.
    pub mutation: Mutation,
}

impl ChangeEvent {
    /// Creates a setting event.
    #[must_use]
    pub fn setting(
        key_path: KeyPath,
        is_prior: bool,
        previous: Option<Value>,
        current: Option<Value>,
    ) -> Self {
        Self {
            key_path,
            is_prior,
            current,
            previous,
            mutation: Mutation::Setting,
        }
    }

    /// The kind of change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.mutation.kind()
    }
}

/// An immutable description of one observed change.
///
/// Records are built fresh for each dispatch and handed to every reaction by
/// reference. You do not create them; they are produced by
/// [`PropertyObserver`](crate::PropertyObserver).
///
/// A record refers to its target weakly, so a record kept past its dispatch
/// never keeps the observed object alive.
///
/// # Example
///
/// ```rust,ignore
/// observer.report_change(|change| {
///     if change.is_initial() {
///         println!("starting at {:?}", change.current_value());
///     } else if let Some(inserted) = change.inserted() {
///         println!("{} new items", inserted.len());
///     }
/// })?;
/// ```
#[derive(Clone)]
pub struct ChangeRecord {
    target: Weak<dyn Observable>,
    key_path: KeyPath,
    current: Option<Value>,
    previous: Option<Value>,
    is_prior: bool,
    is_initial: bool,
    mutation: Mutation,
}

impl ChangeRecord {
    /// Builds the record reporting the current value at registration time.
    pub(crate) fn initial(
        target: &Arc<dyn Observable>,
        key_path: KeyPath,
        current: Option<Value>,
    ) -> Self {
        Self {
            target: Arc::downgrade(target),
            key_path,
            current,
            previous: None,
            is_prior: false,
            is_initial: true,
            mutation: Mutation::Setting,
        }
    }

    /// Builds the record for a raw event.
    pub(crate) fn from_event(target: &Arc<dyn Observable>, event: &ChangeEvent) -> Self {
        let current = if event.is_prior {
            None
        } else {
            event.current.clone()
        };

        let previous = match event.mutation {
            Mutation::Setting => event.previous.clone(),
            _ => None,
        };

        Self {
            target: Arc::downgrade(target),
            key_path: event.key_path.clone(),
            current,
            previous,
            is_prior: event.is_prior,
            is_initial: false,
            mutation: event.mutation.clone(),
        }
    }

    /// Object whose property did (or will) change, if it is still alive.
    ///
    /// Always `Some` while the record is being dispatched.
    #[must_use]
    pub fn target(&self) -> Option<Arc<dyn Observable>> {
        self.target.upgrade()
    }

    /// Key path of the property that did (or will) change.
    #[must_use]
    pub const fn key_path(&self) -> &KeyPath {
        &self.key_path
    }

    /// Kind of change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.mutation.kind()
    }

    /// The kind-specific payload.
    #[must_use]
    pub const fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// Value after the change. Always `None` for prior records.
    #[must_use]
    pub const fn current_value(&self) -> Option<&Value> {
        self.current.as_ref()
    }

    /// Value before the change.
    ///
    /// Available only for [`ChangeKind::Setting`]; `None` for initial records.
    #[must_use]
    pub const fn previous_value(&self) -> Option<&Value> {
        self.previous.as_ref()
    }

    /// Whether the record describes a change that has not happened yet.
    #[must_use]
    pub const fn is_prior(&self) -> bool {
        self.is_prior
    }

    /// Whether the record was produced at registration time rather than by a
    /// real mutation.
    #[must_use]
    pub const fn is_initial(&self) -> bool {
        self.is_initial
    }

    /// Inserted elements, for insertions.
    #[must_use]
    pub fn inserted(&self) -> Option<&[Value]> {
        match &self.mutation {
            Mutation::Insertion { inserted, .. } => Some(inserted),
            _ => None,
        }
    }

    /// Positions of inserted elements, for insertions into ordered relationships.
    #[must_use]
    pub const fn inserted_indexes(&self) -> Option<&IndexSet> {
        match &self.mutation {
            Mutation::Insertion { indexes, .. } => indexes.as_ref(),
            _ => None,
        }
    }

    /// Removed elements, for removals.
    #[must_use]
    pub fn removed(&self) -> Option<&[Value]> {
        match &self.mutation {
            Mutation::Removal { removed, .. } => Some(removed),
            _ => None,
        }
    }

    /// Former positions of removed elements, for ordered relationships.
    #[must_use]
    pub const fn removed_indexes(&self) -> Option<&IndexSet> {
        match &self.mutation {
            Mutation::Removal { indexes, .. } => indexes.as_ref(),
            _ => None,
        }
    }

    /// Old elements, for replacements.
    #[must_use]
    pub fn replaced(&self) -> Option<&[Value]> {
        match &self.mutation {
            Mutation::Replacement { replaced, .. } => Some(replaced),
            _ => None,
        }
    }

    /// New elements, for replacements.
    #[must_use]
    pub fn replacements(&self) -> Option<&[Value]> {
        match &self.mutation {
            Mutation::Replacement { replacements, .. } => Some(replacements),
            _ => None,
        }
    }

    /// Positions of replaced elements, for ordered relationships.
    #[must_use]
    pub const fn replaced_indexes(&self) -> Option<&IndexSet> {
        match &self.mutation {
            Mutation::Replacement { indexes, .. } => indexes.as_ref(),
            _ => None,
        }
    }
}

// Manual Debug impl: the target has no Debug bound
impl Debug for ChangeRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRecord")
            .field("key_path", &self.key_path)
            .field("kind", &self.kind())
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("is_prior", &self.is_prior)
            .field("is_initial", &self.is_initial)
            .field("mutation", &self.mutation)
            .finish_non_exhaustive()
    }
}
