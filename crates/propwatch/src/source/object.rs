//! A dynamic observable property bag.

use std::collections::BTreeMap;
use std::sync::Weak;

use parking_lot::{ReentrantMutex, RwLock};

use super::{ChangeSink, Observable, PendingChange, SubscriberRegistry, SubscriptionId};
use crate::change::{IndexSet, Mutation};
use crate::error::{ObserveError, Result};
use crate::key_path::KeyPath;
use crate::value::Value;

/// An object holding named properties that can be observed by key path.
///
/// Properties are stored as a tree of [`Value`]s. Dotted key paths address
/// nested maps (and list elements by index); writing below a missing key
/// creates the intermediate maps. A key that was never set reads as `None`.
///
/// Besides plain settings, the object supports relationship mutations that
/// produce insertion, removal and replacement changes:
/// - ordered (`Value::List`): [`insert`](Self::insert), [`push`](Self::push),
///   [`remove_at`](Self::remove_at), [`replace_at`](Self::replace_at)
/// - unordered (`Value::Set`): [`add_to_set`](Self::add_to_set),
///   [`remove_from_set`](Self::remove_from_set)
///
/// Mutations are serialized; a reaction may mutate the same object again
/// from the thread that is dispatching.
///
/// # Example
///
/// ```rust
/// use propwatch::ObservableObject;
///
/// let object = ObservableObject::new().with("count", 1);
/// object.set("count", 2)?;
/// object.push("items", "first")?;
///
/// assert_eq!(object.get("count")?, Some(2.into()));
/// # Ok::<(), propwatch::ObserveError>(())
/// ```
pub struct ObservableObject {
    properties: RwLock<Value>,
    write_lock: ReentrantMutex<()>,
    registry: SubscriberRegistry,
}

impl ObservableObject {
    /// Creates an object with no properties.
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties: RwLock::new(Value::Map(BTreeMap::new())),
            write_lock: ReentrantMutex::new(()),
            registry: SubscriberRegistry::new(),
        }
    }

    /// Sets a top-level property without notifying anyone.
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Map(map) = &mut *self.properties.write() {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Reads the value at `key_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::InvalidKeyPath`] if the key path is malformed.
    pub fn get(&self, key_path: &str) -> Result<Option<Value>> {
        let path = KeyPath::parse(key_path)?;
        Ok(self.read(&path))
    }

    /// Sets the value at `key_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key path is malformed or passes through a
    /// value that is not a map.
    pub fn set(&self, key_path: &str, value: impl Into<Value>) -> Result<()> {
        self.set_value(key_path, Some(value.into()))
    }

    /// Sets or clears (`None`) the value at `key_path`.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_value(&self, key_path: &str, value: Option<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        self.write_setting(&path, value)
    }

    /// Number of live subscriptions on this object.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    // ========================================================================
    // Ordered relationships
    // ========================================================================

    /// Inserts `values` into the list at `key_path`, starting at `index`.
    ///
    /// A missing property is treated as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::NotACollection`] if the property is not a list
    /// and [`ObserveError::IndexOutOfBounds`] if `index` is past the end.
    pub fn insert(&self, key_path: &str, index: usize, values: Vec<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        let _guard = self.write_lock.lock();

        let mut items = self.list_at(&path)?;
        if index > items.len() {
            return Err(ObserveError::index_out_of_bounds(key_path, index, items.len()));
        }
        if values.is_empty() {
            return Ok(());
        }

        let indexes: IndexSet = (index..index + values.len()).collect();
        items.splice(index..index, values.iter().cloned());

        self.write_mutation(
            &path,
            Value::List(items),
            Mutation::Insertion {
                inserted: values,
                indexes: Some(indexes),
            },
        )
    }

    /// Appends `value` to the list at `key_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::NotACollection`] if the property is not a list.
    pub fn push(&self, key_path: &str, value: impl Into<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        let _guard = self.write_lock.lock();
        let len = self.list_at(&path)?.len();
        self.insert(key_path, len, vec![value.into()])
    }

    /// Removes the elements at `indexes` (positions in the current list).
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::NotACollection`] if the property is not a list
    /// and [`ObserveError::IndexOutOfBounds`] if any index is past the end.
    pub fn remove_at(
        &self,
        key_path: &str,
        indexes: impl IntoIterator<Item = usize>,
    ) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        let indexes: IndexSet = indexes.into_iter().collect();
        let _guard = self.write_lock.lock();

        let items = self.list_at(&path)?;
        if let Some(&bad) = indexes.iter().find(|&&i| i >= items.len()) {
            return Err(ObserveError::index_out_of_bounds(key_path, bad, items.len()));
        }
        if indexes.is_empty() {
            return Ok(());
        }

        let (removed, kept): (Vec<_>, Vec<_>) = items
            .into_iter()
            .enumerate()
            .partition(|(i, _)| indexes.contains(i));

        self.write_mutation(
            &path,
            Value::List(kept.into_iter().map(|(_, v)| v).collect()),
            Mutation::Removal {
                removed: removed.into_iter().map(|(_, v)| v).collect(),
                indexes: Some(indexes),
            },
        )
    }

    /// Replaces `values.len()` elements starting at `index` with `values`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::NotACollection`] if the property is not a list
    /// and [`ObserveError::IndexOutOfBounds`] if the range runs past the end.
    pub fn replace_at(&self, key_path: &str, index: usize, values: Vec<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        let _guard = self.write_lock.lock();

        let mut items = self.list_at(&path)?;
        let Some(end) = index
            .checked_add(values.len())
            .filter(|&end| end <= items.len())
        else {
            let bad = index.saturating_add(values.len()).saturating_sub(1).max(index);
            return Err(ObserveError::index_out_of_bounds(key_path, bad, items.len()));
        };
        if values.is_empty() {
            return Ok(());
        }

        let replaced: Vec<Value> = items.splice(index..end, values.iter().cloned()).collect();

        self.write_mutation(
            &path,
            Value::List(items),
            Mutation::Replacement {
                replaced,
                replacements: values,
                indexes: Some((index..end).collect()),
            },
        )
    }

    // ========================================================================
    // Unordered relationships
    // ========================================================================

    /// Adds `values` to the set at `key_path`. Values already present are
    /// skipped; if nothing is new, no change is reported.
    ///
    /// A missing property is treated as an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::NotACollection`] if the property is not a set.
    pub fn add_to_set(&self, key_path: &str, values: Vec<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        let _guard = self.write_lock.lock();

        let mut members = self.set_at(&path)?;
        let mut inserted = Vec::new();
        for value in values {
            if !members.contains(&value) && !inserted.contains(&value) {
                inserted.push(value);
            }
        }
        if inserted.is_empty() {
            return Ok(());
        }

        members.extend(inserted.iter().cloned());

        self.write_mutation(
            &path,
            Value::Set(members),
            Mutation::Insertion {
                inserted,
                indexes: None,
            },
        )
    }

    /// Removes `values` from the set at `key_path`. Values not present are
    /// skipped; if nothing is removed, no change is reported.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::NotACollection`] if the property is not a set.
    pub fn remove_from_set(&self, key_path: &str, values: Vec<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        let _guard = self.write_lock.lock();

        let members = self.set_at(&path)?;
        let (removed, kept): (Vec<_>, Vec<_>) =
            members.into_iter().partition(|member| values.contains(member));
        if removed.is_empty() {
            return Ok(());
        }

        self.write_mutation(
            &path,
            Value::Set(kept),
            Mutation::Removal {
                removed,
                indexes: None,
            },
        )
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read(&self, path: &KeyPath) -> Option<Value> {
        self.properties.read().get_path(path.segments()).cloned()
    }

    fn list_at(&self, path: &KeyPath) -> Result<Vec<Value>> {
        match self.read(path) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => Ok(items),
            Some(_) => Err(ObserveError::not_a_collection(path.as_str(), "list")),
        }
    }

    fn set_at(&self, path: &KeyPath) -> Result<Vec<Value>> {
        match self.read(path) {
            None => Ok(Vec::new()),
            Some(Value::Set(members)) => Ok(members),
            Some(_) => Err(ObserveError::not_a_collection(path.as_str(), "set")),
        }
    }

    /// Every intermediate segment must be absent or a map.
    fn check_writable(&self, path: &KeyPath) -> Result<()> {
        let properties = self.properties.read();
        let segments: Vec<&str> = path.segments().collect();
        let mut current = &*properties;

        for segment in &segments[..segments.len() - 1] {
            let Value::Map(map) = current else {
                return Err(ObserveError::type_mismatch(
                    path.as_str(),
                    "map",
                    current.type_name(),
                ));
            };
            match map.get(*segment) {
                Some(child) => current = child,
                None => return Ok(()),
            }
        }

        match current {
            Value::Map(_) => Ok(()),
            other => Err(ObserveError::type_mismatch(path.as_str(), "map", other.type_name())),
        }
    }

    fn write_setting(&self, path: &KeyPath, value: Option<Value>) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.check_writable(path)?;

        let change = PendingChange::setting(path.clone(), value.clone());
        self.apply(&change, value)
    }

    fn write_mutation(&self, path: &KeyPath, new_value: Value, mutation: Mutation) -> Result<()> {
        self.check_writable(path)?;

        let change = PendingChange::mutation(path.clone(), Some(new_value.clone()), mutation);
        self.apply(&change, Some(new_value))
    }

    fn apply(&self, change: &PendingChange, value: Option<Value>) -> Result<()> {
        let segments: Vec<&str> = change.key_path.segments().collect();

        self.registry.perform(
            std::slice::from_ref(change),
            |path| self.read(path),
            || {
                self.properties
                    .write()
                    .set_path(&segments, value)
                    .map_err(|found| {
                        ObserveError::type_mismatch(change.key_path.as_str(), "map", found)
                    })
            },
        )
    }
}

impl Default for ObservableObject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObservableObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableObject")
            .field("properties", &*self.properties.read())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Observable for ObservableObject {
    fn value_at(&self, key_path: &KeyPath) -> Result<Option<Value>> {
        Ok(self.read(key_path))
    }

    fn set_value_at(&self, key_path: &KeyPath, value: Option<Value>) -> Result<()> {
        self.write_setting(key_path, value)
    }

    fn subscribe(
        &self,
        key_path: &KeyPath,
        wants_prior: bool,
        sink: Weak<dyn ChangeSink>,
    ) -> Result<SubscriptionId> {
        Ok(self.registry.subscribe(key_path, wants_prior, sink))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.unsubscribe(id);
    }
}
