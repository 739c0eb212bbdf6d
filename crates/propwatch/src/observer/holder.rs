//! Ownership of a group of observers.

use std::sync::Arc;

use parking_lot::Mutex;

use super::PropertyObserver;
use crate::source::Observable;

/// Owns observers and removes them together.
///
/// Keep one per owning object (a view model, a controller) and put every
/// observer it creates in it. Dropping the set removes all of them.
///
/// ```rust
/// use std::sync::Arc;
/// use propwatch::{ObservableObject, ObserveExt, ObserverSet};
///
/// let model = Arc::new(ObservableObject::new().with("count", 0));
/// let observers = ObserverSet::new();
///
/// observers.insert(model.observe("count")?);
/// observers.insert(model.map_or("count", "label", 0)?);
/// assert_eq!(observers.len(), 2);
///
/// assert_eq!(observers.remove_all_of(&model), 2);
/// assert!(observers.is_empty());
/// # Ok::<(), propwatch::ObserveError>(())
/// ```
#[derive(Debug, Default)]
pub struct ObserverSet {
    observers: Mutex<Vec<PropertyObserver>>,
}

impl ObserverSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `observer`.
    pub fn insert(&self, observer: PropertyObserver) {
        self.observers.lock().push(observer);
    }

    /// Number of observers held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Returns `true` if no observer is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }

    /// Removes every observer from its target. Returns how many were held.
    pub fn remove_all(&self) -> usize {
        let observers = std::mem::take(&mut *self.observers.lock());
        for observer in &observers {
            observer.remove_from_target();
        }
        observers.len()
    }

    /// Removes the observers watching `target`. Returns how many were removed.
    pub fn remove_all_of<T: Observable + ?Sized>(&self, target: &Arc<T>) -> usize {
        let removed: Vec<PropertyObserver> = {
            let mut observers = self.observers.lock();
            let (matching, kept) = std::mem::take(&mut *observers)
                .into_iter()
                .partition(|o| o.is_observing(target));
            *observers = kept;
            matching
        };

        for observer in &removed {
            observer.remove_from_target();
        }
        removed.len()
    }
}

impl Drop for ObserverSet {
    fn drop(&mut self) {
        let count = self.remove_all();
        if count > 0 {
            tracing::debug!(count, "observer set dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObservableObject, ObserveExt};

    #[test]
    fn test_remove_all_of_only_touches_target() {
        let first = Arc::new(ObservableObject::new().with("a", 1));
        let second = Arc::new(ObservableObject::new().with("a", 1));
        let set = ObserverSet::new();

        let kept = second.observe("a").unwrap();
        set.insert(first.observe("a").unwrap());
        set.insert(kept.clone());

        assert_eq!(set.remove_all_of(&first), 1);
        assert_eq!(set.len(), 1);
        assert!(!kept.is_removed());
        assert_eq!(first.subscription_count(), 0);
    }

    #[test]
    fn test_drop_removes_everything() {
        let object = Arc::new(ObservableObject::new().with("a", 1));
        let observer = object.observe("a").unwrap();

        {
            let set = ObserverSet::new();
            set.insert(observer.clone());
        }

        assert!(observer.is_removed());
        assert_eq!(object.subscription_count(), 0);
    }
}
