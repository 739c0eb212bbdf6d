//! Observable wrapper for typed structs.

use std::collections::BTreeMap;
use std::sync::Weak;

use parking_lot::{ReentrantMutex, RwLock};

use super::{ChangeSink, Observable, PendingChange, SubscriberRegistry, SubscriptionId};
use crate::error::{ObserveError, Result};
use crate::key_path::KeyPath;
use crate::value::{PropertyValue, Value};

/// Key-based access to the fields of a struct.
///
/// This trait is usually derived with `#[derive(KeyValue)]`:
///
/// ```rust,ignore
/// use propwatch::KeyValue;
///
/// #[derive(Clone, KeyValue)]
/// struct Profile {
///     name: String,
///     #[key(rename = "e-mail")]
///     email: Option<String>,
///     #[key(readonly)]
///     id: u64,
///     #[key(nested)]
///     address: Address,
///     #[key(skip)]
///     cache: Vec<u8>,
/// }
/// ```
///
/// Nested fields are reachable with dotted keys (`"address.city"`).
pub trait KeyValue {
    /// All top-level keys, in declaration order.
    fn keys() -> &'static [&'static str];

    /// Reads the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::UnknownKey`] if `key` names no field.
    fn get_key(&self, key: &str) -> Result<Option<Value>>;

    /// Writes the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::UnknownKey`], [`ObserveError::ReadOnly`] or
    /// [`ObserveError::TypeMismatch`] when the write cannot be performed.
    fn set_key(&mut self, key: &str, value: Option<Value>) -> Result<()>;

    /// Collects every key with a value into a map.
    fn to_map(&self) -> BTreeMap<String, Value> {
        Self::keys()
            .iter()
            .filter_map(|key| {
                let value = self.get_key(key).ok().flatten()?;
                Some(((*key).to_string(), value))
            })
            .collect()
    }
}

/// A struct made observable.
///
/// Wraps a value implementing [`KeyValue`] and notifies subscribers whenever
/// it is written through [`set`](Self::set), [`set_value`](Self::set_value)
/// or [`update`](Self::update). Writes are staged on a copy and validated
/// before anyone is notified, so a rejected write produces no events.
///
/// Key paths may continue below a field into its value, so
/// `"settings.theme"` works for a field holding a [`Value::Map`] as well as
/// for a nested `KeyValue` field.
///
/// # Example
///
/// ```rust,ignore
/// let counter = Arc::new(Observed::new(Counter { count: 0 }));
///
/// let observer = PropertyObserver::new(&counter, "count", ObserverOptions::new())?;
/// observer.report_integer(|count| println!("count = {count}"))?;
///
/// counter.set("count", 1_i64)?;
/// counter.update(|c| c.count += 1);
/// ```
pub struct Observed<T> {
    state: RwLock<T>,
    write_lock: ReentrantMutex<()>,
    registry: SubscriberRegistry,
}

impl<T: KeyValue + Clone> Observed<T> {
    /// Wraps `value`.
    pub fn new(value: T) -> Self {
        Self {
            state: RwLock::new(value),
            write_lock: ReentrantMutex::new(()),
            registry: SubscriberRegistry::new(),
        }
    }

    /// Read access to the wrapped value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.read())
    }

    /// A clone of the wrapped value.
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.state.read().clone()
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }

    /// Reads the value at `key_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key path is malformed or unknown.
    pub fn get(&self, key_path: &str) -> Result<Option<Value>> {
        let path = KeyPath::parse(key_path)?;
        resolve(&*self.state.read(), &path)
    }

    /// Reads and decodes the value at `key_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::TypeMismatch`] if the value does not decode
    /// as `V`.
    pub fn get_as<V: PropertyValue>(&self, key_path: &str) -> Result<V> {
        crate::value::decode(key_path, self.get(key_path)?)
    }

    /// Writes `value` at `key_path`, notifying subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the key path is unknown or read-only, or the
    /// value has the wrong type.
    pub fn set<V: PropertyValue>(&self, key_path: &str, value: V) -> Result<()> {
        self.set_value(key_path, value.to_value())
    }

    /// Writes a raw value (or clears it with `None`) at `key_path`.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_value(&self, key_path: &str, value: Option<Value>) -> Result<()> {
        let path = KeyPath::parse(key_path)?;
        self.write(&path, value)
    }

    /// Mutates the value in place and notifies subscribers of every
    /// top-level key whose value changed.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _guard = self.write_lock.lock();

        let before = self.state.read().clone();
        let mut next = before.clone();
        let result = f(&mut next);

        let changes: Vec<PendingChange> = T::keys()
            .iter()
            .filter_map(|key| {
                let old = before.get_key(key).ok().flatten();
                let new = next.get_key(key).ok().flatten();
                if old == new {
                    return None;
                }
                let path = KeyPath::parse(key).ok()?;
                Some(PendingChange::setting(path, new))
            })
            .collect();

        if changes.is_empty() {
            *self.state.write() = next;
            return result;
        }

        tracing::trace!(changed = changes.len(), "update changed keys");

        let outcome: std::result::Result<(), std::convert::Infallible> = self.registry.perform(
            &changes,
            |path| self.read_path(path),
            || {
                *self.state.write() = next;
                Ok(())
            },
        );
        let Ok(()) = outcome;

        result
    }

    /// Number of live subscriptions on this value.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    fn read_path(&self, path: &KeyPath) -> Option<Value> {
        resolve(&*self.state.read(), path).ok().flatten()
    }

    fn write(&self, path: &KeyPath, value: Option<Value>) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut next = self.state.read().clone();
        assign(&mut next, path, value)?;
        let new_value = resolve(&next, path)?;

        let change = PendingChange::setting(path.clone(), new_value);
        self.registry.perform(
            std::slice::from_ref(&change),
            |p| self.read_path(p),
            || {
                *self.state.write() = next;
                Ok(())
            },
        )
    }
}

/// Reads a key path, descending into field values when the struct does not
/// resolve the dotted key itself.
fn resolve<T: KeyValue>(state: &T, path: &KeyPath) -> Result<Option<Value>> {
    match state.get_key(path.as_str()) {
        Err(ObserveError::UnknownKey { .. }) if !path.is_simple() => {
            let root = state.get_key(path.first())?;
            Ok(root.and_then(|value| value.get_path(path.segments().skip(1)).cloned()))
        }
        other => other,
    }
}

fn assign<T: KeyValue>(state: &mut T, path: &KeyPath, value: Option<Value>) -> Result<()> {
    match state.set_key(path.as_str(), value.clone()) {
        Err(ObserveError::UnknownKey { .. }) if !path.is_simple() => {
            let mut root = state
                .get_key(path.first())?
                .unwrap_or_else(|| Value::Map(BTreeMap::new()));
            let rest: Vec<&str> = path.segments().skip(1).collect();

            root.set_path(&rest, value)
                .map_err(|found| ObserveError::type_mismatch(path.as_str(), "map", found))?;
            state.set_key(path.first(), Some(root))
        }
        other => other,
    }
}

impl<T> std::fmt::Debug for Observed<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observed")
            .field("state", &*self.state.read())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<T> Observable for Observed<T>
where
    T: KeyValue + Clone + Send + Sync + 'static,
{
    fn value_at(&self, key_path: &KeyPath) -> Result<Option<Value>> {
        resolve(&*self.state.read(), key_path)
    }

    fn set_value_at(&self, key_path: &KeyPath, value: Option<Value>) -> Result<()> {
        self.write(key_path, value)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::decode;

    // Hand-written impl; the derive is covered by integration tests.
    #[derive(Clone, Debug, Default)]
    struct Settings {
        volume: i64,
        theme: Option<String>,
        extra: BTreeMap<String, Value>,
    }

    impl KeyValue for Settings {
        fn keys() -> &'static [&'static str] {
            &["volume", "theme", "extra"]
        }

        fn get_key(&self, key: &str) -> Result<Option<Value>> {
            match key {
                "volume" => Ok(self.volume.to_value()),
                "theme" => Ok(self.theme.to_value()),
                "extra" => Ok(self.extra.to_value()),
                other => Err(ObserveError::unknown_key(other)),
            }
        }

        fn set_key(&mut self, key: &str, value: Option<Value>) -> Result<()> {
            match key {
                "volume" => self.volume = decode(key, value)?,
                "theme" => self.theme = decode(key, value)?,
                "extra" => self.extra = decode(key, value)?,
                other => return Err(ObserveError::unknown_key(other)),
            }
            Ok(())
        }
    }

    #[test]
    fn test_get_and_set() {
        let observed = Observed::new(Settings::default());
        observed.set("volume", 7_i64).unwrap();
        observed.set("theme", Some("dark".to_string())).unwrap();

        assert_eq!(observed.get_as::<i64>("volume").unwrap(), 7);
        assert_eq!(observed.get("theme").unwrap(), Some("dark".into()));
        observed.set_value("theme", None).unwrap();
        assert_eq!(observed.get("theme").unwrap(), None);
    }

    #[test]
    fn test_rejected_write_leaves_state() {
        let observed = Observed::new(Settings::default());
        let err = observed.set("volume", "loud".to_string()).unwrap_err();
        assert!(matches!(err, ObserveError::TypeMismatch { .. }));
        assert!(matches!(
            observed.get("bogus"),
            Err(ObserveError::UnknownKey { .. })
        ));
        assert_eq!(observed.read(|s| s.volume), 0);
    }

    #[test]
    fn test_dotted_path_into_field_value() {
        let observed = Observed::new(Settings::default());
        observed.set("extra.color", "red".to_string()).unwrap();

        assert_eq!(observed.get("extra.color").unwrap(), Some("red".into()));
        assert_eq!(observed.get("extra.missing").unwrap(), None);
        assert!(observed.snapshot().extra.contains_key("color"));
    }

    #[test]
    fn test_to_map_skips_empty() {
        let settings = Settings {
            volume: 3,
            ..Settings::default()
        };
        let map = settings.to_map();
        assert_eq!(map.get("volume"), Some(&Value::Integer(3)));
        assert!(!map.contains_key("theme"));
    }

    #[test]
    fn test_update_returns_closure_result() {
        let observed = Observed::new(Settings::default());
        let doubled = observed.update(|s| {
            s.volume = 21;
            s.volume * 2
        });
        assert_eq!(doubled, 42);
        assert_eq!(observed.into_inner().volume, 21);
    }
}
