//! Derived properties: keeping one key path in sync with another.
//!
//! A mapping is an ordinary [`PropertyObserver`] with default options and a
//! single set action. Because the initial record is delivered right away,
//! the destination is populated as soon as the mapping exists.
//!
//! ```rust
//! use std::sync::Arc;
//! use propwatch::{Mapping, ObservableObject, ObserveExt, transforms};
//!
//! let form = Arc::new(ObservableObject::new().with("busy", false));
//! let _mapping = form.map("busy", "enabled", Mapping::transform(transforms::invert_bool))?;
//!
//! assert_eq!(form.get("enabled")?, Some(true.into()));
//! form.set("busy", true)?;
//! assert_eq!(form.get("enabled")?, Some(false.into()));
//! # Ok::<(), propwatch::ObserveError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use super::PropertyObserver;
use crate::error::{BoxError, Result};
use crate::options::ObserverOptions;
use crate::source::Observable;
use crate::value::Value;

/// Shared transform function.
pub type Transform =
    Arc<dyn Fn(Option<&Value>) -> std::result::Result<Option<Value>, BoxError> + Send + Sync>;

/// How the source value becomes the destination value.
#[derive(Clone)]
pub enum Mapping {
    /// Copy the value as is; an absent value clears the destination.
    Identity,

    /// Copy the value, writing the given value when the source is absent.
    NullReplacement(Value),

    /// Compute the destination value.
    Transform(Transform),
}

impl Mapping {
    /// Wraps a transform function.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> std::result::Result<Option<Value>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::Transform(Arc::new(f))
    }

    /// Shorthand for [`Mapping::NullReplacement`].
    pub fn or(replacement: impl Into<Value>) -> Self {
        Self::NullReplacement(replacement.into())
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::NullReplacement(value) => f.debug_tuple("NullReplacement").field(value).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Keeps `destination_path` on `destination` in sync with `source_path` on
/// `source`.
///
/// The mapping lives as long as the returned observer; keep it (for
/// instance in an [`ObserverSet`](crate::ObserverSet)).
///
/// # Errors
///
/// Returns an error if either key path is malformed or the source cannot
/// observe `source_path`.
pub fn map_property<S, D>(
    source: &Arc<S>,
    source_path: &str,
    destination: &Arc<D>,
    destination_path: &str,
    mapping: Mapping,
) -> Result<PropertyObserver>
where
    S: Observable,
    D: Observable,
{
    let observer = PropertyObserver::new(source, source_path, ObserverOptions::new())?;

    match mapping {
        Mapping::Identity => {
            observer.set_value_on(destination, destination_path, None)?;
        }
        Mapping::NullReplacement(replacement) => {
            observer.set_value_on(destination, destination_path, Some(replacement))?;
        }
        Mapping::Transform(transform) => {
            observer.set_transformed_on(destination, destination_path, move |value| {
                transform(value)
            })?;
        }
    }

    tracing::debug!(source_path, destination_path, "mapping created");
    Ok(observer)
}

/// Observation shorthands for shared observable objects.
pub trait ObserveExt {
    /// Observes `key_path` with default options.
    ///
    /// # Errors
    ///
    /// See [`PropertyObserver::new`].
    fn observe(&self, key_path: &str) -> Result<PropertyObserver>;

    /// Observes `key_path` with `options`.
    ///
    /// # Errors
    ///
    /// See [`PropertyObserver::new`].
    fn observe_with(&self, key_path: &str, options: ObserverOptions) -> Result<PropertyObserver>;

    /// Maps one key path of this object to another.
    ///
    /// # Errors
    ///
    /// See [`map_property`].
    fn map(&self, source_path: &str, destination_path: &str, mapping: Mapping)
    -> Result<PropertyObserver>;

    /// Copies one key path to another, writing `replacement` when the source
    /// is absent.
    ///
    /// # Errors
    ///
    /// See [`map_property`].
    fn map_or(
        &self,
        source_path: &str,
        destination_path: &str,
        replacement: impl Into<Value>,
    ) -> Result<PropertyObserver>;
}

impl<T: Observable> ObserveExt for Arc<T> {
    fn observe(&self, key_path: &str) -> Result<PropertyObserver> {
        PropertyObserver::new(self, key_path, ObserverOptions::new())
    }

    fn observe_with(&self, key_path: &str, options: ObserverOptions) -> Result<PropertyObserver> {
        PropertyObserver::new(self, key_path, options)
    }

    fn map(
        &self,
        source_path: &str,
        destination_path: &str,
        mapping: Mapping,
    ) -> Result<PropertyObserver> {
        map_property(self, source_path, self, destination_path, mapping)
    }

    fn map_or(
        &self,
        source_path: &str,
        destination_path: &str,
        replacement: impl Into<Value>,
    ) -> Result<PropertyObserver> {
        map_property(
            self,
            source_path,
            self,
            destination_path,
            Mapping::or(replacement),
        )
    }
}

/// Ready-made transforms for [`Mapping::transform`].
pub mod transforms {
    use thiserror::Error;

    use crate::error::BoxError;
    use crate::value::Value;

    /// A value that does not read as a boolean.
    #[derive(Debug, Error)]
    #[error("cannot read a {found} value as bool")]
    pub struct NotABool {
        /// Type name of the offending value.
        pub found: &'static str,
    }

    /// `true` when the value is absent.
    ///
    /// # Errors
    ///
    /// Never fails.
    #[allow(clippy::unnecessary_wraps)]
    pub fn is_none(value: Option<&Value>) -> Result<Option<Value>, BoxError> {
        Ok(Some(Value::Bool(value.is_none())))
    }

    /// `true` when the value is present.
    ///
    /// # Errors
    ///
    /// Never fails.
    #[allow(clippy::unnecessary_wraps)]
    pub fn is_some(value: Option<&Value>) -> Result<Option<Value>, BoxError> {
        Ok(Some(Value::Bool(value.is_some())))
    }

    /// The boolean negation of the value. An absent value reads as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`NotABool`] if the value cannot be read as a boolean.
    pub fn invert_bool(value: Option<&Value>) -> Result<Option<Value>, BoxError> {
        let current = match value {
            None => false,
            Some(value) => value.to_bool().ok_or(NotABool {
                found: value.type_name(),
            })?,
        };
        Ok(Some(Value::Bool(!current)))
    }

    /// A value that is not an absolute URL string.
    #[derive(Debug, Error)]
    #[error("{text:?} is not an absolute URL")]
    pub struct NotAUrl {
        /// The rejected text, or the type name for non-string values.
        pub text: String,
    }

    /// Validates a string as an absolute URL (`scheme:rest`) and passes it
    /// on trimmed. An absent value stays absent.
    ///
    /// # Errors
    ///
    /// Returns [`NotAUrl`] for non-string values, a missing or malformed
    /// scheme, or an empty remainder.
    pub fn url_from_string(value: Option<&Value>) -> Result<Option<Value>, BoxError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let Some(text) = value.as_str() else {
            return Err(NotAUrl {
                text: value.type_name().to_string(),
            }
            .into());
        };

        let text = text.trim();
        let valid = text.split_once(':').is_some_and(|(scheme, rest)| {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && !rest.is_empty()
                && !rest.chars().any(char::is_whitespace)
        });
        if !valid {
            return Err(NotAUrl {
                text: text.to_string(),
            }
            .into());
        }
        Ok(Some(Value::from(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObservableObject;
    use crate::error::ObserveError;

    #[test]
    fn test_identity_across_objects() {
        let source = Arc::new(ObservableObject::new().with("title", "draft"));
        let destination = Arc::new(ObservableObject::new());

        let _mapping =
            map_property(&source, "title", &destination, "header.text", Mapping::Identity).unwrap();
        assert_eq!(destination.get("header.text").unwrap(), Some("draft".into()));

        source.set("title", "final").unwrap();
        assert_eq!(destination.get("header.text").unwrap(), Some("final".into()));

        source.set_value("title", None).unwrap();
        assert_eq!(destination.get("header.text").unwrap(), None);
    }

    #[test]
    fn test_null_replacement() {
        let object = Arc::new(ObservableObject::new());
        let _mapping = object.map_or("nickname", "display", "anonymous").unwrap();
        assert_eq!(object.get("display").unwrap(), Some("anonymous".into()));

        object.set("nickname", "ada").unwrap();
        assert_eq!(object.get("display").unwrap(), Some("ada".into()));
    }

    #[test]
    fn test_builtin_transforms() {
        assert_eq!(transforms::is_none(None).unwrap(), Some(Value::Bool(true)));
        assert_eq!(
            transforms::is_some(Some(&Value::Integer(0))).unwrap(),
            Some(Value::Bool(true))
        );
        assert_eq!(transforms::invert_bool(None).unwrap(), Some(Value::Bool(true)));
        assert_eq!(
            transforms::invert_bool(Some(&Value::Bool(true))).unwrap(),
            Some(Value::Bool(false))
        );
        assert!(transforms::invert_bool(Some(&Value::List(vec![]))).is_err());
    }

    #[test]
    fn test_url_from_string() {
        let url = |text: &str| transforms::url_from_string(Some(&Value::from(text)));

        assert_eq!(
            url("  https://example.com/a?b=1 ").unwrap(),
            Some(Value::from("https://example.com/a?b=1"))
        );
        assert_eq!(url("mailto:ada@example.com").unwrap(), Some(Value::from("mailto:ada@example.com")));
        assert_eq!(transforms::url_from_string(None).unwrap(), None);

        assert!(url("").is_err());
        assert!(url("example.com").is_err());
        assert!(url("1http://x").is_err());
        assert!(url("http:").is_err());
        assert!(url("http://a b").is_err());
        let err = transforms::url_from_string(Some(&Value::Integer(3))).unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_transform_failure_reported() {
        let object = Arc::new(ObservableObject::new().with("flag", true));
        let mapping = object
            .map("flag", "negated", Mapping::transform(transforms::invert_bool))
            .unwrap();

        let errors = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        mapping.on_error(move |err| sink.lock().push(matches!(err, ObserveError::Transform { .. })));

        object.set("flag", Value::List(vec![])).unwrap();

        assert_eq!(*errors.lock(), vec![true]);
        assert_eq!(object.get("negated").unwrap(), Some(false.into()));
    }

    #[test]
    fn test_dropped_destination_is_skipped() {
        let source = Arc::new(ObservableObject::new().with("count", 1));
        let destination = Arc::new(ObservableObject::new());
        let mapping =
            map_property(&source, "count", &destination, "copy", Mapping::Identity).unwrap();

        drop(destination);
        source.set("count", 2).unwrap();
        assert_eq!(mapping.action_count(), 1);
    }
}
