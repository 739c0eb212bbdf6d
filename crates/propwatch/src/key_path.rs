//! Dotted accessor chains.
//!
//! A [`KeyPath`] names a (possibly nested) property on an observable object,
//! such as `"count"` or `"address.city"`. Key paths are validated once when
//! they are parsed and are cheap to clone afterwards.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ObserveError;

/// An immutable, validated, dot-separated key path.
///
/// # Example
///
/// ```rust
/// use propwatch::KeyPath;
///
/// let path = KeyPath::parse("address.city")?;
/// assert_eq!(path.first(), "address");
/// assert_eq!(path.len(), 2);
///
/// let parent = KeyPath::parse("address")?;
/// assert!(parent.is_ancestor_of(&path));
/// assert_eq!(path.relative_to(&parent).unwrap().as_str(), "city");
/// # Ok::<(), propwatch::ObserveError>(())
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Arc<str>);

impl KeyPath {
    /// Parses and validates a key path.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::InvalidKeyPath`] if the text is empty, has an
    /// empty segment (`"a..b"`, `".a"`, `"a."`) or a segment containing
    /// whitespace.
    pub fn parse(text: &str) -> Result<Self, ObserveError> {
        if text.is_empty() {
            return Err(ObserveError::invalid_key_path(text, "key path is empty"));
        }

        for segment in text.split('.') {
            if segment.is_empty() {
                return Err(ObserveError::invalid_key_path(text, "empty segment"));
            }

            if segment.chars().any(char::is_whitespace) {
                return Err(ObserveError::invalid_key_path(
                    text,
                    "segment contains whitespace",
                ));
            }
        }

        Ok(Self(Arc::from(text)))
    }

    /// The key path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split('.')
    }

    /// The first segment (the property on the target itself).
    #[must_use]
    pub fn first(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Number of segments. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.split('.').count()
    }

    /// Key paths are never empty; provided for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if this path names a single property.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        !self.0.contains('.')
    }

    /// Returns `true` if `other` lies strictly beneath this path.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other
            .0
            .strip_prefix(&*self.0)
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// The remainder of this path below `ancestor`, if `ancestor` is one.
    #[must_use]
    pub fn relative_to(&self, ancestor: &Self) -> Option<Self> {
        self.0
            .strip_prefix(&*ancestor.0)
            .and_then(|rest| rest.strip_prefix('.'))
            .map(|rest| Self(Arc::from(rest)))
    }

    /// Appends segments to this path.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::InvalidKeyPath`] if `suffix` is not itself a
    /// valid key path.
    pub fn join(&self, suffix: &str) -> Result<Self, ObserveError> {
        Self::parse(&format!("{}.{suffix}", self.0))
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPath({:?})", &*self.0)
    }
}

impl FromStr for KeyPath {
    type Err = ObserveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for KeyPath {
    type Error = ObserveError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for KeyPath {
    type Error = ObserveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&KeyPath> for KeyPath {
    type Error = ObserveError;

    fn try_from(value: &KeyPath) -> Result<Self, Self::Error> {
        Ok(value.clone())
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for KeyPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for KeyPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let path = KeyPath::parse("count").unwrap();
        assert_eq!(path.as_str(), "count");
        assert!(path.is_simple());
        assert_eq!(path.len(), 1);

        let path: KeyPath = "a.b.c".parse().unwrap();
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(path.first(), "a");
        assert!(!path.is_simple());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", ".", "a..b", ".a", "a.", "a b", "a.\tb"] {
            let result = KeyPath::parse(bad);
            assert!(
                matches!(result, Err(ObserveError::InvalidKeyPath { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_ancestry() {
        let a = KeyPath::parse("address").unwrap();
        let ac = KeyPath::parse("address.city").unwrap();
        let ab = KeyPath::parse("addressbook").unwrap();

        assert!(a.is_ancestor_of(&ac));
        assert!(!a.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&ab));
        assert!(!ac.is_ancestor_of(&a));

        assert_eq!(ac.relative_to(&a).unwrap().as_str(), "city");
        assert!(ab.relative_to(&a).is_none());
    }

    #[test]
    fn test_join() {
        let a = KeyPath::parse("address").unwrap();
        assert_eq!(a.join("city.zip").unwrap().as_str(), "address.city.zip");
        assert!(a.join("").is_err());
    }
}
