//! Dynamically-typed property values.
//!
//! The [`Value`] enum is what observers see: every property read through a
//! key path, every change record's current and previous value and every
//! element of an observed relationship is a `Value`. An absent value (a
//! property that is unset or `None`) is represented as `Option::None` at the
//! API boundary rather than as a variant.
//!
//! # Supported Types
//!
//! | Variant | Rust Types |
//! |---------|------------|
//! | `Bool` | `bool` |
//! | `Integer` | `i8` - `i64`, `u8` - `u32` (and `u64`/`usize` when they fit) |
//! | `Float` | `f32`, `f64` |
//! | `String` | `String`, `&str` |
//! | `Point` / `Size` / `Rect` / `EdgeInsets` | the geometry structs below |
//! | `List` | `Vec<T>` (ordered relationship) |
//! | `Set` | unordered relationship |
//! | `Map` | `BTreeMap<String, T>` (nested properties) |
//! | `Object` | any `Arc<T>`, compared by identity |
//!
//! # Coercion
//!
//! Typed reactions unwrap values the way Foundation's `-boolValue`,
//! `-integerValue` and friends do: numbers and numeric strings convert
//! between each other, geometry can be read from maps or lists with the
//! right components. Conversions go through [`num_traits::ToPrimitive`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use num_traits::ToPrimitive;

use crate::error::ObserveError;

/// Shared opaque object stored in a [`Value::Object`].
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

// ============================================================================
// Geometry
// ============================================================================

/// A point in a two-dimensional coordinate system.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A rectangle given by its origin and size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent from the origin.
    pub size: Size,
}

impl Rect {
    /// Creates a rectangle from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }
}

/// Insets from each edge of a rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeInsets {
    /// Inset from the top edge.
    pub top: f64,
    /// Inset from the left edge.
    pub left: f64,
    /// Inset from the bottom edge.
    pub bottom: f64,
    /// Inset from the right edge.
    pub right: f64,
}

impl EdgeInsets {
    /// Creates edge insets.
    #[must_use]
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }
}

// ============================================================================
// Macros for reducing boilerplate
// ============================================================================

/// Generates `From<T>` implementations for Value
macro_rules! impl_from_integer {
    ($($t:ty),+ $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Integer(i64::from(n))
                }
            }
        )+
    };
}

/// Generates `to_*` methods that use ToPrimitive
macro_rules! impl_to_primitive {
    ($($method:ident -> $t:ty),+ $(,)?) => {
        $(
            #[doc = concat!("Converts to `", stringify!($t), "` if possible.")]
            #[must_use]
            pub fn $method(&self) -> Option<$t> {
                match self {
                    Value::Integer(n) => n.$method(),

                    Value::Float(f) => f.$method(),

                    Value::String(s) => s.trim().parse().ok(),

                    Value::Bool(b) => Some(if *b { 1 as $t } else { 0 as $t }),

                    _ => None,
                }
            }
        )+
    };
}

// ============================================================================
// Value Enum
// ============================================================================

/// A dynamically-typed property value.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A boolean.
    Bool(bool),

    /// A signed integer (stored as i64).
    Integer(i64),

    /// A floating-point number (stored as f64).
    Float(f64),

    /// A string.
    String(String),

    /// A point.
    Point(Point),

    /// A size.
    Size(Size),

    /// A rectangle.
    Rect(Rect),

    /// Edge insets.
    EdgeInsets(EdgeInsets),

    /// An ordered collection (ordered relationship).
    List(Vec<Value>),

    /// An unordered collection without duplicates (unordered relationship).
    Set(Vec<Value>),

    /// Nested properties addressed by key-path segments.
    Map(BTreeMap<String, Value>),

    /// An opaque shared object, compared by identity.
    #[cfg_attr(feature = "serde", serde(skip))]
    Object(ObjectRef),
}

impl Value {
    /// Wraps an arbitrary object. Two `Object` values are equal only if they
    /// share the same allocation.
    pub fn object<T: Any + Send + Sync>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Wraps an already shared object.
    pub fn from_arc<T: Any + Send + Sync>(object: Arc<T>) -> Self {
        Self::Object(object)
    }

    /// Returns the wrapped object if it has type `T`.
    #[must_use]
    pub fn downcast_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(object) => object.clone().downcast::<T>().ok(),

            _ => None,
        }
    }

    /// Human-readable name of the stored shape, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Point(_) => "point",
            Self::Size(_) => "size",
            Self::Rect(_) => "rect",
            Self::EdgeInsets(_) => "edge insets",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Returns `true` for `List` and `Set` values.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_))
    }

    /// Returns the string if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),

            _ => None,
        }
    }

    /// Returns the elements if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),

            _ => None,
        }
    }

    /// Returns the elements if this is a `Set`.
    #[must_use]
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Self::Set(items) => Some(items),

            _ => None,
        }
    }

    /// Returns the entries if this is a `Map`.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),

            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Coercion
    // ------------------------------------------------------------------------

    /// Interprets the value as a boolean.
    ///
    /// Numbers are `true` when non-zero; strings accept `true/false`,
    /// `yes/no`, `y/n`, `t/f` (any case) and numeric text.
    #[must_use]
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),

            Self::Integer(n) => Some(*n != 0),

            Self::Float(f) => Some(*f != 0.0),

            Self::String(s) => {
                let trimmed = s.trim();
                match trimmed.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "y" | "t" => Some(true),

                    "false" | "no" | "n" | "f" | "" => Some(false),

                    _ => trimmed.parse::<f64>().ok().map(|f| f != 0.0),
                }
            }

            _ => None,
        }
    }

    impl_to_primitive! {
        to_i8 -> i8,
        to_i16 -> i16,
        to_i32 -> i32,
        to_i64 -> i64,
        to_isize -> isize,
        to_u8 -> u8,
        to_u16 -> u16,
        to_u32 -> u32,
        to_u64 -> u64,
        to_usize -> usize,
        to_f32 -> f32,
        to_f64 -> f64,
    }

    /// Interprets the value as a point.
    ///
    /// Accepts `Point`, a map with `x`/`y`, or a two-element numeric list.
    #[must_use]
    pub fn to_point(&self) -> Option<Point> {
        match self {
            Self::Point(p) => Some(*p),

            Self::Map(map) => Some(Point::new(
                component(map, "x")?,
                component(map, "y")?,
            )),

            Self::List(items) => match numbers::<2>(items)? {
                [x, y] => Some(Point::new(x, y)),
            },

            _ => None,
        }
    }

    /// Interprets the value as a size.
    ///
    /// Accepts `Size`, a map with `width`/`height`, or a two-element list.
    #[must_use]
    pub fn to_size(&self) -> Option<Size> {
        match self {
            Self::Size(s) => Some(*s),

            Self::Map(map) => Some(Size::new(
                component(map, "width")?,
                component(map, "height")?,
            )),

            Self::List(items) => match numbers::<2>(items)? {
                [width, height] => Some(Size::new(width, height)),
            },

            _ => None,
        }
    }

    /// Interprets the value as a rectangle.
    ///
    /// Accepts `Rect`, a map with `x`/`y`/`width`/`height`, or a
    /// four-element list in that order.
    #[must_use]
    pub fn to_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),

            Self::Map(map) => Some(Rect::new(
                component(map, "x")?,
                component(map, "y")?,
                component(map, "width")?,
                component(map, "height")?,
            )),

            Self::List(items) => match numbers::<4>(items)? {
                [x, y, width, height] => Some(Rect::new(x, y, width, height)),
            },

            _ => None,
        }
    }

    /// Interprets the value as edge insets.
    ///
    /// Accepts `EdgeInsets`, a map with `top`/`left`/`bottom`/`right`, or a
    /// four-element list in that order.
    #[must_use]
    pub fn to_edge_insets(&self) -> Option<EdgeInsets> {
        match self {
            Self::EdgeInsets(e) => Some(*e),

            Self::Map(map) => Some(EdgeInsets::new(
                component(map, "top")?,
                component(map, "left")?,
                component(map, "bottom")?,
                component(map, "right")?,
            )),

            Self::List(items) => match numbers::<4>(items)? {
                [top, left, bottom, right] => Some(EdgeInsets::new(top, left, bottom, right)),
            },

            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Path access
    // ------------------------------------------------------------------------

    /// Resolves nested segments below this value.
    ///
    /// Map segments are keys; list segments are decimal indexes. Returns
    /// `None` as soon as a segment does not resolve.
    #[must_use]
    pub fn get_path<'a, I>(&self, segments: I) -> Option<&Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;

        for segment in segments {
            current = match current {
                Self::Map(map) => map.get(segment)?,

                Self::List(items) => items.get(segment.parse::<usize>().ok()?)?,

                _ => return None,
            };
        }

        Some(current)
    }

    /// Writes `value` at the nested segments below this map, creating
    /// intermediate maps. `None` removes the entry.
    ///
    /// On failure returns the type name of the value that blocked the path.
    pub(crate) fn set_path(
        &mut self,
        segments: &[&str],
        value: Option<Value>,
    ) -> Result<(), &'static str> {
        let Self::Map(map) = self else {
            return Err(self.type_name());
        };

        match segments {
            [] => Ok(()),

            [last] => {
                match value {
                    Some(value) => {
                        map.insert((*last).to_string(), value);
                    }
                    None => {
                        map.remove(*last);
                    }
                }
                Ok(())
            }

            [head, rest @ ..] => {
                let child = map
                    .entry((*head).to_string())
                    .or_insert_with(|| Self::Map(BTreeMap::new()));
                child.set_path(rest, value)
            }
        }
    }
}

fn component(map: &BTreeMap<String, Value>, key: &str) -> Option<f64> {
    map.get(key)?.to_f64()
}

fn numbers<const N: usize>(items: &[Value]) -> Option<[f64; N]> {
    if items.len() != N {
        return None;
    }

    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.to_f64()?;
    }
    Some(out)
}

// ============================================================================
// Equality
// ============================================================================

// Objects compare by identity. Sets compare by membership, ignoring order and
// repeated elements.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Point(a), Self::Point(b)) => a == b,
            (Self::Size(a), Self::Size(b)) => a == b,
            (Self::Rect(a), Self::Rect(b)) => a == b,
            (Self::EdgeInsets(a), Self::EdgeInsets(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

// Manual Debug impl: objects have no Debug bound
impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Point(p) => f.debug_tuple("Point").field(p).finish(),
            Self::Size(s) => f.debug_tuple("Size").field(s).finish(),
            Self::Rect(r) => f.debug_tuple("Rect").field(r).finish(),
            Self::EdgeInsets(e) => f.debug_tuple("EdgeInsets").field(e).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Object(object) => write!(f, "Object({:p})", Arc::as_ptr(object)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),

            Self::Integer(n) => write!(f, "{n}"),

            Self::Float(x) => write!(f, "{x}"),

            Self::String(s) => f.write_str(s),

            Self::Point(p) => write!(f, "{{{}, {}}}", p.x, p.y),

            Self::Size(s) => write!(f, "{{{}, {}}}", s.width, s.height),

            Self::Rect(r) => write!(
                f,
                "{{{{{}, {}}}, {{{}, {}}}}}",
                r.origin.x, r.origin.y, r.size.width, r.size.height
            ),

            Self::EdgeInsets(e) => {
                write!(f, "{{{}, {}, {}, {}}}", e.top, e.left, e.bottom, e.right)
            }

            Self::List(items) | Self::Set(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }

            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }

            Self::Object(object) => write!(f, "<object {:p}>", Arc::as_ptr(object)),
        }
    }
}

// ============================================================================
// From impls
// ============================================================================

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Self::Point(p)
    }
}

impl From<Size> for Value {
    fn from(s: Size) -> Self {
        Self::Size(s)
    }
}

impl From<Rect> for Value {
    fn from(r: Rect) -> Self {
        Self::Rect(r)
    }
}

impl From<EdgeInsets> for Value {
    fn from(e: EdgeInsets) -> Self {
        Self::EdgeInsets(e)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Value> for Value {
    /// JSON `null` entries inside arrays and objects are dropped; use
    /// [`Value::from_json`] to convert a top-level value that may be null.
    fn from(json: serde_json::Value) -> Self {
        Self::from_json(json).unwrap_or(Self::Map(BTreeMap::new()))
    }
}

#[cfg(feature = "serde")]
impl Value {
    /// Converts a JSON value, mapping `null` to `None`.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => None,

            Json::Bool(b) => Some(Self::Bool(b)),

            Json::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Integer),
            ),

            Json::String(s) => Some(Self::String(s)),

            Json::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),

            Json::Object(entries) => Some(Self::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

// ============================================================================
// PropertyValue
// ============================================================================

/// Conversion between Rust field types and property values.
///
/// This is what `#[derive(KeyValue)]` uses to expose struct fields through
/// key paths. `to_value` returns `None` for absent values; `from_value`
/// returns `None` when the value has the wrong shape.
pub trait PropertyValue: Sized {
    /// Shape name used in type-mismatch diagnostics.
    const EXPECTED: &'static str;

    /// Converts the field into a property value.
    fn to_value(&self) -> Option<Value>;

    /// Converts a property value back into the field type.
    fn from_value(value: Option<Value>) -> Option<Self>;
}

/// Decodes a property value for the field at `key_path`.
///
/// # Errors
///
/// Returns [`ObserveError::TypeMismatch`] when the value cannot be converted.
pub fn decode<T: PropertyValue>(key_path: &str, value: Option<Value>) -> Result<T, ObserveError> {
    let found = value.as_ref().map_or("nothing", Value::type_name);
    T::from_value(value).ok_or_else(|| ObserveError::type_mismatch(key_path, T::EXPECTED, found))
}

macro_rules! impl_property_integer {
    ($($t:ty => $method:ident),+ $(,)?) => {
        $(
            impl PropertyValue for $t {
                const EXPECTED: &'static str = "integer";

                fn to_value(&self) -> Option<Value> {
                    self.to_i64().map(Value::Integer)
                }

                fn from_value(value: Option<Value>) -> Option<Self> {
                    match value? {
                        Value::Integer(n) => n.$method(),

                        Value::Float(f) if f.fract() == 0.0 => f.$method(),

                        _ => None,
                    }
                }
            }
        )+
    };
}

impl_property_integer! {
    i8 => to_i8,
    i16 => to_i16,
    i32 => to_i32,
    i64 => to_i64,
    isize => to_isize,
    u8 => to_u8,
    u16 => to_u16,
    u32 => to_u32,
    u64 => to_u64,
    usize => to_usize,
}

macro_rules! impl_property_variant {
    ($($t:ty => $variant:ident, $expected:literal),+ $(,)?) => {
        $(
            impl PropertyValue for $t {
                const EXPECTED: &'static str = $expected;

                fn to_value(&self) -> Option<Value> {
                    Some(Value::$variant(self.clone()))
                }

                fn from_value(value: Option<Value>) -> Option<Self> {
                    match value? {
                        Value::$variant(inner) => Some(inner),

                        _ => None,
                    }
                }
            }
        )+
    };
}

impl_property_variant! {
    bool => Bool, "bool",
    String => String, "string",
    Point => Point, "point",
    Size => Size, "size",
    Rect => Rect, "rect",
    EdgeInsets => EdgeInsets, "edge insets",
}

impl PropertyValue for f64 {
    const EXPECTED: &'static str = "float";

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        match value? {
            Value::Float(f) => Some(f),

            Value::Integer(n) => n.to_f64(),

            _ => None,
        }
    }
}

impl PropertyValue for f32 {
    const EXPECTED: &'static str = "float";

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(f64::from(*self)))
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        match value? {
            Value::Float(f) => f.to_f32(),

            Value::Integer(n) => n.to_f32(),

            _ => None,
        }
    }
}

impl PropertyValue for Value {
    const EXPECTED: &'static str = "value";

    fn to_value(&self) -> Option<Value> {
        Some(self.clone())
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        value
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(PropertyValue::to_value)
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        match value {
            None => Some(None),

            Some(value) => T::from_value(Some(value)).map(Some),
        }
    }
}

impl<T: PropertyValue> PropertyValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn to_value(&self) -> Option<Value> {
        Some(Value::List(
            self.iter().filter_map(PropertyValue::to_value).collect(),
        ))
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        match value? {
            Value::List(items) | Value::Set(items) => items
                .into_iter()
                .map(|item| T::from_value(Some(item)))
                .collect(),

            _ => None,
        }
    }
}

impl<T: PropertyValue> PropertyValue for BTreeMap<String, T> {
    const EXPECTED: &'static str = "map";

    fn to_value(&self) -> Option<Value> {
        Some(Value::Map(
            self.iter()
                .filter_map(|(k, v)| v.to_value().map(|v| (k.clone(), v)))
                .collect(),
        ))
    }

    fn from_value(value: Option<Value>) -> Option<Self> {
        match value? {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_value(Some(v)).map(|v| (k, v)))
                .collect(),

            _ => None,
        }
    }
}
