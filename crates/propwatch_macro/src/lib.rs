//! # propwatch_macro
//!
//! Procedural macro implementation for the `propwatch` crate.
//!
//! This crate provides `#[derive(KeyValue)]`, which gives a struct key-based
//! field access so it can be wrapped in `propwatch::Observed` and observed by
//! key path.
//!
//! **Note:** Users should depend on the `propwatch` crate, not this one
//! directly. `propwatch` re-exports this macro along with the trait.
//!
//! # Module Structure
//!
//! - `parse` - Attribute parsing for `#[key(...)]`
//! - `expand` - Code generation for the `KeyValue` impl

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

// Internal modules - not exposed publicly
mod expand;
mod parse;

/// Derive macro for key-based field access.
///
/// Every named field becomes a key. Field types must implement
/// `propwatch::PropertyValue` (or `KeyValue`, for `nested` fields).
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `rename = "name"` | Use a different key for the field |
/// | `skip` | Leave the field out |
/// | `readonly` | Reads work, writes fail with `ObserveError::ReadOnly` |
/// | `nested` | The field implements `KeyValue`; `"field.sub"` delegates to it |
///
/// # Example
///
/// ```ignore
/// use propwatch::KeyValue;
///
/// #[derive(Clone, KeyValue)]
/// struct Address {
///     city: String,
///     zip: Option<String>,
/// }
///
/// #[derive(Clone, KeyValue)]
/// struct Customer {
///     #[key(readonly)]
///     id: u64,
///
///     #[key(rename = "displayName")]
///     display_name: String,
///
///     #[key(nested)]
///     address: Address,
///
///     #[key(skip)]
///     scratch: Vec<u8>,
/// }
///
/// assert_eq!(Customer::keys(), &["id", "displayName", "address"]);
/// ```
///
/// # Generated Methods
///
/// - `keys()` - the keys, in declaration order
/// - `get_key(&self, key)` - reads a key; nested fields read as a map
/// - `set_key(&mut self, key, value)` - writes a key with type checking
#[proc_macro_derive(KeyValue, attributes(key))]
pub fn derive_key_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    // On error, convert to a compile_error!() invocation with the right span
    expand::Expander::expand(&input).unwrap_or_else(|err| err.to_compile_error().into())
}
