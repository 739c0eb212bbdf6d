//! Attribute parsing for `#[key(rename = "name", skip, readonly, nested)]`.
//!
//! Options are accumulated one at a time by [`Parser::parse_meta`] and
//! validated together by [`Parser::build`], so conflicting combinations are
//! reported with the span of the offending option.
//!
//! # Supported Syntax
//!
//! ```ignore
//! #[key(rename = "displayName")]   // Custom key
//! #[key(skip)]                     // Not a key
//! #[key(readonly)]                 // Writes are rejected
//! #[key(nested)]                   // Delegates dotted keys to the field
//! #[key(nested, readonly)]         // Combinable
//! ```

use std::collections::HashSet;

use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Error as SynError, Field, Ident, LitStr, Result as SynResult, Type};

/// A field that takes part in key access.
pub struct KeyField {
    /// The Rust field name.
    pub ident: Ident,

    /// The field type.
    pub ty: Type,

    /// The key the field is reachable under.
    pub key: String,

    /// Writes are rejected.
    pub readonly: bool,

    /// The field implements `KeyValue` itself.
    pub nested: bool,
}

/// Accumulates the options of one field's `#[key(...)]` attributes.
#[derive(Default)]
struct Parser {
    rename: Option<LitStr>,
    skip: Option<Ident>,
    readonly: bool,
    nested: bool,

    /// Options seen so far, for duplicate detection.
    seen: HashSet<&'static str>,
}

impl Parser {
    #[expect(
        clippy::needless_pass_by_value,
        reason = "ParseNestedMeta is passed by value per syn's parse_nested_meta callback signature"
    )]
    fn parse_meta(&mut self, meta: ParseNestedMeta) -> SynResult<()> {
        let ident = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("Expected Identifier"))?
            .clone();
        let name = ident.to_string();

        let key: &'static str = match name.as_str() {
            "rename" => "rename",
            "skip" => "skip",
            "readonly" => "readonly",
            "nested" => "nested",
            _ => return Err(meta.error(format!("Unknown option `{name}`"))),
        };

        if !self.seen.insert(key) {
            return Err(meta.error(format!("Duplicate option: `{key}`")));
        }

        match key {
            "rename" => {
                let lit: LitStr = meta.value()?.parse()?;
                validate_key(&lit)?;
                self.rename = Some(lit);
            }
            "skip" => self.skip = Some(ident),
            "readonly" => self.readonly = true,
            "nested" => self.nested = true,
            _ => unreachable!("option names are checked above"),
        }

        Ok(())
    }

    /// Validates the option combination. `None` means the field is skipped.
    fn build(self, field: &Field) -> SynResult<Option<KeyField>> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| SynError::new_spanned(field, "KeyValue requires named fields"))?;

        if let Some(skip) = self.skip {
            if self.seen.len() > 1 {
                return Err(SynError::new(
                    skip.span(),
                    "`skip` cannot be combined with other options",
                ));
            }
            return Ok(None);
        }

        let key = self
            .rename
            .map_or_else(|| unraw(&ident), |lit| lit.value());

        Ok(Some(KeyField {
            ident,
            ty: field.ty.clone(),
            key,
            readonly: self.readonly,
            nested: self.nested,
        }))
    }
}

/// A key must be one non-empty segment without whitespace.
fn validate_key(lit: &LitStr) -> SynResult<()> {
    let value = lit.value();

    if value.is_empty() {
        return Err(SynError::new(lit.span(), "key cannot be empty"));
    }
    if value.contains('.') {
        return Err(SynError::new(
            lit.span(),
            "key cannot contain `.`; use `nested` for nested access",
        ));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(SynError::new(lit.span(), "key cannot contain whitespace"));
    }
    Ok(())
}

/// Field name without the `r#` prefix of raw identifiers.
fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map_or_else(|| name.clone(), str::to_string)
}

/// Parses every field, reporting all attribute errors at once.
pub fn parse_fields(fields: &Punctuated<Field, Comma>) -> SynResult<Vec<KeyField>> {
    let mut parsed = Vec::new();
    let mut errors: Option<SynError> = None;
    let mut push_error = |err: SynError| match &mut errors {
        Some(existing) => existing.combine(err),
        None => errors = Some(err),
    };

    for field in fields {
        let mut parser = Parser::default();

        let outcome = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("key"))
            .try_for_each(|attr| attr.parse_nested_meta(|meta| parser.parse_meta(meta)))
            .and_then(|()| parser.build(field));

        match outcome {
            Ok(Some(key_field)) => parsed.push(key_field),
            Ok(None) => {}
            Err(err) => push_error(err),
        }
    }

    // Keys must be unique
    let mut keys = HashSet::new();
    for field in &parsed {
        if !keys.insert(field.key.as_str()) {
            push_error(SynError::new(
                field.ident.span(),
                format!("duplicate key `{}`", field.key),
            ));
        }
    }

    match errors {
        Some(err) => Err(err),
        None => Ok(parsed),
    }
}
