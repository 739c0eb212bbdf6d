//! Code generation for `#[derive(KeyValue)]`.
//!
//! The [`Expander`] validates the input, parses the fields and produces one
//! `impl ::propwatch::KeyValue` block:
//!
//! | Method | Generated from |
//! |--------|----------------|
//! | `keys()` | every non-skipped field, in declaration order |
//! | `get_key()` | one arm per key, plus a prefix arm per nested field |
//! | `set_key()` | one arm per key, plus a prefix arm per nested field |

use proc_macro::TokenStream;
use proc_macro2::TokenStream as QuoteStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Error as SynError, Field, Fields, Result as SynResult};

use crate::parse::{KeyField, parse_fields};

/// The main orchestrator for macro expansion.
pub struct Expander;

impl Expander {
    /// Main entry point for expanding the derive macro.
    pub fn expand(input: &DeriveInput) -> SynResult<TokenStream> {
        let struct_name = &input.ident;
        let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

        let fields = Self::extract_struct_fields(input)?;
        let key_fields = parse_fields(fields)?;

        let key_literals: Vec<&str> = key_fields.iter().map(|f| f.key.as_str()).collect();
        let num_keys = key_literals.len();

        let get_arms = key_fields.iter().map(generate_get_arm);
        let set_arms = key_fields.iter().map(generate_set_arm);
        let nested_get_arms = key_fields.iter().filter(|f| f.nested).map(generate_nested_get_arm);
        let nested_set_arms = key_fields.iter().filter(|f| f.nested).map(generate_nested_set_arm);

        let expanded = quote! {
            impl #impl_generics ::propwatch::KeyValue for #struct_name #type_generics #where_clause {
                fn keys() -> &'static [&'static str] {
                    static KEYS: [&str; #num_keys] = [#(#key_literals),*];
                    &KEYS
                }

                fn get_key(
                    &self,
                    key: &str,
                ) -> ::propwatch::Result<::core::option::Option<::propwatch::Value>> {
                    match key {
                        #(#get_arms)*
                        #(#nested_get_arms)*
                        _ => ::core::result::Result::Err(::propwatch::ObserveError::unknown_key(key)),
                    }
                }

                fn set_key(
                    &mut self,
                    key: &str,
                    value: ::core::option::Option<::propwatch::Value>,
                ) -> ::propwatch::Result<()> {
                    match key {
                        #(#set_arms)*
                        #(#nested_set_arms)*
                        _ => ::core::result::Result::Err(::propwatch::ObserveError::unknown_key(key)),
                    }
                }
            }
        };

        Ok(expanded.into())
    }

    /// Extract named fields from the struct, rejecting invalid types.
    fn extract_struct_fields(input: &DeriveInput) -> SynResult<&Punctuated<Field, Comma>> {
        match &input.data {
            Data::Struct(data_struct) => match &data_struct.fields {
                Fields::Named(fields_named) => Ok(&fields_named.named),

                Fields::Unnamed(_) => Err(SynError::new_spanned(
                    input,
                    "KeyValue does not support tuple structs",
                )),

                Fields::Unit => Err(SynError::new_spanned(
                    input,
                    "KeyValue does not support unit structs",
                )),
            },

            Data::Enum(_) => Err(SynError::new_spanned(
                input,
                "KeyValue can only be derived for structs, not enums",
            )),

            Data::Union(_) => Err(SynError::new_spanned(
                input,
                "KeyValue can only be derived for structs, not unions",
            )),
        }
    }
}

fn generate_get_arm(field: &KeyField) -> QuoteStream {
    let ident = &field.ident;
    let key = &field.key;

    if field.nested {
        quote! {
            #key => ::core::result::Result::Ok(::core::option::Option::Some(
                ::propwatch::Value::Map(::propwatch::KeyValue::to_map(&self.#ident)),
            )),
        }
    } else {
        quote! {
            #key => ::core::result::Result::Ok(::propwatch::PropertyValue::to_value(&self.#ident)),
        }
    }
}

fn generate_set_arm(field: &KeyField) -> QuoteStream {
    let ident = &field.ident;
    let key = &field.key;

    if field.readonly {
        return quote! {
            #key => ::core::result::Result::Err(::propwatch::ObserveError::read_only(key)),
        };
    }

    if field.nested {
        // A whole map assigns its entries one by one
        quote! {
            #key => match value {
                ::core::option::Option::Some(::propwatch::Value::Map(entries)) => {
                    for (sub_key, sub_value) in entries {
                        ::propwatch::KeyValue::set_key(
                            &mut self.#ident,
                            &sub_key,
                            ::core::option::Option::Some(sub_value),
                        )?;
                    }
                    ::core::result::Result::Ok(())
                }
                other => ::core::result::Result::Err(::propwatch::ObserveError::type_mismatch(
                    key,
                    "map",
                    other.as_ref().map_or("nothing", ::propwatch::Value::type_name),
                )),
            },
        }
    } else {
        quote! {
            #key => {
                self.#ident = ::propwatch::decode(key, value)?;
                ::core::result::Result::Ok(())
            }
        }
    }
}

fn generate_nested_get_arm(field: &KeyField) -> QuoteStream {
    let ident = &field.ident;
    let prefix = format!("{}.", field.key);

    quote! {
        key if key.starts_with(#prefix) => {
            ::propwatch::KeyValue::get_key(&self.#ident, &key[#prefix.len()..])
        }
    }
}

fn generate_nested_set_arm(field: &KeyField) -> QuoteStream {
    let ident = &field.ident;
    let prefix = format!("{}.", field.key);

    if field.readonly {
        return quote! {
            key if key.starts_with(#prefix) => {
                ::core::result::Result::Err(::propwatch::ObserveError::read_only(key))
            }
        };
    }

    quote! {
        key if key.starts_with(#prefix) => {
            ::propwatch::KeyValue::set_key(&mut self.#ident, &key[#prefix.len()..], value)
        }
    }
}
