//! `#[derive(Record)]`, and the `Record` half of `#[derive(Host)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Field, Fields, Ident, Type};

/// How a field takes part in name-keyed access.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    /// Readable and writable `Value`.
    Value,
    /// Readable `Value`; writes fail with `ReadOnly`.
    ReadOnly,
    /// A nested record, optionally behind `Option`.
    Nested { optional: bool },
    /// Not reachable by name.
    Skip,
    /// The host's error collection.
    Errors,
    /// The host's memoized partials.
    Partials,
}

pub(crate) struct RecordField<'a> {
    pub ident: &'a Ident,
    pub kind: FieldKind,
}

impl RecordField<'_> {
    /// Accessor name, without any `r#` prefix.
    fn key(&self) -> String {
        self.ident.unraw().to_string()
    }
}

/// Named fields of a non-generic struct.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Comma>> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            format!("{derive} derive does not support generic types"),
        ));
    }
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                format!("{derive} derive only supports structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} derive only supports structs"),
        )),
    }
}

/// Classify every field by its `#[record(...)]` attribute.
pub(crate) fn record_fields(fields: &Punctuated<Field, Comma>) -> syn::Result<Vec<RecordField<'_>>> {
    fields
        .iter()
        .map(|field| {
            let kind = field_kind(field)?;
            let ident = field
                .ident
                .as_ref()
                .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
            Ok(RecordField { ident, kind })
        })
        .collect()
}

/// Parse `#[record(nested | readonly | skip | errors | partials)]`.
fn field_kind(field: &Field) -> syn::Result<FieldKind> {
    let mut kind = FieldKind::Value;
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("nested") {
                FieldKind::Nested {
                    optional: is_option(&field.ty),
                }
            } else if meta.path.is_ident("readonly") {
                FieldKind::ReadOnly
            } else if meta.path.is_ident("skip") {
                FieldKind::Skip
            } else if meta.path.is_ident("errors") {
                FieldKind::Errors
            } else if meta.path.is_ident("partials") {
                FieldKind::Partials
            } else {
                return Err(meta.error(
                    "unknown record option, expected `nested`, `readonly`, `skip`, `errors`, or `partials`",
                ));
            };
            if kind != FieldKind::Value {
                return Err(meta.error("a field takes at most one record option"));
            }
            kind = next;
            Ok(())
        })?;
    }
    Ok(kind)
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(ty) if ty.qself.is_none() => ty
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == "Option"),
        _ => false,
    }
}

/// The `impl Record` block for `name`.
pub(crate) fn expand_record(name: &Ident, fields: &[RecordField<'_>]) -> TokenStream {
    let type_name = name.to_string();

    let reads = fields.iter().filter_map(|field| {
        let ident = field.ident;
        let key = field.key();
        match field.kind {
            FieldKind::Value | FieldKind::ReadOnly => Some(quote! {
                #key => ::core::result::Result::Ok(::core::clone::Clone::clone(&self.#ident)),
            }),
            _ => None,
        }
    });

    let writes = fields.iter().filter_map(|field| {
        let ident = field.ident;
        let key = field.key();
        match field.kind {
            FieldKind::Value => Some(quote! {
                #key => {
                    self.#ident = value;
                    ::core::result::Result::Ok(())
                }
            }),
            FieldKind::ReadOnly => Some(quote! {
                #key => ::core::result::Result::Err(
                    ::partitional::ResolutionError::read_only(#type_name, name),
                ),
            }),
            _ => None,
        }
    });

    let nested = fields.iter().filter_map(|field| nested_arm(field, &type_name, quote!(&)));
    let nested_mut = fields
        .iter()
        .filter_map(|field| nested_arm(field, &type_name, quote!(&mut)));

    quote! {
        impl ::partitional::Record for #name {
            fn read(
                &self,
                name: &str,
            ) -> ::core::result::Result<::partitional::Value, ::partitional::ResolutionError> {
                match name {
                    #(#reads)*
                    _ => ::core::result::Result::Err(::partitional::ResolutionError::undefined(#type_name, name)),
                }
            }

            #[allow(unused_variables)]
            fn write(
                &mut self,
                name: &str,
                value: ::partitional::Value,
            ) -> ::core::result::Result<(), ::partitional::ResolutionError> {
                match name {
                    #(#writes)*
                    _ => ::core::result::Result::Err(::partitional::ResolutionError::undefined(#type_name, name)),
                }
            }

            fn nested(
                &self,
                name: &str,
            ) -> ::core::result::Result<&dyn ::partitional::Record, ::partitional::ResolutionError> {
                match name {
                    #(#nested)*
                    _ => ::core::result::Result::Err(::partitional::ResolutionError::undefined(#type_name, name)),
                }
            }

            fn nested_mut(
                &mut self,
                name: &str,
            ) -> ::core::result::Result<&mut dyn ::partitional::Record, ::partitional::ResolutionError> {
                match name {
                    #(#nested_mut)*
                    _ => ::core::result::Result::Err(::partitional::ResolutionError::undefined(#type_name, name)),
                }
            }
        }
    }
}

/// One `nested`/`nested_mut` match arm; `borrow` is `&` or `&mut`.
fn nested_arm(field: &RecordField<'_>, type_name: &str, borrow: TokenStream) -> Option<TokenStream> {
    let ident = field.ident;
    let key = field.key();
    match field.kind {
        FieldKind::Nested { optional: false } => Some(quote! {
            #key => ::core::result::Result::Ok(#borrow self.#ident),
        }),
        FieldKind::Nested { optional: true } => Some(quote! {
            #key => match #borrow self.#ident {
                ::core::option::Option::Some(record) => ::core::result::Result::Ok(record),
                ::core::option::Option::None => ::core::result::Result::Err(
                    ::partitional::ResolutionError::undefined(#type_name, name),
                ),
            },
        }),
        FieldKind::Value | FieldKind::ReadOnly => Some(quote! {
            #key => ::core::result::Result::Err(::partitional::ResolutionError::not_nested(#type_name, name)),
        }),
        _ => None,
    }
}

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = named_fields(input, "Record")?;
    let fields = record_fields(fields)?;
    Ok(expand_record(&input.ident, &fields))
}
