//! `#[derive(Partial)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{DeriveInput, Field, Lit, LitStr, Token};

use crate::record::{self, FieldKind, RecordField};

enum Check {
    Presence,
    Format(LitStr),
    Inclusion(Vec<Lit>),
}

/// Everything `#[validates(...)]` says about one field.
#[derive(Default)]
struct FieldRules {
    checks: Vec<Check>,
    allow_nil: bool,
    allow_blank: bool,
    message: Option<LitStr>,
}

fn field_rules(field: &Field) -> syn::Result<FieldRules> {
    let mut rules = FieldRules::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("validates") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("presence") {
                rules.checks.push(Check::Presence);
            } else if meta.path.is_ident("format") {
                let pattern: LitStr = meta.value()?.parse()?;
                if let Err(err) = regex::Regex::new(&pattern.value()) {
                    return Err(syn::Error::new(pattern.span(), format!("invalid format pattern: {err}")));
                }
                rules.checks.push(Check::Format(pattern));
            } else if meta.path.is_ident("inclusion") {
                let content;
                syn::parenthesized!(content in meta.input);
                let values = Punctuated::<Lit, Token![,]>::parse_terminated(&content)?;
                if values.is_empty() {
                    return Err(meta.error("inclusion needs at least one value"));
                }
                for value in &values {
                    if !matches!(value, Lit::Str(_) | Lit::Int(_) | Lit::Float(_) | Lit::Bool(_)) {
                        return Err(syn::Error::new_spanned(
                            value,
                            "inclusion values must be string, integer, float, or bool literals",
                        ));
                    }
                }
                rules.checks.push(Check::Inclusion(values.into_iter().collect()));
            } else if meta.path.is_ident("allow_nil") {
                rules.allow_nil = true;
            } else if meta.path.is_ident("allow_blank") {
                rules.allow_blank = true;
            } else if meta.path.is_ident("message") {
                rules.message = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error(
                    "unknown validation, expected `presence`, `format`, `inclusion`, `allow_nil`, `allow_blank`, or `message`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(rules)
}

/// `AttributeRule` constructor expressions for one field. Runs inside a
/// closure returning `Result<_, ConfigurationError>`.
fn rule_exprs(attribute: &str, rules: &FieldRules) -> Vec<TokenStream> {
    let mut modifiers = Vec::new();
    if rules.allow_nil {
        modifiers.push(quote!(.allow_nil()));
    }
    if rules.allow_blank {
        modifiers.push(quote!(.allow_blank()));
    }
    if let Some(message) = &rules.message {
        modifiers.push(quote!(.message(#message)));
    }

    rules
        .checks
        .iter()
        .map(|check| {
            let rule = match check {
                Check::Presence => quote! {
                    ::partitional::AttributeRule::presence(#attribute)
                },
                Check::Format(pattern) => quote! {
                    ::partitional::AttributeRule::format(#attribute, #pattern)?
                },
                Check::Inclusion(values) => quote! {
                    ::partitional::AttributeRule::inclusion(
                        #attribute,
                        [#(::partitional::Value::from(#values)),*],
                    )
                },
            };
            quote!(#rule #(#modifiers)*)
        })
        .collect()
}

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;
    let type_name = name.to_string();
    let fields = record::named_fields(input, "Partial")?;

    let mut idents = Vec::with_capacity(fields.len());
    let mut keys = Vec::with_capacity(fields.len());
    let mut rules = Vec::new();
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let key = ident.unraw().to_string();
        rules.extend(rule_exprs(&key, &field_rules(field)?));
        idents.push(ident);
        keys.push(key);
    }

    let validate = if rules.is_empty() {
        quote!()
    } else {
        quote! {
            fn validate(
                source: &dyn ::partitional::ReadAttribute,
                errors: &mut ::partitional::Errors,
            ) -> ::core::result::Result<(), ::partitional::Error> {
                static RULES: ::partitional::__private::Lazy<
                    ::core::result::Result<
                        ::std::vec::Vec<::partitional::AttributeRule>,
                        ::partitional::ConfigurationError,
                    >,
                > = ::partitional::__private::Lazy::new(|| {
                    ::core::result::Result::Ok(::std::vec![#(#rules),*])
                });
                match &*RULES {
                    ::core::result::Result::Ok(rules) => ::partitional::validation::run_rules(rules, source, errors),
                    ::core::result::Result::Err(err) => ::core::result::Result::Err(
                        ::core::clone::Clone::clone(err).into(),
                    ),
                }
            }
        }
    };

    // A partial type is also a plain record over its own attributes.
    let record_fields: Vec<RecordField<'_>> = idents
        .iter()
        .map(|ident| RecordField {
            ident,
            kind: FieldKind::Value,
        })
        .collect();
    let record_impl = record::expand_record(name, &record_fields);

    let accessors = format_ident!("{}Attributes", name);
    let accessors_doc = format!("Typed attribute accessors for `PartialProxy<'_, {type_name}>`.");
    let getters = &idents;
    let setters: Vec<_> = idents.iter().map(|ident| format_ident!("set_{}", ident.unraw())).collect();

    Ok(quote! {
        impl ::partitional::Partial for #name {
            const NAME: &'static str = #type_name;
            const ATTRIBUTES: &'static [&'static str] = &[#(#keys),*];

            fn read_local(&self, attribute: &str) -> ::core::option::Option<::partitional::Value> {
                match attribute {
                    #(#keys => ::core::option::Option::Some(::core::clone::Clone::clone(&self.#idents)),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn write_local(&mut self, attribute: &str, value: ::partitional::Value) -> bool {
                match attribute {
                    #(#keys => self.#idents = value,)*
                    _ => return false,
                }
                true
            }

            #validate
        }

        impl ::partitional::ReadAttribute for #name {
            fn read_attribute(
                &self,
                attribute: &str,
            ) -> ::core::result::Result<::partitional::Value, ::partitional::Error> {
                ::partitional::Partial::read_local(self, attribute).ok_or_else(|| {
                    ::partitional::ResolutionError::undeclared(#type_name, attribute).into()
                })
            }
        }

        #record_impl

        #[doc = #accessors_doc]
        #vis trait #accessors {
            #(
                fn #getters(&self) -> ::core::result::Result<::partitional::Value, ::partitional::Error>;

                fn #setters(
                    &mut self,
                    value: impl ::core::convert::Into<::partitional::Value>,
                ) -> ::core::result::Result<(), ::partitional::Error>;
            )*
        }

        impl #accessors for ::partitional::PartialProxy<'_, #name> {
            #(
                fn #getters(&self) -> ::core::result::Result<::partitional::Value, ::partitional::Error> {
                    self.get(#keys)
                }

                fn #setters(
                    &mut self,
                    value: impl ::core::convert::Into<::partitional::Value>,
                ) -> ::core::result::Result<(), ::partitional::Error> {
                    self.set(#keys, value)
                }
            )*
        }
    })
}
