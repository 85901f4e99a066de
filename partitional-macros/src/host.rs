//! `#[derive(Host)]`: record accessors, partition accessors, registry
//! submissions, and the host's rule set.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{Attribute, DeriveInput, Expr, ExprLit, Ident, Lit, LitBool, LitStr, Token};

use crate::record::{self, FieldKind, RecordField};

/// `#[partition(name, Target, prefix = "..", mapping(attr = "path"), validation = bool)]`
struct Partition {
    name: Ident,
    target: syn::Path,
    prefix: Option<LitStr>,
    mapping: Vec<(Ident, LitStr)>,
    validation: bool,
}

impl Partition {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let target: syn::Path = input.parse()?;

        let mut partition = Partition {
            name,
            target,
            prefix: None,
            mapping: Vec::new(),
            validation: true,
        };

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key = Ident::parse_any(input)?;
            if key == "prefix" {
                input.parse::<Token![=]>()?;
                let prefix: LitStr = input.parse()?;
                check_prefix(&prefix)?;
                partition.prefix = Some(prefix);
            } else if key == "mapping" {
                let content;
                syn::parenthesized!(content in input);
                let entries = Punctuated::<MappingEntry, Token![,]>::parse_terminated(&content)?;
                for entry in entries {
                    if partition.mapping.iter().any(|(attribute, _)| *attribute == entry.attribute) {
                        return Err(syn::Error::new(
                            entry.attribute.span(),
                            format!("`{}` is mapped twice", entry.attribute),
                        ));
                    }
                    check_path(&entry.path)?;
                    partition.mapping.push((entry.attribute, entry.path));
                }
            } else if key == "validation" {
                input.parse::<Token![=]>()?;
                let validation: LitBool = input.parse()?;
                partition.validation = validation.value;
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown partition option `{key}`, expected `prefix`, `mapping`, or `validation`"),
                ));
            }
        }

        Ok(partition)
    }
}

struct MappingEntry {
    attribute: Ident,
    path: LitStr,
}

impl syn::parse::Parse for MappingEntry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attribute = Ident::parse_any(input)?;
        input.parse::<Token![=]>()?;
        let path = input.parse()?;
        Ok(MappingEntry { attribute, path })
    }
}

fn check_prefix(prefix: &LitStr) -> syn::Result<()> {
    let value = prefix.value();
    if value.is_empty() || value.contains('.') || value.contains(char::is_whitespace) {
        return Err(syn::Error::new(prefix.span(), format!("invalid mapping prefix `{value}`")));
    }
    Ok(())
}

fn check_path(path: &LitStr) -> syn::Result<()> {
    let value = path.value();
    let valid = value
        .split('.')
        .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace));
    if !valid {
        return Err(syn::Error::new(path.span(), format!("invalid accessor path `{value}`")));
    }
    Ok(())
}

/// `#[validates_partial(name, if = .., unless = .., message = .., allow_nil,
/// allow_blank, attributes(..))]`, parsed into `BridgeOptions` builder calls.
struct BridgeDecl {
    name: Ident,
    options: Vec<TokenStream>,
}

impl BridgeDecl {
    fn parse(input: ParseStream, host: &Ident) -> syn::Result<Self> {
        let name: Ident = input.parse()?;
        let mut options = Vec::new();

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key = Ident::parse_any(input)?;
            let option = match key.to_string().as_str() {
                "allow_nil" => {
                    let flag = parse_flag(input)?;
                    quote!(.allow_nil(#flag))
                }
                "allow_blank" => {
                    let flag = parse_flag(input)?;
                    quote!(.allow_blank(#flag))
                }
                "if" => {
                    input.parse::<Token![=]>()?;
                    let guard = parse_guard(input, host)?;
                    quote!(.when(#guard))
                }
                "unless" => {
                    input.parse::<Token![=]>()?;
                    let guard = parse_guard(input, host)?;
                    quote!(.unless(#guard))
                }
                "message" => {
                    input.parse::<Token![=]>()?;
                    let message: LitStr = input.parse()?;
                    quote!(.message(#message))
                }
                "attributes" => {
                    let keys: Vec<LitStr> = if input.peek(Token![=]) {
                        input.parse::<Token![=]>()?;
                        vec![input.parse()?]
                    } else {
                        let content;
                        syn::parenthesized!(content in input);
                        Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?
                            .into_iter()
                            .collect()
                    };
                    quote!(.attributes::<_, &str>([#(#keys),*]))
                }
                _ => {
                    return Err(syn::Error::new(key.span(), format!("{key} is invalid options")));
                }
            };
            options.push(option);
        }

        Ok(BridgeDecl { name, options })
    }
}

/// A bare flag means `true`; `flag = bool` is explicit.
fn parse_flag(input: ParseStream) -> syn::Result<LitBool> {
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
        input.parse()
    } else {
        Ok(LitBool::new(true, Span::call_site()))
    }
}

/// `"property"`, `true`/`false`, a function path, or a non-capturing closure.
fn parse_guard(input: ParseStream, host: &Ident) -> syn::Result<TokenStream> {
    let expr: Expr = input.parse()?;
    match &expr {
        Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) => Ok(quote! {
            ::partitional::Guard::<#host>::property(#name)
        }),
        Expr::Lit(ExprLit { lit: Lit::Bool(value), .. }) => Ok(quote! {
            ::partitional::Guard::<#host>::Constant(#value)
        }),
        Expr::Path(_) | Expr::Closure(_) => Ok(quote! {
            ::partitional::Guard::<#host>::Predicate((#expr) as fn(&#host) -> bool)
        }),
        _ => Err(syn::Error::new_spanned(
            expr,
            "guard must be a property name, a bool, a function path, or a closure",
        )),
    }
}

/// One entry of the host's rule set, in attribute order.
enum HostRule {
    /// Default bridge of a partition declared with validation on.
    Partition(usize),
    Bridge(BridgeDecl),
    Validate(syn::Path),
}

struct HostAttrs {
    partitions: Vec<Partition>,
    rules: Vec<HostRule>,
}

fn host_attrs(attrs: &[Attribute], host: &Ident) -> syn::Result<HostAttrs> {
    let mut partitions: Vec<Partition> = Vec::new();
    let mut rules = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("partition") {
            let partition = attr.parse_args_with(Partition::parse)?;
            if partitions.iter().any(|existing| existing.name == partition.name) {
                return Err(syn::Error::new(
                    partition.name.span(),
                    format!("partial `{}` is declared twice on {host}", partition.name),
                ));
            }
            rules.push(HostRule::Partition(partitions.len()));
            partitions.push(partition);
        } else if attr.path().is_ident("validates_partial") {
            let bridge = attr.parse_args_with(|input: ParseStream| BridgeDecl::parse(input, host))?;
            rules.push(HostRule::Bridge(bridge));
        } else if attr.path().is_ident("validate") {
            rules.push(HostRule::Validate(attr.parse_args()?));
        }
    }

    for rule in &rules {
        if let HostRule::Bridge(bridge) = rule {
            if !partitions.iter().any(|partition| partition.name == bridge.name) {
                return Err(syn::Error::new(
                    bridge.name.span(),
                    format!("{host} declares no partial named `{}`", bridge.name),
                ));
            }
        }
    }

    Ok(HostAttrs { partitions, rules })
}

/// Exactly one field of `kind`.
fn single_field<'a>(fields: &[RecordField<'a>], kind: FieldKind, marker: &str) -> syn::Result<&'a Ident> {
    let mut found = fields.iter().filter(|field| field.kind == kind);
    match (found.next(), found.next()) {
        (Some(field), None) => Ok(field.ident),
        (None, _) => Err(syn::Error::new(
            Span::call_site(),
            format!("Host derive requires a `#[record({marker})]` field"),
        )),
        (Some(_), Some(extra)) => Err(syn::Error::new(
            extra.ident.span(),
            format!("only one field may be `#[record({marker})]`"),
        )),
    }
}

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;
    let host_name = name.to_string();

    let fields = record::named_fields(input, "Host")?;
    let fields = record::record_fields(fields)?;
    let errors = single_field(&fields, FieldKind::Errors, "errors")?;
    let partials = single_field(&fields, FieldKind::Partials, "partials")?;
    let HostAttrs { partitions, rules } = host_attrs(&input.attrs, name)?;

    let record_impl = record::expand_record(name, &fields);

    let rule_pushes = rules.iter().filter_map(|rule| match rule {
        HostRule::Partition(index) => {
            let partition = &partitions[*index];
            let overridden = rules
                .iter()
                .any(|rule| matches!(rule, HostRule::Bridge(bridge) if bridge.name == partition.name));
            if !partition.validation || overridden {
                return None;
            }
            let key = partition.name.unraw().to_string();
            Some(quote! {
                rules.push(::partitional::ValidationBridge::new(
                    #key,
                    ::partitional::BridgeOptions::<#name>::new(),
                ));
            })
        }
        HostRule::Bridge(bridge) => {
            let key = bridge.name.unraw().to_string();
            let options = &bridge.options;
            Some(quote! {
                rules.push(::partitional::ValidationBridge::new(
                    #key,
                    ::partitional::BridgeOptions::<#name>::new() #(#options)*,
                ));
            })
        }
        HostRule::Validate(check) => Some(quote! {
            rules.push(::partitional::FnRule::<#name>::new(#check));
        }),
    });

    let accessors = partitions.iter().map(|partition| {
        let getter = &partition.name;
        let setter = format_ident!("set_{}", partition.name.unraw());
        let key = partition.name.unraw().to_string();
        let target = &partition.target;
        let getter_doc = format!("The memoized `{key}` partial, bound to this record.");
        let setter_doc = format!("Replace the `{key}` partial, copying `origin`'s directly mapped attributes.");
        quote! {
            #[doc = #getter_doc]
            #vis fn #getter(&mut self) -> ::partitional::PartialProxy<'_, #target> {
                ::partitional::binder::fetch(self, #key)
            }

            #[doc = #setter_doc]
            #vis fn #setter<O>(&mut self, origin: &O) -> ::core::result::Result<(), ::partitional::Error>
            where
                O: ::partitional::ReadAttribute + ?::core::marker::Sized,
            {
                ::partitional::binder::assign::<Self, #target, O>(self, #key, origin)
            }
        }
    });

    let submissions = partitions.iter().map(|partition| {
        let key = partition.name.unraw().to_string();
        let target = &partition.target;
        let target_name = quote!(#target).to_string().replace(' ', "");
        let validation = partition.validation;
        let prefix = match &partition.prefix {
            Some(prefix) => quote!(::core::option::Option::Some(#prefix)),
            None => quote!(::core::option::Option::None),
        };
        let entries = partition.mapping.iter().map(|(attribute, path)| {
            let attribute = attribute.unraw().to_string();
            quote!((#attribute, #path))
        });
        let asserts = partition.mapping.iter().map(|(attribute, _)| {
            let attribute = attribute.unraw().to_string();
            let message = format!("`{attribute}` is not an attribute of {target_name}");
            quote! {
                const _: () = ::core::assert!(
                    ::partitional::mapping::declares(
                        <#target as ::partitional::Partial>::ATTRIBUTES,
                        #attribute,
                    ),
                    #message,
                );
            }
        });
        quote! {
            #(#asserts)*

            ::partitional::__private::inventory::submit! {
                ::partitional::registry::Declaration {
                    host: ::core::any::TypeId::of::<#name>,
                    host_name: #host_name,
                    name: #key,
                    target: ::core::any::TypeId::of::<#target>,
                    target_name: <#target as ::partitional::Partial>::NAME,
                    attributes: <#target as ::partitional::Partial>::ATTRIBUTES,
                    mapping: &[#(#entries),*],
                    prefix: #prefix,
                    validation: #validation,
                    validate: <#target as ::partitional::Partial>::validate,
                }
            }
        }
    });

    Ok(quote! {
        #record_impl

        impl ::partitional::Host for #name {
            fn errors(&self) -> &::partitional::Errors {
                &self.#errors
            }

            fn errors_mut(&mut self) -> &mut ::partitional::Errors {
                &mut self.#errors
            }

            fn partials_mut(&mut self) -> &mut ::partitional::Partials {
                &mut self.#partials
            }

            fn rules() -> &'static ::partitional::RuleSet<Self> {
                static RULES: ::partitional::__private::Lazy<::partitional::RuleSet<#name>> =
                    ::partitional::__private::Lazy::new(|| {
                        #[allow(unused_mut)]
                        let mut rules = ::partitional::RuleSet::<#name>::new();
                        #(#rule_pushes)*
                        rules
                    });
                &RULES
            }
        }

        impl #name {
            #(#accessors)*
        }

        #(#submissions)*
    })
}
