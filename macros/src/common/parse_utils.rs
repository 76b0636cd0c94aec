//! Common parsing utilities
//!
//! Shared parsing helpers for marker attributes.

use proc_macro2::Span;
use quote::format_ident;
use syn::{
    parse::{Parse, ParseStream},
    parse_quote,
    punctuated::Punctuated,
    Attribute, Ident, LitStr, Meta, Path, Token,
};

// =============================================================================
// Marker Arguments: `("positional", key = "value", ...)`
// =============================================================================

/// A single named argument: `key = "value"`
#[derive(Clone)]
pub struct NamedArg {
    pub key: Ident,
    pub value: LitStr,
}

/// Arguments attached to a marker attribute.
///
/// Used in:
/// - `#[policy("script-src")]`
/// - `#[add_self(method = "allow_self")]`
/// - `#[add_literal(value = "'unsafe-allow-redirects'", method = "add_unsafe_allow_redirects")]`
#[derive(Clone, Default)]
pub struct MarkerArgs {
    pub positional: Option<LitStr>,
    pub named: Vec<NamedArg>,
}

impl Parse for MarkerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = MarkerArgs::default();

        while !input.is_empty() {
            if input.peek(LitStr) {
                if args.positional.is_some() || !args.named.is_empty() {
                    return Err(input.error("a string argument must come first and appear once"));
                }
                args.positional = Some(input.parse()?);
            } else if input.peek(Ident) && input.peek2(Token![=]) {
                let key: Ident = input.parse()?;
                input.parse::<Token![=]>()?;
                let value: LitStr = input.parse()?;
                if args.named(&key.to_string()).is_some() {
                    return Err(syn::Error::new_spanned(&key, format!("duplicate argument `{}`", key)));
                }
                args.named.push(NamedArg { key, value });
            } else {
                return Err(input.error("expected a string literal or `key = \"value\"`"));
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        Ok(args)
    }
}

impl MarkerArgs {
    /// Parse the arguments of a marker attribute.
    ///
    /// `#[add_self]` has no arguments; `#[add_self(...)]` parses the list;
    /// `#[add_self = "..."]` is rejected.
    pub fn from_meta(meta: &Meta) -> syn::Result<Self> {
        match meta {
            Meta::Path(_) => Ok(MarkerArgs::default()),
            Meta::List(list) => list.parse_args(),
            Meta::NameValue(nv) => Err(syn::Error::new_spanned(
                nv,
                "markers take parenthesized arguments, e.g. `#[add_self(method = \"allow_self\")]`",
            )),
        }
    }

    pub fn named(&self, key: &str) -> Option<&LitStr> {
        self.named.iter().find(|arg| arg.key == key).map(|arg| &arg.value)
    }

    /// Reject any named argument not in `allowed`.
    pub fn expect_keys(&self, allowed: &[&str]) -> Result<(), String> {
        match self.named.iter().find(|arg| !allowed.contains(&arg.key.to_string().as_str())) {
            Some(arg) if allowed.is_empty() => Err(format!("unexpected argument `{}`; this marker takes no arguments", arg.key)),
            Some(arg) => Err(format!(
                "unexpected argument `{}`; expected one of: {}",
                arg.key,
                allowed.join(", ")
            )),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_none() && self.named.is_empty()
    }
}

// =============================================================================
// Identifier Helpers
// =============================================================================

/// Parse `name` as a Rust identifier located at `span`.
///
/// Keywords and malformed names (`add-self`, `self`) are rejected.
pub fn parse_ident(name: &str, span: Span) -> syn::Result<Ident> {
    let mut ident: Ident = syn::parse_str(name)?;
    ident.set_span(span);
    Ok(ident)
}

/// `r#new` -> `new`; other names are returned as is.
pub fn unraw(name: &str) -> &str {
    name.strip_prefix("r#").unwrap_or(name)
}

/// `add_self` -> `add_self_if`
pub fn conditional_ident(method: &Ident) -> Ident {
    format_ident!("{}_if", method, span = method.span())
}

/// `ScriptSrcPolicy` -> `ScriptSrcPolicyOptions`
pub fn paired_options_ident(policy: &Ident) -> Ident {
    format_ident!("{}Options", policy, span = policy.span())
}

// =============================================================================
// Derive Filtering
// =============================================================================

/// Traits every generated policy type already derives.
pub const GENERATED_DERIVES: [&str; 4] = ["Debug", "Clone", "PartialEq", "Eq"];

/// Remove [`GENERATED_DERIVES`] from `#[derive(...)]` attributes.
///
/// A derive left empty is dropped. Other attributes, and derives that do
/// not parse as a path list, are kept untouched.
pub fn without_generated_derives(attrs: &[Attribute]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("derive") {
                return Some(attr.clone());
            }
            let Ok(paths) = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) else {
                return Some(attr.clone());
            };
            let kept: Vec<&Path> = paths
                .iter()
                .filter(|path| {
                    !path
                        .segments
                        .last()
                        .is_some_and(|seg| GENERATED_DERIVES.iter().any(|name| seg.ident == *name))
                })
                .collect();
            if kept.is_empty() {
                None
            } else if kept.len() == paths.len() {
                Some(attr.clone())
            } else {
                Some(parse_quote!(#[derive(#(#kept),*)]))
            }
        })
        .collect()
}

/// Last path segment of every derived trait, across all derive attributes.
#[cfg(test)]
pub fn derived(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("derive"))
        .flat_map(|a| a.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated).unwrap())
        .map(|p| p.segments.last().unwrap().ident.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_derives_are_removed() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[doc = " Options."]),
            parse_quote!(#[derive(Debug, Default, std::clone::Clone)]),
            parse_quote!(#[derive(PartialEq, Eq)]),
            parse_quote!(#[derive(Hash)]),
        ];
        let kept = without_generated_derives(&attrs);

        assert_eq!(kept.len(), 3);
        assert!(kept[0].path().is_ident("doc"));
        assert_eq!(derived(&kept), ["Default", "Hash"]);
    }

    #[test]
    fn test_unraw() {
        assert_eq!(unraw("r#new"), "new");
        assert_eq!(unraw("add_self"), "add_self");
    }
}
