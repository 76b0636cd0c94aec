//! Option accumulator expansion.
//!
//! ```ignore
//! #[policy_options]
//! #[add_self]
//! #[add_nonce]
//! pub struct ScriptSrcPolicyOptions;
//! ```
//!
//! expands to a struct holding the accumulated values and the nonce, the
//! `add_value` / `add_value_if` primitives, one `add_x` / `add_x_if` pair per
//! marker (in marker order) and the `PolicyOptions` impl.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

use crate::common::{conditional_ident, parse_ident};
use crate::model::{Parameter, ResolvedMarker, ResolvedSpec, Shape};

/// Functions generated besides the per-marker pairs: `new`, `add_value`,
/// `add_value_if` and the three `PolicyOptions` methods.
const FIXED_ITEMS: usize = 6;

pub(super) fn expand_options(spec: &ResolvedSpec, markers: &[ResolvedMarker]) -> syn::Result<(TokenStream2, usize)> {
    let ident = &spec.ident;
    let vis = &spec.vis;
    let attrs = &spec.attrs;

    let methods = markers
        .iter()
        .map(expand_marker)
        .collect::<syn::Result<Vec<_>>>()?;

    let tokens = quote! {
        #(#attrs)*
        #[derive(Debug, Clone, PartialEq, Eq)]
        #vis struct #ident {
            values: ::csp_policy::PolicyValues,
            nonce: ::csp_policy::__private::String,
        }

        impl #ident {
            /// Creates empty options. `nonce` is captured once and used for every nonce added.
            pub fn new(nonce: impl ::core::convert::Into<::csp_policy::__private::String>) -> Self {
                #ident {
                    values: ::csp_policy::PolicyValues::new(),
                    nonce: nonce.into(),
                }
            }

            /// Adds a policy value.
            pub fn add_value(&mut self, value: impl ::core::convert::Into<::csp_policy::__private::String>) -> &mut Self {
                self.values.push(value);
                self
            }

            /// Conditionally adds a policy value.
            ///
            /// `condition` is called exactly once; the value is added only if it returns `true`.
            pub fn add_value_if(
                &mut self,
                value: impl ::core::convert::Into<::csp_policy::__private::String>,
                condition: impl ::core::ops::FnOnce() -> bool,
            ) -> &mut Self {
                if condition() { self.add_value(value) } else { self }
            }

            #(#methods)*
        }

        impl ::csp_policy::PolicyOptions for #ident {
            fn with_nonce(nonce: ::csp_policy::__private::String) -> Self {
                #ident::new(nonce)
            }

            fn values(&self) -> &::csp_policy::PolicyValues {
                &self.values
            }

            fn nonce(&self) -> &str {
                &self.nonce
            }
        }
    };

    Ok((tokens, FIXED_ITEMS + 2 * markers.len()))
}

/// The `add_x` / `add_x_if` pair for one marker.
fn expand_marker(marker: &ResolvedMarker) -> syn::Result<TokenStream2> {
    let method = parse_ident(&marker.method, marker.span)?;
    let method_if = conditional_ident(&method);

    let (params, args, value) = match (marker.definition.shape, &marker.literal) {
        (Shape::Literal(_) | Shape::CallerLiteral, Some(token)) => (quote! {}, quote! {}, quote! { #token }),
        (Shape::Parameterized(parameter), _) => parameterized(parameter),
        (_, None) => {
            return Err(syn::Error::new(
                marker.span,
                format!("literal marker `{}` resolved without a token", marker.definition.name),
            ));
        }
    };

    let what = match &marker.literal {
        Some(token) => format!("`{}`", token),
        None => marker.definition.summary.to_string(),
    };
    let doc = format!("Adds {} to the policy.", what);
    let doc_if = format!("Conditionally adds {} to the policy.", what);

    Ok(quote! {
        #[doc = #doc]
        pub fn #method(&mut self, #params) -> &mut Self {
            self.add_value(#value)
        }

        #[doc = #doc_if]
        ///
        /// `condition` is called exactly once, before anything is added.
        pub fn #method_if(&mut self, #params condition: impl ::core::ops::FnOnce() -> bool) -> &mut Self {
            if condition() { self.#method(#args) } else { self }
        }
    })
}

/// Parameters (with trailing comma), forwarded arguments, and the formatted value.
fn parameterized(parameter: Parameter) -> (TokenStream2, TokenStream2, TokenStream2) {
    match parameter {
        Parameter::GroupName => (
            quote! { group_name: impl ::core::convert::Into<::csp_policy::__private::String>, },
            quote! { group_name },
            quote! { group_name },
        ),
        Parameter::HashValue => (
            quote! { algorithm: ::csp_policy::HashAlgorithm, hash: impl ::core::convert::AsRef<str>, },
            quote! { algorithm, hash },
            quote! { ::csp_policy::__private::format!("'{}-{}'", algorithm.as_str(), hash.as_ref()) },
        ),
        Parameter::HostSource => (
            quote! { host: impl ::core::convert::AsRef<str>, },
            quote! { host },
            quote! { ::csp_policy::__private::format!("'{}'", host.as_ref()) },
        ),
        Parameter::Nonce => (
            quote! {},
            quote! {},
            quote! { ::csp_policy::__private::format!("'nonce-{}'", self.nonce) },
        ),
        Parameter::SchemeSource => (
            quote! { scheme: ::csp_policy::SchemeSource, },
            quote! { scheme },
            quote! { ::csp_policy::__private::format!("{}:", scheme.as_str()) },
        ),
        Parameter::Uri => (
            quote! { uri: impl ::core::convert::Into<::csp_policy::__private::String>, },
            quote! { uri },
            quote! { uri },
        ),
    }
}
