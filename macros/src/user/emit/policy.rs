//! Named directive expansion.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Ident;

use crate::model::ResolvedSpec;

/// `new`, `options`, `policy_value` and `fmt`.
const ITEMS: usize = 4;

pub(super) fn expand_policy(spec: &ResolvedSpec, directive: &str, accumulator: &Ident) -> (TokenStream2, usize) {
    let ident = &spec.ident;
    let vis = &spec.vis;
    let attrs = &spec.attrs;

    let new_doc = format!(
        "Creates the `{}` directive. `configure` receives fresh [`{}`] and runs once, before this returns.",
        directive, accumulator
    );

    let tokens = quote! {
        #(#attrs)*
        #[derive(Debug, Clone, PartialEq, Eq)]
        #vis struct #ident {
            options: #accumulator,
        }

        impl #ident {
            #[doc = #new_doc]
            pub fn new(
                nonce: impl ::core::convert::Into<::csp_policy::__private::String>,
                configure: impl ::core::ops::FnOnce(&mut #accumulator),
            ) -> Self {
                let mut options = <#accumulator as ::csp_policy::PolicyOptions>::with_nonce(nonce.into());
                configure(&mut options);
                #ident { options }
            }

            pub fn options(&self) -> &#accumulator {
                &self.options
            }
        }

        impl ::csp_policy::Policy for #ident {
            const NAME: &'static str = #directive;

            fn policy_value(&self) -> ::csp_policy::__private::String {
                ::csp_policy::assemble_policy(Self::NAME, ::csp_policy::PolicyOptions::values(&self.options))
            }
        }

        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::csp_policy::write_policy(
                    f,
                    <Self as ::csp_policy::Policy>::NAME,
                    ::csp_policy::PolicyOptions::values(&self.options),
                )
            }
        }
    };

    (tokens, ITEMS)
}
