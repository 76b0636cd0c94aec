//! Code emitter: one [`EmittedArtifact`] per resolved declaration.
//!
//! ```text
//! ResolvedSpec
//!   ├── OptionAccumulator -> options::expand_options
//!   └── NamedDirective    -> policy::expand_policy
//! ```

mod options;
mod policy;

use proc_macro2::TokenStream as TokenStream2;
use quote::ToTokens;
use syn::Ident;

use crate::common::GenerationError;
use crate::model::{ResolvedSpec, Role};

/// Generated source for exactly one declaration.
#[derive(Debug, Clone)]
pub struct EmittedArtifact {
    /// The declaration this was generated from.
    pub declaration: Ident,
    tokens: TokenStream2,
}

impl EmittedArtifact {
    #[cfg(test)]
    pub fn tokens(&self) -> &TokenStream2 {
        &self.tokens
    }

    /// Generated source text.
    pub fn source(&self) -> String {
        self.tokens.to_string()
    }

    /// BLAKE3 digest of the source, identical across runs on identical input.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.source().as_bytes()).to_hex().to_string()
    }
}

impl ToTokens for EmittedArtifact {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        self.tokens.to_tokens(tokens);
    }
}

/// Emitter run context. One per generation run.
#[derive(Debug, Default)]
pub struct Emitter {
    items_emitted: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Functions generated so far in this run.
    pub fn items_emitted(&self) -> usize {
        self.items_emitted
    }

    pub fn emit(&mut self, spec: &ResolvedSpec) -> Result<EmittedArtifact, GenerationError> {
        let (tokens, items) = match &spec.role {
            Role::OptionAccumulator { markers } => {
                options::expand_options(spec, markers).map_err(|err| GenerationError::EmissionFault {
                    declaration: spec.name(),
                    reason: err.to_string(),
                })?
            }
            Role::NamedDirective { directive, accumulator } => policy::expand_policy(spec, directive, accumulator),
        };

        self.items_emitted += items;
        Ok(EmittedArtifact {
            declaration: spec.ident.clone(),
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{scan, Batch, Resolver};
    use pretty_assertions::assert_eq;
    use syn::{parse_quote, ImplItem, Item};

    fn resolve(batch: Batch) -> Vec<ResolvedSpec> {
        let scan = scan(batch.items);
        let resolver = Resolver::new(&scan.declarations);
        scan.declarations
            .iter()
            .filter_map(|d| resolver.resolve(d).ok().flatten())
            .collect()
    }

    /// Names of the inherent methods, in emission order.
    fn inherent_methods(artifact: &EmittedArtifact) -> Vec<String> {
        let file: syn::File = syn::parse2(artifact.tokens().clone()).expect("artifact parses as Rust");
        file.items
            .iter()
            .filter_map(|item| match item {
                Item::Impl(imp) if imp.trait_.is_none() => Some(imp),
                _ => None,
            })
            .flat_map(|imp| imp.items.iter())
            .filter_map(|item| match item {
                ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_methods_follow_marker_order() {
        let specs = resolve(parse_quote! {
            #[policy_options]
            #[add_nonce]
            #[add_self]
            #[add_hash_value]
            pub struct ScriptSrcPolicyOptions;
        });
        let artifact = Emitter::new().emit(&specs[0]).unwrap();

        assert_eq!(
            inherent_methods(&artifact),
            [
                "new",
                "add_value",
                "add_value_if",
                "add_nonce",
                "add_nonce_if",
                "add_self",
                "add_self_if",
                "add_hash_value",
                "add_hash_value_if",
            ]
        );
    }

    #[test]
    fn test_method_override() {
        let specs = resolve(parse_quote! {
            #[policy_options]
            #[add_self(method = "allow_self")]
            #[add_literal(value = "'inline-speculation-rules'", method = "add_inline_speculation_rules")]
            struct RulesPolicyOptions;
        });
        let artifact = Emitter::new().emit(&specs[0]).unwrap();
        let methods = inherent_methods(&artifact);

        assert!(methods.contains(&"allow_self_if".to_string()));
        assert!(methods.contains(&"add_inline_speculation_rules".to_string()));
        assert!(!methods.contains(&"add_self".to_string()));
        assert!(artifact.source().contains("\"'inline-speculation-rules'\""));
    }

    #[test]
    fn test_directive_artifact() {
        let specs = resolve(parse_quote! {
            #[policy_options]
            #[add_self]
            pub struct BaseUriPolicyOptions;

            /// base-uri policy.
            #[policy("base-uri")]
            pub struct BaseUriPolicy;
        });
        let artifact = Emitter::new().emit(&specs[1]).unwrap();

        assert_eq!(artifact.declaration.to_string(), "BaseUriPolicy");
        assert_eq!(inherent_methods(&artifact), ["new", "options"]);
        assert!(artifact.source().contains("\"base-uri\""));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let input: Batch = parse_quote! {
            #[policy_options]
            #[add_self]
            #[add_scheme_source]
            struct ImgSrcPolicyOptions;
        };
        let specs = resolve(input);

        let first = Emitter::new().emit(&specs[0]).unwrap();
        let second = Emitter::new().emit(&specs[0]).unwrap();
        assert_eq!(first.source(), second.source());
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn test_invalid_method_name_is_an_emission_fault() {
        let specs = resolve(parse_quote! {
            #[policy_options]
            #[add_self(method = "add-self")]
            struct BadPolicyOptions;
        });
        let mut emitter = Emitter::new();
        let err = emitter.emit(&specs[0]).unwrap_err();

        assert!(matches!(&err, GenerationError::EmissionFault { declaration, .. } if declaration == "BadPolicyOptions"));
        assert_eq!(err.code(), "CSP0001");
        assert_eq!(emitter.items_emitted(), 0);
    }

    #[test]
    fn test_items_emitted_counts_the_run() {
        let specs = resolve(parse_quote! {
            #[policy_options]
            #[add_self]
            #[add_nonce]
            struct ChildSrcPolicyOptions;

            #[policy("child-src")]
            struct ChildSrcPolicy;
        });
        let mut emitter = Emitter::new();
        for spec in &specs {
            emitter.emit(spec).unwrap();
        }
        assert_eq!(emitter.items_emitted(), (6 + 4) + 4);
    }
}
