//! Batch driver for `policies!`.
//!
//! Scans the batch, resolves every declaration, emits the options types and
//! then the directives wrapping them, and collects whatever went wrong along
//! the way. One bad declaration never costs the others their artifacts; a
//! directive is only emitted next to its options type.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Item;

use super::emit::{EmittedArtifact, Emitter};
use crate::common::{Diagnostic, Diagnostics, GenerationError};
use crate::model::{scan, Batch, Resolver, Role, Scan};

/// Everything one run produced.
pub struct GenerationOutput {
    pub artifacts: Vec<EmittedArtifact>,
    /// Items that take no part in generation, re-emitted unchanged.
    pub passthrough: Vec<Item>,
    pub diagnostics: Diagnostics,
}

impl GenerationOutput {
    #[cfg(test)]
    pub fn artifact(&self, declaration: &str) -> Option<&EmittedArtifact> {
        self.artifacts.iter().find(|a| a.declaration == declaration)
    }

    pub fn into_token_stream(self) -> TokenStream2 {
        let passthrough = &self.passthrough;
        let artifacts = &self.artifacts;
        let errors = self.diagnostics.to_compile_errors();
        quote! {
            #(#passthrough)*
            #(#artifacts)*
            #errors
        }
    }
}

pub fn generate(batch: Batch) -> GenerationOutput {
    let Scan {
        declarations,
        mut passthrough,
    } = scan(batch.items);

    let resolver = Resolver::new(&declarations);
    let mut emitter = Emitter::new();

    // Per-declaration slots keep artifacts and diagnostics in source order
    // even though accumulators are emitted before the directives wrapping them.
    let mut emitted: Vec<Option<EmittedArtifact>> = vec![None; declarations.len()];
    let mut reported: Vec<Vec<Diagnostic>> = vec![Vec::new(); declarations.len()];
    let mut directives = Vec::new();

    for (index, decl) in declarations.iter().enumerate() {
        match resolver.resolve(decl) {
            Ok(Some(spec)) => match spec.role {
                Role::OptionAccumulator { .. } => match emitter.emit(&spec) {
                    Ok(artifact) => emitted[index] = Some(artifact),
                    Err(err) => reported[index].push(Diagnostic::new(err, decl.span())),
                },
                Role::NamedDirective { .. } => directives.push((index, spec)),
            },
            Ok(None) => {
                tracing::trace!(declaration = %decl.ident, "no role marker, passing through");
                passthrough.push(decl.item.clone());
            }
            Err(errors) => reported[index] = errors,
        }
    }

    for (index, spec) in directives {
        let Role::NamedDirective { accumulator, .. } = &spec.role else {
            continue;
        };
        let paired = emitted.iter().flatten().any(|a| a.declaration == *accumulator);
        if !paired {
            reported[index].push(Diagnostic::new(
                GenerationError::InvalidPairedAccumulator {
                    declaration: spec.name(),
                    accumulator: accumulator.to_string(),
                },
                spec.ident.span(),
            ));
            continue;
        }
        match emitter.emit(&spec) {
            Ok(artifact) => emitted[index] = Some(artifact),
            Err(err) => reported[index].push(Diagnostic::new(err, spec.ident.span())),
        }
    }

    let artifacts: Vec<EmittedArtifact> = emitted.into_iter().flatten().collect();
    let mut diagnostics = Diagnostics::default();
    diagnostics.extend(reported.into_iter().flatten());

    for artifact in &artifacts {
        tracing::trace!(
            declaration = %artifact.declaration,
            fingerprint = %artifact.fingerprint(),
            "emitted"
        );
    }
    for diagnostic in diagnostics.iter() {
        tracing::debug!(
            severity = ?diagnostic.severity,
            code = diagnostic.code(),
            declaration = diagnostic.declaration(),
            "{}",
            diagnostic.message()
        );
    }
    tracing::debug!(
        artifacts = artifacts.len(),
        diagnostics = diagnostics.len(),
        items_emitted = emitter.items_emitted(),
        "policy generation finished"
    );

    GenerationOutput {
        artifacts,
        passthrough,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_bad_declaration_does_not_block_others() {
        let output = generate(parse_quote! {
            #[policy_options]
            #[add_self]
            #[add_nonce]
            pub struct ScriptSrcPolicyOptions;

            #[policy("script-src")]
            pub struct ScriptSrcPolicy;

            #[policy_options]
            #[add_self]
            #[add_sparkles]
            pub struct StylePolicyOptions;
        });

        assert_eq!(output.artifacts.len(), 2);
        assert!(output.artifact("ScriptSrcPolicyOptions").is_some());
        assert!(output.artifact("ScriptSrcPolicy").is_some());
        assert!(output.artifact("StylePolicyOptions").is_none());

        assert_eq!(output.diagnostics.len(), 1);
        let diagnostic = output.diagnostics.iter().next().unwrap();
        assert!(matches!(diagnostic.error, GenerationError::UnknownMarker { ref marker, .. } if marker == "add_sparkles"));
        assert_eq!(output.diagnostics.for_declaration("StylePolicyOptions").count(), 1);
    }

    #[test]
    fn test_every_issue_is_reported() {
        let output = generate(parse_quote! {
            #[policy("base-uri")]
            struct BaseUriPolicy;

            #[policy_options]
            #[add_self(method = "self")]
            struct KeywordPolicyOptions;

            #[policy_options]
            enum NotAStruct { A }
        });

        let codes: Vec<_> = output.diagnostics.iter().map(|d| d.code()).collect();
        assert_eq!(codes, ["CSP0003", "CSP0001", "CSP0006"]);
        assert!(output.artifacts.is_empty());

        let rendered = output.into_token_stream().to_string();
        assert_eq!(rendered.matches("compile_error").count(), 3);
        assert!(rendered.contains("CSP0003"));
    }

    #[test]
    fn test_unmarked_items_pass_through() {
        let output = generate(parse_quote! {
            use std::fmt;

            #[derive(Debug)]
            struct Helper;

            #[add_self]
            struct NoRole;
        });

        assert!(output.artifacts.is_empty());
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.passthrough.len(), 3);

        let rendered = output.into_token_stream().to_string();
        assert!(rendered.contains("Helper"));
        assert!(!rendered.contains("add_self"));
    }

    #[test]
    fn test_directive_is_dropped_when_its_options_fail_to_emit() {
        let output = generate(parse_quote! {
            #[policy_options]
            #[add_self(method = "add-self")]
            pub struct ScriptSrcPolicyOptions;

            #[policy("script-src")]
            pub struct ScriptSrcPolicy;
        });

        assert!(output.artifacts.is_empty());
        assert!(output.artifact("ScriptSrcPolicy").is_none());
        let codes: Vec<_> = output.diagnostics.iter().map(|d| d.code()).collect();
        assert_eq!(codes, ["CSP0001", "CSP0004"]);
    }

    #[test]
    fn test_artifacts_keep_source_order() {
        let output = generate(parse_quote! {
            #[policy("img-src")]
            pub struct ImgSrcPolicy;

            #[policy_options]
            #[add_self]
            pub struct ImgSrcPolicyOptions;
        });

        let names: Vec<_> = output.artifacts.iter().map(|a| a.declaration.to_string()).collect();
        assert_eq!(names, ["ImgSrcPolicy", "ImgSrcPolicyOptions"]);
    }
}
