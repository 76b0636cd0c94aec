//! Policy model builder.
//!
//! Turns a scanned [`Declaration`] into a [`ResolvedSpec`]:
//!
//! ```text
//! #[policy_options] + markers  -> Role::OptionAccumulator { markers }
//! #[policy("name")]            -> Role::NamedDirective { directive, accumulator }
//! neither                      -> skipped (Ok(None))
//! ```
//!
//! Failures are collected per declaration and returned as diagnostics; they
//! never stop the rest of the batch.

use std::collections::HashMap;

use proc_macro2::Span;
use syn::{Attribute, Ident, Visibility};

use super::catalog::{lookup, MarkerDefinition, Shape, POLICY, POLICY_OPTIONS};
use super::scan::{DeclShape, Declaration, MarkerRef};
use crate::common::{paired_options_ident, unraw, without_generated_derives, Diagnostic, GenerationError, MarkerArgs};

/// A catalog marker bound to one declaration.
#[derive(Debug, Clone)]
pub struct ResolvedMarker {
    pub definition: &'static MarkerDefinition,
    /// Method name: the `method = "..."` override or the catalog default.
    pub method: String,
    /// Token for literal markers, fixed or caller-supplied.
    pub literal: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Role {
    OptionAccumulator { markers: Vec<ResolvedMarker> },
    NamedDirective { directive: String, accumulator: Ident },
}

/// Emission-ready model of one declaration.
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    pub ident: Ident,
    pub vis: Visibility,
    pub attrs: Vec<Attribute>,
    pub role: Role,
}

impl ResolvedSpec {
    pub fn name(&self) -> String {
        self.ident.to_string()
    }
}

pub type Resolution = Result<Option<ResolvedSpec>, Vec<Diagnostic>>;

/// Resolves declarations against the rest of their batch.
pub struct Resolver<'a> {
    by_name: HashMap<String, &'a Declaration>,
}

impl<'a> Resolver<'a> {
    pub fn new(declarations: &'a [Declaration]) -> Self {
        let mut by_name = HashMap::new();
        for decl in declarations {
            by_name.entry(decl.name()).or_insert(decl);
        }
        Resolver { by_name }
    }

    pub fn resolve(&self, decl: &Declaration) -> Resolution {
        let roles: Vec<&MarkerRef> = decl.role_markers().collect();
        let Some(role_marker) = roles.first() else {
            return Ok(None);
        };

        let mut errors = Vec::new();
        if let Some(extra) = roles.get(1) {
            let reason = if extra.name == role_marker.name {
                "role marker repeated".to_string()
            } else {
                "a type cannot be both `#[policy]` and `#[policy_options]`".to_string()
            };
            errors.push(invalid_marker(decl, extra, reason));
        }
        if let Err(err) = check_shape(decl) {
            errors.push(err);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let role = if role_marker.name == POLICY {
            self.resolve_directive(decl, role_marker)?
        } else {
            Role::OptionAccumulator {
                markers: resolve_options(decl, role_marker)?,
            }
        };

        Ok(Some(ResolvedSpec {
            ident: decl.ident.clone(),
            vis: decl.vis.clone(),
            attrs: without_generated_derives(&decl.attrs),
            role,
        }))
    }

    fn resolve_directive(&self, decl: &Declaration, marker: &MarkerRef) -> Result<Role, Vec<Diagnostic>> {
        let mut errors = Vec::new();

        let directive = match MarkerArgs::from_meta(&marker.meta) {
            Ok(args) if args.named.is_empty() => match args.positional {
                Some(lit) => Some(lit.value()),
                None => {
                    errors.push(invalid_marker(decl, marker, "expected the directive name, e.g. `#[policy(\"script-src\")]`"));
                    None
                }
            },
            Ok(_) => {
                errors.push(invalid_marker(decl, marker, "only the directive name is accepted"));
                None
            }
            Err(err) => {
                errors.push(invalid_marker(decl, marker, err.to_string()));
                None
            }
        };

        for stray in decl.catalog_markers() {
            errors.push(invalid_marker(
                decl,
                stray,
                format!("`{}` belongs on the paired `#[policy_options]` type", stray.name),
            ));
        }

        let accumulator = paired_options_ident(&decl.ident);
        match self.by_name.get(&accumulator.to_string()) {
            None => errors.push(Diagnostic::new(
                GenerationError::MissingPairedAccumulator {
                    declaration: decl.name(),
                    expected: accumulator.to_string(),
                },
                decl.span(),
            )),
            Some(paired) if !is_valid_accumulator(paired) => errors.push(Diagnostic::new(
                GenerationError::InvalidPairedAccumulator {
                    declaration: decl.name(),
                    accumulator: accumulator.to_string(),
                },
                decl.span(),
            )),
            Some(_) => {}
        }

        match directive {
            Some(directive) if errors.is_empty() => Ok(Role::NamedDirective { directive, accumulator }),
            _ => Err(errors),
        }
    }
}

/// A paired accumulator must be an options type that resolves cleanly.
fn is_valid_accumulator(decl: &Declaration) -> bool {
    let roles: Vec<&MarkerRef> = decl.role_markers().collect();
    match roles.as_slice() {
        [only] if only.name == POLICY_OPTIONS => check_shape(decl).is_ok() && resolve_options(decl, only).is_ok(),
        _ => false,
    }
}

/// Methods every options type gets regardless of its markers.
const RESERVED_METHODS: [&str; 6] = ["new", "add_value", "add_value_if", "with_nonce", "values", "nonce"];

fn resolve_options(decl: &Declaration, role_marker: &MarkerRef) -> Result<Vec<ResolvedMarker>, Vec<Diagnostic>> {
    let mut errors = Vec::new();
    let mut markers: Vec<ResolvedMarker> = Vec::new();
    let mut taken: Vec<String> = RESERVED_METHODS.iter().map(|m| m.to_string()).collect();

    match MarkerArgs::from_meta(&role_marker.meta) {
        Ok(args) if args.is_empty() => {}
        Ok(_) => errors.push(invalid_marker(decl, role_marker, "`#[policy_options]` takes no arguments")),
        Err(err) => errors.push(invalid_marker(decl, role_marker, err.to_string())),
    }

    for marker in decl.catalog_markers() {
        let name = marker.name.to_string();
        let Some(definition) = lookup(&name) else {
            errors.push(Diagnostic::new(
                GenerationError::UnknownMarker {
                    declaration: decl.name(),
                    marker: name,
                },
                marker.span(),
            ));
            continue;
        };

        match resolve_marker(definition, marker) {
            Ok(resolved) => {
                let method = unraw(&resolved.method);
                let pair = [method.to_string(), format!("{}_if", method)];
                if let Some(clash) = pair.iter().find(|name| taken.contains(*name)) {
                    errors.push(invalid_marker(
                        decl,
                        marker,
                        format!("method `{}` is already generated for this type", clash),
                    ));
                } else {
                    taken.extend(pair);
                    markers.push(resolved);
                }
            }
            Err(reason) => errors.push(invalid_marker(decl, marker, reason)),
        }
    }

    if errors.is_empty() { Ok(markers) } else { Err(errors) }
}

fn resolve_marker(definition: &'static MarkerDefinition, marker: &MarkerRef) -> Result<ResolvedMarker, String> {
    let args = MarkerArgs::from_meta(&marker.meta).map_err(|err| err.to_string())?;
    if args.positional.is_some() {
        return Err("arguments must be named, e.g. `method = \"...\"`".to_string());
    }
    args.expect_keys(definition.accepted_keys())?;

    let method = match args.named("method") {
        Some(lit) => lit.value(),
        None if definition.method.is_empty() => {
            return Err(format!("`{}` requires `method = \"...\"`", definition.name));
        }
        None => definition.method.to_string(),
    };

    let literal = match definition.shape {
        Shape::Literal(token) => Some(token.to_string()),
        Shape::CallerLiteral => match args.named("value") {
            Some(lit) if !lit.value().trim().is_empty() => Some(lit.value()),
            Some(_) => return Err("`value` must not be empty".to_string()),
            None => return Err(format!("`{}` requires `value = \"...\"`", definition.name)),
        },
        Shape::Parameterized(_) => None,
    };

    Ok(ResolvedMarker {
        definition,
        method,
        literal,
        span: marker.span(),
    })
}

fn check_shape(decl: &Declaration) -> Result<(), Diagnostic> {
    let reason = match decl.shape {
        DeclShape::UnitStruct => return Ok(()),
        DeclShape::FieldStruct => "policy types must be unit structs; their fields are generated",
        DeclShape::GenericStruct => "policy types cannot be generic",
        DeclShape::Enum => "only structs can be policy types, found an enum",
        DeclShape::Union => "only structs can be policy types, found a union",
    };
    Err(Diagnostic::new(
        GenerationError::UnsupportedShape {
            declaration: decl.name(),
            reason: reason.to_string(),
        },
        decl.span(),
    ))
}

fn invalid_marker(decl: &Declaration, marker: &MarkerRef, reason: impl Into<String>) -> Diagnostic {
    Diagnostic::new(
        GenerationError::InvalidMarker {
            declaration: decl.name(),
            marker: marker.name.to_string(),
            reason: reason.into(),
        },
        marker.span(),
    )
}
