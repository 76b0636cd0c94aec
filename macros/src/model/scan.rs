//! Declaration scanner.
//!
//! Walks the items of a `policies!` batch and records, per type
//! declaration, its marker attributes in source order. Marker arguments are
//! kept raw: the resolver parses them, so the scanner never fails.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    Attribute, Fields, Ident, Item, Meta, Visibility,
};

use super::catalog::{is_marker_name, POLICY, POLICY_OPTIONS};

/// Input of `policies! { ... }`: any sequence of items.
pub struct Batch {
    pub items: Vec<Item>,
}

impl Parse for Batch {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut items = Vec::new();
        while !input.is_empty() {
            items.push(input.parse()?);
        }
        Ok(Batch { items })
    }
}

/// A marker attribute as written, e.g. `#[add_hash_value]` or `#[policy("base-uri")]`.
#[derive(Clone)]
pub struct MarkerRef {
    pub name: Ident,
    pub meta: Meta,
}

impl MarkerRef {
    pub fn is_role(&self) -> bool {
        self.name == POLICY || self.name == POLICY_OPTIONS
    }

    pub fn span(&self) -> Span {
        self.name.span()
    }
}

/// What kind of item a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclShape {
    UnitStruct,
    FieldStruct,
    GenericStruct,
    Enum,
    Union,
}

/// One scanned type declaration.
#[derive(Clone)]
pub struct Declaration {
    pub ident: Ident,
    pub vis: Visibility,
    /// Non-marker attributes, carried onto the generated type.
    pub attrs: Vec<Attribute>,
    /// Marker attributes in attachment order.
    pub markers: Vec<MarkerRef>,
    pub shape: DeclShape,
    /// The item itself with marker attributes removed; re-emitted as is
    /// when the declaration takes no part in generation.
    pub item: Item,
}

impl Declaration {
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    pub fn span(&self) -> Span {
        self.ident.span()
    }

    pub fn role_markers(&self) -> impl Iterator<Item = &MarkerRef> {
        self.markers.iter().filter(|m| m.is_role())
    }

    pub fn catalog_markers(&self) -> impl Iterator<Item = &MarkerRef> {
        self.markers.iter().filter(|m| !m.is_role())
    }
}

/// Scanned batch: type declarations plus every other item, both in source order.
pub struct Scan {
    pub declarations: Vec<Declaration>,
    pub passthrough: Vec<Item>,
}

pub fn scan(items: Vec<Item>) -> Scan {
    let mut declarations = Vec::new();
    let mut passthrough = Vec::new();

    for mut item in items {
        let (ident, vis, shape, attrs) = match &mut item {
            Item::Struct(s) => {
                let shape = if !s.generics.params.is_empty() {
                    DeclShape::GenericStruct
                } else if matches!(s.fields, Fields::Unit) {
                    DeclShape::UnitStruct
                } else {
                    DeclShape::FieldStruct
                };
                (s.ident.clone(), s.vis.clone(), shape, &mut s.attrs)
            }
            Item::Enum(e) => (e.ident.clone(), e.vis.clone(), DeclShape::Enum, &mut e.attrs),
            Item::Union(u) => (u.ident.clone(), u.vis.clone(), DeclShape::Union, &mut u.attrs),
            _ => {
                passthrough.push(item);
                continue;
            }
        };

        let (markers, kept) = split_markers(std::mem::take(attrs));
        attrs.clone_from(&kept);

        declarations.push(Declaration {
            ident,
            vis,
            attrs: kept,
            markers,
            shape,
            item,
        });
    }

    Scan { declarations, passthrough }
}

fn split_markers(attrs: Vec<Attribute>) -> (Vec<MarkerRef>, Vec<Attribute>) {
    let mut markers = Vec::new();
    let mut kept = Vec::new();

    for attr in attrs {
        match attr.path().get_ident() {
            Some(ident) if is_marker_name(&ident.to_string()) => markers.push(MarkerRef {
                name: ident.clone(),
                meta: attr.meta,
            }),
            _ => kept.push(attr),
        }
    }

    (markers, kept)
}
