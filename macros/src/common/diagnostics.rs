//! Generation errors and the diagnostics reporter.
//!
//! Every failure is captured next to the declaration that caused it and
//! collected into [`Diagnostics`]. Nothing here aborts a batch: the
//! expansion carries the successful artifacts and one `compile_error!` per
//! diagnostic, so the build fails while still reporting every issue.

use proc_macro2::{Span, TokenStream as TokenStream2};

/// Failures raised while resolving or emitting a single declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("source generation encountered an error building `{declaration}`: {reason}")]
    EmissionFault { declaration: String, reason: String },

    #[error("unknown marker `{marker}` on `{declaration}`")]
    UnknownMarker { declaration: String, marker: String },

    #[error("policy `{declaration}` has no paired options type `{expected}` in this batch")]
    MissingPairedAccumulator { declaration: String, expected: String },

    #[error("policy `{declaration}` pairs with `{accumulator}`, which is not a valid `#[policy_options]` type")]
    InvalidPairedAccumulator { declaration: String, accumulator: String },

    #[error("invalid marker `{marker}` on `{declaration}`: {reason}")]
    InvalidMarker { declaration: String, marker: String, reason: String },

    #[error("`{declaration}` cannot carry policy markers: {reason}")]
    UnsupportedShape { declaration: String, reason: String },
}

impl GenerationError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::EmissionFault { .. } => "CSP0001",
            GenerationError::UnknownMarker { .. } => "CSP0002",
            GenerationError::MissingPairedAccumulator { .. } => "CSP0003",
            GenerationError::InvalidPairedAccumulator { .. } => "CSP0004",
            GenerationError::InvalidMarker { .. } => "CSP0005",
            GenerationError::UnsupportedShape { .. } => "CSP0006",
        }
    }

    pub fn declaration(&self) -> &str {
        match self {
            GenerationError::EmissionFault { declaration, .. }
            | GenerationError::UnknownMarker { declaration, .. }
            | GenerationError::MissingPairedAccumulator { declaration, .. }
            | GenerationError::InvalidPairedAccumulator { declaration, .. }
            | GenerationError::InvalidMarker { declaration, .. }
            | GenerationError::UnsupportedShape { declaration, .. } => declaration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

/// A structured diagnostic keyed to the offending declaration.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: GenerationError,
    /// Where the compiler points: the declaration, or the marker attribute at fault.
    pub span: Span,
}

impl Diagnostic {
    pub fn new(error: GenerationError, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Error,
            error,
            span,
        }
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn declaration(&self) -> &str {
        self.error.declaration()
    }

    pub fn to_syn_error(&self) -> syn::Error {
        syn::Error::new(self.span, format!("{}: {}", self.code(), self.message()))
    }
}

/// Diagnostics collected over one generation run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries.extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics attached to the named declaration.
    #[cfg(test)]
    pub fn for_declaration<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.declaration() == name)
    }

    /// One `compile_error!` per diagnostic, each at its own span.
    pub fn to_compile_errors(&self) -> TokenStream2 {
        self.entries.iter().map(|d| d.to_syn_error().to_compile_error()).collect()
    }
}
