//! The marker catalog.
//!
//! A closed registry of every capability marker the generator understands.
//! Each entry names the attribute (`#[add_nonce]`), the method it produces
//! by default, and the shape of that method. Lookups are by attribute name,
//! which is stable across runs.

/// Runtime argument(s) a parameterized marker method takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// `group_name`, appended verbatim.
    GroupName,
    /// `algorithm, hash` -> `'<algorithm>-<hash>'`
    HashValue,
    /// `host` -> `'<host>'`
    HostSource,
    /// No argument: `'nonce-<nonce captured at construction>'`
    Nonce,
    /// `scheme` -> `<scheme>:`
    SchemeSource,
    /// `uri`, appended verbatim.
    Uri,
}

/// Emission shape of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fixed token, already formatted for the directive grammar.
    Literal(&'static str),
    /// Token supplied by the declaration through `value = "..."`.
    CallerLiteral,
    Parameterized(Parameter),
}

#[derive(Debug, PartialEq, Eq)]
pub struct MarkerDefinition {
    /// Attribute name, e.g. `add_self`.
    pub name: &'static str,
    /// Default method name. Empty when the declaration must supply one.
    pub method: &'static str,
    pub shape: Shape,
    /// What the generated method adds, for its doc comment.
    pub summary: &'static str,
}

impl MarkerDefinition {
    /// Named arguments this marker accepts.
    pub fn accepted_keys(&self) -> &'static [&'static str] {
        match self.shape {
            Shape::CallerLiteral => &["value", "method"],
            _ => &["method"],
        }
    }
}

/// Role marker for option accumulator types.
pub const POLICY_OPTIONS: &str = "policy_options";

/// Role marker for named directive types.
pub const POLICY: &str = "policy";

/// Prefix shared by every catalog marker.
pub const MARKER_PREFIX: &str = "add_";

pub static CATALOG: &[MarkerDefinition] = &[
    MarkerDefinition { name: "add_none", method: "add_none", shape: Shape::Literal("'none'"), summary: "`'none'`" },
    MarkerDefinition {
        name: "add_report_sample",
        method: "add_report_sample",
        shape: Shape::Literal("'report-sample'"),
        summary: "`'report-sample'`",
    },
    MarkerDefinition { name: "add_self", method: "add_self", shape: Shape::Literal("'self'"), summary: "`'self'`" },
    MarkerDefinition {
        name: "add_strict_dynamic",
        method: "add_strict_dynamic",
        shape: Shape::Literal("'strict-dynamic'"),
        summary: "`'strict-dynamic'`",
    },
    MarkerDefinition {
        name: "add_unsafe_eval",
        method: "add_unsafe_eval",
        shape: Shape::Literal("'unsafe-eval'"),
        summary: "`'unsafe-eval'`",
    },
    MarkerDefinition {
        name: "add_unsafe_hashes",
        method: "add_unsafe_hashes",
        shape: Shape::Literal("'unsafe-hashes'"),
        summary: "`'unsafe-hashes'`",
    },
    MarkerDefinition {
        name: "add_unsafe_inline",
        method: "add_unsafe_inline",
        shape: Shape::Literal("'unsafe-inline'"),
        summary: "`'unsafe-inline'`",
    },
    MarkerDefinition {
        name: "add_wasm_unsafe_eval",
        method: "add_wasm_unsafe_eval",
        shape: Shape::Literal("'wasm-unsafe-eval'"),
        summary: "`'wasm-unsafe-eval'`",
    },
    MarkerDefinition { name: "add_script", method: "add_script", shape: Shape::Literal("'script'"), summary: "`'script'`" },
    MarkerDefinition { name: "add_literal", method: "", shape: Shape::CallerLiteral, summary: "" },
    MarkerDefinition {
        name: "add_group_name",
        method: "add_group_name",
        shape: Shape::Parameterized(Parameter::GroupName),
        summary: "a group name",
    },
    MarkerDefinition {
        name: "add_hash_value",
        method: "add_hash_value",
        shape: Shape::Parameterized(Parameter::HashValue),
        summary: "a hash value",
    },
    MarkerDefinition {
        name: "add_host_source",
        method: "add_host_source",
        shape: Shape::Parameterized(Parameter::HostSource),
        summary: "a host source",
    },
    MarkerDefinition {
        name: "add_nonce",
        method: "add_nonce",
        shape: Shape::Parameterized(Parameter::Nonce),
        summary: "the nonce",
    },
    MarkerDefinition {
        name: "add_scheme_source",
        method: "add_scheme_source",
        shape: Shape::Parameterized(Parameter::SchemeSource),
        summary: "a scheme source",
    },
    MarkerDefinition {
        name: "add_uri",
        method: "add_uri",
        shape: Shape::Parameterized(Parameter::Uri),
        summary: "a uri",
    },
];

pub fn lookup(name: &str) -> Option<&'static MarkerDefinition> {
    CATALOG.iter().find(|def| def.name == name)
}

/// Whether an attribute name is a marker reference (role or catalog).
///
/// Everything else (`doc`, `derive`, `cfg`, ...) passes through untouched.
pub fn is_marker_name(name: &str) -> bool {
    name == POLICY || name == POLICY_OPTIONS || name.starts_with(MARKER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let mut seen = HashSet::new();
        for def in CATALOG {
            assert!(seen.insert(def.name), "duplicate marker `{}`", def.name);
        }
    }

    #[test]
    fn test_every_entry_is_a_marker_name() {
        for def in CATALOG {
            assert!(is_marker_name(def.name));
            assert!(lookup(def.name).is_some());
        }
    }

    #[test]
    fn test_literal_tokens_are_quoted() {
        for def in CATALOG {
            if let Shape::Literal(token) = def.shape {
                assert!(token.starts_with('\'') && token.ends_with('\''), "{} -> {}", def.name, token);
            }
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("add_nonce").map(|d| d.shape), Some(Shape::Parameterized(Parameter::Nonce)));
        assert!(lookup("add_everything").is_none());
        assert!(!is_marker_name("derive"));
        assert!(is_marker_name("policy"));
        assert!(is_marker_name("add_everything"));
    }
}
