//! Procedural macros for the csp-policy builders
//!
//! # Macro API
//!
//! | Macro | Target | Purpose |
//! |-------|--------|---------|
//! | `policies!{}` | unit structs | Generate options and directive builders |
//!
//! ## Example
//!
//! ```ignore
//! policies! {
//!     /// script-src options.
//!     #[policy_options]
//!     #[add_self]
//!     #[add_nonce]
//!     #[add_hash_value]
//!     pub struct ScriptSrcPolicyOptions;
//!
//!     /// script-src directive.
//!     #[policy("script-src")]
//!     pub struct ScriptSrcPolicy;
//! }
//!
//! let policy = ScriptSrcPolicy::new("abc123", |o| {
//!     o.add_self().add_nonce();
//! });
//! assert_eq!(policy.policy_value(), "script-src: 'self' 'nonce-abc123';");
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! items -> scan (Declaration) -> resolve (ResolvedSpec) -> emit (EmittedArtifact)
//!                                     \                      /
//!                                      +---> Diagnostics <--+
//! ```

use proc_macro::TokenStream;
use syn::parse_macro_input;

// =============================================================================
// Module Declarations (common / model / user)
// =============================================================================

mod common;
mod model;
mod user;

// =============================================================================
// User-facing Macros (user/)
// =============================================================================

/// Generate policy builders from a batch of marked declarations.
///
/// # Role markers
///
/// - `#[policy_options]` - an options type accumulating policy values
/// - `#[policy("directive-name")]` - a directive wrapping `<Name>Options`
///
/// # Value markers (options types only)
///
/// | Marker | Generated method | Adds |
/// |--------|------------------|------|
/// | `#[add_none]` | `add_none()` | `'none'` |
/// | `#[add_report_sample]` | `add_report_sample()` | `'report-sample'` |
/// | `#[add_self]` | `add_self()` | `'self'` |
/// | `#[add_strict_dynamic]` | `add_strict_dynamic()` | `'strict-dynamic'` |
/// | `#[add_unsafe_eval]` | `add_unsafe_eval()` | `'unsafe-eval'` |
/// | `#[add_unsafe_hashes]` | `add_unsafe_hashes()` | `'unsafe-hashes'` |
/// | `#[add_unsafe_inline]` | `add_unsafe_inline()` | `'unsafe-inline'` |
/// | `#[add_wasm_unsafe_eval]` | `add_wasm_unsafe_eval()` | `'wasm-unsafe-eval'` |
/// | `#[add_script]` | `add_script()` | `'script'` |
/// | `#[add_literal(value = "..", method = "..")]` | `<method>()` | `value` |
/// | `#[add_group_name]` | `add_group_name(name)` | `name` |
/// | `#[add_hash_value]` | `add_hash_value(alg, hash)` | `'sha256-<hash>'` |
/// | `#[add_host_source]` | `add_host_source(host)` | `'<host>'` |
/// | `#[add_nonce]` | `add_nonce()` | `'nonce-<nonce>'` |
/// | `#[add_scheme_source]` | `add_scheme_source(scheme)` | `https:` |
/// | `#[add_uri]` | `add_uri(uri)` | `uri` |
///
/// Every method comes with an `_if` twin taking a trailing
/// `condition: impl FnOnce() -> bool`. Any marker accepts
/// `method = "name"` to rename its pair.
///
/// Items without a role marker are re-emitted unchanged. Errors are
/// reported per declaration; valid declarations in the same batch are
/// still generated.
#[proc_macro]
pub fn policies(input: TokenStream) -> TokenStream {
    let batch = parse_macro_input!(input as model::Batch);
    user::generate(batch).into_token_stream().into()
}
