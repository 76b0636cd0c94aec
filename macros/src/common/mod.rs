// Common utilities shared by the model and the emitters
//
// This module contains:
// - parse_utils: marker argument parsing and identifier helpers
// - diagnostics: error taxonomy and the diagnostics reporter

pub mod diagnostics;
mod parse_utils;

pub use diagnostics::*;
pub use parse_utils::*;
