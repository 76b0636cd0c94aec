//! `policies!` expansion: emitters and the batch driver.

pub mod emit;
mod generate;

pub use generate::{generate, GenerationOutput};
