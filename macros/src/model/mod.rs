//! Declaration model: catalog -> scan -> resolve.

pub mod catalog;
pub mod resolve;
pub mod scan;

pub use catalog::{Parameter, Shape};
pub use resolve::{ResolvedMarker, ResolvedSpec, Resolver, Role};
pub use scan::{scan, Batch, Scan};
