//! Source analysis and transformation.
//!
//! # Submodules
//!
//! - [`analyze`] - Parse Lua sources and locate top-level declarations
//! - [`transform`] - Excise byte ranges and stage the rewritten text

pub mod analyze;
pub mod transform;
mod types;

pub use analyze::{ENTRY_POINT_NAME, SourceAnalyzer, SourceUnit};
pub use transform::{remove_ranges, stage};
pub use types::*;
