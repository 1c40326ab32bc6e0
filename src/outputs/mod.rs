//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`GenerationRecord`](crate::models::GenerationRecord)
//!   consumed by the display layer

pub mod json;
