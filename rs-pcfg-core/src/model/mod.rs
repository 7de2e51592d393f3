//! Trained password grammar.
//!
//! This module provides the PCFG password model, including:
//! - Character classes, runs and structures (`Structure`, `Segment`)
//! - Normalized categorical tables with weighted sampling (`WeightedTable`)
//! - The immutable grammar itself (`GrammarModel`)
//! - Loading from the trained artifact directory, with an optional binary cache

/// Immutable PCFG: probability lookups, password scoring and generation.
pub mod grammar;

/// Artifact directory loader and compiled-model cache.
mod loader;

/// Character classes, class runs and password structures.
pub mod structure;

/// Categorical distribution over weighted keys.
///
/// Supports lookups without insertion and O(log k) weighted draws.
pub mod weighted;

pub use grammar::GrammarModel;
pub use structure::{CharClass, Segment, Structure};
pub use weighted::WeightedTable;
