//! Monte Carlo guess-number estimation.
//!
//! This module turns a trained `GrammarModel` into guess-number estimates:
//! - Parallel, seed-reproducible sampling (`Sampler`)
//! - Sorted sample index and rank lookup (`RankEstimator`)
//! - Test-set streaming with per-line strength output (`EvaluationPipeline`)
//! - Guess-crack aggregation and curve hand-off (`GuessCrackTable`, `CurveRenderer`)

/// Guess-crack table, its text format, and the curve renderer seam.
pub mod guess_crack;

/// Test-set evaluation loop.
pub mod pipeline;

/// Cumulative position index over a sorted sample.
pub mod rank;

/// Monte Carlo sample generation.
pub mod sampler;

pub use guess_crack::{CurveRenderer, GuessCrackPoint, GuessCrackTable, TsvCurveWriter};
pub use pipeline::{EstimationRecord, Evaluation, EvaluationPipeline};
pub use rank::RankEstimator;
pub use sampler::{Sample, SampleRecord, Sampler};
