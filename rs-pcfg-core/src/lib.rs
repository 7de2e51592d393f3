//! Monte Carlo password-strength estimation for PCFG password models.
//!
//! This crate estimates, for each password of a test set, the number of
//! guesses an attacker needs when guessing in decreasing probability
//! order under a trained probabilistic context-free grammar:
//! - Loading the trained grammar (structures and class/length terminals)
//! - Scoring passwords and drawing random ones from the grammar
//! - Estimating guess numbers from a self-drawn Monte Carlo sample
//! - Aggregating estimates into a guess-crack curve
//!
//! Typical flow:
//! `GrammarModel::load` → `Sampler::sample` → `RankEstimator::from_sample`
//! → `EvaluationPipeline::run`.

/// Grammar model: structures, weighted tables, scoring and generation.
pub mod model;

/// Sampling, rank estimation and test-set evaluation.
pub mod estimate;

/// Run parameters (sample size, upper bound, seed, label).
pub mod config;

/// Cooperative cancellation of long loops.
pub mod cancel;

/// Crate error type.
pub mod error;

/// I/O utilities (line reading, directory listing).
///
/// Not exposed
pub(crate) mod io;

pub use cancel::CancelToken;
pub use config::EvaluationConfig;
pub use error::{Error, Result};
pub use estimate::{EvaluationPipeline, RankEstimator, Sampler};
pub use model::GrammarModel;
