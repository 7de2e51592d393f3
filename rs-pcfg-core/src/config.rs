use crate::error::{Error, Result};

/// Default number of sampled passwords.
pub const DEFAULT_SAMPLE_SIZE: usize = 10_000;

/// Guess numbers at or above this bound are left out of the guess-crack table.
pub const DEFAULT_UPPER_BOUND: f64 = 1e20;

/// Lines between two evaluation progress messages.
pub const DEFAULT_PROGRESS_EVERY: usize = 10_000;

/// Parameters of one Monte Carlo evaluation run.
///
/// `EvaluationConfig` holds both the sampling parameters (size, seed) and
/// the aggregation parameters (upper bound, curve label).
///
/// # Invariants
/// - `sample_size() >= 1`
/// - `upper_bound()` is finite and strictly positive
/// - `progress_every >= 1`
#[derive(Clone, Debug)]
pub struct EvaluationConfig {
	/// Number of passwords drawn from the model.
	sample_size: usize,

	/// Guess numbers `>= upper_bound` are excluded from the curve.
	upper_bound: f64,

	/// RNG seed for the sample. `None` draws a fresh one.
	pub seed: Option<u64>,

	/// Label of the guess-crack series.
	pub label: String,

	/// Lines between evaluation progress messages.
	progress_every: usize,
}

impl Default for EvaluationConfig {
	fn default() -> Self {
		Self {
			sample_size: DEFAULT_SAMPLE_SIZE,
			upper_bound: DEFAULT_UPPER_BOUND,
			seed: None,
			label: String::new(),
			progress_every: DEFAULT_PROGRESS_EVERY,
		}
	}
}

impl EvaluationConfig {
	pub fn sample_size(&self) -> usize {
		self.sample_size
	}

	/// Sets the number of sampled passwords.
	///
	/// # Errors
	/// Returns an error if `sample_size` is 0, estimation is undefined without a sample.
	pub fn set_sample_size(&mut self, sample_size: usize) -> Result<()> {
		if sample_size == 0 {
			return Err(Error::InvalidConfig("sample size must be at least 1".to_owned()));
		}
		self.sample_size = sample_size;
		Ok(())
	}

	pub fn upper_bound(&self) -> f64 {
		self.upper_bound
	}

	/// Sets the guess-number bound of the guess-crack table.
	///
	/// # Errors
	/// Returns an error unless `upper_bound` is finite and `> 0`.
	pub fn set_upper_bound(&mut self, upper_bound: f64) -> Result<()> {
		if !upper_bound.is_finite() || upper_bound <= 0.0 {
			return Err(Error::InvalidConfig(format!("upper bound must be finite and > 0, got {}", upper_bound)));
		}
		self.upper_bound = upper_bound;
		Ok(())
	}

	pub fn progress_every(&self) -> usize {
		self.progress_every
	}

	pub fn set_progress_every(&mut self, lines: usize) -> Result<()> {
		if lines == 0 {
			return Err(Error::InvalidConfig("progress interval must be at least 1".to_owned()));
		}
		self.progress_every = lines;
		Ok(())
	}

	/// Returns the configured seed, or draws one from the thread RNG.
	pub fn resolve_seed(&self) -> u64 {
		self.seed.unwrap_or_else(rand::random::<u64>)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = EvaluationConfig::default();
		assert_eq!(config.sample_size(), 10_000);
		assert_eq!(config.upper_bound(), 1e20);
		assert_eq!(config.progress_every(), 10_000);
	}

	#[test]
	fn zero_sample_size_is_rejected() {
		let mut config = EvaluationConfig::default();
		assert!(config.set_sample_size(0).is_err());
		assert_eq!(config.sample_size(), DEFAULT_SAMPLE_SIZE);
		assert!(config.set_sample_size(1).is_ok());
		assert_eq!(config.sample_size(), 1);
	}

	#[test]
	fn upper_bound_must_be_positive_and_finite() {
		let mut config = EvaluationConfig::default();
		assert!(config.set_upper_bound(0.0).is_err());
		assert!(config.set_upper_bound(-5.0).is_err());
		assert!(config.set_upper_bound(f64::INFINITY).is_err());
		assert!(config.set_upper_bound(f64::NAN).is_err());
		assert!(config.set_upper_bound(1e6).is_ok());
	}

	#[test]
	fn fixed_seed_is_returned() {
		let config = EvaluationConfig { seed: Some(17), ..EvaluationConfig::default() };
		assert_eq!(config.resolve_seed(), 17);
	}
}
