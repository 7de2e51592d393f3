use std::f64::consts::LN_2;

use crate::error::{Error, Result};
use super::sampler::Sample;

/// Monte Carlo guess-number estimator.
///
/// Built from `n` surprisals drawn from the model itself. A sampled
/// password of probability `p` stands in for about `1 / (n * p)` outcomes
/// at least as likely, so the running sum of `2^s / n` over the sorted
/// surprisals estimates how many guesses an optimal attacker makes before
/// reaching a given surprisal.
///
/// # Invariants
/// - `surprisals` is sorted ascending and non-empty
/// - `positions` has the same length and is non-decreasing
/// - Every position is finite and `> 0`
#[derive(Clone, Debug)]
pub struct RankEstimator {
	surprisals: Vec<f64>,
	/// `log2` of the cumulative positions.
	log_positions: Vec<f64>,
	positions: Vec<f64>,
}

impl RankEstimator {
	/// Builds the estimator from a completed sample.
	pub fn from_sample(sample: &Sample) -> Result<Self> {
		Self::from_surprisals(sample.surprisals().collect())
	}

	/// Builds the estimator from raw surprisals, in any order.
	///
	/// # Errors
	/// Returns `Error::EmptySample` if `surprisals` is empty.
	pub fn from_surprisals(mut surprisals: Vec<f64>) -> Result<Self> {
		if surprisals.is_empty() {
			return Err(Error::EmptySample);
		}
		surprisals.sort_by(f64::total_cmp);

		// Summed in the log2 domain: 2^s overflows long before s does
		let log_n = (surprisals.len() as f64).log2();
		let mut log_positions = Vec::with_capacity(surprisals.len());
		let mut running = f64::NEG_INFINITY;
		for s in &surprisals {
			running = log2_add(running, s - log_n);
			log_positions.push(running);
		}

		let positions = log_positions
			.iter()
			.map(|lp| {
				let position = lp.exp2();
				if position.is_finite() { position } else { f64::MAX }
			})
			.collect();

		Ok(Self { surprisals, log_positions, positions })
	}

	/// Sample size.
	pub fn len(&self) -> usize {
		self.surprisals.len()
	}

	/// Always false: an estimator holds at least one sample.
	pub fn is_empty(&self) -> bool {
		self.surprisals.is_empty()
	}

	/// Sorted sample surprisals.
	pub fn surprisals(&self) -> &[f64] {
		&self.surprisals
	}

	/// Cumulative positions, aligned with `surprisals()`.
	pub fn positions(&self) -> &[f64] {
		&self.positions
	}

	/// Index of the position used for `surprisal`.
	///
	/// The rightmost insertion point of `surprisal` in the sorted sample,
	/// clamped to the last index. `+inf` maps to the last index.
	pub fn index_of(&self, surprisal: f64) -> usize {
		let idx = self.surprisals.partition_point(|&s| s <= surprisal);
		idx.min(self.surprisals.len() - 1)
	}

	/// Raw (fractional) guess-number estimate for a surprisal.
	///
	/// Always finite and `> 0`.
	pub fn estimate(&self, surprisal: f64) -> f64 {
		self.positions[self.index_of(surprisal)]
	}

	/// `log2` of `estimate`, exact even when the estimate saturates.
	pub fn log2_estimate(&self, surprisal: f64) -> f64 {
		self.log_positions[self.index_of(surprisal)]
	}

	/// Guess number for a surprisal: the estimate rounded up.
	pub fn guess_number(&self, surprisal: f64) -> f64 {
		self.estimate(surprisal).ceil()
	}
}

/// `log2(2^a + 2^b)` without leaving the log domain.
fn log2_add(a: f64, b: f64) -> f64 {
	let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
	if lo == f64::NEG_INFINITY {
		return hi;
	}
	hi + (lo - hi).exp2().ln_1p() / LN_2
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn empty_sample_is_rejected() {
		assert!(matches!(RankEstimator::from_surprisals(vec![]), Err(Error::EmptySample)));
	}

	#[test]
	fn positions_are_running_sums() {
		// n = 4, surprisals 1, 2, 3, 3 -> terms 2/4, 4/4, 8/4, 8/4
		let estimator = RankEstimator::from_surprisals(vec![3.0, 1.0, 3.0, 2.0]).unwrap();
		let expected = [0.5, 1.5, 3.5, 5.5];
		for (got, want) in estimator.positions().iter().zip(expected) {
			assert!((got - want).abs() < 1e-12, "{} vs {}", got, want);
		}
		assert_eq!(estimator.surprisals(), &[1.0, 2.0, 3.0, 3.0]);
	}

	#[test]
	fn lookup_uses_rightmost_insertion_point() {
		let estimator = RankEstimator::from_surprisals(vec![1.0, 2.0, 3.0, 3.0]).unwrap();
		assert_eq!(estimator.index_of(0.5), 0);
		assert_eq!(estimator.index_of(1.0), 1);
		assert_eq!(estimator.index_of(2.5), 2);
		assert_eq!(estimator.index_of(3.0), 3);
		assert_eq!(estimator.guess_number(1.0), 2.0);
	}

	#[test]
	fn more_probable_than_every_sample_gets_first_position() {
		let estimator = RankEstimator::from_surprisals(vec![4.0, 5.0, 6.0]).unwrap();
		let first = estimator.positions()[0];
		assert_eq!(estimator.estimate(0.0), first);
		assert!(estimator.guess_number(0.0) >= 1.0);
	}

	#[test]
	fn unreachable_clamps_to_last_position() {
		let estimator = RankEstimator::from_surprisals(vec![4.0, 5.0, 6.0]).unwrap();
		let last = *estimator.positions().last().unwrap();
		assert_eq!(estimator.estimate(f64::INFINITY), last);
		assert_eq!(estimator.estimate(1e9), last);
		assert!(estimator.guess_number(f64::INFINITY).is_finite());
	}

	#[test]
	fn single_sample_maps_everything_to_one_value() {
		let estimator = RankEstimator::from_surprisals(vec![10.0]).unwrap();
		assert_eq!(estimator.positions().len(), 1);
		for s in [0.0, 10.0, 20.0, f64::INFINITY] {
			assert_eq!(estimator.estimate(s), 1024.0);
		}
	}

	#[test]
	fn huge_surprisals_stay_finite() {
		let estimator = RankEstimator::from_surprisals(vec![1500.0, 2000.0]).unwrap();
		assert!(estimator.positions().iter().all(|p| p.is_finite()));
		assert_eq!(estimator.estimate(f64::INFINITY), f64::MAX);
		assert!((estimator.log2_estimate(f64::INFINITY) - 1999.0).abs() < 1e-9);
	}

	#[test]
	fn log2_add_matches_linear_sum() {
		assert!((log2_add(3.0, 3.0) - 4.0).abs() < 1e-12);
		assert!((log2_add(f64::NEG_INFINITY, 2.0) - 2.0).abs() < 1e-12);
		assert!((log2_add(0.0, 1.0) - 3f64.log2()).abs() < 1e-12);
	}

	proptest! {
		#[test]
		fn positions_never_decrease(surprisals in prop::collection::vec(0.0f64..200.0, 1..300)) {
			let estimator = RankEstimator::from_surprisals(surprisals).unwrap();
			for pair in estimator.positions().windows(2) {
				prop_assert!(pair[0] <= pair[1]);
			}
		}

		#[test]
		fn estimate_is_monotone_in_surprisal(
			surprisals in prop::collection::vec(0.0f64..60.0, 1..100),
			a in 0.0f64..80.0,
			b in 0.0f64..80.0,
		) {
			let estimator = RankEstimator::from_surprisals(surprisals).unwrap();
			let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
			prop_assert!(estimator.estimate(lo) <= estimator.estimate(hi));
			prop_assert!(estimator.estimate(lo) > 0.0);
		}
	}
}
