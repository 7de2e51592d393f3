use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// A categorical distribution over keys, built from non-negative weights.
///
/// Weights are normalized at construction: the probability of a key is
/// `weight / Σweights`. Keys with zero weight stay in the table so that
/// lookups can tell "seen with probability 0" from "never seen", but
/// they are never drawn.
///
/// ## Responsibilities:
/// - Answer probability lookups without inserting missing keys
/// - Draw keys with probability proportional to their weight
///
/// ## Invariants
/// - `cumulative` is strictly increasing and ends at `drawable_mass`
/// - `drawable` is sorted, so draws are reproducible for a fixed RNG
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound(
	serialize = "K: Serialize + Eq + Hash",
	deserialize = "K: Deserialize<'de> + Eq + Hash"
))]
pub struct WeightedTable<K> {
	/// Normalized probability of every key, including zero-weight ones.
	probabilities: HashMap<K, f64>,
	/// Keys with a strictly positive weight, sorted.
	drawable: Vec<K>,
	/// Running sum of the probabilities of `drawable`.
	cumulative: Vec<f64>,
	drawable_mass: f64,
}

impl<K: Clone + Eq + Hash + Ord> WeightedTable<K> {
	/// Builds a table from `(key, weight)` pairs.
	///
	/// - Weights are expected to be finite and `>= 0`; callers validate them.
	/// - A repeated key keeps its last weight.
	pub fn from_weights<I: IntoIterator<Item = (K, f64)>>(weights: I) -> Self {
		let raw: HashMap<K, f64> = weights.into_iter().collect();
		Self::from_map(raw, |_| true)
	}

	/// Same as `from_weights`, but only keys accepted by `drawable` may be
	/// drawn. Their probabilities are still normalized over every key.
	pub fn from_map<F: Fn(&K) -> bool>(raw: HashMap<K, f64>, drawable: F) -> Self {
		// Sorted first so sums do not depend on hash order.
		let mut entries: Vec<(K, f64)> = raw.into_iter().collect();
		entries.sort_by(|a, b| a.0.cmp(&b.0));
		let total: f64 = entries.iter().map(|(_, weight)| weight).sum();

		let mut probabilities = HashMap::with_capacity(entries.len());
		let mut keys = Vec::new();
		let mut cumulative = Vec::new();
		let mut running = 0.0;
		for (key, weight) in entries {
			let probability = if total > 0.0 { weight / total } else { 0.0 };
			if probability > 0.0 && drawable(&key) {
				running += probability;
				cumulative.push(running);
				keys.push(key.clone());
			}
			probabilities.insert(key, probability);
		}

		Self { probabilities, drawable: keys, cumulative, drawable_mass: running }
	}

	/// Returns the probability of `key`, or `None` if it was never seen.
	pub fn probability<Q>(&self, key: &Q) -> Option<f64>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.probabilities.get(key).copied()
	}

	/// Draws a key together with its probability.
	///
	/// Uses a binary search over the cumulative weights, O(log k) per draw.
	/// Returns `None` if no key can be drawn.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<(&K, f64)> {
		if self.drawable.is_empty() {
			return None;
		}
		let r = rng.random::<f64>() * self.drawable_mass;
		let idx = self.cumulative.partition_point(|&c| c <= r).min(self.drawable.len() - 1);
		let key = &self.drawable[idx];
		Some((key, self.probabilities[key]))
	}

	/// True when at least one key can be drawn.
	pub fn is_drawable(&self) -> bool {
		!self.drawable.is_empty()
	}

	pub fn len(&self) -> usize {
		self.probabilities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.probabilities.is_empty()
	}
}
