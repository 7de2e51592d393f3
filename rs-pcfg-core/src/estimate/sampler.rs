use std::sync::mpsc;
use std::thread;

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::model::GrammarModel;

/// Number of draws sharing one RNG stream.
///
/// Fixed, so a seed yields the same sample whatever the worker count.
pub const BATCH_SIZE: usize = 1024;

/// One sampled password and its surprisal under the model.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRecord {
	pub password: String,
	pub surprisal: f64,
}

/// A completed Monte Carlo sample, in draw order.
#[derive(Clone, Debug)]
pub struct Sample {
	records: Vec<SampleRecord>,
}

impl Sample {
	pub fn records(&self) -> &[SampleRecord] {
		&self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn surprisals(&self) -> impl Iterator<Item = f64> + '_ {
		self.records.iter().map(|record| record.surprisal)
	}
}

/// Draws independent passwords from a `GrammarModel`.
///
/// # Behavior
/// - Draws are split into batches of `BATCH_SIZE`.
/// - Batch `b` uses an RNG seeded with `batch_seed(seed, b)`, so runs with
///   adjacent seeds share no stream.
/// - Batches run on worker threads and are reassembled in batch order.
pub struct Sampler<'a> {
	model: &'a GrammarModel,
	seed: u64,
	workers: usize,
	cancel: CancelToken,
}

impl<'a> Sampler<'a> {
	/// Creates a sampler using one worker per CPU.
	pub fn new(model: &'a GrammarModel, seed: u64) -> Self {
		Self { model, seed, workers: num_cpus::get(), cancel: CancelToken::new() }
	}

	/// Sets the number of worker threads (at least 1).
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.workers = workers.max(1);
		self
	}

	/// Attaches a cancel token, checked before each batch.
	pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// Draws `n` passwords.
	///
	/// # Errors
	/// - `Error::EmptySample` if `n == 0`
	/// - `Error::NotGenerable` if the model cannot produce any password
	/// - `Error::Cancelled` if the cancel token fired
	pub fn sample(&self, n: usize) -> Result<Sample> {
		if n == 0 {
			return Err(Error::EmptySample);
		}
		if !self.model.is_generable() {
			return Err(Error::NotGenerable);
		}

		info!("sample {} guesses (seed {})", n, self.seed);
		let batches = n.div_ceil(BATCH_SIZE);
		let workers = self.workers.min(batches);
		let mut slots: Vec<Option<Vec<SampleRecord>>> = vec![None; batches];

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for worker in 0..workers {
				let tx = tx.clone();
				scope.spawn(move || {
					for batch in (worker..batches).step_by(workers) {
						let result = self.cancel.check().and_then(|_| self.draw_batch(batch, n));
						let failed = result.is_err();
						if tx.send((batch, result)).is_err() || failed {
							return;
						}
					}
				});
			}
			drop(tx);

			let mut done = 0;
			let mut failure = None;
			for (batch, result) in rx.iter() {
				match result {
					Ok(records) => slots[batch] = Some(records),
					Err(e) => {
						self.cancel.cancel();
						failure.get_or_insert(e);
					}
				}
				done += 1;
				info!("sampling progress: {:5.2}%", done as f64 / batches as f64 * 100.0);
			}
			failure.map_or(Ok(()), Err)
		})?;

		let records: Vec<SampleRecord> = slots.into_iter().flatten().flatten().collect();
		if records.len() != n {
			return Err(Error::Cancelled);
		}
		info!("sampling done!");
		Ok(Sample { records })
	}

	fn draw_batch(&self, batch: usize, n: usize) -> Result<Vec<SampleRecord>> {
		let start = batch * BATCH_SIZE;
		let size = BATCH_SIZE.min(n - start);
		let mut rng = StdRng::seed_from_u64(batch_seed(self.seed, batch as u64));
		(0..size)
			.map(|_| {
				self.model
					.generate_one(&mut rng)
					.map(|(password, surprisal)| SampleRecord { password, surprisal })
			})
			.collect()
	}
}

/// Mixes the run seed and a batch index into one RNG seed (splitmix64 finalizer).
fn batch_seed(seed: u64, batch: u64) -> u64 {
	let mut z = seed ^ batch.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
	z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
	z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
	z ^ (z >> 31)
}
