use std::io::{BufRead, Write};

use log::info;

use crate::cancel::CancelToken;
use crate::config::EvaluationConfig;
use crate::error::{Error, Result};
use crate::model::GrammarModel;
use super::guess_crack::GuessCrackTable;
use super::rank::RankEstimator;

/// Guess-number estimate of one test-set password.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimationRecord {
	pub password: String,
	/// Surprisal under the model (`+inf` when unreachable).
	pub surprisal: f64,
	/// Raw, fractional estimate.
	pub estimate: f64,
}

impl EstimationRecord {
	/// Integer guess number used for the guess-crack table.
	pub fn guess_number(&self) -> f64 {
		self.estimate.ceil()
	}
}

/// Result of streaming a test set through the estimator.
#[derive(Clone, Debug)]
pub struct Evaluation {
	/// One record per input line, in input order.
	pub records: Vec<EstimationRecord>,
	/// Guess-crack aggregation of `records`.
	pub table: GuessCrackTable,
}

impl Evaluation {
	/// Number of test-set lines, the denominator of every percentage.
	pub fn total(&self) -> usize {
		self.records.len()
	}
}

/// Streams a test set through a `RankEstimator`.
///
/// # Behavior
/// - Each line (without its trailing `\n` / `\r\n`) is scored, estimated and
///   written to the strength sink as `password\testimate`, in input order.
/// - The strength sink is never filtered; the upper bound only applies to
///   the guess-crack table.
pub struct EvaluationPipeline<'a> {
	model: &'a GrammarModel,
	estimator: &'a RankEstimator,
	upper_bound: f64,
	progress_every: usize,
	cancel: CancelToken,
}

impl<'a> EvaluationPipeline<'a> {
	pub fn new(model: &'a GrammarModel, estimator: &'a RankEstimator, config: &EvaluationConfig) -> Self {
		Self {
			model,
			estimator,
			upper_bound: config.upper_bound(),
			progress_every: config.progress_every(),
			cancel: CancelToken::new(),
		}
	}

	/// Attaches a cancel token, checked before each line.
	pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
		self.cancel = cancel;
		self
	}

	/// Estimates a single password.
	pub fn estimate(&self, password: &str) -> EstimationRecord {
		let surprisal = self.model.log_probability(password);
		EstimationRecord {
			password: password.to_owned(),
			surprisal,
			estimate: self.estimator.estimate(surprisal),
		}
	}

	/// Runs the whole test set.
	///
	/// Invalid UTF-8 is decoded lossily, which makes the line unscorable
	/// rather than aborting the batch.
	///
	/// # Errors
	/// - `Error::Stream` on a read or write failure
	/// - `Error::Cancelled` if the cancel token fired
	pub fn run<R: BufRead, W: Write>(&self, mut test_set: R, mut strength: W) -> Result<Evaluation> {
		let mut records = Vec::new();
		let mut buffer = Vec::new();

		loop {
			self.cancel.check()?;
			buffer.clear();
			if test_set.read_until(b'\n', &mut buffer).map_err(Error::Stream)? == 0 {
				break;
			}
			while matches!(buffer.last(), Some(b'\n' | b'\r')) {
				buffer.pop();
			}

			let password = String::from_utf8_lossy(&buffer);
			let record = self.estimate(&password);
			writeln!(strength, "{}\t{}", record.password, record.estimate).map_err(Error::Stream)?;
			records.push(record);

			if records.len() % self.progress_every == 0 {
				info!("progress: {}", records.len());
			}
		}
		strength.flush().map_err(Error::Stream)?;

		let guess_numbers: Vec<f64> = records.iter().map(EstimationRecord::guess_number).collect();
		let table = GuessCrackTable::from_guess_numbers(&guess_numbers, records.len(), self.upper_bound);
		info!("evaluated {} passwords, {} curve points", records.len(), table.points().len());
		Ok(Evaluation { records, table })
	}
}
