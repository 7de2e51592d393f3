use std::io::Write;

use crate::error::{Error, Result};

/// One step of the guess-crack curve.
#[derive(Clone, Debug, PartialEq)]
pub struct GuessCrackPoint {
	/// Guess budget (an integer-valued guess number).
	pub guess_number: f64,
	/// Test-set entries cracked within `guess_number` guesses.
	pub cracked: usize,
	/// `cracked` over the whole test set, in percent.
	pub percentage: f64,
}

/// Cumulative fraction of a test set cracked as a function of guess budget.
///
/// # Invariants
/// - Points are sorted by strictly increasing `guess_number`
/// - `cracked` is non-decreasing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuessCrackTable {
	points: Vec<GuessCrackPoint>,
}

impl GuessCrackTable {
	/// Aggregates rounded guess numbers into a step function.
	///
	/// - Guess numbers `>= upper_bound` are dropped.
	/// - Entries sharing a guess number collapse into one point whose
	///   `cracked` counts every entry at or below it.
	/// - Percentages use `total` (the unfiltered test-set size) as denominator.
	pub fn from_guess_numbers(guess_numbers: &[f64], total: usize, upper_bound: f64) -> Self {
		let mut kept: Vec<f64> = guess_numbers.iter().copied().filter(|g| *g < upper_bound).collect();
		kept.sort_by(f64::total_cmp);

		let mut points: Vec<GuessCrackPoint> = Vec::new();
		for (idx, guess_number) in kept.into_iter().enumerate() {
			let cracked = idx + 1;
			let percentage = cracked as f64 / total as f64 * 100.0;
			match points.last_mut() {
				Some(last) if last.guess_number == guess_number => {
					last.cracked = cracked;
					last.percentage = percentage;
				}
				_ => points.push(GuessCrackPoint { guess_number, cracked, percentage }),
			}
		}
		Self { points }
	}

	pub fn points(&self) -> &[GuessCrackPoint] {
		&self.points
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	/// `(guess_number, percentage)` pairs, for plotting.
	pub fn series(&self) -> Vec<(f64, f64)> {
		self.points.iter().map(|p| (p.guess_number, p.percentage)).collect()
	}

	/// Writes one `<guess_number> : <cracked> : <percentage>` line per point.
	pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
		for point in &self.points {
			writeln!(out, "{:.0} : {} : {:5.2}", point.guess_number, point.cracked, point.percentage)
				.map_err(Error::Stream)?;
		}
		out.flush().map_err(Error::Stream)
	}
}

/// Receives the guess-crack series for drawing.
///
/// Rasterizing the curve is left to implementors; the library only hands
/// over the labeled `(guess_number, percentage)` series.
pub trait CurveRenderer {
	fn render(&mut self, label: &str, series: &[(f64, f64)]) -> Result<()>;
}

/// Writes the series as tab-separated text: a `# label` header, then
/// `guess_number\tpercentage` lines, ready for an external plotting tool.
pub struct TsvCurveWriter<W: Write> {
	out: W,
}

impl<W: Write> TsvCurveWriter<W> {
	pub fn new(out: W) -> Self {
		Self { out }
	}

	pub fn into_inner(self) -> W {
		self.out
	}
}

impl<W: Write> CurveRenderer for TsvCurveWriter<W> {
	fn render(&mut self, label: &str, series: &[(f64, f64)]) -> Result<()> {
		writeln!(self.out, "# {}", label).map_err(Error::Stream)?;
		for (guess_number, percentage) in series {
			writeln!(self.out, "{:.0}\t{:.4}", guess_number, percentage).map_err(Error::Stream)?;
		}
		self.out.flush().map_err(Error::Stream)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ties_collapse_to_cumulative_counts() {
		let table = GuessCrackTable::from_guess_numbers(&[5.0, 2.0, 5.0, 9.0], 4, 1e20);
		let summary: Vec<(f64, usize)> = table.points().iter().map(|p| (p.guess_number, p.cracked)).collect();
		assert_eq!(summary, vec![(2.0, 1), (5.0, 3), (9.0, 4)]);
		assert_eq!(table.points()[2].percentage, 100.0);
	}

	#[test]
	fn upper_bound_filters_but_denominator_stays() {
		let table = GuessCrackTable::from_guess_numbers(&[1.0, 3.0, 100.0, 1000.0], 4, 100.0);
		assert_eq!(table.points().len(), 2);
		assert_eq!(table.points()[1].cracked, 2);
		assert_eq!(table.points()[1].percentage, 50.0);
	}

	#[test]
	fn empty_input_gives_empty_table() {
		let table = GuessCrackTable::from_guess_numbers(&[], 0, 1e20);
		assert!(table.is_empty());
		assert!(table.series().is_empty());
	}

	#[test]
	fn table_format() {
		let table = GuessCrackTable::from_guess_numbers(&[2.0, 7.0, 7.0], 3, 1e20);
		let mut out = Vec::new();
		table.write_to(&mut out).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), "2 : 1 : 33.33\n7 : 3 : 100.00\n");
	}

	#[test]
	fn large_guess_numbers_print_as_integers() {
		let table = GuessCrackTable::from_guess_numbers(&[1e15], 1, 1e20);
		let mut out = Vec::new();
		table.write_to(&mut out).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), "1000000000000000 : 1 : 100.00\n");
	}

	#[test]
	fn tsv_writer_emits_label_and_points() {
		let mut writer = TsvCurveWriter::new(Vec::new());
		writer.render("model", &[(1.0, 50.0), (10.0, 100.0)]).unwrap();
		let text = String::from_utf8(writer.into_inner()).unwrap();
		assert_eq!(text, "# model\n1\t50.0000\n10\t100.0000\n");
	}
}
