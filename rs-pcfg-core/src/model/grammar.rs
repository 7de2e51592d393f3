use std::collections::HashMap;

use log::{debug, warn};
use rand::Rng;

use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use super::structure::{split_runs, CharClass, Segment, Structure};
use super::weighted::WeightedTable;

/// A trained probabilistic context-free grammar over passwords.
///
/// A password is produced by drawing a `Structure` (its class/length shape),
/// then one terminal for each run of that structure. Its probability is the
/// product of every drawn probability.
///
/// # Responsibilities
/// - Look up structure and terminal probabilities (absent means unreachable)
/// - Score arbitrary passwords as surprisal, `-log2(probability)`
/// - Draw random passwords together with their surprisal
///
/// # Invariants
/// - Immutable once built
/// - A structure is drawable only if each of its runs has a drawable terminal
/// - A terminal is drawable only if it matches its group's class and length,
///   so every generated password scores back to its own surprisal
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GrammarModel {
	structures: WeightedTable<Structure>,
	terminals: HashMap<Segment, WeightedTable<String>>,
}

impl GrammarModel {
	/// Builds a model from raw (not necessarily normalized) weights.
	///
	/// Each table is normalized independently. Structures that cannot be
	/// expanded and terminals that do not fit their group keep their lookup
	/// probability but are never drawn; both are reported with `warn!`.
	pub fn new(
		structures: HashMap<Structure, f64>,
		terminals: HashMap<Segment, HashMap<String, f64>>,
	) -> Self {
		let terminals: HashMap<Segment, WeightedTable<String>> = terminals
			.into_iter()
			.map(|(segment, weights)| {
				let misfits = weights.keys().filter(|t| !fits(segment, t)).count();
				if misfits > 0 {
					warn!(
						"{} terminal(s) of group {}{} do not match the group and will not be generated",
						misfits,
						segment.class.symbol(),
						segment.len
					);
				}
				(segment, WeightedTable::from_map(weights, |t| fits(segment, t)))
			})
			.collect();

		let expandable = |structure: &Structure| {
			!structure.is_empty()
				&& structure
					.segments()
					.iter()
					.all(|segment| terminals.get(segment).is_some_and(WeightedTable::is_drawable))
		};
		for (structure, weight) in &structures {
			if *weight > 0.0 && !expandable(structure) {
				warn!("structure {} has no terminals for one of its runs and will not be generated", structure);
			}
		}
		let structures = WeightedTable::from_map(structures, expandable);

		debug!("grammar built: {} structures, {} terminal groups", structures.len(), terminals.len());
		Self { structures, terminals }
	}

	/// Probability of a structure, `None` if the grammar never saw it.
	pub fn structure_probability(&self, structure: &Structure) -> Option<f64> {
		self.structures.probability(structure)
	}

	/// Probability of `terminal` within the `(class, len)` group,
	/// `None` if the group or the terminal is unknown.
	pub fn terminal_probability(&self, class: CharClass, len: usize, terminal: &str) -> Option<f64> {
		self.terminals.get(&Segment { class, len })?.probability(terminal)
	}

	/// Surprisal of `password`: `-log2` of its probability under the grammar.
	///
	/// Returns `f64::INFINITY` when the password contains a character outside
	/// the three classes, uses an unseen terminal, or has an unseen structure.
	/// Deterministic for a given model and password.
	pub fn log_probability(&self, password: &str) -> f64 {
		let Some(runs) = split_runs(password) else {
			warn!("unknown char found in {:?}, only printable ASCII without spaces can be scored", password);
			return f64::INFINITY;
		};

		let mut surprisal = 0.0;
		for (segment, terminal) in &runs {
			match self.terminal_probability(segment.class, segment.len, terminal) {
				Some(p) if p > 0.0 => surprisal -= p.log2(),
				_ => return f64::INFINITY,
			}
		}

		let structure = Structure::from_segments(runs.iter().map(|(segment, _)| *segment));
		match self.structure_probability(&structure) {
			Some(p) if p > 0.0 => surprisal - p.log2(),
			_ => f64::INFINITY,
		}
	}

	/// Probability of `password`, `2^-surprisal` (0 when unreachable).
	pub fn probability(&self, password: &str) -> f64 {
		(-self.log_probability(password)).exp2()
	}

	/// Draws one password and its surprisal.
	///
	/// # Errors
	/// Returns `Error::NotGenerable` if no structure can be drawn.
	pub fn generate_one<R: Rng>(&self, rng: &mut R) -> Result<(String, f64)> {
		let (structure, p) = self.structures.sample(rng).ok_or(Error::NotGenerable)?;
		let mut password = String::new();
		let mut surprisal = -p.log2();

		for segment in structure.segments() {
			// Drawable structures only reference drawable groups
			let (terminal, q) = self
				.terminals
				.get(segment)
				.and_then(|table| table.sample(rng))
				.ok_or(Error::NotGenerable)?;
			password.push_str(terminal);
			surprisal -= q.log2();
		}
		Ok((password, surprisal))
	}

	/// True when at least one password can be generated.
	pub fn is_generable(&self) -> bool {
		self.structures.is_drawable()
	}

	/// Number of known structures.
	pub fn structure_count(&self) -> usize {
		self.structures.len()
	}

	/// Number of `(class, length)` terminal groups.
	pub fn group_count(&self) -> usize {
		self.terminals.len()
	}
}

/// Checks that `terminal` is a run of `segment.len` characters of `segment.class`.
fn fits(segment: Segment, terminal: &str) -> bool {
	terminal.chars().count() == segment.len && terminal.chars().all(|c| CharClass::of(c) == Some(segment.class))
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn segment(class: CharClass, len: usize) -> Segment {
		Segment { class, len }
	}

	/// Structures {L3: 0.6, D2: 0.4}, letters {cat}, digits {12, 34}.
	pub(crate) fn small_model() -> GrammarModel {
		let structures = [("L3", 0.6), ("D2", 0.4)]
			.into_iter()
			.map(|(s, w)| (Structure::parse(s).unwrap(), w))
			.collect();
		let mut terminals = HashMap::new();
		terminals.insert(segment(CharClass::Letter, 3), HashMap::from([("cat".to_string(), 1.0)]));
		terminals.insert(
			segment(CharClass::Digit, 2),
			HashMap::from([("12".to_string(), 0.5), ("34".to_string(), 0.5)]),
		);
		GrammarModel::new(structures, terminals)
	}

	#[test]
	fn scores_known_passwords() {
		let model = small_model();
		assert!((model.log_probability("cat") - 0.737).abs() < 1e-3);
		assert!((model.log_probability("12") - 2.322).abs() < 1e-3);
	}

	#[test]
	fn unseen_terminal_is_unreachable() {
		let model = small_model();
		assert_eq!(model.log_probability("zz"), f64::INFINITY);
		assert_eq!(model.log_probability("dog"), f64::INFINITY);
		assert_eq!(model.probability("zz"), 0.0);
	}

	#[test]
	fn unseen_structure_is_unreachable() {
		// Both terminals exist but "L3D2" is not a structure of the grammar
		let model = small_model();
		assert_eq!(model.log_probability("cat12"), f64::INFINITY);
	}

	#[test]
	fn unclassified_character_is_unreachable() {
		let model = small_model();
		assert_eq!(model.log_probability("ca t"), f64::INFINITY);
		assert_eq!(model.log_probability(""), f64::INFINITY);
	}

	#[test]
	fn lookups_do_not_grow_tables() {
		let model = small_model();
		assert_eq!(model.terminal_probability(CharClass::Symbol, 4, "!!!!"), None);
		assert_eq!(model.terminal_probability(CharClass::Digit, 2, "99"), None);
		assert_eq!(model.group_count(), 2);
		assert_eq!(model.structure_probability(&Structure::parse("S4").unwrap()), None);
		assert_eq!(model.structure_count(), 2);
	}

	#[test]
	fn scoring_is_pure() {
		let model = small_model();
		let first = model.log_probability("34");
		for _ in 0..10 {
			assert_eq!(model.log_probability("34"), first);
		}
	}

	#[test]
	fn generated_passwords_score_back() {
		let model = small_model();
		let mut rng = StdRng::seed_from_u64(42);
		for _ in 0..200 {
			let (password, surprisal) = model.generate_one(&mut rng).unwrap();
			assert!((model.log_probability(&password) - surprisal).abs() < 1e-9, "{}", password);
		}
	}

	#[test]
	fn generation_is_seed_deterministic() {
		let model = small_model();
		let mut rng1 = StdRng::seed_from_u64(5);
		let mut rng2 = StdRng::seed_from_u64(5);
		for _ in 0..50 {
			assert_eq!(model.generate_one(&mut rng1).unwrap(), model.generate_one(&mut rng2).unwrap());
		}
	}

	#[test]
	fn structure_without_terminals_is_never_generated() {
		let structures = [("L3", 1.0), ("S2", 1.0)]
			.into_iter()
			.map(|(s, w)| (Structure::parse(s).unwrap(), w))
			.collect();
		let terminals = HashMap::from([(segment(CharClass::Letter, 3), HashMap::from([("abc".to_string(), 1.0)]))]);
		let model = GrammarModel::new(structures, terminals);

		assert_eq!(model.structure_probability(&Structure::parse("SS").unwrap()), Some(0.5));
		let mut rng = StdRng::seed_from_u64(9);
		for _ in 0..100 {
			assert_eq!(model.generate_one(&mut rng).unwrap().0, "abc");
		}
	}

	#[test]
	fn misfit_terminal_is_never_generated() {
		let structures = HashMap::from([(Structure::parse("LLL").unwrap(), 1.0)]);
		let terminals = HashMap::from([(
			segment(CharClass::Letter, 3),
			HashMap::from([("abc".to_string(), 1.0), ("a1c".to_string(), 1.0)]),
		)]);
		let model = GrammarModel::new(structures, terminals);
		let mut rng = StdRng::seed_from_u64(3);
		for _ in 0..100 {
			assert_eq!(model.generate_one(&mut rng).unwrap().0, "abc");
		}
	}

	#[test]
	fn empty_grammar_is_not_generable() {
		let model = GrammarModel::new(HashMap::new(), HashMap::new());
		assert!(!model.is_generable());
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(model.generate_one(&mut rng), Err(Error::NotGenerable)));
	}
}
