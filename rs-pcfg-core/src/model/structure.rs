use std::fmt;

use serde::{Deserialize, Serialize};

/// Character class of a password run.
///
/// The three classes are disjoint: ASCII letters, ASCII digits, and
/// printable ASCII punctuation. Whitespace, control characters and
/// anything outside ASCII belong to no class.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharClass {
	Letter,
	Digit,
	Symbol,
}

impl CharClass {
	/// Returns the class of `c`, or `None` if `c` belongs to no class.
	pub fn of(c: char) -> Option<Self> {
		match c {
			'a'..='z' | 'A'..='Z' => Some(CharClass::Letter),
			'0'..='9' => Some(CharClass::Digit),
			'\x21'..='\x2f' | '\x3a'..='\x40' | '\x5b'..='\x60' | '\x7b'..='\x7e' => Some(CharClass::Symbol),
			_ => None,
		}
	}

	/// Letter used for this class in structure strings.
	pub fn symbol(self) -> char {
		match self {
			CharClass::Letter => 'L',
			CharClass::Digit => 'D',
			CharClass::Symbol => 'S',
		}
	}

	pub fn from_symbol(c: char) -> Option<Self> {
		match c {
			'L' => Some(CharClass::Letter),
			'D' => Some(CharClass::Digit),
			'S' => Some(CharClass::Symbol),
			_ => None,
		}
	}
}

/// One maximal run of a single class inside a structure.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
	pub class: CharClass,
	pub len: usize,
}

/// Coarse shape of a password: the ordered list of its class runs.
///
/// # Invariants
/// - Every segment has `len >= 1`
/// - Two consecutive segments never share the same class
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Structure {
	segments: Vec<Segment>,
}

impl Structure {
	/// Builds a structure from segments, merging adjacent runs of the same
	/// class and dropping empty ones.
	pub fn from_segments<I: IntoIterator<Item = Segment>>(segments: I) -> Self {
		let mut merged: Vec<Segment> = Vec::new();
		for segment in segments {
			if segment.len == 0 {
				continue;
			}
			match merged.last_mut() {
				Some(last) if last.class == segment.class => last.len += segment.len,
				_ => merged.push(segment),
			}
		}
		Self { segments: merged }
	}

	/// Parses a structure key.
	///
	/// Accepts both run notations, which may be mixed:
	/// - repeated letters: `"LLLDD"`
	/// - letter and count: `"L3D2"`
	pub fn parse(key: &str) -> Result<Self, String> {
		let mut segments = Vec::new();
		let mut chars = key.chars().peekable();
		while let Some(c) = chars.next() {
			let class = CharClass::from_symbol(c)
				.ok_or_else(|| format!("unknown class '{}' in structure '{}'", c, key))?;
			let mut digits = String::new();
			while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
				digits.push(d);
				chars.next();
			}
			let len = if digits.is_empty() {
				1
			} else {
				digits
					.parse::<usize>()
					.map_err(|e| format!("bad run length in structure '{}': {}", key, e))?
			};
			if len == 0 {
				return Err(format!("zero-length run in structure '{}'", key));
			}
			segments.push(Segment { class, len });
		}
		Ok(Self::from_segments(segments))
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}
}

impl fmt::Display for Structure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for segment in &self.segments {
			for _ in 0..segment.len {
				write!(f, "{}", segment.class.symbol())?;
			}
		}
		Ok(())
	}
}

/// Splits a password into its maximal class runs.
///
/// Returns `None` if any character belongs to no class; such a password
/// cannot be produced by the grammar. Lengths are counted in characters.
pub fn split_runs(password: &str) -> Option<Vec<(Segment, &str)>> {
	let mut runs: Vec<(Segment, &str)> = Vec::new();
	let mut start = 0;
	let mut current: Option<Segment> = None;

	for (idx, c) in password.char_indices() {
		let class = CharClass::of(c)?;
		match current.as_mut() {
			Some(segment) if segment.class == class => segment.len += 1,
			Some(segment) => {
				runs.push((*segment, &password[start..idx]));
				start = idx;
				current = Some(Segment { class, len: 1 });
			}
			None => current = Some(Segment { class, len: 1 }),
		}
	}
	if let Some(segment) = current {
		runs.push((segment, &password[start..]));
	}
	Some(runs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn both_notations_parse_to_same_structure() {
		let repeated = Structure::parse("LLLDDS").unwrap();
		let counted = Structure::parse("L3D2S1").unwrap();
		assert_eq!(repeated, counted);
		assert_eq!(counted.to_string(), "LLLDDS");
	}

	#[test]
	fn adjacent_runs_merge() {
		let structure = Structure::parse("L3L2").unwrap();
		assert_eq!(structure.segments(), &[Segment { class: CharClass::Letter, len: 5 }]);
	}

	#[test]
	fn parse_rejects_unknown_class_and_zero_runs() {
		assert!(Structure::parse("LX").is_err());
		assert!(Structure::parse("L0").is_err());
	}

	#[test]
	fn split_runs_on_mixed_password() {
		let runs = split_runs("abc12!!x").unwrap();
		let parts: Vec<&str> = runs.iter().map(|(_, s)| *s).collect();
		assert_eq!(parts, vec!["abc", "12", "!!", "x"]);
		assert_eq!(runs[2].0, Segment { class: CharClass::Symbol, len: 2 });
	}

	#[test]
	fn split_runs_rejects_space_and_non_ascii() {
		assert!(split_runs("pass word").is_none());
		assert!(split_runs("caf\u{e9}").is_none());
		assert!(split_runs("tab\there").is_none());
	}

	#[test]
	fn empty_password_has_no_runs() {
		assert!(split_runs("").unwrap().is_empty());
	}

	proptest! {
		#[test]
		fn runs_concatenate_back_to_password(password in "[a-zA-Z0-9!-/:-@]{0,24}") {
			let runs = split_runs(&password).unwrap();
			let joined: String = runs.iter().map(|(_, s)| *s).collect();
			prop_assert_eq!(joined, password.clone());
			for pair in runs.windows(2) {
				prop_assert_ne!(pair[0].0.class, pair[1].0.class);
			}
			let structure = Structure::from_segments(runs.iter().map(|(segment, _)| *segment));
			prop_assert_eq!(structure.to_string().len(), password.len());
		}
	}
}
