use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::io::{get_filename, list_files_recursive, read_lines};
use super::grammar::GrammarModel;
use super::structure::{CharClass, Segment, Structure};

const DICTIONARY_FILE: &str = "dictionaries.txt";
const GRAMMAR_DIR: &str = "grammar";
const STRUCTURES_FILE: &str = "structures.txt";
const DIGITS_DIR: &str = "digits";
const SPECIAL_DIR: &str = "special";

impl GrammarModel {
	/// Loads a trained model from its artifact directory.
	///
	/// Layout:
	/// - `dictionaries.txt`: one letter terminal per line, uniform within a length
	/// - `grammar/structures.txt`: `<structure>\t<weight>`
	/// - `digits/<N>.txt`, `special/<N>.txt`: `<terminal>\t<weight>`
	///
	/// # Errors
	/// - `Error::MissingArtifact` if the directory, dictionary or structure file is missing
	/// - `Error::ModelFormat` on any malformed line; the model is never partially loaded
	pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
		let dir = dir.as_ref();
		if !dir.is_dir() {
			return Err(Error::MissingArtifact(dir.to_path_buf()));
		}

		let structures = load_structures(&dir.join(GRAMMAR_DIR).join(STRUCTURES_FILE))?;
		let mut terminals = load_dictionary(&dir.join(DICTIONARY_FILE))?;
		load_terminal_dir(&dir.join(DIGITS_DIR), CharClass::Digit, &mut terminals)?;
		load_terminal_dir(&dir.join(SPECIAL_DIR), CharClass::Symbol, &mut terminals)?;

		info!(
			"loaded model {}: {} structures, {} terminal groups",
			dir.display(),
			structures.len(),
			terminals.len()
		);
		Ok(GrammarModel::new(structures, terminals))
	}

	/// Loads a model through a compiled binary cache.
	///
	/// - If `cache` exists, it is decoded with `postcard`.
	/// - Otherwise the model is parsed from `dir` and then written to `cache`.
	///
	/// The model directory itself is never written.
	pub fn load_cached<P, C>(dir: P, cache: C) -> Result<Self>
	where
		P: AsRef<Path>,
		C: AsRef<Path>,
	{
		let cache = cache.as_ref();
		if cache.exists() {
			let bytes = fs::read(cache).map_err(|e| Error::io(cache, e))?;
			let model = postcard::from_bytes(&bytes)?;
			info!("loaded compiled model from {}", cache.display());
			return Ok(model);
		}

		let model = Self::load(dir)?;
		let bytes = postcard::to_stdvec(&model)?;
		fs::write(cache, bytes).map_err(|e| Error::io(cache, e))?;
		info!("compiled model written to {}", cache.display());
		Ok(model)
	}
}

fn load_structures(path: &Path) -> Result<HashMap<Structure, f64>> {
	let mut structures = HashMap::new();
	for (line_no, key, weight) in read_weighted(path)? {
		let structure = Structure::parse(&key).map_err(|reason| Error::format(path, line_no, reason))?;
		structures.insert(structure, weight);
	}
	Ok(structures)
}

/// Letter terminals: every word of a given length gets `1 / (words of that length)`.
fn load_dictionary(path: &Path) -> Result<HashMap<Segment, HashMap<String, f64>>> {
	let mut by_length: HashMap<usize, Vec<String>> = HashMap::new();
	for word in read_lines(path)? {
		let len = word.chars().count();
		if len == 0 {
			continue;
		}
		by_length.entry(len).or_default().push(word);
	}

	let terminals: HashMap<Segment, HashMap<String, f64>> = by_length
		.into_iter()
		.map(|(len, words)| {
			let weight = 1.0 / words.len() as f64;
			let group: HashMap<String, f64> = words.into_iter().map(|word| (word, weight)).collect();
			(Segment { class: CharClass::Letter, len }, group)
		})
		.collect();
	Ok(terminals)
}

/// Reads every `<N>.txt` file below `dir` into the `(class, N)` group.
fn load_terminal_dir(
	dir: &Path,
	class: CharClass,
	terminals: &mut HashMap<Segment, HashMap<String, f64>>,
) -> Result<()> {
	for path in list_files_recursive(dir)? {
		let len = terminal_length(&path).ok_or_else(|| {
			Error::format(&path, 0, "terminal file name must be <length>.txt")
		})?;
		let group = terminals.entry(Segment { class, len }).or_default();
		for (_, terminal, weight) in read_weighted(&path)? {
			group.insert(terminal, weight);
		}
		debug!("loaded {} ({}{})", path.display(), class.symbol(), len);
	}
	Ok(())
}

fn terminal_length(path: &Path) -> Option<usize> {
	if path.extension()? != "txt" {
		return None;
	}
	get_filename(path)?.parse::<usize>().ok().filter(|len| *len > 0)
}

/// Parses `<key>\t<weight>` lines, returning `(line number, key, weight)`.
fn read_weighted(path: &Path) -> Result<Vec<(usize, String, f64)>> {
	let mut entries = Vec::new();
	for (idx, line) in read_lines(path)?.into_iter().enumerate() {
		let line_no = idx + 1;
		let fields: Vec<&str> = line.split('\t').collect();
		if fields.len() != 2 {
			return Err(Error::format(path, line_no, format!("expected 2 tab-separated fields, got {}", fields.len())));
		}
		let weight: f64 = fields[1]
			.trim()
			.parse()
			.map_err(|e| Error::format(path, line_no, format!("bad weight {:?}: {}", fields[1], e)))?;
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::format(path, line_no, format!("weight must be finite and >= 0, got {}", weight)));
		}
		entries.push((line_no, fields[0].to_owned(), weight));
	}
	Ok(entries)
}
