use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - A missing file is reported as `Error::MissingArtifact`
pub(crate) fn read_lines<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let path = filename.as_ref();
	if !path.is_file() {
		return Err(Error::MissingArtifact(path.to_path_buf()));
	}
	let mut contents = String::new();
	File::open(path)
		.and_then(|mut file| file.read_to_string(&mut contents))
		.map_err(|e| Error::io(path, e))?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./digits/4.txt"` → `"4"`
/// - `"4.txt"` → `"4"`
pub(crate) fn get_filename<P: AsRef<Path>>(input_path: P) -> Option<String> {
	input_path
		.as_ref()
		.file_stem()
		.map(|stem| stem.to_string_lossy().to_string())
}

/// Lists all files below `dir`, walking subdirectories.
///
/// Returns full paths sorted, so loading order does not depend on the
/// file system. A missing directory yields an empty list.
pub(crate) fn list_files_recursive<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
	let dir = dir.as_ref();
	let mut files = Vec::new();
	if !dir.is_dir() {
		return Ok(files);
	}

	let mut pending = vec![dir.to_path_buf()];
	while let Some(current) = pending.pop() {
		for entry in fs::read_dir(&current).map_err(|e| Error::io(&current, e))? {
			let path = entry.map_err(|e| Error::io(&current, e))?.path();
			if path.is_dir() {
				pending.push(path);
			} else if path.is_file() {
				files.push(path);
			}
		}
	}

	files.sort();
	Ok(files)
}
