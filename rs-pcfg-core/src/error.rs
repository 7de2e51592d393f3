use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading a trained grammar, sampling from it,
/// or evaluating a test set against it.
#[derive(Debug, Error)]
pub enum Error {
	/// Underlying I/O failure, tagged with the path being accessed.
	#[error("{}: {}", .path.display(), .source)]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A grammar or terminal artifact line could not be parsed.
	/// The model is corrupt and the whole run must stop.
	#[error("{}:{}: {}", .path.display(), .line, .reason)]
	ModelFormat {
		path: PathBuf,
		line: usize,
		reason: String,
	},

	/// Read or write failure on a test-set or output stream.
	#[error("stream I/O: {0}")]
	Stream(#[source] std::io::Error),

	/// A required artifact file or directory does not exist.
	#[error("missing model artifact: {}", .0.display())]
	MissingArtifact(PathBuf),

	/// Estimation was requested without any sampled passwords.
	#[error("sample is empty, sample at least one password before evaluating")]
	EmptySample,

	/// No structure of the grammar can be expanded into a password.
	#[error("grammar has no structure that can be generated")]
	NotGenerable,

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// The run was interrupted through its cancel token.
	#[error("operation cancelled")]
	Cancelled,

	/// The compiled model cache could not be encoded or decoded.
	#[error("model cache: {0}")]
	Cache(#[from] postcard::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Wraps an I/O error with the path that produced it.
	pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
		Error::Io { path: path.into(), source }
	}

	pub(crate) fn format<P: Into<PathBuf>>(path: P, line: usize, reason: impl Into<String>) -> Self {
		Error::ModelFormat { path: path.into(), line, reason: reason.into() }
	}
}
