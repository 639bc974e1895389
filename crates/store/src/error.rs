use std::path::PathBuf;

use vigil_primitives::TagError;

/// Failures of store configuration and persistence.
///
/// Section lookups and mutations never fail; only the disk and config
/// surfaces report errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("invalid store configuration: {0}")]
	InvalidConfig(String),

	#[error("failed to parse store configuration: {0}")]
	ConfigParse(#[from] toml::de::Error),

	#[error("i/o error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to encode store data: {0}")]
	Encode(#[source] postcard::Error),

	#[error("failed to decode store data: {0}")]
	Decode(#[source] postcard::Error),

	#[error("malformed store data: {0}")]
	Malformed(#[from] TagError),

	#[error("stored sections use precision {found}, store expects {expected}")]
	PrecisionMismatch { expected: i32, found: i32 },
}

impl StoreError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}
}
