use std::path::PathBuf;

use serde::Deserialize;

use crate::error::StoreError;
use crate::store::PRECISION_CHUNK;

/// File stem used when no save key is configured.
pub const DEFAULT_SAVE_KEY: &str = "structure_matching";

/// Store configuration, typically parsed from TOML:
///
/// ```toml
/// save_key = "structure_matching"
/// directory = "world/data"
/// precision = 16
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
	/// Stem of the data file written by `save`.
	pub save_key: String,
	/// Directory holding the data file. `None` keeps the store in memory only.
	pub directory: Option<PathBuf>,
	/// Edge length of one section in blocks.
	pub precision: i32,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			save_key: DEFAULT_SAVE_KEY.to_owned(),
			directory: None,
			precision: PRECISION_CHUNK,
		}
	}
}

impl StoreConfig {
	/// In-memory configuration with the default key and chunk precision.
	pub fn in_memory() -> Self {
		Self::default()
	}

	/// Configuration persisting to `directory`.
	pub fn persistent(directory: impl Into<PathBuf>) -> Self {
		Self {
			directory: Some(directory.into()),
			..Self::default()
		}
	}

	/// Parses and validates a TOML document.
	pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), StoreError> {
		if self.precision <= 0 {
			return Err(StoreError::InvalidConfig(format!(
				"precision must be positive, got {}",
				self.precision
			)));
		}
		if self.save_key.is_empty() {
			return Err(StoreError::InvalidConfig("save_key must not be empty".into()));
		}
		if self.save_key.contains(['/', '\\']) || self.save_key == "." || self.save_key == ".." {
			return Err(StoreError::InvalidConfig(format!(
				"save_key {:?} must be a plain file stem",
				self.save_key
			)));
		}
		Ok(())
	}

	/// Full path of the data file, if persistence is enabled.
	pub fn data_file(&self) -> Option<PathBuf> {
		self.directory
			.as_ref()
			.map(|dir| dir.join(format!("{}.dat", self.save_key)))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn defaults_fill_missing_fields() {
		let config = StoreConfig::from_toml_str("directory = \"saves/overworld\"").unwrap();
		assert_eq!(config.save_key, DEFAULT_SAVE_KEY);
		assert_eq!(config.precision, PRECISION_CHUNK);
		assert_eq!(
			config.data_file(),
			Some(PathBuf::from("saves/overworld/structure_matching.dat"))
		);
	}

	#[test]
	fn empty_document_is_in_memory() {
		let config = StoreConfig::from_toml_str("").unwrap();
		assert_eq!(config, StoreConfig::in_memory());
		assert_eq!(config.data_file(), None);
	}

	#[test]
	fn invalid_values_are_rejected() {
		assert!(matches!(
			StoreConfig::from_toml_str("precision = 0"),
			Err(StoreError::InvalidConfig(_))
		));
		assert!(matches!(
			StoreConfig::from_toml_str("save_key = \"../escape\""),
			Err(StoreError::InvalidConfig(_))
		));
		assert!(matches!(
			StoreConfig::from_toml_str("unknown = 1"),
			Err(StoreError::ConfigParse(_))
		));
	}
}
