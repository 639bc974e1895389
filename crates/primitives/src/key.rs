use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Namespace assumed when an identifier is written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error returned when identifier text is not a valid `namespace:path`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKeyError {
	#[error("identifier is empty")]
	Empty,
	#[error("invalid character {ch:?} in namespace of {input:?}")]
	Namespace { input: String, ch: char },
	#[error("invalid character {ch:?} in path of {input:?}")]
	Path { input: String, ch: char },
}

/// A namespaced identifier such as `observerlib:structure`.
///
/// Names observer kinds; stored alongside every persisted subscriber so the
/// matching provider can be looked up again on load.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
	namespace: Arc<str>,
	path: Arc<str>,
}

impl ResourceKey {
	/// Builds a key from its parts, validating both.
	pub fn new(namespace: &str, path: &str) -> Result<Self, ParseKeyError> {
		let input = || format!("{namespace}:{path}");
		if path.is_empty() {
			return Err(ParseKeyError::Empty);
		}
		if let Some(ch) = namespace.chars().find(|&c| !is_namespace_char(c)) {
			return Err(ParseKeyError::Namespace { input: input(), ch });
		}
		if let Some(ch) = path.chars().find(|&c| !is_path_char(c)) {
			return Err(ParseKeyError::Path { input: input(), ch });
		}
		let namespace = if namespace.is_empty() { DEFAULT_NAMESPACE } else { namespace };
		Ok(Self {
			namespace: namespace.into(),
			path: path.into(),
		})
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn path(&self) -> &str {
		&self.path
	}
}

fn is_namespace_char(c: char) -> bool {
	matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

fn is_path_char(c: char) -> bool {
	is_namespace_char(c) || c == '/'
}

impl FromStr for ResourceKey {
	type Err = ParseKeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once(':') {
			Some((namespace, path)) => Self::new(namespace, path),
			None => Self::new(DEFAULT_NAMESPACE, s),
		}
	}
}

impl TryFrom<String> for ResourceKey {
	type Error = ParseKeyError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<ResourceKey> for String {
	fn from(key: ResourceKey) -> Self {
		key.to_string()
	}
}

impl fmt::Display for ResourceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.namespace, self.path)
	}
}

impl fmt::Debug for ResourceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ResourceKey({self})")
	}
}
