use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque description of a block state, e.g. `minecraft:furnace[facing=north]`.
///
/// The registry never interprets states; it only compares and stores them on
/// behalf of observers.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockState(Arc<str>);

impl BlockState {
	/// State used for empty space.
	pub fn air() -> Self {
		Self::new("minecraft:air")
	}

	pub fn new(state: impl AsRef<str>) -> Self {
		Self(state.as_ref().into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for BlockState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for BlockState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "BlockState({})", self.0)
	}
}

impl From<&str> for BlockState {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
