use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge length of one chunk column, in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// An integer block coordinate.
///
/// Used as the anchor key for subscribers, so ordering and hashing are
/// derived over `(x, y, z)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
	pub x: i32,
	pub y: i32,
	pub z: i32,
}

impl BlockPos {
	/// The world origin.
	pub const ORIGIN: Self = Self::new(0, 0, 0);

	/// Creates a block position.
	pub const fn new(x: i32, y: i32, z: i32) -> Self {
		Self { x, y, z }
	}

	/// Returns this position shifted by the given deltas, saturating at the
	/// `i32` bounds.
	#[inline]
	pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
		Self::new(
			self.x.saturating_add(dx),
			self.y.saturating_add(dy),
			self.z.saturating_add(dz),
		)
	}

	/// Component-wise saturating sum.
	#[inline]
	pub const fn add(self, other: Self) -> Self {
		self.offset(other.x, other.y, other.z)
	}

	/// Component-wise saturating difference.
	#[inline]
	pub const fn subtract(self, other: Self) -> Self {
		Self::new(
			self.x.saturating_sub(other.x),
			self.y.saturating_sub(other.y),
			self.z.saturating_sub(other.z),
		)
	}
}

impl fmt::Display for BlockPos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
	}
}

/// A chunk column coordinate (`CHUNK_SIZE` blocks wide on X and Z).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
	pub x: i32,
	pub z: i32,
}

impl ChunkPos {
	pub const fn new(x: i32, z: i32) -> Self {
		Self { x, z }
	}

	/// Returns the chunk containing `pos`. Negative coordinates round toward
	/// negative infinity, so block `-1` lives in chunk `-1`.
	pub const fn from_block(pos: BlockPos) -> Self {
		Self::new(pos.x.div_euclid(CHUNK_SIZE), pos.z.div_euclid(CHUNK_SIZE))
	}
}

impl fmt::Display for ChunkPos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.x, self.z)
	}
}

/// Coordinate of a storage section at a given precision.
///
/// With a precision of [`CHUNK_SIZE`] a section coincides with a chunk column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionPos {
	pub x: i32,
	pub z: i32,
}

impl SectionPos {
	pub const fn new(x: i32, z: i32) -> Self {
		Self { x, z }
	}

	/// Section coinciding with `chunk` at a precision of [`CHUNK_SIZE`].
	///
	/// Maps coordinates directly, so chunks past the last block column still
	/// get a distinct section.
	pub const fn from_chunk(chunk: ChunkPos) -> Self {
		Self::new(chunk.x, chunk.z)
	}

	/// Returns the section containing `pos` for sections `precision` blocks wide.
	///
	/// `precision` must be positive.
	pub const fn from_block(pos: BlockPos, precision: i32) -> Self {
		Self::new(pos.x.div_euclid(precision), pos.z.div_euclid(precision))
	}
}

impl fmt::Display for SectionPos {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.x, self.z)
	}
}
