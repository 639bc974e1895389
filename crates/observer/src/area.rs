//! Area shapes: which partitions and blocks an observer watches.
//!
//! # Invariants
//!
//! - A shape must be a pure function of the anchor and its own static
//!   configuration. Removal re-derives the footprint from the shape, so a
//!   footprint that drifts between add and remove leaks stale index entries.
//! - Every block for which [`ObservableArea::observes`] is true must lie in one
//!   of the chunks returned by [`ObservableArea::affected_chunks`].

use std::collections::BTreeSet;
use std::fmt;

use vigil_primitives::{BlockPos, ChunkPos};

/// Spatial footprint of an observer relative to its anchor.
pub trait ObservableArea: Send + Sync + fmt::Debug {
	/// Chunks touched by this area when rooted at `anchor`.
	fn affected_chunks(&self, anchor: BlockPos) -> BTreeSet<ChunkPos>;

	/// Whether a change at `pos` is relevant to an observer rooted at `anchor`.
	fn observes(&self, anchor: BlockPos, pos: BlockPos) -> bool;
}

/// Axis-aligned box of block offsets around the anchor, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBoxArea {
	min: BlockPos,
	max: BlockPos,
}

impl BoundingBoxArea {
	/// Builds a box from two opposite corners in any order.
	pub fn new(a: BlockPos, b: BlockPos) -> Self {
		Self {
			min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
			max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
		}
	}

	/// A cube extending `radius` blocks from the anchor on every axis.
	pub fn around(radius: u16) -> Self {
		let r = i32::from(radius);
		Self::new(BlockPos::new(-r, -r, -r), BlockPos::new(r, r, r))
	}

	pub fn min(&self) -> BlockPos {
		self.min
	}

	pub fn max(&self) -> BlockPos {
		self.max
	}
}

impl ObservableArea for BoundingBoxArea {
	fn affected_chunks(&self, anchor: BlockPos) -> BTreeSet<ChunkPos> {
		let lo = ChunkPos::from_block(anchor.add(self.min));
		let hi = ChunkPos::from_block(anchor.add(self.max));
		(lo.x..=hi.x)
			.flat_map(|x| (lo.z..=hi.z).map(move |z| ChunkPos::new(x, z)))
			.collect()
	}

	fn observes(&self, anchor: BlockPos, pos: BlockPos) -> bool {
		// Widened so offsets between far-apart positions cannot overflow.
		let within = |p: i32, a: i32, lo: i32, hi: i32| {
			(i64::from(lo)..=i64::from(hi)).contains(&(i64::from(p) - i64::from(a)))
		};
		within(pos.x, anchor.x, self.min.x, self.max.x)
			&& within(pos.y, anchor.y, self.min.y, self.max.y)
			&& within(pos.z, anchor.z, self.min.z, self.max.z)
	}
}

/// Every chunk within a Chebyshev `radius` of the anchor's chunk, full height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRadiusArea {
	radius: u16,
}

impl ChunkRadiusArea {
	pub fn new(radius: u16) -> Self {
		Self { radius }
	}
}

impl ObservableArea for ChunkRadiusArea {
	fn affected_chunks(&self, anchor: BlockPos) -> BTreeSet<ChunkPos> {
		let center = ChunkPos::from_block(anchor);
		let r = i32::from(self.radius);
		(-r..=r)
			.flat_map(|dx| (-r..=r).map(move |dz| ChunkPos::new(center.x + dx, center.z + dz)))
			.collect()
	}

	fn observes(&self, anchor: BlockPos, pos: BlockPos) -> bool {
		let center = ChunkPos::from_block(anchor);
		let chunk = ChunkPos::from_block(pos);
		let r = i32::from(self.radius);
		(chunk.x - center.x).abs() <= r && (chunk.z - center.z).abs() <= r
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn box_inside_one_chunk() {
		let area = BoundingBoxArea::around(2);
		let chunks = area.affected_chunks(BlockPos::new(8, 64, 8));
		assert_eq!(chunks.into_iter().collect::<Vec<_>>(), vec![ChunkPos::new(0, 0)]);
	}

	#[test]
	fn box_straddling_chunk_corner() {
		let area = BoundingBoxArea::around(1);
		let chunks = area.affected_chunks(BlockPos::new(0, 64, 0));
		let expected: BTreeSet<_> = [(-1, -1), (-1, 0), (0, -1), (0, 0)]
			.into_iter()
			.map(|(x, z)| ChunkPos::new(x, z))
			.collect();
		assert_eq!(chunks, expected);
	}

	#[test]
	fn box_corners_are_normalized() {
		let area = BoundingBoxArea::new(BlockPos::new(3, -1, 2), BlockPos::new(-3, 4, -2));
		assert_eq!(area.min(), BlockPos::new(-3, -1, -2));
		assert_eq!(area.max(), BlockPos::new(3, 4, 2));
		let anchor = BlockPos::new(100, 10, 100);
		assert!(area.observes(anchor, anchor.offset(-3, 4, 2)));
		assert!(!area.observes(anchor, anchor.offset(0, -2, 0)));
	}

	#[test]
	fn chunk_radius_covers_square() {
		let area = ChunkRadiusArea::new(1);
		let anchor = BlockPos::new(-1, 0, 17);
		let chunks = area.affected_chunks(anchor);
		assert_eq!(chunks.len(), 9);
		assert!(chunks.contains(&ChunkPos::new(-2, 0)));
		assert!(chunks.contains(&ChunkPos::new(0, 2)));
		assert!(area.observes(anchor, BlockPos::new(15, -30, 47)));
		assert!(!area.observes(anchor, BlockPos::new(16, 0, 17)));
	}

	#[test]
	fn shapes_clamp_at_the_world_edge() {
		let anchor = BlockPos::new(i32::MAX, 0, i32::MIN);
		let area = BoundingBoxArea::around(3);
		assert_eq!(
			area.affected_chunks(anchor).into_iter().collect::<Vec<_>>(),
			vec![ChunkPos::new(134_217_727, -134_217_728)]
		);
		assert!(area.observes(anchor, anchor));
		assert!(area.observes(anchor, anchor.offset(-3, 3, 3)));
		assert!(!area.observes(anchor, BlockPos::new(i32::MIN, 0, i32::MIN)));
		assert!(!area.observes(BlockPos::new(i32::MIN, 0, 0), BlockPos::new(i32::MAX, 0, 0)));

		let radius = ChunkRadiusArea::new(1);
		let chunks = radius.affected_chunks(anchor);
		assert_eq!(chunks.len(), 9);
		assert!(chunks.contains(&ChunkPos::new(134_217_728, -134_217_729)));
		assert!(radius.observes(anchor, BlockPos::new(i32::MAX - 20, 0, i32::MIN + 20)));
	}

	proptest! {
		/// Every observed block falls inside one of the affected chunks.
		#[test]
		fn observed_blocks_lie_in_affected_chunks(
			ax in -4096i32..4096, az in -4096i32..4096,
			r in 0u16..24,
			dx in -30i32..30, dz in -30i32..30,
		) {
			let anchor = BlockPos::new(ax, 64, az);
			let pos = anchor.offset(dx, 0, dz);
			let area = BoundingBoxArea::around(r);
			if area.observes(anchor, pos) {
				prop_assert!(area.affected_chunks(anchor).contains(&ChunkPos::from_block(pos)));
			}
		}
	}
}
