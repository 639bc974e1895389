//! Section map and its lock domain.
//!
//! # Invariants
//!
//! - Every access to section contents happens inside [`SectionStore::read`] or
//!   [`SectionStore::write`]; guards are dropped on return and on unwind.
//! - Sections are created only inside a write scope.
//! - A section position is in the dirty set iff it was marked dirty after the
//!   last successful save or load.

use std::collections::BTreeSet;
use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use vigil_primitives::{BlockPos, CHUNK_SIZE, Compound, SectionPos, Tag};

use crate::error::StoreError;
use crate::section::WorldSection;

#[cfg(test)]
mod tests;

/// Precision at which one section equals one chunk column.
pub const PRECISION_CHUNK: i32 = CHUNK_SIZE;

const SECTIONS: &str = "sections";
const PRECISION: &str = "precision";
const SECTION_X: &str = "sx";
const SECTION_Z: &str = "sz";
const SECTION_DATA: &str = "data";

/// The sections of one store, as seen from inside a lock scope.
pub struct Sections<S> {
	precision: i32,
	sections: FxHashMap<SectionPos, S>,
	dirty: BTreeSet<SectionPos>,
}

impl<S: WorldSection> Sections<S> {
	/// Section containing `pos`.
	#[inline]
	pub fn section_pos(&self, pos: BlockPos) -> SectionPos {
		SectionPos::from_block(pos, self.precision)
	}

	/// Section containing `pos`, if it has been created.
	pub fn get(&self, pos: BlockPos) -> Option<&S> {
		self.sections.get(&self.section_pos(pos))
	}

	pub fn get_at(&self, section: SectionPos) -> Option<&S> {
		self.sections.get(&section)
	}

	pub fn get_at_mut(&mut self, section: SectionPos) -> Option<&mut S> {
		self.sections.get_mut(&section)
	}

	pub fn get_mut(&mut self, pos: BlockPos) -> Option<&mut S> {
		let section = self.section_pos(pos);
		self.sections.get_mut(&section)
	}

	/// Section containing `pos`, creating an empty one on first touch.
	pub fn get_or_create(&mut self, pos: BlockPos) -> &mut S {
		let section = self.section_pos(pos);
		self.get_or_create_at(section)
	}

	/// Section at `section`, creating an empty one on first touch.
	pub fn get_or_create_at(&mut self, section: SectionPos) -> &mut S {
		self.sections.entry(section).or_insert_with(|| {
			debug!(%section, "Creating world section");
			S::new(section)
		})
	}

	/// Flags the section containing `pos` for the next save.
	pub fn mark_dirty(&mut self, pos: BlockPos) {
		let section = self.section_pos(pos);
		self.dirty.insert(section);
	}

	pub fn mark_dirty_at(&mut self, section: SectionPos) {
		self.dirty.insert(section);
	}

	pub fn is_dirty(&self, section: SectionPos) -> bool {
		self.dirty.contains(&section)
	}

	pub(crate) fn dirty_mut(&mut self) -> &mut BTreeSet<SectionPos> {
		&mut self.dirty
	}

	pub fn len(&self) -> usize {
		self.sections.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	/// All created sections in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = &S> {
		self.sections.values()
	}

	pub(crate) fn to_tag(&self) -> Compound {
		let mut ordered: Vec<_> = self.sections.iter().collect();
		ordered.sort_by_key(|(pos, _)| **pos);

		let entries = ordered
			.into_iter()
			.map(|(pos, section)| {
				let mut entry = Compound::new();
				entry.put(SECTION_X, pos.x);
				entry.put(SECTION_Z, pos.z);
				entry.set_sub_tag(SECTION_DATA, |data| section.write_to_tag(data));
				Tag::Compound(entry)
			})
			.collect::<Vec<_>>();

		let mut root = Compound::new();
		root.put(PRECISION, self.precision);
		root.put(SECTIONS, entries);
		root
	}

	pub(crate) fn load_tag(&mut self, root: &Compound, cx: &S::Context) -> Result<(), StoreError> {
		let found = root.get_int_or(PRECISION, self.precision);
		if found != self.precision {
			return Err(StoreError::PrecisionMismatch {
				expected: self.precision,
				found,
			});
		}
		let entries = root.list(SECTIONS)?;

		self.sections.clear();
		self.dirty.clear();
		for entry in entries {
			let Some(entry) = entry.as_compound() else {
				warn!(kind = %entry.kind(), "Skipping non-compound section entry");
				continue;
			};
			let pos = match (entry.get_int(SECTION_X), entry.get_int(SECTION_Z)) {
				(Ok(x), Ok(z)) => SectionPos::new(x, z),
				(Err(error), _) | (_, Err(error)) => {
					warn!(%error, "Skipping section entry without coordinates");
					continue;
				}
			};
			let mut section = S::new(pos);
			section.read_from_tag(&entry.compound_or_empty(SECTION_DATA), cx);
			self.sections.insert(pos, section);
		}
		Ok(())
	}
}

/// Partitioned store guarded by one read/write lock.
pub struct SectionStore<S> {
	precision: i32,
	inner: RwLock<Sections<S>>,
}

impl<S: WorldSection> SectionStore<S> {
	/// Creates an empty store whose sections are `precision` blocks wide.
	pub fn new(precision: i32) -> Result<Self, StoreError> {
		if precision <= 0 {
			return Err(StoreError::InvalidConfig(format!(
				"precision must be positive, got {precision}"
			)));
		}
		Ok(Self::empty(precision))
	}

	/// Creates an empty store with one section per chunk column.
	pub fn chunked() -> Self {
		Self::empty(PRECISION_CHUNK)
	}

	fn empty(precision: i32) -> Self {
		Self {
			precision,
			inner: RwLock::new(Sections {
				precision,
				sections: FxHashMap::default(),
				dirty: BTreeSet::new(),
			}),
		}
	}

	#[inline]
	pub fn section_pos(&self, pos: BlockPos) -> SectionPos {
		SectionPos::from_block(pos, self.precision)
	}

	/// Runs `f` with shared access. Any number of readers may run at once.
	pub fn read<R>(&self, f: impl FnOnce(&Sections<S>) -> R) -> R {
		f(&*self.inner.read())
	}

	/// Runs `f` with exclusive access, excluding readers and other writers.
	pub fn write<R>(&self, f: impl FnOnce(&mut Sections<S>) -> R) -> R {
		f(&mut *self.inner.write())
	}

	pub fn section_count(&self) -> usize {
		self.read(|sections| sections.len())
	}

	/// Dirty section positions in sorted order.
	pub fn dirty_sections(&self) -> Vec<SectionPos> {
		self.read(|sections| sections.dirty.iter().copied().collect())
	}

	/// Returns and clears the dirty set.
	pub fn take_dirty(&self) -> Vec<SectionPos> {
		self.write(|sections| std::mem::take(&mut sections.dirty).into_iter().collect())
	}

	/// Serializes every section, ordered by position.
	pub fn write_to_tag(&self) -> Compound {
		self.read(|sections| sections.to_tag())
	}

	/// Replaces all sections with those stored in `root` and clears the dirty
	/// set. Entries without coordinates are skipped with a warning.
	pub fn read_from_tag(&self, root: &Compound, cx: &S::Context) -> Result<(), StoreError> {
		self.write(|sections| sections.load_tag(root, cx))
	}
}

impl<S: WorldSection> fmt::Debug for SectionStore<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (count, dirty) = self.read(|s| (s.len(), s.dirty.len()));
		f.debug_struct("SectionStore")
			.field("precision", &self.precision)
			.field("sections", &count)
			.field("dirty", &dirty)
			.finish()
	}
}
