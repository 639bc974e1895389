use std::collections::BTreeMap;

use tracing::warn;
use vigil_primitives::{BlockPos, BlockState, Compound, Tag};

/// One block transition, from the first state seen to the latest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockChange {
	pub pos: BlockPos,
	pub old_state: BlockState,
	pub new_state: BlockState,
}

impl BlockChange {
	pub fn new(pos: BlockPos, old_state: BlockState, new_state: BlockState) -> Self {
		Self {
			pos,
			old_state,
			new_state,
		}
	}
}

/// Pending block changes for one subscriber, keyed by position.
///
/// Repeated changes at a position collapse into one transition from the
/// earliest old state to the latest new state; a transition that ends where it
/// started is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockChangeSet {
	changes: BTreeMap<BlockPos, BlockChange>,
}

impl BlockChangeSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_change(&mut self, pos: BlockPos, old_state: BlockState, new_state: BlockState) {
		match self.changes.remove(&pos) {
			Some(existing) => {
				if existing.old_state != new_state {
					self.changes
						.insert(pos, BlockChange::new(pos, existing.old_state, new_state));
				}
			}
			None => {
				if old_state != new_state {
					self.changes.insert(pos, BlockChange::new(pos, old_state, new_state));
				}
			}
		}
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn get(&self, pos: BlockPos) -> Option<&BlockChange> {
		self.changes.get(&pos)
	}

	/// Changes in position order.
	pub fn iter(&self) -> impl Iterator<Item = &BlockChange> {
		self.changes.values()
	}

	pub fn reset(&mut self) {
		self.changes.clear();
	}

	pub fn to_tag(&self) -> Tag {
		Tag::List(
			self.changes
				.values()
				.map(|change| {
					let mut entry = Compound::new();
					entry.write_block_pos(change.pos);
					entry.put("old", change.old_state.as_str());
					entry.put("new", change.new_state.as_str());
					Tag::Compound(entry)
				})
				.collect(),
		)
	}

	/// Rebuilds a change set from [`BlockChangeSet::to_tag`] output, skipping
	/// malformed entries.
	pub fn from_tags(entries: &[Tag]) -> Self {
		let mut set = Self::new();
		for entry in entries {
			let Some(entry) = entry.as_compound() else {
				warn!(kind = %entry.kind(), "Skipping non-compound block change entry");
				continue;
			};
			let parsed = entry
				.read_block_pos()
				.and_then(|pos| Ok((pos, entry.str("old")?, entry.str("new")?)));
			match parsed {
				Ok((pos, old, new)) => set.add_change(pos, BlockState::new(old), BlockState::new(new)),
				Err(error) => warn!(%error, "Skipping malformed block change entry"),
			}
		}
		set
	}
}
