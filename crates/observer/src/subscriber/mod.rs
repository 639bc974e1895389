//! Subscriber envelope: an anchor bound to one observer instance.
//!
//! A single [`ChangeSubscriber`] is shared (via `Arc`) by every partition its
//! area touches, so partition-local lookups all resolve to the same instance.
//! The area is captured once at construction; the registry uses that captured
//! shape both to insert and to remove the subscriber, which keeps the two
//! footprints identical even if the observer misbehaves later.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use vigil_primitives::{BlockPos, ChunkPos, Compound, ResourceKey};

use crate::area::ObservableArea;
use crate::change::{BlockChange, BlockChangeSet};
use crate::observer::ChangeObserver;
use crate::world::WorldContext;


const OBSERVER_STATE: &str = "observer";
const CHANGE_SET: &str = "changeSet";
const IS_MATCHING: &str = "isMatching";

struct Inner {
	observer: Box<dyn ChangeObserver>,
	changes: BlockChangeSet,
	matching: Option<bool>,
	initialized: bool,
}

/// An observer registered at an anchor position.
pub struct ChangeSubscriber {
	anchor: BlockPos,
	provider: ResourceKey,
	area: Arc<dyn ObservableArea>,
	inner: Mutex<Inner>,
}

impl ChangeSubscriber {
	/// Wraps a freshly provided observer.
	pub fn new(anchor: BlockPos, observer: Box<dyn ChangeObserver>) -> Self {
		Self {
			anchor,
			provider: observer.provider_key().clone(),
			area: observer.observable_area(),
			inner: Mutex::new(Inner {
				observer,
				changes: BlockChangeSet::new(),
				matching: None,
				initialized: false,
			}),
		}
	}

	/// Rebuilds a subscriber from persisted state written by
	/// [`ChangeSubscriber::write_state`].
	///
	/// Observer state is restored before the area is captured. The observer
	/// counts as initialized and [`ChangeSubscriber::initialize`] will not run
	/// it again.
	pub fn restore(anchor: BlockPos, mut observer: Box<dyn ChangeObserver>, tag: &Compound) -> Self {
		observer.read_state(&tag.compound_or_empty(OBSERVER_STATE));
		let subscriber = Self::new(anchor, observer);
		{
			let mut inner = subscriber.inner.lock();
			if let Ok(entries) = tag.list(CHANGE_SET) {
				inner.changes = BlockChangeSet::from_tags(entries);
			}
			inner.matching = tag.get_bool(IS_MATCHING).ok();
			inner.initialized = true;
		}
		subscriber
	}

	pub fn anchor(&self) -> BlockPos {
		self.anchor
	}

	/// Identifier of the observer kind.
	pub fn provider_key(&self) -> &ResourceKey {
		&self.provider
	}

	pub fn observable_area(&self) -> &Arc<dyn ObservableArea> {
		&self.area
	}

	/// Chunks this subscriber is indexed under: the area's chunks plus the
	/// anchor's own chunk, which is where lookups by anchor land.
	pub fn observable_chunks(&self) -> BTreeSet<ChunkPos> {
		let mut chunks = self.area.affected_chunks(self.anchor);
		chunks.insert(ChunkPos::from_block(self.anchor));
		chunks
	}

	pub fn observes(&self, pos: BlockPos) -> bool {
		self.area.observes(self.anchor, pos)
	}

	/// Records `change` if it falls inside the observed area.
	pub fn add_change(&self, change: BlockChange) -> bool {
		if !self.observes(change.pos) {
			return false;
		}
		self.inner
			.lock()
			.changes
			.add_change(change.pos, change.old_state, change.new_state);
		true
	}

	/// Number of changes waiting for evaluation.
	pub fn pending_changes(&self) -> usize {
		self.inner.lock().changes.len()
	}

	/// Evaluates pending changes, if any, and returns the latest match result.
	///
	/// Returns `false` while no evaluation has happened yet.
	pub fn is_valid(&self, world: &dyn WorldContext) -> bool {
		let mut guard = self.inner.lock();
		let inner = &mut *guard;
		if !inner.changes.is_empty() {
			let matching = inner.observer.notify_change(world, self.anchor, &inner.changes);
			inner.matching = Some(matching);
			inner.changes.reset();
		}
		inner.matching.unwrap_or(false)
	}

	/// Runs the observer's one-time initialization unless it already ran.
	///
	/// Returns whether this call ran it. Concurrent callers block until the
	/// first one finishes, so every caller returns with the observer
	/// initialized.
	pub fn initialize(&self, world: &dyn WorldContext) -> bool {
		let mut inner = self.inner.lock();
		if inner.initialized {
			return false;
		}
		inner.observer.initialize(world, self.anchor);
		inner.initialized = true;
		true
	}

	pub fn is_initialized(&self) -> bool {
		self.inner.lock().initialized
	}

	/// Grants temporary access to the wrapped observer.
	pub fn with_observer<R>(&self, f: impl FnOnce(&mut dyn ChangeObserver) -> R) -> R {
		f(self.inner.lock().observer.as_mut())
	}

	pub fn write_state(&self, tag: &mut Compound) {
		let inner = self.inner.lock();
		tag.set_sub_tag(OBSERVER_STATE, |sub| inner.observer.write_state(sub));
		tag.put(CHANGE_SET, inner.changes.to_tag());
		if let Some(matching) = inner.matching {
			tag.put(IS_MATCHING, matching);
		}
	}
}

impl fmt::Debug for ChangeSubscriber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChangeSubscriber")
			.field("anchor", &self.anchor)
			.field("provider", &self.provider)
			.field("area", &self.area)
			.finish_non_exhaustive()
	}
}
