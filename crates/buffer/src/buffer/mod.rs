//! The registry buffer: adds, removes and looks up subscribers across chunks.
//!
//! # Invariants
//!
//! - A subscriber is indexed in a chunk's section iff that chunk is in its
//!   [`ChangeSubscriber::observable_chunks`] footprint.
//! - At most one live subscriber exists per anchor; the anchor's home section
//!   decides whether it exists.
//! - Removal derives the footprint from the removed subscriber, never from
//!   caller input.
//! - Partitions are addressed by chunk coordinate directly, so anchors at the
//!   edge of the coordinate range index exactly their footprint.
//!
//! # Crash window
//!
//! Each operation updates all of its sections inside one write scope, so other
//! threads never observe a half-registered subscriber. Initialization runs
//! after that scope under the subscriber's own lock; a concurrent
//! `observe_area` that finds the new subscriber waits for it there, so no
//! caller gets an uninitialized observer back. Persistence is not
//! transactional across sections: a process dying between saves can leave a
//! subscriber recorded in only part of its footprint. [`StructureMatchingBuffer::load`]
//! re-derives every footprint from the home records to repair this.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use vigil_observer::{BlockChange, ChangeSubscriber, ObserverProvider, ProviderRegistry, WorldContext};
use vigil_primitives::{BlockPos, ChunkPos, Compound, SectionPos};
use vigil_store::{PRECISION_CHUNK, SectionStore, Sections, StoreConfig, StoreError, WorldSection};

use crate::section::MatcherSection;


/// Chunk-partitioned subscriber registry for one world.
#[derive(Debug)]
pub struct StructureMatchingBuffer {
	config: StoreConfig,
	providers: Arc<ProviderRegistry>,
	store: SectionStore<MatcherSection>,
}

impl StructureMatchingBuffer {
	/// Creates an in-memory buffer resolving persisted kinds through `providers`.
	pub fn new(providers: Arc<ProviderRegistry>) -> Self {
		Self {
			config: StoreConfig::in_memory(),
			providers,
			store: SectionStore::chunked(),
		}
	}

	/// Creates a buffer persisting according to `config`.
	///
	/// The buffer's partitions are chunk columns, so `config.precision` must be
	/// [`PRECISION_CHUNK`].
	pub fn with_config(config: StoreConfig, providers: Arc<ProviderRegistry>) -> Result<Self, StoreError> {
		config.validate()?;
		if config.precision != PRECISION_CHUNK {
			return Err(StoreError::InvalidConfig(format!(
				"structure matching requires chunk precision {PRECISION_CHUNK}, got {}",
				config.precision
			)));
		}
		Ok(Self {
			config,
			providers,
			store: SectionStore::chunked(),
		})
	}

	pub fn config(&self) -> &StoreConfig {
		&self.config
	}

	pub fn providers(&self) -> &Arc<ProviderRegistry> {
		&self.providers
	}

	/// Underlying section store, for dirty tracking and diagnostics.
	pub fn store(&self) -> &SectionStore<MatcherSection> {
		&self.store
	}

	/// Registers an observer from `provider` at `anchor`.
	///
	/// If a subscriber of the same kind already sits at `anchor` it is returned
	/// unchanged. A subscriber of a different kind is torn down first with a
	/// warning. A fresh observer is initialized once, after it has been
	/// indexed in every chunk of its footprint; the returned subscriber is
	/// always initialized.
	pub fn observe_area(
		&self,
		world: &dyn WorldContext,
		anchor: BlockPos,
		provider: &dyn ObserverProvider,
	) -> Arc<ChangeSubscriber> {
		let subscriber = self.store.write(|sections| {
			if let Some(existing) = home_subscriber(sections, anchor) {
				if existing.provider_key() == provider.key() {
					return existing;
				}
				warn!(
					dim = world.dimension(),
					%anchor,
					existing = %existing.provider_key(),
					requested = %provider.key(),
					"Trying to observe area that is already observed by another observer"
				);
				warn!(%anchor, "Removing existing observer");
				remove_indexed(sections, anchor);
			}

			let subscriber = Arc::new(ChangeSubscriber::new(anchor, provider.provide_observer()));
			for chunk in subscriber.observable_chunks() {
				let at = SectionPos::from_chunk(chunk);
				sections.get_or_create_at(at).add_subscriber(anchor, Arc::clone(&subscriber));
				sections.mark_dirty_at(at);
				trace!(%anchor, %chunk, "Indexed subscriber");
			}
			subscriber
		});

		if subscriber.initialize(world) {
			debug!(%anchor, provider = %subscriber.provider_key(), "Observing area");
		}
		subscriber
	}

	/// Removes the subscriber anchored at `anchor` from every chunk it is
	/// indexed under. Returns whether one existed.
	pub fn remove_subscriber(&self, anchor: BlockPos) -> bool {
		self.store.write(|sections| remove_indexed(sections, anchor)).is_some()
	}

	/// Subscriber anchored exactly at `pos`.
	pub fn get_subscriber(&self, pos: BlockPos) -> Option<Arc<ChangeSubscriber>> {
		self.store.read(|sections| home_subscriber(sections, pos))
	}

	/// Snapshot of every subscriber indexed under `chunk`.
	///
	/// The returned list is detached from the index; later adds and removes do
	/// not show up in it.
	pub fn get_subscribers(&self, chunk: ChunkPos) -> Vec<Arc<ChangeSubscriber>> {
		self.store.read(|sections| {
			sections
				.get_at(SectionPos::from_chunk(chunk))
				.map(|section| section.subscribers().cloned().collect())
				.unwrap_or_default()
		})
	}

	/// Routes a block change to every subscriber observing its position.
	///
	/// Returns how many subscribers recorded the change.
	pub fn notify_block_change(&self, change: &BlockChange) -> usize {
		self.get_subscribers(ChunkPos::from_block(change.pos))
			.iter()
			.filter(|subscriber| subscriber.add_change(change.clone()))
			.count()
	}

	/// Serializes all sections.
	pub fn write_to_tag(&self) -> Compound {
		self.store.write_to_tag()
	}

	/// Replaces the index with the sections in `root` and re-derives every
	/// footprint from the home records.
	pub fn read_from_tag(&self, root: &Compound) -> Result<(), StoreError> {
		self.store.read_from_tag(root, &self.providers)?;
		self.relink();
		Ok(())
	}

	/// Writes the index to the configured data file.
	pub fn save(&self) -> Result<Option<PathBuf>, StoreError> {
		self.store.save(&self.config)
	}

	/// Loads the configured data file, if present, and re-derives footprints.
	pub fn load(&self) -> Result<bool, StoreError> {
		let loaded = self.store.load(&self.config, &self.providers)?;
		if loaded {
			self.relink();
		}
		Ok(loaded)
	}

	/// Makes each anchor's home record the single shared instance across its
	/// footprint, dropping copies outside it and copies whose home record is
	/// gone, and filling in chunks the footprint is missing.
	fn relink(&self) {
		self.store.write(|sections| {
			let mut homes: BTreeMap<BlockPos, Arc<ChangeSubscriber>> = BTreeMap::new();
			for section in sections.iter() {
				for subscriber in section.subscribers() {
					let anchor = subscriber.anchor();
					if sections.section_pos(anchor) == section.pos() {
						homes.insert(anchor, Arc::clone(subscriber));
					}
				}
			}

			let footprints: BTreeMap<BlockPos, Vec<SectionPos>> = homes
				.iter()
				.map(|(anchor, subscriber)| {
					let chunks = subscriber.observable_chunks();
					(*anchor, chunks.into_iter().map(SectionPos::from_chunk).collect())
				})
				.collect();

			let mut dropped = 0usize;
			let positions: Vec<SectionPos> = sections.iter().map(|s| s.pos()).collect();
			for pos in positions {
				let Some(section) = sections.get_at_mut(pos) else {
					continue;
				};
				let before = section.len();
				section.retain(|anchor, subscriber| {
					let home = homes.get(anchor).filter(|_| {
						footprints
							.get(anchor)
							.is_some_and(|footprint| footprint.contains(&pos))
					});
					match home {
						Some(home) => {
							*subscriber = Arc::clone(home);
							true
						}
						None => false,
					}
				});
				let removed = before - section.len();
				if removed > 0 {
					dropped += removed;
					sections.mark_dirty_at(pos);
				}
			}

			let mut added = 0usize;
			for (anchor, subscriber) in &homes {
				for chunk in subscriber.observable_chunks() {
					let at = SectionPos::from_chunk(chunk);
					let section = sections.get_or_create_at(at);
					if section.subscriber(*anchor).is_none() {
						section.add_subscriber(*anchor, Arc::clone(subscriber));
						sections.mark_dirty_at(at);
						added += 1;
					}
				}
			}

			if dropped > 0 || added > 0 {
				warn!(dropped, added, "Repaired inconsistent subscriber index after load");
			}
			debug!(subscribers = homes.len(), "Relinked subscriber index");
		});
	}
}

fn home_subscriber(sections: &Sections<MatcherSection>, anchor: BlockPos) -> Option<Arc<ChangeSubscriber>> {
	sections
		.get(anchor)
		.and_then(|section| section.subscriber(anchor))
		.cloned()
}

/// Removes the subscriber at `anchor` from its home section and then from
/// every chunk of the removed subscriber's own footprint.
fn remove_indexed(sections: &mut Sections<MatcherSection>, anchor: BlockPos) -> Option<Arc<ChangeSubscriber>> {
	let removed = sections.get_mut(anchor)?.remove_subscriber(anchor)?;
	for chunk in removed.observable_chunks() {
		let at = SectionPos::from_chunk(chunk);
		if let Some(section) = sections.get_at_mut(at) {
			section.remove_subscriber(anchor);
			sections.mark_dirty_at(at);
			trace!(%anchor, %chunk, "Unindexed subscriber");
		}
	}
	debug!(%anchor, provider = %removed.provider_key(), "Removed subscriber");
	Some(removed)
}
