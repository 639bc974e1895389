use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;
use vigil_observer::{ChangeSubscriber, ProviderRegistry};
use vigil_primitives::{BlockPos, Compound, ResourceKey, SectionPos, Tag};
use vigil_store::WorldSection;


const SUBSCRIBERS: &str = "subscribers";
const IDENTIFIER: &str = "identifier";
const MATCH_DATA: &str = "matchData";

/// Reverse index of one chunk: anchor position to subscriber.
///
/// Holds every subscriber whose footprint includes this chunk, whether or not
/// its anchor lies inside it.
#[derive(Debug)]
pub struct MatcherSection {
	pos: SectionPos,
	subscribers: BTreeMap<BlockPos, Arc<ChangeSubscriber>>,
}

impl MatcherSection {
	/// Subscriber anchored exactly at `anchor`, if indexed here.
	pub fn subscriber(&self, anchor: BlockPos) -> Option<&Arc<ChangeSubscriber>> {
		self.subscribers.get(&anchor)
	}

	/// Subscribers in anchor order.
	pub fn subscribers(&self) -> impl Iterator<Item = &Arc<ChangeSubscriber>> {
		self.subscribers.values()
	}

	pub fn len(&self) -> usize {
		self.subscribers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.subscribers.is_empty()
	}

	pub(crate) fn add_subscriber(
		&mut self,
		anchor: BlockPos,
		subscriber: Arc<ChangeSubscriber>,
	) -> Option<Arc<ChangeSubscriber>> {
		self.subscribers.insert(anchor, subscriber)
	}

	pub(crate) fn remove_subscriber(&mut self, anchor: BlockPos) -> Option<Arc<ChangeSubscriber>> {
		self.subscribers.remove(&anchor)
	}

	pub(crate) fn retain(&mut self, f: impl FnMut(&BlockPos, &mut Arc<ChangeSubscriber>) -> bool) {
		self.subscribers.retain(f);
	}
}

impl WorldSection for MatcherSection {
	type Context = ProviderRegistry;

	fn new(pos: SectionPos) -> Self {
		Self {
			pos,
			subscribers: BTreeMap::new(),
		}
	}

	fn pos(&self) -> SectionPos {
		self.pos
	}

	fn write_to_tag(&self, tag: &mut Compound) {
		let records = self
			.subscribers
			.values()
			.map(|subscriber| {
				let mut record = Compound::new();
				record.write_block_pos(subscriber.anchor());
				record.put(IDENTIFIER, subscriber.provider_key().to_string());
				record.set_sub_tag(MATCH_DATA, |state| subscriber.write_state(state));
				Tag::Compound(record)
			})
			.collect::<Vec<_>>();
		tag.put(SUBSCRIBERS, records);
	}

	/// Rebuilds the index from persisted records.
	///
	/// Records whose provider is no longer registered, or that lack an anchor
	/// or identifier, are dropped with a warning. Restored observers are not
	/// initialized.
	fn read_from_tag(&mut self, tag: &Compound, providers: &ProviderRegistry) {
		self.subscribers.clear();

		let Ok(records) = tag.list(SUBSCRIBERS) else {
			return;
		};
		for record in records {
			let Some(record) = record.as_compound() else {
				warn!(section = %self.pos, kind = %record.kind(), "Skipping non-compound subscriber record");
				continue;
			};
			let anchor = match record.read_block_pos() {
				Ok(anchor) => anchor,
				Err(error) => {
					warn!(section = %self.pos, %error, "Skipping subscriber record without anchor");
					continue;
				}
			};
			let identifier = match record.str(IDENTIFIER).map(str::parse::<ResourceKey>) {
				Ok(Ok(key)) => key,
				Ok(Err(error)) => {
					warn!(section = %self.pos, %anchor, %error, "Skipping subscriber record with invalid identifier");
					continue;
				}
				Err(error) => {
					warn!(section = %self.pos, %anchor, %error, "Skipping subscriber record without identifier");
					continue;
				}
			};
			let Some(provider) = providers.resolve(&identifier) else {
				warn!(section = %self.pos, %anchor, provider = %identifier, "Unknown observer provider, skipping");
				continue;
			};

			let subscriber = ChangeSubscriber::restore(
				anchor,
				provider.provide_observer(),
				&record.compound_or_empty(MATCH_DATA),
			);
			self.subscribers.insert(anchor, Arc::new(subscriber));
		}
	}
}
