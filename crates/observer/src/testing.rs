//! Fixture observers, providers and worlds for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use vigil_primitives::{BlockPos, BlockState, Compound, ResourceKey};

use crate::area::ObservableArea;
use crate::change::BlockChangeSet;
use crate::observer::ChangeObserver;
use crate::provider::{FnProvider, ObserverProvider};
use crate::world::WorldContext;

/// World with a fixed dimension name and no block data.
#[derive(Debug, Clone)]
pub struct TestWorld {
	pub dimension: String,
}

impl Default for TestWorld {
	fn default() -> Self {
		Self {
			dimension: "minecraft:overworld".into(),
		}
	}
}

impl WorldContext for TestWorld {
	fn dimension(&self) -> &str {
		&self.dimension
	}
}

/// Observer that counts initializations and reports a match while no watched
/// block has been turned into air.
#[derive(Debug)]
pub struct ProbeObserver {
	key: ResourceKey,
	area: Arc<dyn ObservableArea>,
	initialized: Arc<AtomicUsize>,
	/// Free-form state persisted under `label`.
	pub label: String,
	/// Number of `notify_change` calls seen, persisted under `evaluations`.
	pub evaluations: i32,
}

impl ProbeObserver {
	pub fn new(key: ResourceKey, area: Arc<dyn ObservableArea>, initialized: Arc<AtomicUsize>) -> Self {
		Self {
			key,
			area,
			initialized,
			label: String::new(),
			evaluations: 0,
		}
	}
}

impl ChangeObserver for ProbeObserver {
	fn provider_key(&self) -> &ResourceKey {
		&self.key
	}

	fn observable_area(&self) -> Arc<dyn ObservableArea> {
		Arc::clone(&self.area)
	}

	fn initialize(&mut self, world: &dyn WorldContext, anchor: BlockPos) {
		self.initialized.fetch_add(1, Ordering::SeqCst);
		self.label = format!("{}@{anchor}", world.dimension());
	}

	fn notify_change(&mut self, _world: &dyn WorldContext, _anchor: BlockPos, changes: &BlockChangeSet) -> bool {
		self.evaluations += 1;
		changes.iter().all(|change| change.new_state != BlockState::air())
	}

	fn read_state(&mut self, tag: &Compound) {
		self.label = tag.str("label").unwrap_or_default().to_owned();
		self.evaluations = tag.get_int_or("evaluations", 0);
	}

	fn write_state(&self, tag: &mut Compound) {
		tag.put("label", self.label.as_str());
		tag.put("evaluations", self.evaluations);
	}
}

/// Provider of [`ProbeObserver`]s plus the shared initialization counter.
pub struct ProbeKind {
	pub provider: Arc<dyn ObserverProvider>,
	pub initialized: Arc<AtomicUsize>,
}

impl ProbeKind {
	pub fn new(key: &str, area: impl ObservableArea + 'static) -> Self {
		let key: ResourceKey = match key.parse() {
			Ok(key) => key,
			Err(error) => panic!("invalid fixture key {key:?}: {error}"),
		};
		let area: Arc<dyn ObservableArea> = Arc::new(area);
		let initialized = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&initialized);
		let observer_key = key.clone();
		let provider = FnProvider::new(key, move || -> Box<dyn ChangeObserver> {
			Box::new(ProbeObserver::new(
				observer_key.clone(),
				Arc::clone(&area),
				Arc::clone(&counter),
			))
		});
		Self {
			provider: Arc::new(provider),
			initialized,
		}
	}

	pub fn initialize_count(&self) -> usize {
		self.initialized.load(Ordering::SeqCst)
	}
}
