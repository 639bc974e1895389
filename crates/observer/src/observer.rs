use std::sync::Arc;

use vigil_primitives::{BlockPos, Compound, ResourceKey};

use crate::area::ObservableArea;
use crate::change::BlockChangeSet;
use crate::world::WorldContext;

/// One registered observer instance.
///
/// Instances come from an [`ObserverProvider`](crate::ObserverProvider) and
/// are owned by a single [`ChangeSubscriber`](crate::ChangeSubscriber).
///
/// Lifecycle:
/// 1. Constructed by its provider.
/// 2. [`initialize`](Self::initialize) runs once for a fresh registration.
///    Observers restored from disk only see [`read_state`](Self::read_state).
/// 3. [`notify_change`](Self::notify_change) runs whenever pending changes
///    inside its area are evaluated.
pub trait ChangeObserver: Send {
	/// Identifier of the provider that created this observer.
	fn provider_key(&self) -> &ResourceKey;

	/// The area this observer watches. Must not depend on mutable state.
	fn observable_area(&self) -> Arc<dyn ObservableArea>;

	fn initialize(&mut self, _world: &dyn WorldContext, _anchor: BlockPos) {}

	/// Evaluates accumulated changes and returns whether the observed
	/// structure still matches.
	fn notify_change(
		&mut self,
		world: &dyn WorldContext,
		anchor: BlockPos,
		changes: &BlockChangeSet,
	) -> bool;

	/// Restores observer-owned state. Unknown fields must be ignored.
	fn read_state(&mut self, tag: &Compound);

	fn write_state(&self, tag: &mut Compound);
}
