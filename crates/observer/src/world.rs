use vigil_primitives::{BlockPos, BlockState};

/// Host world handle passed to observers.
///
/// The registry itself only uses [`WorldContext::dimension`] for diagnostics;
/// observers may query block states while initializing or evaluating changes.
pub trait WorldContext {
	/// Identifier of the dimension this world belongs to.
	fn dimension(&self) -> &str;

	/// Current state at `pos`, if the host can provide it.
	fn block_state(&self, _pos: BlockPos) -> Option<BlockState> {
		None
	}
}
