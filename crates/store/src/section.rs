use vigil_primitives::{Compound, SectionPos};

/// One partition of a [`SectionStore`](crate::SectionStore).
pub trait WorldSection: Send + Sync {
	/// Extra data needed to rebuild a section from disk, such as a provider
	/// registry.
	type Context: ?Sized;

	/// Creates an empty section at `pos`.
	fn new(pos: SectionPos) -> Self;

	fn pos(&self) -> SectionPos;

	fn write_to_tag(&self, tag: &mut Compound);

	/// Replaces this section's contents with those stored in `tag`.
	fn read_from_tag(&mut self, tag: &Compound, cx: &Self::Context);
}
