//! Core value types for the spatial observer registry: positions, partitions,
//! namespaced identifiers and the structured persistence tree.

/// Opaque block-state descriptors carried by change sets.
pub mod block;
/// Namespaced identifiers used to name observer kinds.
pub mod key;
/// Block, chunk and section coordinates.
pub mod pos;
/// Structured tree of named fields used for persistence.
pub mod tag;

pub use block::BlockState;
pub use key::{DEFAULT_NAMESPACE, ParseKeyError, ResourceKey};
pub use pos::{BlockPos, CHUNK_SIZE, ChunkPos, SectionPos};
pub use tag::{Compound, Tag, TagError, TagKind};
