//! Partitioned world storage.
//!
//! A [`SectionStore`] buckets world data into [`WorldSection`]s keyed by
//! [`SectionPos`](vigil_primitives::SectionPos). All sections of one store
//! share a single read/write lock domain: lookups run inside
//! [`SectionStore::read`], mutations inside [`SectionStore::write`], and both
//! release the lock on every exit path. Sections are created lazily on first
//! write, tracked as dirty once modified, and persisted as one
//! postcard-encoded [`Tag`](vigil_primitives::Tag) tree per store.

mod config;
mod error;
mod persist;
mod section;
mod store;

pub use config::{DEFAULT_SAVE_KEY, StoreConfig};
pub use error::StoreError;
pub use section::WorldSection;
pub use store::{PRECISION_CHUNK, SectionStore, Sections};
