//! Structure matching buffer.
//!
//! Indexes [`ChangeSubscriber`](vigil_observer::ChangeSubscriber)s by chunk so
//! a block change can be routed to exactly the observers whose area covers it.
//!
//! # Mental Model
//!
//! - Each chunk column has one [`MatcherSection`] mapping anchor positions to
//!   subscribers whose footprint includes that chunk.
//! - [`StructureMatchingBuffer::observe_area`] writes one shared subscriber
//!   into every chunk of its footprint; [`StructureMatchingBuffer::remove_subscriber`]
//!   finds it through its home chunk and strips it from the same footprint.
//! - The anchor's home chunk is authoritative for whether a subscriber exists.
//!
//! # Concurrency
//!
//! All sections share one read/write lock. Every add, remove and relink runs
//! in a single write scope; lookups run in read scopes and return snapshots.
//! Observer callbacks (`initialize`, change evaluation) run outside the lock.

mod buffer;
mod section;
#[cfg(test)]
mod test_util;

pub use buffer::StructureMatchingBuffer;
pub use section::MatcherSection;
