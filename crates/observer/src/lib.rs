//! Observer side of the spatial change registry.
//!
//! An observer is registered against an anchor position and declares, through
//! its [`ObservableArea`], which chunk partitions it needs to hear about. The
//! registry wraps each observer in a [`ChangeSubscriber`] and indexes it under
//! every affected partition. Observer kinds are named by a
//! [`ResourceKey`](vigil_primitives::ResourceKey) and constructed on demand
//! through a [`ProviderRegistry`].

pub mod area;
pub mod change;
pub mod observer;
pub mod provider;
pub mod subscriber;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod world;

pub use area::{BoundingBoxArea, ChunkRadiusArea, ObservableArea};
pub use change::{BlockChange, BlockChangeSet};
pub use observer::ChangeObserver;
pub use provider::{FnProvider, ObserverProvider, ProviderReg, ProviderRegistry, RegisterError};
pub use subscriber::ChangeSubscriber;
pub use world::WorldContext;
