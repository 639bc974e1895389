//! Observer factory lookup.
//!
//! # Role
//!
//! Maps an observer-kind [`ResourceKey`] to the provider that constructs
//! observers of that kind. Sections consult it when reloading persisted
//! subscribers; an unresolved key is a recoverable condition, never an error.
//!
//! # Registration
//!
//! Providers are either submitted at link time through `inventory`
//! ([`ProviderReg`], picked up by [`ProviderRegistry::with_builtins`]) or
//! registered at runtime with [`ProviderRegistry::register`].

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;
use vigil_primitives::ResourceKey;

use crate::observer::ChangeObserver;


/// Factory for one observer kind.
pub trait ObserverProvider: Send + Sync {
	/// Identifier persisted alongside every observer this provider creates.
	fn key(&self) -> &ResourceKey;

	fn provide_observer(&self) -> Box<dyn ChangeObserver>;
}

/// Closure-backed [`ObserverProvider`].
pub struct FnProvider<F> {
	key: ResourceKey,
	factory: F,
}

impl<F> FnProvider<F>
where
	F: Fn() -> Box<dyn ChangeObserver> + Send + Sync,
{
	pub fn new(key: ResourceKey, factory: F) -> Self {
		Self { key, factory }
	}
}

impl<F> ObserverProvider for FnProvider<F>
where
	F: Fn() -> Box<dyn ChangeObserver> + Send + Sync,
{
	fn key(&self) -> &ResourceKey {
		&self.key
	}

	fn provide_observer(&self) -> Box<dyn ChangeObserver> {
		(self.factory)()
	}
}

/// Link-time provider registration, collected by `inventory`.
///
/// ```ignore
/// inventory::submit! { vigil_observer::ProviderReg(|| Arc::new(MyProvider::default())) }
/// ```
pub struct ProviderReg(pub fn() -> Arc<dyn ObserverProvider>);
inventory::collect!(ProviderReg);

/// Registration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
	#[error("observer provider {0} is already registered")]
	Duplicate(ResourceKey),
}

/// Thread-safe map from observer kind to provider.
#[derive(Default)]
pub struct ProviderRegistry {
	providers: RwLock<FxHashMap<ResourceKey, Arc<dyn ObserverProvider>>>,
}

impl ProviderRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry holding every provider submitted via [`ProviderReg`].
	///
	/// On duplicate keys the first submission wins.
	pub fn with_builtins() -> Self {
		let registry = Self::new();
		for reg in inventory::iter::<ProviderReg> {
			if let Err(error) = registry.register((reg.0)()) {
				debug!(%error, "Ignoring duplicate builtin observer provider");
			}
		}
		registry
	}

	/// Adds a provider, rejecting a second provider for the same key.
	pub fn register(&self, provider: Arc<dyn ObserverProvider>) -> Result<(), RegisterError> {
		let mut providers = self.providers.write();
		let key = provider.key().clone();
		if providers.contains_key(&key) {
			return Err(RegisterError::Duplicate(key));
		}
		debug!(provider = %key, "Registered observer provider");
		providers.insert(key, provider);
		Ok(())
	}

	/// Removes and returns the provider for `key`.
	pub fn unregister(&self, key: &ResourceKey) -> Option<Arc<dyn ObserverProvider>> {
		self.providers.write().remove(key)
	}

	pub fn resolve(&self, key: &ResourceKey) -> Option<Arc<dyn ObserverProvider>> {
		self.providers.read().get(key).cloned()
	}

	/// Registered keys in sorted order.
	pub fn keys(&self) -> Vec<ResourceKey> {
		let mut keys: Vec<_> = self.providers.read().keys().cloned().collect();
		keys.sort();
		keys
	}

	pub fn len(&self) -> usize {
		self.providers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Debug for ProviderRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProviderRegistry").field("keys", &self.keys()).finish()
	}
}
