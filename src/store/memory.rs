//! Thread-safe in-memory [`KeyValueStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// In-process backend; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored keys.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Synchronous read used by tests and debugging tools.
	pub fn peek(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	/// Synchronous single-key write that bypasses the facades, e.g. to seed legacy values.
	pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
		self.0.write().insert(key.into(), value.into());
	}
}
impl KeyValueStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let value = self.0.read().get(key).cloned();

		Box::pin(async move { Ok(value) })
	}

	fn set_many<'a>(&'a self, entries: Vec<(&'static str, String)>) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			let mut guard = map.write();

			for (key, value) in entries {
				guard.insert(key.to_owned(), value);
			}

			Ok(())
		})
	}

	fn remove_many<'a>(&'a self, keys: &'a [&'static str]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			let mut guard = map.write();

			for key in keys {
				guard.remove(*key);
			}

			Ok(())
		})
	}
}
