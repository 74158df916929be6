//! Key-value persistence contract plus the typed facades built on top of it.
//!
//! Backends implement [`KeyValueStore`]; the rest of the crate only talks to
//! [`TokenPersistence`] (credential and handshake) and [`Preferences`] (sort rules and shuffle
//! configuration), which own the key layout and make every multi-key write atomic.

pub mod file;
pub mod memory;
pub mod persistence;
pub mod preferences;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use persistence::*;
pub use preferences::*;

// self
use crate::_prelude::*;

/// Boxed future returned by [`KeyValueStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// String key-value backend.
///
/// `set_many` and `remove_many` apply their whole batch or nothing, so callers never observe a
/// half-written credential.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Reads a single value.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes every entry in one atomic batch.
	fn set_many<'a>(&'a self, entries: Vec<(&'static str, String)>) -> StoreFuture<'a, ()>;

	/// Removes every key in one atomic batch. Missing keys are ignored.
	fn remove_many<'a>(&'a self, keys: &'a [&'static str]) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// A snapshot or value could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
