//! JSON-snapshot [`KeyValueStore`] that survives process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError, StoreFuture},
};

type Snapshot = BTreeMap<String, String>;

/// Persists the whole map to a JSON file after each mutation.
///
/// A batch is applied to a copy of the map and only becomes visible once the snapshot has been
/// written and renamed into place, so a failed write leaves both disk and memory untouched.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		let snapshot = load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn commit(&self, apply: impl FnOnce(&mut Snapshot)) -> Result<(), StoreError> {
		let mut guard = self.inner.write();
		let mut next = guard.clone();

		apply(&mut next);

		if next == *guard {
			return Ok(());
		}

		persist(&self.path, &next)?;

		*guard = next;

		Ok(())
	}
}
impl KeyValueStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.inner.read().get(key).cloned()) })
	}

	fn set_many<'a>(&'a self, entries: Vec<(&'static str, String)>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.commit(|map| {
				for (key, value) in entries {
					map.insert(key.to_owned(), value);
				}
			})
		})
	}

	fn remove_many<'a>(&'a self, keys: &'a [&'static str]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.commit(|map| {
				for key in keys {
					map.remove(*key);
				}
			})
		})
	}
}

fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
	if !path.exists() {
		return Ok(Snapshot::new());
	}

	let bytes = fs::read(path).map_err(|e| StoreError::Backend {
		message: format!("Failed to read {}: {e}", path.display()),
	})?;

	if bytes.is_empty() {
		return Ok(Snapshot::new());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse {}: {e}", path.display()),
	})
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}

fn persist(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
	ensure_parent_exists(path)?;

	let serialized = serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
		message: format!("Failed to serialize store snapshot: {e}"),
	})?;
	let tmp_path = path.with_extension("tmp");

	{
		let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
			message: format!("Failed to create {}: {e}", tmp_path.display()),
		})?;

		file.write_all(&serialized).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", tmp_path.display()),
		})?;
		file.sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", tmp_path.display()),
		})?;
	}

	fs::rename(&tmp_path, path).map_err(|e| StoreError::Backend {
		message: format!("Failed to replace {}: {e}", path.display()),
	})
}
