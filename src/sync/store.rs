//! Remote playlist collaborator contract plus an in-process implementation.

// std
use std::{
	collections::HashSet,
	sync::atomic::{AtomicUsize, Ordering},
};
// self
use crate::{_prelude::*, reorder::Track, sync::RemotePlaylist};

/// Most items the provider accepts in one write request.
pub const WRITE_BATCH_LIMIT: usize = 100;

/// Boxed future returned by [`PlaylistStore`] operations.
pub type PlaylistFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, PlaylistStoreError>> + 'a + Send>>;

/// Failure reported by a [`PlaylistStore`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct PlaylistStoreError {
	/// Human-readable error payload.
	pub message: String,
}
impl PlaylistStoreError {
	/// Wraps a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Remote playlist API as seen by the coordinator.
///
/// Implementations handle pagination, request batching, and authentication themselves.
pub trait PlaylistStore
where
	Self: Send + Sync,
{
	/// Identifier of the signed-in user.
	fn current_user_id(&self) -> PlaylistFuture<'_, String>;

	/// Every playlist visible to the user, owned or followed.
	fn list_playlists(&self) -> PlaylistFuture<'_, Vec<RemotePlaylist>>;

	/// Complete track list of `playlist_id`, in playlist order.
	fn get_tracks<'a>(&'a self, playlist_id: &'a str) -> PlaylistFuture<'a, Vec<Track>>;

	/// Replaces the playlist content with `track_ids`, in order.
	fn replace_tracks<'a>(
		&'a self,
		playlist_id: &'a str,
		track_ids: Vec<String>,
	) -> PlaylistFuture<'a, ()>;
}

#[derive(Debug, Default)]
struct Library {
	playlists: Vec<RemotePlaylist>,
	tracks: HashMap<String, Vec<Track>>,
	failing_fetches: HashSet<String>,
	failing_writes: HashSet<String>,
	writes_per_playlist: HashMap<String, usize>,
}

/// In-memory [`PlaylistStore`] that batches writes at [`WRITE_BATCH_LIMIT`] like the provider.
///
/// The first batch of a replacement overwrites the playlist and later batches append, so a
/// 250-track write costs three requests.
#[derive(Debug)]
pub struct MemoryPlaylistStore {
	user_id: String,
	library: RwLock<Library>,
	write_requests: AtomicUsize,
}
impl MemoryPlaylistStore {
	/// Creates an empty library for `user_id`.
	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			library: RwLock::new(Library::default()),
			write_requests: AtomicUsize::new(0),
		}
	}

	/// Adds a playlist owned by `owner_id`; its track count follows `tracks`.
	pub fn with_playlist(
		self,
		id: impl Into<String>,
		name: impl Into<String>,
		owner_id: impl Into<String>,
		tracks: Vec<Track>,
	) -> Self {
		let id = id.into();

		{
			let mut library = self.library.write();

			library.playlists.push(RemotePlaylist {
				href: format!("memory://playlists/{id}"),
				id: id.clone(),
				name: name.into(),
				track_count: tracks.len() as u32,
				owner_id: owner_id.into(),
			});
			library.tracks.insert(id, tracks);
		}

		self
	}

	/// Makes every fetch of `playlist_id` fail.
	pub fn fail_fetches_for(self, playlist_id: impl Into<String>) -> Self {
		self.library.write().failing_fetches.insert(playlist_id.into());

		self
	}

	/// Makes every write to `playlist_id` fail.
	pub fn fail_writes_for(self, playlist_id: impl Into<String>) -> Self {
		self.library.write().failing_writes.insert(playlist_id.into());

		self
	}

	/// Current track ids of `playlist_id`.
	pub fn track_ids(&self, playlist_id: &str) -> Vec<String> {
		self.library
			.read()
			.tracks
			.get(playlist_id)
			.map(|tracks| tracks.iter().map(|track| track.id.clone()).collect())
			.unwrap_or_default()
	}

	/// Write requests issued across all playlists, counting each batch.
	pub fn write_requests(&self) -> usize {
		self.write_requests.load(Ordering::SeqCst)
	}

	/// Write requests issued against `playlist_id`.
	pub fn write_requests_for(&self, playlist_id: &str) -> usize {
		self.library.read().writes_per_playlist.get(playlist_id).copied().unwrap_or_default()
	}

	fn write(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), PlaylistStoreError> {
		let mut library = self.library.write();

		if library.failing_writes.contains(playlist_id) {
			return Err(PlaylistStoreError::new(format!("write to {playlist_id} was rejected")));
		}

		let Some(current) = library.tracks.get(playlist_id) else {
			return Err(PlaylistStoreError::new(format!("playlist {playlist_id} does not exist")));
		};
		let mut pool = current.clone();
		let mut next = Vec::with_capacity(track_ids.len());

		for id in track_ids {
			let Some(at) = pool.iter().position(|track| &track.id == id) else {
				return Err(PlaylistStoreError::new(format!("track {id} is not in {playlist_id}")));
			};

			next.push(pool.swap_remove(at));
		}

		// The first batch replaces the content, later batches append.
		let mut batches = next.chunks(WRITE_BATCH_LIMIT);
		let mut written = batches.next().map(<[Track]>::to_vec).unwrap_or_default();
		let mut requests = 1;

		for batch in batches {
			written.extend_from_slice(batch);
			requests += 1;
		}

		self.write_requests.fetch_add(requests, Ordering::SeqCst);
		*library.writes_per_playlist.entry(playlist_id.to_owned()).or_default() += requests;
		library.tracks.insert(playlist_id.to_owned(), written);

		Ok(())
	}
}
impl PlaylistStore for MemoryPlaylistStore {
	fn current_user_id(&self) -> PlaylistFuture<'_, String> {
		let user_id = self.user_id.clone();

		Box::pin(async move { Ok(user_id) })
	}

	fn list_playlists(&self) -> PlaylistFuture<'_, Vec<RemotePlaylist>> {
		let playlists = self.library.read().playlists.clone();

		Box::pin(async move { Ok(playlists) })
	}

	fn get_tracks<'a>(&'a self, playlist_id: &'a str) -> PlaylistFuture<'a, Vec<Track>> {
		let library = self.library.read();
		let outcome = if library.failing_fetches.contains(playlist_id) {
			Err(PlaylistStoreError::new(format!("fetch of {playlist_id} was rejected")))
		} else {
			library.tracks.get(playlist_id).cloned().ok_or_else(|| {
				PlaylistStoreError::new(format!("playlist {playlist_id} does not exist"))
			})
		};

		Box::pin(async move { outcome })
	}

	fn replace_tracks<'a>(
		&'a self,
		playlist_id: &'a str,
		track_ids: Vec<String>,
	) -> PlaylistFuture<'a, ()> {
		Box::pin(async move { self.write(playlist_id, &track_ids) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn tracks(count: usize) -> Vec<Track> {
		(0..count).map(|i| Track::new(format!("t{i}"), format!("Track {i}"))).collect()
	}

	#[tokio::test]
	async fn large_writes_are_batched() {
		let store = MemoryPlaylistStore::new("me").with_playlist("p1", "Big", "me", tracks(250));
		let mut reversed = store.track_ids("p1");

		reversed.reverse();
		store
			.replace_tracks("p1", reversed.clone())
			.await
			.expect("Replacing tracks should succeed.");

		assert_eq!(store.write_requests(), 3);
		assert_eq!(store.write_requests_for("p1"), 3);
		assert_eq!(store.track_ids("p1"), reversed);
	}

	#[tokio::test]
	async fn failures_are_injected_per_playlist() {
		let store = MemoryPlaylistStore::new("me")
			.with_playlist("p1", "One", "me", tracks(2))
			.with_playlist("p2", "Two", "me", tracks(2))
			.fail_fetches_for("p1")
			.fail_writes_for("p2");

		assert!(store.get_tracks("p1").await.is_err());
		assert!(store.replace_tracks("p2", store.track_ids("p2")).await.is_err());
		assert_eq!(store.write_requests(), 0);
	}

	#[tokio::test]
	async fn unknown_track_ids_are_rejected_without_writing() {
		let store = MemoryPlaylistStore::new("me").with_playlist("p1", "One", "me", tracks(2));
		let err = store
			.replace_tracks("p1", vec!["t0".into(), "ghost".into()])
			.await
			.expect_err("Unknown ids should be rejected.");

		assert!(err.message.contains("ghost"));
		assert_eq!(store.track_ids("p1"), ["t0", "t1"]);
	}
}
