//! Playlist entries as the selection UI sees them.

// self
use crate::_prelude::*;

/// Per-playlist progress through a sync run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistStatus {
	/// Loaded, not processed in the current run.
	#[default]
	Ready,
	/// Fetch, reorder, or write-back in progress.
	Sorting,
	/// Sorted order written back.
	Sorted,
	/// Shuffled order written back.
	Shuffled,
	/// Reordering produced the existing order; nothing was written.
	Unchanged,
	/// Fetch or write-back failed.
	Error,
}
impl PlaylistStatus {
	/// Lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Ready => "ready",
			Self::Sorting => "sorting",
			Self::Sorted => "sorted",
			Self::Shuffled => "shuffled",
			Self::Unchanged => "unchanged",
			Self::Error => "error",
		}
	}

	/// Returns `true` for the states a run leaves a processed playlist in.
	pub fn is_final(self) -> bool {
		matches!(self, Self::Sorted | Self::Shuffled | Self::Unchanged | Self::Error)
	}
}
impl Display for PlaylistStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Playlist metadata as returned by a [`PlaylistStore`](crate::sync::PlaylistStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
	/// Provider identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Link to the playlist on the provider.
	pub href: String,
	/// Number of tracks.
	pub track_count: u32,
	/// Identifier of the owning user.
	pub owner_id: String,
}

/// A loaded playlist plus its selection and run status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistEntry {
	/// Provider identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Link to the playlist on the provider.
	pub href: String,
	/// Number of tracks.
	pub track_count: u32,
	/// Whether the next run processes this playlist.
	pub selected: bool,
	/// Progress in the current or last run.
	pub status: PlaylistStatus,
}
impl PlaylistEntry {
	/// Returns `true` when `search` is empty or a case-insensitive substring of the name.
	pub fn matches(&self, search: &str) -> bool {
		let needle = search.trim().to_lowercase();

		needle.is_empty() || self.name.to_lowercase().contains(&needle)
	}
}
impl From<RemotePlaylist> for PlaylistEntry {
	fn from(remote: RemotePlaylist) -> Self {
		Self {
			id: remote.id,
			name: remote.name,
			href: remote.href,
			track_count: remote.track_count,
			selected: false,
			status: PlaylistStatus::Ready,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn remote_playlists_load_ready_and_unselected() {
		let entry = PlaylistEntry::from(RemotePlaylist {
			id: "p1".into(),
			name: "Road Trip".into(),
			href: "https://open.example.com/playlist/p1".into(),
			track_count: 12,
			owner_id: "me".into(),
		});

		assert!(!entry.selected);
		assert_eq!(entry.status, PlaylistStatus::Ready);
		assert!(entry.matches("road"));
		assert!(entry.matches("  "));
		assert!(!entry.matches("jazz"));
	}

	#[test]
	fn statuses_serialize_lowercase() {
		let json = serde_json::to_string(&[PlaylistStatus::Sorted, PlaylistStatus::Error])
			.expect("Statuses should serialize.");

		assert_eq!(json, r#"["sorted","error"]"#);
		assert!(!PlaylistStatus::Sorting.is_final());
	}
}
