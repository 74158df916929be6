//! Read-only view of a playlist item.

// self
use crate::_prelude::*;

/// Playlist item as fetched from the playlist store.
///
/// Only the first artist matters for ordering. Empty strings and `None` numbers are treated as
/// missing values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
	/// Provider identifier or URI; write-back uses this value.
	pub id: String,
	/// Track title.
	#[serde(default)]
	pub name: String,
	/// Credited artist names in provider order.
	#[serde(default)]
	pub artists: Vec<String>,
	/// Album title.
	#[serde(default)]
	pub album: String,
	/// Album release date as delivered (`YYYY`, `YYYY-MM`, or `YYYY-MM-DD`).
	#[serde(default)]
	pub release_date: String,
	/// Disc number within the album.
	#[serde(default)]
	pub disc_number: Option<u32>,
	/// Track number within the disc.
	#[serde(default)]
	pub track_number: Option<u32>,
	/// Provider popularity score in `0..=100`.
	#[serde(default)]
	pub popularity: Option<u32>,
}
impl Track {
	/// Creates a track with an id and title; remaining fields start empty.
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self { id: id.into(), name: name.into(), ..Default::default() }
	}

	/// Appends a credited artist.
	pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
		self.artists.push(artist.into());

		self
	}

	/// Sets the album title.
	pub fn with_album(mut self, album: impl Into<String>) -> Self {
		self.album = album.into();

		self
	}

	/// Sets the album release date.
	pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
		self.release_date = date.into();

		self
	}

	/// Sets disc and track numbers.
	pub fn with_position(mut self, disc_number: u32, track_number: u32) -> Self {
		self.disc_number = Some(disc_number);
		self.track_number = Some(track_number);

		self
	}

	/// Sets the popularity score.
	pub fn with_popularity(mut self, popularity: u32) -> Self {
		self.popularity = Some(popularity);

		self
	}

	/// First credited artist, or `""`.
	pub fn artist(&self) -> &str {
		self.artists.first().map(String::as_str).unwrap_or_default()
	}

	/// Popularity clamped to `0..=100`, missing as `0`.
	pub fn popularity_score(&self) -> u32 {
		self.popularity.unwrap_or(0).min(100)
	}
}
