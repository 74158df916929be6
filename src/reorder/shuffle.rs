//! Popularity-weighted shuffling followed by an optional artist/album separation pass.

// crates.io
use rand::{Rng, seq::SliceRandom};
// self
use crate::{_prelude::*, reorder::Track};

const JITTER: f64 = 5.0;
const INVERSION_CEILING: f64 = 105.0;
const MIN_WEIGHT: f64 = 1.0;

/// Bias applied while drawing tracks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShuffleWeight {
	/// Favor popular tracks.
	PopularityHigh,
	/// Uniform permutation.
	#[default]
	Random,
	/// Favor obscure tracks.
	PopularityLow,
}

/// Which neighbours the separation pass keeps apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmartSeparation {
	/// Avoid back-to-back tracks by the same first artist.
	pub artist: bool,
	/// Avoid back-to-back tracks from the same album.
	pub album: bool,
}
impl SmartSeparation {
	/// Returns `true` when either constraint is on.
	pub fn is_enabled(&self) -> bool {
		self.artist || self.album
	}

	fn allows(&self, previous: &Track, candidate: &Track) -> bool {
		let same_artist = self.artist && previous.artist() == candidate.artist();
		let same_album = self.album && previous.album == candidate.album;

		!(same_artist || same_album)
	}
}

/// Shuffle mode selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShuffleConfig {
	/// Sampling bias.
	pub weighted: ShuffleWeight,
	/// Separation constraints.
	pub smart: SmartSeparation,
}
impl Default for ShuffleConfig {
	fn default() -> Self {
		Self {
			weighted: ShuffleWeight::Random,
			smart: SmartSeparation { artist: true, album: false },
		}
	}
}

/// Shuffles with the thread-local generator. The input is left untouched.
pub fn shuffle_tracks(tracks: &[Track], config: &ShuffleConfig) -> Vec<Track> {
	shuffle_tracks_with(tracks, config, &mut rand::rng())
}

/// Shuffles with a caller-provided generator, for reproducible output.
pub fn shuffle_tracks_with<R>(tracks: &[Track], config: &ShuffleConfig, rng: &mut R) -> Vec<Track>
where
	R: ?Sized + Rng,
{
	let weighted = weighted_order(tracks.to_vec(), config.weighted, rng);

	if config.smart.is_enabled() { separate(weighted, config.smart) } else { weighted }
}

/// Stage one: a uniform permutation, or popularity-weighted sampling without replacement.
pub fn weighted_order<R>(tracks: Vec<Track>, weight: ShuffleWeight, rng: &mut R) -> Vec<Track>
where
	R: ?Sized + Rng,
{
	if weight == ShuffleWeight::Random {
		let mut tracks = tracks;

		tracks.shuffle(rng);

		return tracks;
	}

	let mut pool = tracks
		.into_iter()
		.map(|track| {
			let mut score = f64::from(track.popularity_score()) + rng.random::<f64>() * JITTER;

			if weight == ShuffleWeight::PopularityLow {
				score = INVERSION_CEILING - score;
			}

			(score.max(MIN_WEIGHT), track)
		})
		.collect::<Vec<_>>();
	let mut drawn = Vec::with_capacity(pool.len());

	while !pool.is_empty() {
		let total = pool.iter().map(|(weight, _)| weight).sum::<f64>();
		let mut remaining = rng.random::<f64>() * total;
		// Rounding can leave `remaining` positive after the last subtraction.
		let idx = pool
			.iter()
			.position(|(weight, _)| {
				remaining -= weight;

				remaining <= 0.0
			})
			.unwrap_or(pool.len() - 1);

		drawn.push(pool.remove(idx).1);
	}

	drawn
}

/// Stage two: greedy first-fit separation.
///
/// Each step places the first remaining track that differs from the previously placed one on
/// every enabled attribute, or the first remaining track when none does. Once more than twice
/// the initial pool size of consecutive forced placements pile up, the rest is appended as is.
pub fn separate(tracks: Vec<Track>, smart: SmartSeparation) -> Vec<Track> {
	if !smart.is_enabled() {
		return tracks;
	}

	let max_skips = tracks.len() * 2;
	let mut pool = tracks;
	let mut placed = Vec::<Track>::with_capacity(pool.len());
	let mut skips = 0_usize;

	while !pool.is_empty() {
		if skips > max_skips {
			placed.append(&mut pool);

			break;
		}

		let fit = match placed.last() {
			None => Some(0),
			Some(previous) => pool.iter().position(|candidate| smart.allows(previous, candidate)),
		};

		match fit {
			Some(idx) => {
				placed.push(pool.remove(idx));

				skips = 0;
			},
			None => {
				placed.push(pool.remove(0));

				skips += 1;
			},
		}
	}

	placed
}
