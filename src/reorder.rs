//! Track reordering: deterministic multi-rule sorting and weighted, separation-aware shuffling.
//!
//! Both engines only read the fields exposed by [`Track`] and never alter anything but the
//! position of a track within the sequence.

pub mod rules;
pub mod shuffle;
pub mod sort;
pub mod track;

pub use rules::*;
pub use shuffle::*;
pub use sort::*;
pub use track::*;

/// How a sync run reorders each selected playlist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReorderMode {
	/// Stable multi-key sort.
	Sort(Vec<SortRule>),
	/// Weighted shuffle with optional separation.
	Shuffle(ShuffleConfig),
}
impl ReorderMode {
	/// Reorders `tracks` and reports whether the order differs from the input.
	pub fn apply(&self, mut tracks: Vec<Track>) -> (Vec<Track>, bool) {
		match self {
			Self::Sort(rules) => {
				let changed = sort_tracks(&mut tracks, rules);

				(tracks, changed)
			},
			Self::Shuffle(config) => {
				let shuffled = shuffle_tracks(&tracks, config);
				let changed = !same_order(&tracks, &shuffled);

				(shuffled, changed)
			},
		}
	}
}
impl Default for ReorderMode {
	fn default() -> Self {
		Self::Sort(Vec::new())
	}
}

/// Returns `true` when both sequences list the same track ids in the same order.
pub fn same_order(a: &[Track], b: &[Track]) -> bool {
	a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn sort_mode_reports_change_only_when_order_moves() {
		let tracks = vec![Track::new("1", "Apple"), Track::new("2", "Banana")];
		let mode = ReorderMode::Sort(vec![SortRule::new(SortKey::Title, SortOrder::Asc)]);
		let (sorted, changed) = mode.apply(tracks.clone());

		assert!(!changed);
		assert_eq!(sorted, tracks);

		let mode = ReorderMode::Sort(vec![SortRule::new(SortKey::Title, SortOrder::Desc)]);
		let (sorted, changed) = mode.apply(tracks);

		assert!(changed);
		assert_eq!(sorted[0].id, "2");
	}

	#[test]
	fn shuffle_mode_keeps_single_track_unchanged() {
		let mode = ReorderMode::Shuffle(ShuffleConfig::default());
		let (shuffled, changed) = mode.apply(vec![Track::new("only", "Solo")]);

		assert!(!changed);
		assert_eq!(shuffled.len(), 1);
	}
}
