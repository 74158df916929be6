//! Stable multi-rule track sorting.

// std
use std::cmp::Ordering;
// self
use crate::reorder::{SortKey, SortRule, Track};

/// Precomputed comparison value for one rule.
#[derive(Debug)]
enum SortValue {
	/// Missing text; sorts first in either direction.
	Blank,
	/// Folded text for case- and accent-insensitive ordering plus an accent-aware tiebreak.
	Text { folded: String, lowered: String },
	Number(u32),
}
impl SortValue {
	fn of(track: &Track, key: SortKey) -> Self {
		match key {
			SortKey::Artist => Self::text(track.artist()),
			SortKey::Title => Self::text(&track.name),
			SortKey::Album => Self::text(&track.album),
			SortKey::ReleaseDate => Self::text(&track.release_date),
			SortKey::DiscNumber => Self::Number(track.disc_number.unwrap_or(0)),
			SortKey::TrackNumber => Self::Number(track.track_number.unwrap_or(0)),
		}
	}

	fn text(value: &str) -> Self {
		if value.is_empty() {
			return Self::Blank;
		}

		let lowered = value.to_lowercase();

		Self::Text { folded: unaccent::unaccent(&lowered), lowered }
	}

	fn compare(&self, other: &Self, rule: &SortRule) -> Ordering {
		match (self, other) {
			(Self::Blank, Self::Blank) => Ordering::Equal,
			(Self::Blank, _) => Ordering::Less,
			(_, Self::Blank) => Ordering::Greater,
			(
				Self::Text { folded: a, lowered: a_lowered },
				Self::Text { folded: b, lowered: b_lowered },
			) => rule.order.apply(a.cmp(b).then_with(|| a_lowered.cmp(b_lowered))),
			(Self::Number(a), Self::Number(b)) => rule.order.apply(a.cmp(b)),
			// One key always yields the same variant family.
			_ => Ordering::Equal,
		}
	}
}

/// Sorts `tracks` in place and returns `true` when any track moved.
///
/// Rules are evaluated in list order and the first non-equal comparison decides; full ties keep
/// the input order. Text keys compare case-insensitively with accents folded and place empty
/// values first regardless of direction. Numeric keys treat missing values as `0`.
pub fn sort_tracks(tracks: &mut Vec<Track>, rules: &[SortRule]) -> bool {
	if tracks.len() < 2 || rules.is_empty() {
		return false;
	}

	let mut keyed = std::mem::take(tracks)
		.into_iter()
		.enumerate()
		.map(|(idx, track)| {
			let values =
				rules.iter().map(|rule| SortValue::of(&track, rule.key)).collect::<Vec<_>>();

			(idx, values, track)
		})
		.collect::<Vec<_>>();

	keyed.sort_by(|(_, a, _), (_, b, _)| {
		rules
			.iter()
			.zip(a.iter().zip(b))
			.map(|(rule, (a, b))| a.compare(b, rule))
			.find(|ordering| ordering.is_ne())
			.unwrap_or(Ordering::Equal)
	});

	let changed = keyed.iter().enumerate().any(|(position, (idx, _, _))| position != *idx);

	tracks.extend(keyed.into_iter().map(|(_, _, track)| track));

	changed
}
