//! Declarative sort rules and their compact `key[/order]` encoding.
//!
//! Rules are separated by a single space. The `asc` order is the default and is never written
//! out, so `"artist album/desc"` decodes to two rules and re-encodes byte for byte.

// std
use std::cmp::Ordering;
// self
use crate::_prelude::*;

const RULE_SEPARATOR: char = ' ';
const ORDER_SEPARATOR: char = '/';

/// Rules used when nothing has been stored yet.
pub const DEFAULT_SORT_RULES: &str = "artist release_date album title";

/// Errors raised while decoding a rule string.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SortRuleError {
	/// Input was empty.
	#[error("Empty sort rules.")]
	Empty,
	/// Key is not one of the supported sort keys.
	#[error("Invalid sort key: {key}.")]
	InvalidKey {
		/// Offending key (may be empty when separators repeat).
		key: String,
	},
	/// Order is neither `asc` nor `desc`.
	#[error("Invalid sort order: {order} ('{key}' key).")]
	InvalidOrder {
		/// Key the order was attached to.
		key: String,
		/// Offending order.
		order: String,
	},
}

/// Track attribute a rule compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortKey {
	/// First artist name.
	Artist,
	/// Track title.
	Title,
	/// Album title.
	Album,
	/// Album release date.
	ReleaseDate,
	/// Disc number.
	DiscNumber,
	/// Track number.
	TrackNumber,
}
impl SortKey {
	/// Every key, in the order the UI lists them.
	pub const ALL: [SortKey; 6] = [
		SortKey::Artist,
		SortKey::Album,
		SortKey::ReleaseDate,
		SortKey::Title,
		SortKey::DiscNumber,
		SortKey::TrackNumber,
	];

	/// Encoded name.
	pub const fn as_str(self) -> &'static str {
		match self {
			SortKey::Artist => "artist",
			SortKey::Title => "title",
			SortKey::Album => "album",
			SortKey::ReleaseDate => "release_date",
			SortKey::DiscNumber => "disc_number",
			SortKey::TrackNumber => "track_number",
		}
	}
}
impl Display for SortKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SortKey {
	type Err = SortRuleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|key| key.as_str() == s)
			.ok_or_else(|| SortRuleError::InvalidKey { key: s.to_owned() })
	}
}

/// Direction of a rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
	/// Ascending; the encoded default.
	#[default]
	Asc,
	/// Descending.
	Desc,
}
impl SortOrder {
	/// Encoded name.
	pub const fn as_str(self) -> &'static str {
		match self {
			SortOrder::Asc => "asc",
			SortOrder::Desc => "desc",
		}
	}

	/// Orients an ascending comparison result.
	pub fn apply(self, ordering: Ordering) -> Ordering {
		match self {
			SortOrder::Asc => ordering,
			SortOrder::Desc => ordering.reverse(),
		}
	}
}

/// One `(key, order)` pair. Earlier rules in a list take priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SortRule {
	/// Attribute compared.
	pub key: SortKey,
	/// Direction applied to non-empty values.
	pub order: SortOrder,
}
impl SortRule {
	/// Pairs a key with an order.
	pub const fn new(key: SortKey, order: SortOrder) -> Self {
		Self { key, order }
	}
}
impl Display for SortRule {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.order {
			SortOrder::Asc => f.write_str(self.key.as_str()),
			order => write!(f, "{}{ORDER_SEPARATOR}{}", self.key, order.as_str()),
		}
	}
}
impl FromStr for SortRule {
	type Err = SortRuleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// Segments past the order are ignored.
		let mut segments = s.split(ORDER_SEPARATOR);
		let raw_key = segments.next().unwrap_or_default();
		let key = raw_key.parse::<SortKey>()?;
		let order = match segments.next() {
			None | Some("" | "asc") => SortOrder::Asc,
			Some("desc") => SortOrder::Desc,
			Some(other) =>
				return Err(SortRuleError::InvalidOrder {
					key: raw_key.to_owned(),
					order: other.to_owned(),
				}),
		};

		Ok(Self { key, order })
	}
}

/// Decodes a space-separated rule list.
///
/// Each rule is `key[/order]`; an empty order (`artist/`) means ascending and anything after a
/// second `/` is ignored. Any unknown key or order, including the empty key produced by doubled
/// spaces, rejects the whole string.
pub fn decode_rules(raw: &str) -> Result<Vec<SortRule>, SortRuleError> {
	if raw.is_empty() {
		return Err(SortRuleError::Empty);
	}

	raw.split(RULE_SEPARATOR).map(str::parse).collect()
}

/// Encodes rules into their canonical string; an empty list encodes to `""`.
pub fn encode_rules(rules: &[SortRule]) -> String {
	rules.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decodes_default_and_explicit_orders() {
		let rules = decode_rules("artist album/desc title/asc").expect("Rules should decode.");

		assert_eq!(
			rules,
			vec![
				SortRule::new(SortKey::Artist, SortOrder::Asc),
				SortRule::new(SortKey::Album, SortOrder::Desc),
				SortRule::new(SortKey::Title, SortOrder::Asc),
			]
		);
		assert_eq!(encode_rules(&rules), "artist album/desc title");
	}

	#[test]
	fn canonical_strings_round_trip() {
		for raw in ["artist", "release_date/desc disc_number track_number/desc", "title/desc"] {
			let rules = decode_rules(raw).expect("Canonical string should decode.");

			assert_eq!(encode_rules(&rules), raw);
			assert_eq!(decode_rules(&encode_rules(&rules)), Ok(rules));
		}
	}

	#[test]
	fn malformed_strings_are_rejected() {
		assert_eq!(decode_rules(""), Err(SortRuleError::Empty));
		assert_eq!(
			decode_rules("artist  album"),
			Err(SortRuleError::InvalidKey { key: String::new() })
		);
		assert_eq!(decode_rules("date"), Err(SortRuleError::InvalidKey { key: "date".into() }));
		assert_eq!(
			decode_rules("artist/up"),
			Err(SortRuleError::InvalidOrder { key: "artist".into(), order: "up".into() })
		);
	}

	#[test]
	fn lenient_separators_decode_like_their_canonical_form() {
		assert_eq!(decode_rules("artist/"), decode_rules("artist"));
		assert_eq!(decode_rules("album/desc/asc"), decode_rules("album/desc"));
		assert_eq!(
			decode_rules("title/desc/"),
			Ok(vec![SortRule::new(SortKey::Title, SortOrder::Desc)])
		);
		assert!(decode_rules("artist/up/desc").is_err());
	}

	#[test]
	fn empty_list_encodes_to_empty_string() {
		assert_eq!(encode_rules(&[]), "");
		assert_eq!(decode_rules(DEFAULT_SORT_RULES).map(|rules| rules.len()), Ok(4));
	}
}
