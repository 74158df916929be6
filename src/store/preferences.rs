//! Typed facade for the user's reorder preferences.

// self
use crate::{
	_prelude::*,
	reorder::{DEFAULT_SORT_RULES, ShuffleConfig, SortRule, decode_rules, encode_rules},
	store::{KeyValueStore, StoreError},
};

/// Key holding the compact sort-rule encoding.
pub const SORT_RULES_KEY: &str = "sort_rules";
/// Key holding the JSON shuffle configuration.
pub const SHUFFLE_CONFIG_KEY: &str = "shuffle_config";

/// Reads and writes sort rules and shuffle configuration.
#[derive(Clone)]
pub struct Preferences {
	store: Arc<dyn KeyValueStore>,
}
impl Preferences {
	/// Wraps a backend.
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self { store }
	}

	/// Loads the stored sort rules.
	///
	/// Nothing stored yields the default rules; a value that fails to decode yields no rules.
	pub async fn load_sort_rules(&self) -> Result<Vec<SortRule>> {
		let Some(raw) = self.store.get(SORT_RULES_KEY).await? else {
			return Ok(decode_rules(DEFAULT_SORT_RULES).unwrap_or_default());
		};

		Ok(decode_rules(&raw).unwrap_or_default())
	}

	/// Persists `rules` in their compact encoding.
	pub async fn save_sort_rules(&self, rules: &[SortRule]) -> Result<()> {
		self.store.set_many(vec![(SORT_RULES_KEY, encode_rules(rules))]).await?;

		Ok(())
	}

	/// Loads the stored shuffle configuration, falling back to the default when absent or
	/// undecodable.
	pub async fn load_shuffle_config(&self) -> Result<ShuffleConfig> {
		let raw = self.store.get(SHUFFLE_CONFIG_KEY).await?;

		Ok(raw.and_then(|raw| serde_json::from_str(&raw).ok()).unwrap_or_default())
	}

	/// Persists `config` as JSON.
	pub async fn save_shuffle_config(&self, config: &ShuffleConfig) -> Result<()> {
		let raw = serde_json::to_string(config)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		self.store.set_many(vec![(SHUFFLE_CONFIG_KEY, raw)]).await?;

		Ok(())
	}
}
impl Debug for Preferences {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Preferences(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		reorder::{ShuffleWeight, SmartSeparation, SortKey, SortOrder},
		store::MemoryStore,
	};

	fn preferences() -> (MemoryStore, Preferences) {
		let store = MemoryStore::default();

		(store.clone(), Preferences::new(Arc::new(store)))
	}

	#[tokio::test]
	async fn missing_rules_fall_back_to_defaults() {
		let (_, preferences) = preferences();
		let rules = preferences.load_sort_rules().await.expect("Loading rules should succeed.");

		assert_eq!(encode_rules(&rules), DEFAULT_SORT_RULES);
	}

	#[tokio::test]
	async fn undecodable_rules_load_as_empty() {
		let (store, preferences) = preferences();

		store.insert(SORT_RULES_KEY, "artist/sideways");

		let rules = preferences.load_sort_rules().await.expect("Loading rules should succeed.");

		assert!(rules.is_empty());
	}

	#[tokio::test]
	async fn rules_persist_in_compact_form() {
		let (store, preferences) = preferences();
		let rules = [
			SortRule::new(SortKey::Album, SortOrder::Desc),
			SortRule::new(SortKey::TrackNumber, SortOrder::Asc),
		];

		preferences.save_sort_rules(&rules).await.expect("Saving rules should succeed.");

		assert_eq!(store.peek(SORT_RULES_KEY).as_deref(), Some("album/desc track_number"));
		assert_eq!(
			preferences.load_sort_rules().await.expect("Loading rules should succeed."),
			rules
		);
	}

	#[tokio::test]
	async fn shuffle_config_round_trips_and_tolerates_garbage() {
		let (store, preferences) = preferences();

		store.insert(SHUFFLE_CONFIG_KEY, "{not json");

		assert_eq!(
			preferences.load_shuffle_config().await.expect("Loading config should succeed."),
			ShuffleConfig::default()
		);

		let config = ShuffleConfig {
			weighted: ShuffleWeight::PopularityHigh,
			smart: SmartSeparation { artist: false, album: true },
		};

		preferences.save_shuffle_config(&config).await.expect("Saving config should succeed.");

		assert_eq!(
			store.peek(SHUFFLE_CONFIG_KEY).as_deref(),
			Some(r#"{"weighted":"popularity-high","smart":{"artist":false,"album":true}}"#)
		);
		assert_eq!(
			preferences.load_shuffle_config().await.expect("Loading config should succeed."),
			config
		);
	}
}
