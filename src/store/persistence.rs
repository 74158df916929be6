//! Typed access to the persisted credential and PKCE handshake.

// self
use crate::{
	_prelude::*,
	auth::{Credential, HandshakeState},
	store::KeyValueStore,
};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "spotify_access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";
/// Storage key of the expiry instant in Unix epoch milliseconds.
pub const TOKEN_EXPIRY_KEY: &str = "spotify_token_expiry";
/// Storage key of the pending PKCE verifier.
pub const CODE_VERIFIER_KEY: &str = "code_verifier";
/// Storage key of the pending anti-CSRF state.
pub const OAUTH_STATE_KEY: &str = "oauth_state";

const CREDENTIAL_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY];
const HANDSHAKE_KEYS: [&str; 2] = [CODE_VERIFIER_KEY, OAUTH_STATE_KEY];

/// Owns the credential and handshake key layout on top of a [`KeyValueStore`].
///
/// Credential writes and removals always touch all three keys in one batch. A credential with
/// any key missing or an unreadable expiry loads as absent.
#[derive(Clone)]
pub struct TokenPersistence {
	store: Arc<dyn KeyValueStore>,
}
impl TokenPersistence {
	/// Wraps a backend.
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self { store }
	}

	/// Loads the persisted credential, if one is fully present.
	pub async fn load_credential(&self) -> Result<Option<Credential>> {
		let access = self.store.get(ACCESS_TOKEN_KEY).await?;
		let refresh = self.store.get(REFRESH_TOKEN_KEY).await?;
		let expiry = self.store.get(TOKEN_EXPIRY_KEY).await?;
		let (Some(access), Some(refresh), Some(expiry)) = (access, refresh, expiry) else {
			return Ok(None);
		};
		let Some(expires_at) =
			expiry.trim().parse::<i128>().ok().and_then(Credential::expiry_from_millis)
		else {
			return Ok(None);
		};

		Ok(Some(Credential::new(access, refresh, expires_at)))
	}

	/// Replaces the persisted credential wholesale.
	pub async fn save_credential(&self, credential: &Credential) -> Result<()> {
		self.store
			.set_many(vec![
				(ACCESS_TOKEN_KEY, credential.access_token_unchecked().expose().to_owned()),
				(REFRESH_TOKEN_KEY, credential.refresh_token().expose().to_owned()),
				(TOKEN_EXPIRY_KEY, credential.expires_at_millis().to_string()),
			])
			.await?;

		Ok(())
	}

	/// Removes all three credential keys together.
	pub async fn clear_credential(&self) -> Result<()> {
		self.store.remove_many(&CREDENTIAL_KEYS).await?;

		Ok(())
	}

	/// Stores the verifier and state of a freshly started authorization.
	pub async fn save_handshake(&self, handshake: &HandshakeState) -> Result<()> {
		self.store
			.set_many(vec![
				(CODE_VERIFIER_KEY, handshake.code_verifier.clone()),
				(OAUTH_STATE_KEY, handshake.state.clone()),
			])
			.await?;

		Ok(())
	}

	/// Loads the pending handshake when both values are present.
	pub async fn load_handshake(&self) -> Result<Option<HandshakeState>> {
		let code_verifier = self.store.get(CODE_VERIFIER_KEY).await?;
		let state = self.store.get(OAUTH_STATE_KEY).await?;

		Ok(code_verifier
			.zip(state)
			.map(|(code_verifier, state)| HandshakeState { code_verifier, state }))
	}

	/// Reads only the stored anti-CSRF state.
	pub async fn load_state(&self) -> Result<Option<String>> {
		Ok(self.store.get(OAUTH_STATE_KEY).await?)
	}

	/// Removes the handshake; called after every callback exchange, successful or not.
	pub async fn clear_handshake(&self) -> Result<()> {
		self.store.remove_many(&HANDSHAKE_KEYS).await?;

		Ok(())
	}

	/// Removes credential and handshake together.
	pub async fn clear_all(&self) -> Result<()> {
		const ALL_KEYS: [&str; 5] = [
			ACCESS_TOKEN_KEY,
			REFRESH_TOKEN_KEY,
			TOKEN_EXPIRY_KEY,
			CODE_VERIFIER_KEY,
			OAUTH_STATE_KEY,
		];

		self.store.remove_many(&ALL_KEYS).await.map_err(Error::from)
	}
}
impl Debug for TokenPersistence {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenPersistence(..)")
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::store::MemoryStore;

	fn persistence() -> (MemoryStore, TokenPersistence) {
		let store = MemoryStore::default();

		(store.clone(), TokenPersistence::new(Arc::new(store)))
	}

	#[tokio::test]
	async fn credential_round_trips_through_epoch_millis() {
		let (store, persistence) = persistence();
		let credential = Credential::new("a", "r", macros::datetime!(2025-03-01 12:00 UTC));

		persistence.save_credential(&credential).await.expect("Save should succeed.");

		assert_eq!(store.peek(TOKEN_EXPIRY_KEY), Some("1740830400000".into()));
		assert_eq!(
			persistence.load_credential().await.expect("Load should succeed."),
			Some(credential)
		);

		persistence.clear_credential().await.expect("Clear should succeed.");

		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn partial_or_unreadable_credentials_load_as_absent() {
		let (store, persistence) = persistence();

		store.insert(ACCESS_TOKEN_KEY, "a");
		store.insert(TOKEN_EXPIRY_KEY, "1740830400000");

		assert_eq!(persistence.load_credential().await.expect("Load should succeed."), None);

		store.insert(REFRESH_TOKEN_KEY, "r");
		store.insert(TOKEN_EXPIRY_KEY, "tomorrow");

		assert_eq!(persistence.load_credential().await.expect("Load should succeed."), None);
	}

	#[tokio::test]
	async fn handshake_requires_both_values() {
		let (store, persistence) = persistence();
		let handshake = HandshakeState { code_verifier: "v".into(), state: "s".into() };

		persistence.save_handshake(&handshake).await.expect("Save should succeed.");

		assert_eq!(
			persistence.load_handshake().await.expect("Load should succeed."),
			Some(handshake)
		);

		store.remove_many(&[CODE_VERIFIER_KEY]).await.expect("Removal should succeed.");

		assert_eq!(persistence.load_handshake().await.expect("Load should succeed."), None);
		assert_eq!(persistence.load_state().await.expect("Load should succeed."), Some("s".into()));

		persistence.clear_all().await.expect("Clear should succeed.");

		assert!(store.is_empty());
	}
}
