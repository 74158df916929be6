//! Identity-provider descriptor: the endpoints, client registration, and scopes the session
//! authorizes against.
//!
//! Descriptors are assembled through [`ProviderDescriptorBuilder`], which rejects plaintext
//! endpoints other than loopback development hosts, or loaded from the environment with
//! [`ProviderDescriptor::from_env`].

pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::ScopeSet, error::ConfigError};

/// Authorization endpoint of the hosted music service.
pub const SPOTIFY_AUTHORIZATION_ENDPOINT: &str = "https://accounts.spotify.com/authorize";
/// Token endpoint of the hosted music service.
pub const SPOTIFY_TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";
/// Scopes needed to read and rewrite the user's playlists.
pub const SPOTIFY_SCOPES: [&str; 3] =
	["playlist-read-private", "playlist-modify-private", "playlist-modify-public"];
/// Environment variable holding the registered client identifier.
pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the registered redirect URI.
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_REDIRECT_URI";

/// Immutable provider descriptor consumed by the session and the token client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// Endpoint the user agent is redirected to for consent.
	pub authorization_endpoint: Url,
	/// Endpoint receiving code exchanges and refreshes.
	pub token_endpoint: Url,
	/// Public client identifier; no client secret exists for PKCE clients.
	pub client_id: String,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested during authorization.
	pub scope: ScopeSet,
}
impl ProviderDescriptor {
	/// Creates an empty builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::default()
	}

	/// Descriptor for the hosted music service with its fixed endpoints and playlist scopes.
	pub fn spotify(client_id: impl Into<String>, redirect_uri: Url) -> Result<Self> {
		Ok(Self::builder()
			.authorization_endpoint(parse_url(SPOTIFY_AUTHORIZATION_ENDPOINT)?)
			.token_endpoint(parse_url(SPOTIFY_TOKEN_ENDPOINT)?)
			.client_id(client_id)
			.redirect_uri(redirect_uri)
			.scope(ScopeSet::new(SPOTIFY_SCOPES).map_err(ConfigError::from)?)
			.build()
			.map_err(ConfigError::from)?)
	}

	/// Reads [`ENV_CLIENT_ID`] and [`ENV_REDIRECT_URI`] from the process environment.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`ProviderDescriptor::from_env`] but reads variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let client_id = lookup(ENV_CLIENT_ID)
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingEnv { name: ENV_CLIENT_ID })?;
		let redirect_uri = lookup(ENV_REDIRECT_URI)
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingEnv { name: ENV_REDIRECT_URI })?;

		Self::spotify(client_id.trim(), parse_url(redirect_uri.trim())?)
	}

	/// Builds the consent URL carrying the PKCE challenge and anti-CSRF state.
	pub fn authorize_url(&self, code_challenge: &str, state: &str) -> Url {
		let mut url = self.authorization_endpoint.clone();

		url.query_pairs_mut()
			.append_pair("client_id", &self.client_id)
			.append_pair("response_type", "code")
			.append_pair("redirect_uri", self.redirect_uri.as_str())
			.append_pair("code_challenge_method", "S256")
			.append_pair("code_challenge", code_challenge)
			.append_pair("state", state)
			.append_pair("scope", &self.scope.normalized());

		url
	}
}

fn parse_url(value: &str) -> Result<Url> {
	Url::parse(value)
		.map_err(|source| ConfigError::InvalidUrl { value: value.to_owned(), source }.into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup_from<'a>(
		pairs: &'a [(&'static str, &'static str)],
	) -> impl Fn(&'static str) -> Option<String> + 'a {
		move |name| pairs.iter().find(|(key, _)| *key == name).map(|(_, value)| (*value).into())
	}

	#[test]
	fn authorize_url_carries_every_pkce_parameter() {
		let descriptor = ProviderDescriptor::spotify(
			"client-123",
			Url::parse("http://localhost:5173/").expect("Redirect fixture should parse."),
		)
		.expect("Preset descriptor should build.");
		let url = descriptor.authorize_url("challenge-abc", "state-xyz");
		let pairs = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert_eq!(url.host_str(), Some("accounts.spotify.com"));
		assert_eq!(url.path(), "/authorize");
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-123"));
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some("http://localhost:5173/"));
		assert_eq!(pairs.get("code_challenge_method").map(String::as_str), Some("S256"));
		assert_eq!(pairs.get("code_challenge").map(String::as_str), Some("challenge-abc"));
		assert_eq!(pairs.get("state").map(String::as_str), Some("state-xyz"));
		assert_eq!(
			pairs.get("scope").map(String::as_str),
			Some("playlist-modify-private playlist-modify-public playlist-read-private")
		);
	}

	#[test]
	fn from_lookup_requires_both_variables() {
		let err = ProviderDescriptor::from_lookup(lookup_from(&[(ENV_CLIENT_ID, "abc")]))
			.expect_err("Missing redirect URI should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingEnv { name: ENV_REDIRECT_URI })));

		let descriptor = ProviderDescriptor::from_lookup(lookup_from(&[
			(ENV_CLIENT_ID, " abc "),
			(ENV_REDIRECT_URI, "https://sorter.example.com/"),
		]))
		.expect("Complete environment should produce a descriptor.");

		assert_eq!(descriptor.client_id, "abc");
		assert_eq!(descriptor.token_endpoint.as_str(), SPOTIFY_TOKEN_ENDPOINT);
	}

	#[test]
	fn from_lookup_rejects_unparsable_redirects() {
		let err = ProviderDescriptor::from_lookup(lookup_from(&[
			(ENV_CLIENT_ID, "abc"),
			(ENV_REDIRECT_URI, "not a url"),
		]))
		.expect_err("Unparsable redirect URI should fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidUrl { .. })));
	}
}
