//! Token endpoint transport for code exchanges and refreshes.
//!
//! [`TokenEndpoint`] is the session's only dependency on the network. The reqwest-backed
//! [`ReqwestTokenClient`] posts form-encoded bodies to the descriptor's token endpoint and
//! maps OAuth error payloads into [`Error::Exchange`] or [`Error::Refresh`] so the session can
//! surface the provider's own wording.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::{error::TransportError, provider::ProviderDescriptor};

/// Boxed future returned by [`TokenEndpoint`] operations.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenGrant>> + 'a + Send>>;

/// Abstraction over the provider's token endpoint.
///
/// Implementations must be `Send + Sync` so a single instance can be shared by the session and
/// its background refresh task.
pub trait TokenEndpoint
where
	Self: Send + Sync,
{
	/// Exchanges an authorization code plus its PKCE verifier for a grant.
	fn exchange_code<'a>(&'a self, code: &'a str, verifier: &'a str) -> TokenFuture<'a>;

	/// Redeems a refresh token for a new grant.
	fn refresh<'a>(&'a self, refresh_token: &'a str) -> TokenFuture<'a>;
}

/// Successful token endpoint payload.
///
/// `token_type` and `scope` are ignored; an absent `refresh_token` means the prior one stays
/// valid.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
	/// Newly minted access token.
	pub access_token: String,
	/// Rotated refresh token, when the provider issued one.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Lifetime of the access token in seconds.
	pub expires_in: i64,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Grant type carried by a token request, used to classify failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantKind {
	/// `grant_type=authorization_code`.
	AuthorizationCode,
	/// `grant_type=refresh_token`.
	RefreshToken,
}
impl GrantKind {
	/// Wire value of the `grant_type` form field.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::AuthorizationCode => "authorization_code",
			Self::RefreshToken => "refresh_token",
		}
	}

	/// Wraps a rejection reason in the error variant matching this grant.
	pub fn failure(self, reason: impl Into<String>) -> Error {
		match self {
			Self::AuthorizationCode => Error::Exchange { reason: reason.into() },
			Self::RefreshToken => Error::Refresh { reason: reason.into() },
		}
	}
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}
impl OAuthErrorBody {
	fn reason(self) -> String {
		match self.error_description {
			Some(description) if !description.trim().is_empty() => description,
			_ => self.error,
		}
	}
}

/// Parses a successful token response body.
pub fn parse_grant(body: &[u8], status: Option<u16>) -> Result<TokenGrant> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let grant: TokenGrant = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| Error::TokenResponseParse { source, status })?;

	if grant.access_token.is_empty() {
		return Err(Error::TokenEndpoint {
			message: "response did not include an access token".into(),
			status,
		});
	}
	if grant.expires_in <= 0 {
		return Err(crate::error::ConfigError::NonPositiveExpiresIn.into());
	}

	Ok(grant)
}

/// Maps a non-success token response into the grant's failure variant.
///
/// OAuth error bodies contribute `error_description` (or `error`); anything else falls back to
/// the HTTP status line.
pub fn map_error_response(grant: GrantKind, status: u16, body: &[u8]) -> Error {
	match serde_json::from_slice::<OAuthErrorBody>(body) {
		Ok(parsed) => grant.failure(parsed.reason()),
		Err(_) => grant.failure(format!("HTTP {status}")),
	}
}

/// Reqwest-backed [`TokenEndpoint`].
///
/// Redirects are never followed; token endpoints answer directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTokenClient {
	client: ReqwestClient,
	descriptor: Arc<ProviderDescriptor>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTokenClient {
	/// Builds a client with a dedicated non-redirecting reqwest instance.
	pub fn new(descriptor: impl Into<Arc<ProviderDescriptor>>) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::http_client_build)?;

		Ok(Self::with_client(client, descriptor))
	}

	/// Wraps an existing reqwest client. Configure it not to follow redirects.
	pub fn with_client(client: ReqwestClient, descriptor: impl Into<Arc<ProviderDescriptor>>) -> Self {
		Self { client, descriptor: descriptor.into() }
	}

	/// Descriptor the client posts against.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	async fn post_form(&self, grant: GrantKind, form: &[(&str, &str)]) -> Result<TokenGrant> {
		let response = self
			.client
			.post(self.descriptor.token_endpoint.clone())
			.form(form)
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?;

		if status.is_success() {
			parse_grant(&body, Some(status.as_u16()))
		} else {
			Err(map_error_response(grant, status.as_u16(), &body))
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenEndpoint for ReqwestTokenClient {
	fn exchange_code<'a>(&'a self, code: &'a str, verifier: &'a str) -> TokenFuture<'a> {
		Box::pin(async move {
			let grant = GrantKind::AuthorizationCode;
			let redirect_uri = self.descriptor.redirect_uri.as_str();

			self.post_form(
				grant,
				&[
					("grant_type", grant.as_str()),
					("code", code),
					("redirect_uri", redirect_uri),
					("code_verifier", verifier),
					("client_id", self.descriptor.client_id.as_str()),
				],
			)
			.await
		})
	}

	fn refresh<'a>(&'a self, refresh_token: &'a str) -> TokenFuture<'a> {
		Box::pin(async move {
			if refresh_token.is_empty() {
				return Err(Error::Refresh { reason: "no refresh token stored".into() });
			}

			let grant = GrantKind::RefreshToken;

			self.post_form(
				grant,
				&[
					("grant_type", grant.as_str()),
					("refresh_token", refresh_token),
					("client_id", self.descriptor.client_id.as_str()),
				],
			)
			.await
		})
	}
}
