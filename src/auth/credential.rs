//! The delegated credential and its liveness rules.

// self
use crate::{_prelude::*, error::ConfigError, http::TokenGrant};

/// Lead time before expiry at which a proactive refresh is due.
pub const REFRESH_BUFFER: Duration = Duration::seconds(300);

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access/refresh token pair plus the instant the access token stops being valid.
///
/// `expires_at` is the only source of truth for liveness. A credential is replaced wholesale on
/// every refresh and never patched field by field.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	access_token: TokenSecret,
	refresh_token: TokenSecret,
	expires_at: OffsetDateTime,
}
impl Credential {
	/// Assembles a credential from its three parts.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at,
		}
	}

	/// Builds the credential issued by a token endpoint response received at `now`.
	///
	/// A grant without a refresh token keeps `prior_refresh`; an exchange grant that omits one
	/// stores an empty refresh token, which later fails refresh cleanly.
	pub fn from_grant(
		grant: TokenGrant,
		prior_refresh: Option<&TokenSecret>,
		now: OffsetDateTime,
	) -> Result<Self> {
		if grant.expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		let lifetime = Duration::seconds(grant.expires_in);
		let expires_at = now.checked_add(lifetime).ok_or(ConfigError::ExpiresInOutOfRange)?;
		let refresh_token = match grant.refresh_token {
			Some(token) if !token.is_empty() => TokenSecret::new(token),
			_ => prior_refresh.cloned().unwrap_or_else(|| TokenSecret::new("")),
		};

		Ok(Self { access_token: TokenSecret::new(grant.access_token), refresh_token, expires_at })
	}

	/// Instant at which the access token stops being valid.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Refresh token used to mint the next credential.
	pub fn refresh_token(&self) -> &TokenSecret {
		&self.refresh_token
	}

	/// Returns the access token only while it is still valid at `now`.
	pub fn access_token_at(&self, now: OffsetDateTime) -> Option<&TokenSecret> {
		(now < self.expires_at).then_some(&self.access_token)
	}

	/// Access token without a liveness check; reserved for persistence.
	pub(crate) fn access_token_unchecked(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Remaining lifetime at `now`, clamped at zero.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - now;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Returns `true` once `now` is inside the refresh buffer (including already expired).
	pub fn is_expiring_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at - REFRESH_BUFFER
	}

	/// Expiry as Unix epoch milliseconds, the persisted representation.
	pub fn expires_at_millis(&self) -> i128 {
		self.expires_at.unix_timestamp_nanos() / 1_000_000
	}

	/// Restores the expiry instant from Unix epoch milliseconds.
	pub fn expiry_from_millis(millis: i128) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
