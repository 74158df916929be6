//! Crate-level error types shared across the session, reorder, and sync layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Text surfaced when an exchange failure carries nothing descriptive.
pub const TOKEN_EXCHANGE_FAILED: &str = "token_exchange_failed";
/// Text surfaced when the callback `state` does not match the stored handshake.
pub const STATE_MISMATCH: &str = "state_mismatch";

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint answered with something other than a usable grant or OAuth error.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The identity provider redirected back with an explicit `error` value.
	#[error("{error}")]
	Provider {
		/// Raw `error` query value, surfaced verbatim.
		error: String,
	},
	/// Callback `state` did not match the stored handshake state.
	#[error("state_mismatch")]
	StateMismatch,
	/// No handshake verifier was stored when the callback arrived.
	#[error("Code verifier not found.")]
	MissingHandshake,
	/// Provider rejected the authorization code.
	#[error("Token exchange failed: {reason}.")]
	Exchange {
		/// Provider- or transport-supplied reason string.
		reason: String,
	},
	/// Provider rejected the refresh token, or none was stored.
	#[error("Token refresh failed: {reason}.")]
	Refresh {
		/// Provider- or transport-supplied reason string.
		reason: String,
	},
	/// Fetching a playlist's tracks failed.
	#[error("Failed to fetch tracks of playlist {playlist}: {reason}.")]
	Fetch {
		/// Playlist identifier.
		playlist: String,
		/// Store-supplied reason string.
		reason: String,
	},
	/// Writing a reordered playlist back failed.
	#[error("Failed to write playlist {playlist}: {reason}.")]
	WriteBack {
		/// Playlist identifier.
		playlist: String,
		/// Store-supplied reason string.
		reason: String,
	},
	/// The owning scope was torn down before the operation finished.
	#[error("Operation was cancelled.")]
	Cancelled,
	/// A sync run is already in progress.
	#[error("A sync run is already in progress.")]
	AlreadyProcessing,
}
impl Error {
	/// Human-readable text for the UI layer.
	///
	/// Provider errors are returned verbatim, CSRF failures as `state_mismatch`, and
	/// exchange failures as their descriptive reason, falling back to
	/// `token_exchange_failed` when none exists.
	pub fn surface_text(&self) -> String {
		match self {
			Self::Provider { error } => error.clone(),
			Self::StateMismatch => STATE_MISMATCH.into(),
			Self::Exchange { reason } | Self::Refresh { reason } if !reason.trim().is_empty() =>
				self.to_string(),
			Self::TokenEndpoint { message, .. } if !message.trim().is_empty() => self.to_string(),
			Self::MissingHandshake => self.to_string(),
			_ => TOKEN_EXCHANGE_FAILED.into(),
		}
	}

	/// Returns `true` for errors produced by cooperative cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Scope set validation failed.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// A required environment variable is missing or not valid unicode.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// A configured URL cannot be parsed.
	#[error("Configured URL `{value}` is invalid.")]
	InvalidUrl {
		/// Raw value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint response omitted a usable `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
