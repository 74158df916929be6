//! Ephemeral values that bind an authorization redirect to its callback.

// self
use crate::_prelude::*;

/// Verifier and state stored between the authorize redirect and its callback.
///
/// Consumed exactly once: the callback deletes it whether the exchange succeeds or fails.
#[derive(Clone, PartialEq, Eq)]
pub struct HandshakeState {
	/// PKCE code verifier presented during the code exchange.
	pub code_verifier: String,
	/// Opaque anti-CSRF value that must round-trip through the redirect.
	pub state: String,
}
impl HandshakeState {
	/// Returns `true` when the callback's `state` equals the stored one.
	///
	/// A callback without `state` never matches.
	pub fn matches(&self, returned: Option<&str>) -> bool {
		returned.is_some_and(|value| value == self.state)
	}
}
impl Debug for HandshakeState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HandshakeState")
			.field("code_verifier", &"<redacted>")
			.field("state", &self.state)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn state_must_match_exactly() {
		let handshake = HandshakeState { code_verifier: "v".into(), state: "correct".into() };

		assert!(handshake.matches(Some("correct")));
		assert!(!handshake.matches(Some("wrong")));
		assert!(!handshake.matches(Some("Correct")));
		assert!(!handshake.matches(None));
	}
}
