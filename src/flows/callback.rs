//! Callback URL parsing and the navigation surface it is read from.

// self
use crate::_prelude::*;

/// Query values an authorization redirect may carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Echoed anti-CSRF state.
	pub state: Option<String>,
	/// Provider error such as `access_denied`.
	pub error: Option<String>,
}
impl CallbackParams {
	/// Extracts `code`, `state`, and `error` from the query string. First occurrence wins.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				_ => continue,
			};

			if slot.is_none() && !value.is_empty() {
				*slot = Some(value.into_owned());
			}
		}

		params
	}

	/// Returns `true` when the URL carries a callback that must be stripped.
	pub fn is_callback(&self) -> bool {
		self.code.is_some() || self.error.is_some()
	}
}

/// Returns `url` without query or fragment.
pub fn strip_callback(url: &Url) -> Url {
	let mut stripped = url.clone();

	stripped.set_query(None);
	stripped.set_fragment(None);

	stripped
}

/// Current navigation location of the host application.
pub trait Location
where
	Self: Send + Sync,
{
	/// URL currently shown.
	fn current(&self) -> Url;

	/// Replaces the current URL without creating a history entry.
	fn replace(&self, url: Url);
}

/// In-process [`Location`] that records every rewrite.
#[derive(Debug)]
pub struct MemoryLocation {
	current: Mutex<Url>,
	rewrites: Mutex<Vec<Url>>,
}
impl MemoryLocation {
	/// Starts at `url`.
	pub fn new(url: Url) -> Self {
		Self { current: Mutex::new(url), rewrites: Mutex::new(Vec::new()) }
	}

	/// URLs written through [`Location::replace`], oldest first.
	pub fn rewrites(&self) -> Vec<Url> {
		self.rewrites.lock().clone()
	}
}
impl Location for MemoryLocation {
	fn current(&self) -> Url {
		self.current.lock().clone()
	}

	fn replace(&self, url: Url) {
		self.rewrites.lock().push(url.clone());

		*self.current.lock() = url;
	}
}
