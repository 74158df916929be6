//! Sort and shuffle the playlists you own on a remote music service, backed by a PKCE session
//! that keeps its delegated credential fresh for as long as the application is open.
//!
//! The crate is split into two halves that meet at the [`sync`] coordinator:
//!
//! - [`flows`] drives the Authorization Code + PKCE handshake, callback handling, credential
//!   restore, and the self-rescheduling refresh loop, persisting state through [`store`].
//! - [`reorder`] holds the deterministic multi-rule sort and the weighted, separation-aware
//!   shuffle that [`sync::PlaylistSyncCoordinator`] applies to each selected playlist.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod reorder;
pub mod store;
pub mod sync;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fakes for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use crate::{
		auth::ScopeSet,
		http::{TokenEndpoint, TokenFuture, TokenGrant},
		provider::ProviderDescriptor,
	};

	/// Builds a descriptor pointing at loopback endpoints for tests.
	pub fn test_descriptor() -> ProviderDescriptor {
		ProviderDescriptor::builder()
			.authorization_endpoint(
				Url::parse("https://accounts.example.com/authorize")
					.expect("Authorization endpoint fixture should parse."),
			)
			.token_endpoint(
				Url::parse("https://accounts.example.com/api/token")
					.expect("Token endpoint fixture should parse."),
			)
			.client_id("client-test")
			.redirect_uri(
				Url::parse("http://127.0.0.1:5173/").expect("Redirect URI fixture should parse."),
			)
			.scope(
				ScopeSet::new(["playlist-read-private", "playlist-modify-private"])
					.expect("Scope fixture should be valid."),
			)
			.build()
			.expect("Test descriptor should build.")
	}

	/// Token endpoint fake that replays scripted outcomes and counts calls.
	#[derive(Debug, Default)]
	pub struct ScriptedTokenEndpoint {
		exchanges: Mutex<VecDeque<Result<TokenGrant>>>,
		refreshes: Mutex<VecDeque<Result<TokenGrant>>>,
		exchange_calls: AtomicUsize,
		refresh_calls: AtomicUsize,
		seen_refresh_tokens: Mutex<Vec<String>>,
	}
	impl ScriptedTokenEndpoint {
		/// Queues the outcome of the next code exchange.
		pub fn push_exchange(&self, outcome: Result<TokenGrant>) {
			self.exchanges.lock().push_back(outcome);
		}

		/// Queues the outcome of the next refresh.
		pub fn push_refresh(&self, outcome: Result<TokenGrant>) {
			self.refreshes.lock().push_back(outcome);
		}

		/// Number of code exchanges performed so far.
		pub fn exchange_calls(&self) -> usize {
			self.exchange_calls.load(Ordering::SeqCst)
		}

		/// Number of refreshes performed so far.
		pub fn refresh_calls(&self) -> usize {
			self.refresh_calls.load(Ordering::SeqCst)
		}

		/// Refresh tokens presented to the endpoint, in call order.
		pub fn seen_refresh_tokens(&self) -> Vec<String> {
			self.seen_refresh_tokens.lock().clone()
		}
	}
	impl TokenEndpoint for ScriptedTokenEndpoint {
		fn exchange_code<'a>(&'a self, _code: &'a str, _verifier: &'a str) -> TokenFuture<'a> {
			self.exchange_calls.fetch_add(1, Ordering::SeqCst);

			let next = self.exchanges.lock().pop_front();

			Box::pin(async move {
				next.unwrap_or_else(|| Err(Error::Exchange { reason: "No scripted exchange.".into() }))
			})
		}

		fn refresh<'a>(&'a self, refresh_token: &'a str) -> TokenFuture<'a> {
			self.refresh_calls.fetch_add(1, Ordering::SeqCst);
			self.seen_refresh_tokens.lock().push(refresh_token.to_owned());

			let next = self.refreshes.lock().pop_front();

			Box::pin(async move {
				next.unwrap_or_else(|| Err(Error::Refresh { reason: "No scripted refresh.".into() }))
			})
		}
	}

	/// Convenience grant with the provided lifetime in seconds.
	pub fn grant(access: &str, refresh: Option<&str>, expires_in: i64) -> TokenGrant {
		TokenGrant {
			access_token: access.into(),
			refresh_token: refresh.map(Into::into),
			expires_in,
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
