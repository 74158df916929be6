//! PKCE session lifecycle: authorize, callback exchange, restore, refresh, and logout.
//!
//! [`AuthSession::mount`] runs the callback/restore sequence exactly once. Every asynchronous
//! step is raced against the session's [`CancellationToken`] and every state mutation is gated
//! on it, so a torn-down session neither persists nor publishes anything late.

// std
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
// crates.io
use tokio::sync::watch;
// self
#[cfg(feature = "reqwest")] use crate::{http::ReqwestTokenClient, store::KeyValueStore};
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	flows::{
		CallbackParams, CredentialRefresher, Location, PkceChallenge, RefreshFuture,
		RefreshMetrics, RefreshScheduler, strip_callback,
	},
	http::{TokenEndpoint, TokenFuture, TokenGrant},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
	store::TokenPersistence,
};

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
	/// Not mounted yet.
	#[default]
	Idle,
	/// Reading the current URL for callback parameters.
	CheckingCallback,
	/// Redeeming an authorization code.
	ExchangingCode,
	/// Loading a persisted credential.
	RestoringToken,
	/// Redeeming the refresh token.
	Refreshing,
	/// A live credential is held.
	Authenticated,
	/// No credential is held.
	Unauthenticated,
}

/// What the UI layer observes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Current phase.
	pub phase: SessionPhase,
	/// Credential, present only while authenticated or refreshing in the background.
	pub credential: Option<Credential>,
	/// Human-readable text of the last terminal authentication failure.
	pub auth_error: Option<String>,
}
impl SessionSnapshot {
	fn authenticated(credential: Credential) -> Self {
		Self { phase: SessionPhase::Authenticated, credential: Some(credential), auth_error: None }
	}

	fn unauthenticated(auth_error: Option<String>) -> Self {
		Self { phase: SessionPhase::Unauthenticated, credential: None, auth_error }
	}

	/// Returns `true` until mount settles. A background refresh does not count.
	pub fn is_loading(&self) -> bool {
		match self.phase {
			SessionPhase::Idle
			| SessionPhase::CheckingCallback
			| SessionPhase::ExchangingCode
			| SessionPhase::RestoringToken => true,
			SessionPhase::Refreshing => self.credential.is_none(),
			SessionPhase::Authenticated | SessionPhase::Unauthenticated => false,
		}
	}

	/// Returns `true` when a credential is held.
	pub fn is_authenticated(&self) -> bool {
		self.credential.is_some()
	}
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
	if cancel.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
}

async fn race(cancel: &CancellationToken, request: TokenFuture<'_>) -> Result<TokenGrant> {
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled),
		outcome = request => outcome,
	}
}

struct SessionCore {
	descriptor: Arc<ProviderDescriptor>,
	endpoint: Arc<dyn TokenEndpoint>,
	persistence: TokenPersistence,
	state: watch::Sender<SessionSnapshot>,
	metrics: RefreshMetrics,
	singleflight: AsyncMutex<()>,
	generation: AtomicU64,
}
impl SessionCore {
	fn publish(&self, cancel: &CancellationToken, snapshot: SessionSnapshot) -> Result<()> {
		ensure_live(cancel)?;
		self.state.send_replace(snapshot);

		Ok(())
	}

	fn set_phase(&self, cancel: &CancellationToken, phase: SessionPhase) -> Result<()> {
		ensure_live(cancel)?;
		self.state.send_modify(|snapshot| snapshot.phase = phase);

		Ok(())
	}

	fn commit(&self, cancel: &CancellationToken, credential: Credential) -> Result<()> {
		self.publish(cancel, SessionSnapshot::authenticated(credential))?;
		self.generation.fetch_add(1, Ordering::SeqCst);

		Ok(())
	}

	/// Refreshes under the singleflight guard and returns the new credential with its lifetime.
	///
	/// A caller that waited on the guard while another refresh succeeded reuses that result.
	/// Failure clears the persisted credential and drops to `Unauthenticated` without an
	/// `auth_error`.
	async fn refresh_credential(
		&self,
		cancel: &CancellationToken,
	) -> Result<(Credential, Duration)> {
		const KIND: FlowKind = FlowKind::Refresh;

		let observed = self.generation.load(Ordering::SeqCst);
		let _singleflight = self.singleflight.lock().await;

		ensure_live(cancel)?;

		if self.generation.load(Ordering::SeqCst) != observed {
			let current = self.state.borrow().credential.clone();

			if let Some(current) = current {
				self.metrics.record_coalesced();

				let lifetime = current.remaining_at(OffsetDateTime::now_utc());

				return Ok((current, lifetime));
			}
		}

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result =
			FlowSpan::new(KIND, "refresh_credential").instrument(self.redeem_refresh(cancel)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		match result {
			Ok(refreshed) => {
				self.metrics.record_success();

				Ok(refreshed)
			},
			Err(e) if e.is_cancelled() => Err(e),
			Err(e) => {
				self.metrics.record_failure();
				obs::trace_failure(KIND, &e);
				ensure_live(cancel)?;

				if let Err(clear) = self.persistence.clear_credential().await {
					obs::trace_failure(KIND, &clear);
				}

				self.publish(cancel, SessionSnapshot::unauthenticated(None))?;

				Err(e)
			},
		}
	}

	async fn redeem_refresh(&self, cancel: &CancellationToken) -> Result<(Credential, Duration)> {
		self.set_phase(cancel, SessionPhase::Refreshing)?;

		let current = self
			.persistence
			.load_credential()
			.await?
			.ok_or_else(|| Error::Refresh { reason: "no credential is stored".into() })?;
		let grant = race(cancel, self.endpoint.refresh(current.refresh_token().expose())).await?;
		let lifetime = Duration::seconds(grant.expires_in);
		let next =
			Credential::from_grant(grant, Some(current.refresh_token()), OffsetDateTime::now_utc())?;

		ensure_live(cancel)?;
		self.persistence.save_credential(&next).await?;
		self.commit(cancel, next.clone())?;
		obs::trace_transition(FlowKind::Refresh, "refreshed");

		Ok((next, lifetime))
	}
}
impl CredentialRefresher for SessionCore {
	fn refresh<'a>(&'a self, cancel: &'a CancellationToken) -> RefreshFuture<'a> {
		Box::pin(async move { self.refresh_credential(cancel).await.map(|(_, lifetime)| lifetime) })
	}
}

/// Owns the delegated credential for one application instance.
///
/// Construct one per process (or per test) and pass the [`TokenPersistence`] in explicitly.
/// Dropping the session tears it down.
pub struct AuthSession {
	core: Arc<SessionCore>,
	scheduler: RefreshScheduler,
	cancel: CancellationToken,
	mounted: AtomicBool,
}
impl AuthSession {
	/// Creates an unmounted session.
	pub fn new(
		descriptor: impl Into<Arc<ProviderDescriptor>>,
		endpoint: Arc<dyn TokenEndpoint>,
		persistence: TokenPersistence,
	) -> Self {
		let cancel = CancellationToken::new();
		let (state, _) = watch::channel(SessionSnapshot::default());
		let core = Arc::new(SessionCore {
			descriptor: descriptor.into(),
			endpoint,
			persistence,
			state,
			metrics: RefreshMetrics::default(),
			singleflight: AsyncMutex::new(()),
			generation: AtomicU64::new(0),
		});
		let scheduler = RefreshScheduler::new(core.clone(), cancel.clone())
			.with_error_hook(|e| obs::trace_failure(FlowKind::Refresh, e));

		Self { core, scheduler, cancel, mounted: AtomicBool::new(false) }
	}

	/// Creates a session talking to the descriptor's token endpoint through reqwest.
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(
		descriptor: impl Into<Arc<ProviderDescriptor>>,
		store: Arc<dyn KeyValueStore>,
	) -> Result<Self> {
		let descriptor = descriptor.into();
		let endpoint = Arc::new(ReqwestTokenClient::new(descriptor.clone())?);

		Ok(Self::new(descriptor, endpoint, TokenPersistence::new(store)))
	}

	/// Current snapshot.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.core.state.borrow().clone()
	}

	/// Receiver notified on every published change.
	pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
		self.core.state.subscribe()
	}

	/// Access token, only while it is still valid.
	pub fn access_token(&self) -> Option<TokenSecret> {
		let now = OffsetDateTime::now_utc();

		self.core.state.borrow().credential.as_ref()?.access_token_at(now).cloned()
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.core.metrics
	}

	/// Returns `true` while a refresh timer is armed.
	pub fn is_refresh_scheduled(&self) -> bool {
		self.scheduler.is_armed()
	}

	/// Token cancelled by [`AuthSession::teardown`]; hand it to work that should stop with the
	/// session.
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	/// Starts an authorization: persists a fresh handshake and returns the consent URL.
	pub async fn authorize(&self) -> Result<Url> {
		let pkce = PkceChallenge::generate();

		self.core.persistence.save_handshake(&pkce.handshake()).await?;
		obs::trace_transition(FlowKind::Authorization, "handshake_stored");

		Ok(self.core.descriptor.authorize_url(&pkce.code_challenge, &pkce.state))
	}

	/// Runs the callback/restore sequence once and returns the settled snapshot.
	///
	/// Authentication failures settle as `Unauthenticated` with `auth_error` set and are not
	/// returned as errors. `Err` means the session was torn down mid-way
	/// ([`Error::Cancelled`]) or storage failed. Later calls return the current snapshot.
	pub async fn mount(&self, location: &dyn Location) -> Result<SessionSnapshot> {
		if self.mounted.swap(true, Ordering::SeqCst) {
			return Ok(self.snapshot());
		}

		let cancel = self.cancel.clone();

		match self.run_mount(location, &cancel).await {
			Ok(()) => Ok(self.snapshot()),
			Err(e) if e.is_cancelled() => Err(e),
			Err(e) => {
				if !cancel.is_cancelled() {
					self.core.state.send_replace(SessionSnapshot::unauthenticated(None));
				}

				Err(e)
			},
		}
	}

	/// Refreshes on demand (e.g. after the playlist API rejected the token) and re-arms the
	/// timer.
	pub async fn refresh(&self) -> Result<Credential> {
		let (credential, lifetime) = self.core.refresh_credential(&self.cancel).await?;
		let _singleflight = self.core.singleflight.lock().await;

		// A logout that ran in between leaves nothing to keep alive.
		if self.core.state.borrow().credential.is_some() {
			self.scheduler.schedule(lifetime);
		}

		Ok(credential)
	}

	/// Disarms the timer, clears the credential, and settles as `Unauthenticated`.
	///
	/// Waits for a refresh already in flight so its write can never land after the clear.
	pub async fn logout(&self) -> Result<()> {
		self.scheduler.cancel();

		let _singleflight = self.core.singleflight.lock().await;

		self.scheduler.cancel();
		self.core.persistence.clear_credential().await?;
		self.core.state.send_replace(SessionSnapshot::unauthenticated(None));
		obs::trace_transition(FlowKind::Authorization, "logged_out");

		Ok(())
	}

	/// Cancels in-flight work and the refresh timer. Idempotent.
	pub fn teardown(&self) {
		self.cancel.cancel();
		self.scheduler.cancel();
	}

	async fn run_mount(&self, location: &dyn Location, cancel: &CancellationToken) -> Result<()> {
		self.core.set_phase(cancel, SessionPhase::CheckingCallback)?;

		let current = location.current();
		let params = CallbackParams::from_url(&current);

		if params.is_callback() {
			location.replace(strip_callback(&current));
		}
		if let Some(error) = params.error {
			return self.reject_callback(Error::Provider { error }, cancel).await;
		}
		if let Some(code) = params.code {
			return self.handle_code(&code, params.state.as_deref(), cancel).await;
		}

		self.restore(cancel).await
	}

	async fn reject_callback(&self, error: Error, cancel: &CancellationToken) -> Result<()> {
		obs::record_flow_outcome(FlowKind::Authorization, FlowOutcome::Failure);
		obs::trace_failure(FlowKind::Authorization, &error);
		ensure_live(cancel)?;
		self.core.persistence.clear_all().await?;
		self.core.publish(cancel, SessionSnapshot::unauthenticated(Some(error.surface_text())))
	}

	async fn handle_code(
		&self,
		code: &str,
		returned_state: Option<&str>,
		cancel: &CancellationToken,
	) -> Result<()> {
		const KIND: FlowKind = FlowKind::Authorization;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.core.set_phase(cancel, SessionPhase::ExchangingCode)?;

		let result = span.instrument(self.exchange(code, returned_state, cancel)).await;

		match result {
			Ok(lifetime) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.scheduler.schedule(lifetime);

				Ok(())
			},
			Err(e) if e.is_cancelled() => {
				obs::record_flow_outcome(KIND, FlowOutcome::Cancelled);

				Err(e)
			},
			Err(e) => self.reject_callback(e, cancel).await,
		}
	}

	async fn exchange(
		&self,
		code: &str,
		returned_state: Option<&str>,
		cancel: &CancellationToken,
	) -> Result<Duration> {
		let persistence = &self.core.persistence;
		let verifier = match persistence.load_handshake().await? {
			Some(handshake) if handshake.matches(returned_state) => handshake.code_verifier,
			Some(_) => return Err(Error::StateMismatch),
			None => {
				let stored = persistence.load_state().await?;

				return Err(match (stored.as_deref(), returned_state) {
					(Some(stored), Some(returned)) if stored == returned => Error::MissingHandshake,
					_ => Error::StateMismatch,
				});
			},
		};

		ensure_live(cancel)?;
		persistence.clear_handshake().await?;

		let grant = race(cancel, self.core.endpoint.exchange_code(code, &verifier)).await?;
		let lifetime = Duration::seconds(grant.expires_in);
		let credential = Credential::from_grant(grant, None, OffsetDateTime::now_utc())?;

		ensure_live(cancel)?;
		persistence.save_credential(&credential).await?;
		self.core.commit(cancel, credential)?;
		obs::trace_transition(FlowKind::Authorization, "authenticated");

		Ok(lifetime)
	}

	async fn restore(&self, cancel: &CancellationToken) -> Result<()> {
		const KIND: FlowKind = FlowKind::Restore;

		let span = FlowSpan::new(KIND, "restore");

		self.core.set_phase(cancel, SessionPhase::RestoringToken)?;

		let stored = span.instrument(self.core.persistence.load_credential()).await?;
		let Some(credential) = stored else {
			obs::trace_transition(KIND, "nothing_stored");

			return self.core.publish(cancel, SessionSnapshot::unauthenticated(None));
		};
		let now = OffsetDateTime::now_utc();

		if !credential.is_expiring_at(now) {
			let remaining = credential.remaining_at(now);

			self.core.publish(cancel, SessionSnapshot::authenticated(credential))?;
			self.scheduler.schedule(remaining);
			obs::record_flow_outcome(KIND, FlowOutcome::Success);
			obs::trace_transition(KIND, "restored");

			return Ok(());
		}

		match self.core.refresh_credential(cancel).await {
			Ok((_, lifetime)) => {
				self.scheduler.schedule(lifetime);
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(())
			},
			Err(e) if e.is_cancelled() => Err(e),
			// Already cleared and published as `Unauthenticated`.
			Err(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Ok(())
			},
		}
	}
}
impl Debug for AuthSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthSession")
			.field("snapshot", &self.snapshot())
			.field("scheduler", &self.scheduler)
			.field("torn_down", &self.cancel.is_cancelled())
			.finish()
	}
}
impl Drop for AuthSession {
	fn drop(&mut self) {
		self.teardown();
	}
}
