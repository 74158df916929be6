//! Self-rearming refresh timer.
//!
//! [`RefreshScheduler`] owns a single slot holding the armed timer task. Arming always disarms
//! the previous timer first, so at most one refresh is pending or in flight. Each timer sleeps
//! until [`REFRESH_BUFFER`] before expiry, asks its [`CredentialRefresher`] for a new
//! credential, and re-arms itself from the returned lifetime. A failed refresh reports to the
//! error hook and ends the loop.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{_prelude::*, auth::REFRESH_BUFFER};

/// Boxed future returned by [`CredentialRefresher::refresh`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<Duration>> + 'a + Send>>;

/// Callback invoked when a scheduled refresh fails.
pub type RefreshErrorHook = Arc<dyn Fn(&Error) + Send + Sync>;

/// Produces, persists, and publishes a new credential.
pub trait CredentialRefresher
where
	Self: 'static + Send + Sync,
{
	/// Refreshes the credential and returns the new access token lifetime.
	///
	/// Implementations must leave persisted and published state untouched once `cancel` fires,
	/// and return [`Error::Cancelled`] in that case.
	fn refresh<'a>(&'a self, cancel: &'a CancellationToken) -> RefreshFuture<'a>;
}

/// Delay before refreshing a credential that lives for `lifetime`: `max(0, lifetime - buffer)`.
pub fn refresh_delay(lifetime: Duration) -> StdDuration {
	StdDuration::try_from(lifetime - REFRESH_BUFFER).unwrap_or(StdDuration::ZERO)
}

struct ArmedTimer {
	cancel: CancellationToken,
	task: JoinHandle<()>,
}
impl ArmedTimer {
	fn disarm(self) {
		self.cancel.cancel();
		self.task.abort();
	}
}

/// Single-slot refresh timer. Dropping the scheduler disarms it.
pub struct RefreshScheduler {
	refresher: Arc<dyn CredentialRefresher>,
	on_error: RefreshErrorHook,
	parent: CancellationToken,
	slot: Mutex<Option<ArmedTimer>>,
}
impl RefreshScheduler {
	/// Creates an idle scheduler. Timers stop for good once `parent` is cancelled.
	pub fn new(refresher: Arc<dyn CredentialRefresher>, parent: CancellationToken) -> Self {
		Self { refresher, on_error: Arc::new(|_: &Error| {}), parent, slot: Mutex::new(None) }
	}

	/// Installs the callback notified when a scheduled refresh fails.
	pub fn with_error_hook<F>(mut self, hook: F) -> Self
	where
		F: 'static + Fn(&Error) + Send + Sync,
	{
		self.on_error = Arc::new(hook);

		self
	}

	/// Disarms any pending timer and arms a new one for a credential living `lifetime`.
	///
	/// Must be called from within a Tokio runtime. Does nothing after the parent token fired.
	pub fn schedule(&self, lifetime: Duration) {
		let mut slot = self.slot.lock();

		if let Some(prior) = slot.take() {
			prior.disarm();
		}
		if self.parent.is_cancelled() {
			return;
		}

		let cancel = self.parent.child_token();
		let task = tokio::spawn(run_timer(
			self.refresher.clone(),
			self.on_error.clone(),
			cancel.clone(),
			lifetime,
		));

		*slot = Some(ArmedTimer { cancel, task });
	}

	/// Disarms the pending timer, if any. Safe to call repeatedly.
	pub fn cancel(&self) {
		if let Some(timer) = self.slot.lock().take() {
			timer.disarm();
		}
	}

	/// Returns `true` while a timer is pending or its refresh is running.
	pub fn is_armed(&self) -> bool {
		self.slot.lock().as_ref().is_some_and(|timer| !timer.task.is_finished())
	}
}
impl Debug for RefreshScheduler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshScheduler").field("armed", &self.is_armed()).finish()
	}
}
impl Drop for RefreshScheduler {
	fn drop(&mut self) {
		self.cancel();
	}
}

async fn run_timer(
	refresher: Arc<dyn CredentialRefresher>,
	on_error: RefreshErrorHook,
	cancel: CancellationToken,
	mut lifetime: Duration,
) {
	loop {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => return,
			_ = tokio::time::sleep(refresh_delay(lifetime)) => {},
		}

		match refresher.refresh(&cancel).await {
			Ok(next) => lifetime = next,
			Err(e) => {
				if !e.is_cancelled() && !cancel.is_cancelled() {
					on_error(&e);
				}

				return;
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use super::*;

	#[derive(Default)]
	struct CountingRefresher {
		calls: AtomicUsize,
		outcomes: Mutex<VecDeque<Result<Duration>>>,
	}
	impl CredentialRefresher for CountingRefresher {
		fn refresh<'a>(&'a self, _cancel: &'a CancellationToken) -> RefreshFuture<'a> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let next = self.outcomes.lock().pop_front().unwrap_or(Ok(Duration::hours(1)));

			Box::pin(async move { next })
		}
	}

	async fn advance(secs: u64) {
		tokio::time::sleep(StdDuration::from_secs(secs)).await;
		tokio::task::yield_now().await;
	}

	#[test]
	fn delay_is_clamped_at_zero() {
		assert_eq!(refresh_delay(Duration::seconds(3600)), StdDuration::from_secs(3300));
		assert_eq!(refresh_delay(Duration::seconds(300)), StdDuration::ZERO);
		assert_eq!(refresh_delay(Duration::seconds(-5)), StdDuration::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn fires_before_expiry_and_rearms_from_new_lifetime() {
		let refresher = Arc::new(CountingRefresher::default());
		let scheduler = RefreshScheduler::new(refresher.clone(), CancellationToken::new());

		scheduler.schedule(Duration::seconds(600));
		advance(299).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);

		advance(2).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
		assert!(scheduler.is_armed());

		advance(3300).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn rearming_replaces_the_pending_timer() {
		let refresher = Arc::new(CountingRefresher::default());
		let scheduler = RefreshScheduler::new(refresher.clone(), CancellationToken::new());

		scheduler.schedule(Duration::seconds(600));
		scheduler.schedule(Duration::seconds(3600));
		advance(400).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);

		advance(3000).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn cancel_is_idempotent_and_silences_the_timer() {
		let refresher = Arc::new(CountingRefresher::default());
		let scheduler = RefreshScheduler::new(refresher.clone(), CancellationToken::new());

		scheduler.schedule(Duration::seconds(600));
		scheduler.cancel();
		scheduler.cancel();
		advance(7200).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
		assert!(!scheduler.is_armed());
	}

	#[tokio::test(start_paused = true)]
	async fn parent_cancellation_blocks_future_arming() {
		let refresher = Arc::new(CountingRefresher::default());
		let parent = CancellationToken::new();
		let scheduler = RefreshScheduler::new(refresher.clone(), parent.clone());

		scheduler.schedule(Duration::seconds(600));
		parent.cancel();
		scheduler.schedule(Duration::seconds(600));
		advance(7200).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn failure_notifies_hook_and_stops() {
		let refresher = Arc::new(CountingRefresher::default());
		let failures = Arc::new(AtomicUsize::new(0));
		let hook_failures = failures.clone();

		refresher.outcomes.lock().push_back(Err(Error::Refresh { reason: "invalid_grant".into() }));

		let scheduler = RefreshScheduler::new(refresher.clone(), CancellationToken::new())
			.with_error_hook(move |_| {
				hook_failures.fetch_add(1, Ordering::SeqCst);
			});

		scheduler.schedule(Duration::seconds(300));
		advance(1).await;
		advance(7200).await;

		assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
		assert_eq!(failures.load(Ordering::SeqCst), 1);
		assert!(!scheduler.is_armed());
	}
}
