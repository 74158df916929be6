//! Sequential fetch, reorder, write-back over the user's selected playlists.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	reorder::ReorderMode,
	sync::{PlaylistEntry, PlaylistStatus, PlaylistStore, PlaylistStoreError},
};

/// Observable coordinator state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
	/// Loaded playlists, in provider order.
	pub playlists: Vec<PlaylistEntry>,
	/// Whether a run is in progress.
	pub processing: bool,
}

/// Final status of one processed playlist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistOutcome {
	/// Playlist identifier.
	pub id: String,
	/// Status the run left the playlist in.
	pub status: PlaylistStatus,
	/// Failure text for [`PlaylistStatus::Error`].
	pub error: Option<String>,
}

/// Summary of one run, in processing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
	/// Per-playlist results.
	pub outcomes: Vec<PlaylistOutcome>,
}
impl SyncReport {
	/// Final statuses in processing order.
	pub fn statuses(&self) -> Vec<PlaylistStatus> {
		self.outcomes.iter().map(|outcome| outcome.status).collect()
	}

	/// Playlists whose new order was written back.
	pub fn written(&self) -> usize {
		self.count(|status| matches!(status, PlaylistStatus::Sorted | PlaylistStatus::Shuffled))
	}

	/// Playlists left untouched because their order did not change.
	pub fn unchanged(&self) -> usize {
		self.count(|status| status == PlaylistStatus::Unchanged)
	}

	/// Playlists whose fetch or write-back failed.
	pub fn failed(&self) -> usize {
		self.count(|status| status == PlaylistStatus::Error)
	}

	fn count(&self, f: impl Fn(PlaylistStatus) -> bool) -> usize {
		self.outcomes.iter().filter(|outcome| f(outcome.status)).count()
	}
}

/// Drives playlist selection and sync runs against a [`PlaylistStore`].
///
/// Playlists are processed strictly one at a time. A failure only marks the playlist it
/// happened on.
pub struct PlaylistSyncCoordinator {
	store: Arc<dyn PlaylistStore>,
	state: watch::Sender<SyncSnapshot>,
	processing: AtomicBool,
	has_run: AtomicBool,
}
impl PlaylistSyncCoordinator {
	/// Creates a coordinator with nothing loaded.
	pub fn new(store: Arc<dyn PlaylistStore>) -> Self {
		let (state, _) = watch::channel(SyncSnapshot::default());

		Self { store, state, processing: AtomicBool::new(false), has_run: AtomicBool::new(false) }
	}

	/// Current snapshot.
	pub fn snapshot(&self) -> SyncSnapshot {
		self.state.borrow().clone()
	}

	/// Receiver notified on every status or selection change.
	pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
		self.state.subscribe()
	}

	/// Whether a run is in progress.
	pub fn is_processing(&self) -> bool {
		self.processing.load(Ordering::SeqCst)
	}

	/// Loads the playlists owned by the signed-in user, all ready and unselected.
	///
	/// Any failure other than cancellation leaves the list empty. Playlists followed but not
	/// owned are dropped.
	pub async fn load(&self, cancel: &CancellationToken) -> Result<usize> {
		const KIND: FlowKind = FlowKind::Load;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			FlowSpan::new(KIND, "load_playlists").instrument(self.fetch_owned(cancel)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		match result {
			Ok(playlists) => {
				let count = playlists.len();

				self.state.send_modify(|snapshot| snapshot.playlists = playlists);
				obs::trace_transition(KIND, "loaded");

				Ok(count)
			},
			Err(e) => {
				obs::trace_failure(KIND, &e);

				if !e.is_cancelled() {
					self.state.send_modify(|snapshot| snapshot.playlists.clear());
				}

				Err(e)
			},
		}
	}

	/// Flips the selection of `id`. Returns `false` when no such playlist is loaded.
	pub fn toggle_selection(&self, id: &str) -> bool {
		self.state.send_if_modified(|snapshot| {
			match snapshot.playlists.iter_mut().find(|entry| entry.id == id) {
				Some(entry) => {
					entry.selected = !entry.selected;

					true
				},
				None => false,
			}
		})
	}

	/// Playlists whose name contains `search`, ignoring case. An empty search matches all.
	pub fn filtered(&self, search: &str) -> Vec<PlaylistEntry> {
		self.state.borrow().playlists.iter().filter(|entry| entry.matches(search)).cloned().collect()
	}

	/// Selects every playlist matching `search`, or deselects them when all already are.
	pub fn toggle_all(&self, search: &str) {
		self.state.send_if_modified(|snapshot| {
			let all_selected = snapshot
				.playlists
				.iter()
				.filter(|entry| entry.matches(search))
				.all(|entry| entry.selected);
			let mut modified = false;

			for entry in snapshot.playlists.iter_mut().filter(|entry| entry.matches(search)) {
				modified |= entry.selected == all_selected;
				entry.selected = !all_selected;
			}

			modified
		});
	}

	/// Number of selected playlists.
	pub fn selected_count(&self) -> usize {
		self.state.borrow().playlists.iter().filter(|entry| entry.selected).count()
	}

	/// Reorders every selected playlist with `mode`, one at a time.
	///
	/// From the second run on, every status is reset to ready first. Playlists whose order does
	/// not change are never written. Returns [`Error::AlreadyProcessing`] when another run is in
	/// flight and [`Error::Cancelled`] when `cancel` fires; statuses reached before
	/// cancellation are kept.
	///
	/// Dropping the returned future releases the coordinator the same way cancellation does:
	/// `processing` goes back to `false` and a playlist left mid-flight returns to ready.
	pub async fn run(&self, mode: &ReorderMode, cancel: &CancellationToken) -> Result<SyncReport> {
		const KIND: FlowKind = FlowKind::Sync;

		if self.processing.swap(true, Ordering::SeqCst) {
			return Err(Error::AlreadyProcessing);
		}

		let _release = RunRelease { coordinator: self };
		let reset = self.has_run.swap(true, Ordering::SeqCst);
		let selected = {
			let mut selected = Vec::new();

			self.state.send_modify(|snapshot| {
				snapshot.processing = true;

				for entry in &mut snapshot.playlists {
					if reset {
						entry.status = PlaylistStatus::Ready;
					}
					if entry.selected {
						selected.push(entry.id.clone());
					}
				}
			});

			selected
		};

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			FlowSpan::new(KIND, "run").instrument(self.process_all(&selected, mode, cancel)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn fetch_owned(&self, cancel: &CancellationToken) -> Result<Vec<PlaylistEntry>> {
		let listing = async {
			let user_id = self.store.current_user_id().await?;
			let playlists = self.store.list_playlists().await?;

			Ok::<_, PlaylistStoreError>(
				playlists
					.into_iter()
					.filter(|playlist| playlist.owner_id == user_id)
					.map(PlaylistEntry::from)
					.collect::<Vec<_>>(),
			)
		};

		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			listed = listing => listed
				.map_err(|e| Error::Fetch { playlist: "*".into(), reason: e.message }),
		}
	}

	async fn process_all(
		&self,
		selected: &[String],
		mode: &ReorderMode,
		cancel: &CancellationToken,
	) -> Result<SyncReport> {
		let mut report = SyncReport::default();

		for id in selected {
			if cancel.is_cancelled() {
				return Err(Error::Cancelled);
			}

			self.set_status(id, PlaylistStatus::Sorting);

			let (status, error) = match self.process_one(id, mode, cancel).await {
				Ok(status) => (status, None),
				Err(e) if e.is_cancelled() => return Err(e),
				Err(e) => {
					obs::trace_failure(FlowKind::Sync, &e);

					(PlaylistStatus::Error, Some(e.to_string()))
				},
			};

			self.set_status(id, status);
			report.outcomes.push(PlaylistOutcome { id: id.clone(), status, error });
		}

		Ok(report)
	}

	async fn process_one(
		&self,
		id: &str,
		mode: &ReorderMode,
		cancel: &CancellationToken,
	) -> Result<PlaylistStatus> {
		let tracks = tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(Error::Cancelled),
			fetched = self.store.get_tracks(id) => fetched
				.map_err(|e| Error::Fetch { playlist: id.to_owned(), reason: e.message })?,
		};
		let (reordered, changed) = mode.apply(tracks);

		if !changed {
			return Ok(PlaylistStatus::Unchanged);
		}

		let track_ids = reordered.into_iter().map(|track| track.id).collect();

		// A started write is not raced against cancellation, so the remote side never sees a
		// half-applied replacement from this end.
		self.store
			.replace_tracks(id, track_ids)
			.await
			.map_err(|e| Error::WriteBack { playlist: id.to_owned(), reason: e.message })?;

		Ok(match mode {
			ReorderMode::Sort(_) => PlaylistStatus::Sorted,
			ReorderMode::Shuffle(_) => PlaylistStatus::Shuffled,
		})
	}

	fn set_status(&self, id: &str, status: PlaylistStatus) {
		self.state.send_modify(|snapshot| {
			if let Some(entry) = snapshot.playlists.iter_mut().find(|entry| entry.id == id) {
				entry.status = status;
			}
		});
	}
}
impl Debug for PlaylistSyncCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PlaylistSyncCoordinator")
			.field("snapshot", &*self.state.borrow())
			.field("processing", &self.is_processing())
			.finish()
	}
}

// Ends a run on every exit path, including a dropped `run` future.
struct RunRelease<'a> {
	coordinator: &'a PlaylistSyncCoordinator,
}
impl Drop for RunRelease<'_> {
	fn drop(&mut self) {
		// State goes out before the flag admits the next run.
		self.coordinator.state.send_modify(|snapshot| {
			snapshot.processing = false;

			for entry in &mut snapshot.playlists {
				if entry.status == PlaylistStatus::Sorting {
					entry.status = PlaylistStatus::Ready;
				}
			}
		});
		self.coordinator.processing.store(false, Ordering::SeqCst);
	}
}
