use crate::view::{self, Notice, PendingList, PendingView};
use pcremote_api::PendingActionStore;
use pcremote_core::{AppError, Decision, PendingAction};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of one fetch-and-render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The response was the newest seen so far and is now on screen.
    Applied { seq: u64, count: usize },
    /// A response issued later was already applied; this one was dropped.
    Stale { seq: u64 },
    /// The fetch failed; the view was left alone.
    Failed { seq: u64 },
}

#[derive(Default)]
struct SyncState {
    applied: u64,
    snapshot: Vec<PendingAction>,
    in_flight: HashSet<String>,
}

/// Keeps a rendered list of pending actions in step with the server and relays decisions.
///
/// Every fetch is numbered when it is issued. Responses land in completion order,
/// but only one numbered above the last applied response reaches the view, so a
/// slow poll can never overwrite the result of a newer one.
pub struct PendingActionSync {
    store: Arc<dyn PendingActionStore>,
    view: Arc<dyn PendingView>,
    issued: AtomicU64,
    state: Mutex<SyncState>,
}

impl PendingActionSync {
    pub fn new(store: Arc<dyn PendingActionStore>, view: Arc<dyn PendingView>) -> Self {
        Self {
            store,
            view,
            issued: AtomicU64::new(0),
            state: Mutex::new(SyncState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the store for the current pending set, in server order.
    pub async fn fetch_pending(&self) -> Result<Vec<PendingAction>, AppError> {
        self.store.pending().await
    }

    /// Replace the view with `actions`. Does not touch the stored snapshot.
    pub fn render(&self, actions: &[PendingAction]) {
        let state = self.state();
        self.view.render(&view::render(actions, &state.in_flight));
    }

    /// The actions from the last applied response.
    pub fn snapshot(&self) -> Vec<PendingAction> {
        self.state().snapshot.clone()
    }

    /// The view model as last rendered (or as it would be rendered now).
    pub fn current_list(&self) -> PendingList {
        let state = self.state();
        view::render(&state.snapshot, &state.in_flight)
    }

    /// Sequence number of the last response that reached the view; 0 before the first.
    pub fn applied_seq(&self) -> u64 {
        self.state().applied
    }

    /// One sync cycle. Failures are logged and otherwise ignored: background polls
    /// never surface errors to the user.
    pub async fn sync_once(&self) -> SyncOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let actions = match self.fetch_pending().await {
            Ok(actions) => actions,
            Err(e) => {
                tracing::debug!(seq, error = %e, "pending sync failed, keeping previous view");
                return SyncOutcome::Failed { seq };
            }
        };

        let mut state = self.state();
        if seq <= state.applied {
            tracing::debug!(seq, applied = state.applied, "discarding stale pending response");
            return SyncOutcome::Stale { seq };
        }

        let count = actions.len();
        state.applied = seq;
        state.snapshot = actions;
        // Render under the lock so views observe applies in sequence order.
        self.view.render(&view::render(&state.snapshot, &state.in_flight));
        tracing::trace!(seq, count, "pending view updated");

        SyncOutcome::Applied { seq, count }
    }

    /// Submit a decision for a rendered action.
    ///
    /// On success a notice is shown and the list is resynced at once. On failure an
    /// error notice carries the server's message and the action stays on screen.
    /// While the request is outstanding the action's controls are disabled and a
    /// second decision for it is rejected with [`AppError::DecisionInFlight`].
    pub async fn decide(&self, id: &str, approved: bool) -> Result<Decision, AppError> {
        let decision = Decision::from_approved(approved);

        {
            let mut state = self.state();
            if !state.snapshot.iter().any(|a| a.id == id) {
                return Err(AppError::UnknownAction(id.to_string()));
            }
            if !state.in_flight.insert(id.to_string()) {
                return Err(AppError::DecisionInFlight(id.to_string()));
            }
            self.view.render(&view::render(&state.snapshot, &state.in_flight));
        }

        tracing::info!(id, approved, "submitting decision");
        let result = self.store.decide(id, approved).await;

        match result {
            Ok(()) => {
                self.view.notify(Notice::success(decision.past_tense()));
                // Controls stay disabled until the resync has had its say.
                self.sync_once().await;
                self.finish(id);
                Ok(decision)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "decision rejected");
                self.finish(id);
                self.view.notify(Notice::error(format!("✗ {e}")));
                Err(e)
            }
        }
    }

    fn finish(&self, id: &str) {
        let mut state = self.state();
        state.in_flight.remove(id);
        self.view.render(&view::render(&state.snapshot, &state.in_flight));
    }
}
