use crate::sync::PendingActionSync;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct PollerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Sync immediately, then once every `period` until shut down.
///
/// Each tick runs its cycle as a separate task, so a slow fetch does not hold back
/// the next one; [`PendingActionSync`] drops whichever responses arrive out of order.
pub fn spawn_poller(sync: Arc<PendingActionSync>, period: Duration) -> PollerHandle {
    let token = CancellationToken::new();
    let task = tokio::spawn(poll_loop(sync, period, token.clone()));
    PollerHandle {
        token,
        task: Some(task),
    }
}

async fn poll_loop(sync: Arc<PendingActionSync>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = JoinSet::new();

    tracing::debug!(period_ms = period.as_millis() as u64, "pending poller started");
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let sync = sync.clone();
                cycles.spawn(async move {
                    sync.sync_once().await;
                });
            }
            Some(_) = cycles.join_next(), if !cycles.is_empty() => {}
        }
    }

    cycles.abort_all();
    while cycles.join_next().await.is_some() {}
    tracing::debug!("pending poller stopped");
}

impl PollerHandle {
    /// A token that is cancelled when the poller stops.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop polling, abort cycles still in flight, and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "pending poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
