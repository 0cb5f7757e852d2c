use async_trait::async_trait;
use pcremote_core::{AppError, PendingAction};

/// Server-side holder of the pending approval queue.
///
/// The sync component only ever talks to the queue through this trait, so a
/// test double or another transport can stand in for [`crate::ApiClient`].
#[async_trait]
pub trait PendingActionStore: Send + Sync {
    /// Current pending actions, in server order.
    async fn pending(&self) -> Result<Vec<PendingAction>, AppError>;

    /// Submit the user's decision for one action.
    async fn decide(&self, id: &str, approved: bool) -> Result<(), AppError>;
}
