use chrono::{DateTime, TimeDelta, Utc};
use pcremote_core::config::{EXECUTE_WAIT, STATUS_WAIT};
use pcremote_core::types::{AgentCommand, CommandInfo, ExecuteResult, HookResult};
use pcremote_core::PendingAction;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, RwLock};

// ── Hook queue ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HookEntry {
    pub id: String,
    pub tool: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub approved: Option<bool>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Approval requests in arrival order.
///
/// Decided entries stay readable through [`HookQueue::result`] for `retention`
/// after the decision, then are dropped.
#[derive(Debug)]
pub struct HookQueue {
    entries: Vec<HookEntry>,
    retention: TimeDelta,
}

impl Default for HookQueue {
    fn default() -> Self {
        Self::with_retention(TimeDelta::seconds(DECIDED_RETENTION_SECS))
    }
}

/// How long a decided hook's result stays available to the submitter.
pub const DECIDED_RETENTION_SECS: i64 = 600;

impl HookQueue {
    pub fn with_retention(retention: TimeDelta) -> Self {
        Self {
            entries: Vec::new(),
            retention,
        }
    }

    pub fn raise(&mut self, tool: String, description: String) -> String {
        let now = Utc::now();
        self.prune(now);
        let id = uuid::Uuid::new_v4().to_string();
        self.entries.push(HookEntry {
            id: id.clone(),
            tool,
            description,
            created_at: now,
            approved: None,
            decided_at: None,
        });
        id
    }

    /// Drop decided entries older than the retention window. Returns how many went.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let retention = self.retention;
        self.entries
            .retain(|e| !matches!(e.decided_at, Some(at) if now - at >= retention));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undecided entries, oldest first.
    pub fn pending(&self) -> Vec<PendingAction> {
        self.entries
            .iter()
            .filter(|e| e.approved.is_none())
            .map(|e| PendingAction::new(&e.id, &e.tool, &e.description))
            .collect()
    }

    /// Record a decision. Returns how long the request waited, or `None` if the id is unknown.
    pub fn decide(&mut self, id: &str, approved: bool) -> Option<TimeDelta> {
        let now = Utc::now();
        self.prune(now);
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.approved = Some(approved);
        entry.decided_at = Some(now);
        Some(now - entry.created_at)
    }

    pub fn result(&self, id: &str) -> HookResult {
        match self.entries.iter().find(|e| e.id == id) {
            Some(entry) => HookResult {
                ready: entry.approved.is_some(),
                approved: entry.approved,
            },
            None => HookResult {
                ready: false,
                approved: None,
            },
        }
    }
}

// ── Command relay ───────────────────────────────────────────────────────────

struct QueuedCommand {
    command: AgentCommand,
    dispatched: bool,
    reply: oneshot::Sender<ExecuteResult>,
}

/// Commands waiting for the PC agent, each paired with the request waiting on its result.
#[derive(Default)]
pub struct CommandQueue {
    entries: Vec<QueuedCommand>,
}

impl CommandQueue {
    pub fn enqueue(
        &mut self,
        key: &str,
        text: Option<String>,
    ) -> (String, oneshot::Receiver<ExecuteResult>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.entries.push(QueuedCommand {
            command: AgentCommand {
                id: id.clone(),
                key: key.to_string(),
                text,
            },
            dispatched: false,
            reply: tx,
        });
        (id, rx)
    }

    /// Hand out every command not yet given to the agent. Each command goes out once.
    pub fn dispatch(&mut self) -> Vec<AgentCommand> {
        self.entries
            .iter_mut()
            .filter(|e| !e.dispatched)
            .map(|e| {
                e.dispatched = true;
                e.command.clone()
            })
            .collect()
    }

    /// Deliver the agent's result. Returns false if nobody is waiting for `id` any more.
    pub fn complete(&mut self, id: &str, result: ExecuteResult) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.command.id == id) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        entry.reply.send(result).is_ok()
    }

    /// Forget a command whose requester gave up waiting.
    pub fn cancel(&mut self, id: &str) {
        self.entries.retain(|e| e.command.id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Shared state ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub hooks: Arc<RwLock<HookQueue>>,
    pub commands: Arc<Mutex<CommandQueue>>,
    pub catalog: Arc<Vec<CommandInfo>>,
    pub execute_wait: Duration,
    pub status_wait: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            hooks: Arc::new(RwLock::new(HookQueue::default())),
            commands: Arc::new(Mutex::new(CommandQueue::default())),
            catalog: Arc::new(default_catalog()),
            execute_wait: EXECUTE_WAIT,
            status_wait: STATUS_WAIT,
        }
    }
}

impl AppState {
    /// Shorter waits for relayed commands; used by tests and impatient deployments.
    pub fn with_waits(mut self, execute: Duration, status: Duration) -> Self {
        self.execute_wait = execute;
        self.status_wait = status;
        self
    }
}

pub fn default_catalog() -> Vec<CommandInfo> {
    [
        ("open_vscode", "Open VS Code", "💻"),
        ("open_terminal", "Open terminal", "🖥️"),
        ("git_status", "Git status", "📋"),
        ("system_info", "System status", "📊"),
        ("restart_tg_service", "Restart TG service", "🔄"),
    ]
    .into_iter()
    .map(|(key, label, icon)| CommandInfo {
        key: key.to_string(),
        label: label.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_excludes_decided_and_keeps_order() {
        let mut q = HookQueue::default();
        let a = q.raise("shell".into(), "ls".into());
        let b = q.raise("edit".into(), "patch".into());
        let c = q.raise("web".into(), "fetch".into());

        assert!(q.decide(&b, true).is_some());
        let ids: Vec<String> = q.pending().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.clone(), c]);

        assert_eq!(
            q.result(&b),
            HookResult {
                ready: true,
                approved: Some(true)
            }
        );
        assert!(!q.result(&a).ready);
        assert!(q.decide("missing", false).is_none());
    }

    #[test]
    fn decided_hooks_are_dropped_after_retention() {
        let mut q = HookQueue::with_retention(TimeDelta::minutes(5));
        let decided = q.raise("shell".into(), "ls".into());
        let open = q.raise("edit".into(), "patch".into());
        q.decide(&decided, false);

        let now = Utc::now();
        assert_eq!(q.prune(now + TimeDelta::minutes(1)), 0);
        assert!(q.result(&decided).ready);

        assert_eq!(q.prune(now + TimeDelta::minutes(6)), 1);
        assert_eq!(q.len(), 1);
        assert!(!q.result(&decided).ready);

        // Undecided requests are never dropped, however old.
        assert_eq!(q.prune(now + TimeDelta::days(30)), 0);
        assert_eq!(q.pending()[0].id, open);
    }

    #[test]
    fn raising_prunes_expired_decisions() {
        let mut q = HookQueue::with_retention(TimeDelta::zero());
        let first = q.raise("shell".into(), "ls".into());
        q.decide(&first, true);
        q.raise("edit".into(), "patch".into());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn commands_are_dispatched_once() {
        let mut q = CommandQueue::default();
        let (id, _rx) = q.enqueue("git_status", None);

        let first = q.dispatch();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, id);
        assert!(q.dispatch().is_empty());
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn completion_reaches_waiter() {
        let mut q = CommandQueue::default();
        let (id, rx) = q.enqueue("type_text", Some("hello".into()));

        assert!(q.complete(
            &id,
            ExecuteResult {
                ok: true,
                output: "pasted".into()
            }
        ));
        assert!(q.is_empty());
        assert_eq!(rx.await.unwrap().output, "pasted");
        assert!(!q.complete(&id, ExecuteResult { ok: true, output: String::new() }));
    }

    #[test]
    fn cancelled_command_is_forgotten() {
        let mut q = CommandQueue::default();
        let (id, rx) = q.enqueue("system_info", None);
        drop(rx);
        q.cancel(&id);
        assert!(q.is_empty());
    }
}
