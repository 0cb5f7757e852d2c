use serde::{Deserialize, Serialize};

/// A server-tracked request for human approval before an automation tool proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: String,
    pub tool: String,
    pub description: String,
}

impl PendingAction {
    pub fn new(
        id: impl Into<String>,
        tool: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            description: description.into(),
        }
    }
}

/// The user's answer to a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            Decision::Approve
        } else {
            Decision::Deny
        }
    }

    pub fn approved(self) -> bool {
        matches!(self, Decision::Approve)
    }

    /// Past-tense label used in notices.
    pub fn past_tense(self) -> &'static str {
        match self {
            Decision::Approve => "Approved",
            Decision::Deny => "Denied",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideRequest {
    pub approved: bool,
}

/// An entry of the predefined command catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandList {
    #[serde(default)]
    pub commands: Vec<CommandInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

/// Outcome of a relayed command (`/execute` and `/send`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResult {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub output: String,
}

/// Machine status as `label: value` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub info: String,
}

/// A command as handed to the PC agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCommand {
    pub id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Commands waiting for the PC agent (`/api/poll`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPoll {
    #[serde(default)]
    pub commands: Vec<AgentCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRequest {
    pub tool: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookTicket {
    #[serde(default)]
    pub ok: bool,
    pub hook_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResult {
    pub ready: bool,
    pub approved: Option<bool>,
}

/// Body of every non-success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
