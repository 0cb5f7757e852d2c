use crate::store::PendingActionStore;
use async_trait::async_trait;
use pcremote_core::config::{ClientConfig, INIT_DATA_HEADER};
use pcremote_core::types::{
    AgentCommand, AgentPoll, CommandInfo, CommandList, DecideRequest, ErrorBody, ExecuteRequest,
    ExecuteResult, HookRequest, HookResult, HookTicket, SendRequest, StatusReport,
};
use pcremote_core::{AppError, PendingAction};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const GENERIC_FAILURE: &str = "request failed";

pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

// --- Response envelopes ---

#[derive(Deserialize)]
struct PendingEnvelope {
    #[serde(default)]
    pending: serde_json::Value,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-init-data"),
            HeaderValue::from_str(config.init_data()).map_err(|e| {
                AppError::Config(format!("{INIT_DATA_HEADER} is not a valid header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build an endpoint URL from path segments; every segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.config.base_url().clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("server URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// List the pending actions. A missing or malformed `pending` field reads as empty.
    pub async fn list_pending(&self) -> Result<Vec<PendingAction>, AppError> {
        let resp = self
            .client
            .get(self.endpoint(&["claude", "pending"])?)
            .send()
            .await?;
        let envelope: PendingEnvelope = parse_json(resp).await?;

        match serde_json::from_value::<Vec<PendingAction>>(envelope.pending) {
            Ok(actions) => Ok(actions),
            Err(e) => {
                tracing::debug!(error = %e, "pending field missing or malformed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Submit an approve/deny decision. Any 2xx counts as accepted; the body is ignored.
    pub async fn decide(&self, id: &str, approved: bool) -> Result<(), AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["claude", "decide", id])?)
            .json(&DecideRequest { approved })
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Predefined commands the PC agent can run.
    pub async fn list_commands(&self) -> Result<Vec<CommandInfo>, AppError> {
        let resp = self
            .client
            .get(self.endpoint(&["commands"])?)
            .send()
            .await?;
        let list: CommandList = parse_json(resp).await?;
        Ok(list.commands)
    }

    /// Run a predefined command on the PC and wait for its output.
    pub async fn execute(&self, command: &str) -> Result<ExecuteResult, AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["execute"])?)
            .json(&ExecuteRequest {
                command: command.to_string(),
            })
            .send()
            .await?;
        parse_json(resp).await
    }

    /// Machine status text (`label: value` lines).
    pub async fn status(&self) -> Result<StatusReport, AppError> {
        let resp = self
            .client
            .get(self.endpoint(&["status"])?)
            .send()
            .await?;
        parse_json(resp).await
    }

    /// Send clipboard text to the PC.
    pub async fn send_text(&self, text: &str) -> Result<ExecuteResult, AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["send"])?)
            .json(&SendRequest {
                text: text.to_string(),
            })
            .send()
            .await?;
        parse_json(resp).await
    }

    /// Raise a new pending action. Returns the id the server assigned.
    pub async fn submit_hook(&self, tool: &str, description: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["api", "claude", "hook"])?)
            .json(&HookRequest {
                tool: tool.to_string(),
                description: description.to_string(),
            })
            .send()
            .await?;
        let ticket: HookTicket = parse_json(resp).await?;
        Ok(ticket.hook_id)
    }

    /// Check whether a raised action has been decided yet.
    pub async fn hook_result(&self, hook_id: &str) -> Result<HookResult, AppError> {
        let resp = self
            .client
            .get(self.endpoint(&["api", "claude", "result", hook_id])?)
            .send()
            .await?;
        parse_json(resp).await
    }

    /// Commands queued for the PC agent. Each is handed out once.
    pub async fn poll_commands(&self) -> Result<Vec<AgentCommand>, AppError> {
        let resp = self
            .client
            .get(self.endpoint(&["api", "poll"])?)
            .send()
            .await?;
        let poll: AgentPoll = parse_json(resp).await?;
        Ok(poll.commands)
    }

    /// Deliver the agent's result for a queued command.
    pub async fn report_result(&self, id: &str, result: &ExecuteResult) -> Result<(), AppError> {
        let resp = self
            .client
            .post(self.endpoint(&["api", "result", id])?)
            .json(result)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Poll until the raised action is decided. Returns the decision.
    pub async fn wait_for_decision(
        &self,
        hook_id: &str,
        interval: std::time::Duration,
        timeout: std::time::Duration,
    ) -> Result<bool, AppError> {
        let start = std::time::Instant::now();
        loop {
            let result = self.hook_result(hook_id).await?;
            if result.ready {
                return Ok(result.approved.unwrap_or(false));
            }
            if start.elapsed() + interval > timeout {
                return Err(AppError::Timeout(format!("a decision on '{hook_id}'")));
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[async_trait]
impl PendingActionStore for ApiClient {
    async fn pending(&self) -> Result<Vec<PendingAction>, AppError> {
        self.list_pending().await
    }

    async fn decide(&self, id: &str, approved: bool) -> Result<(), AppError> {
        ApiClient::decide(self, id, approved).await
    }
}

/// Turn a non-success response into [`AppError::Api`], taking the message from the
/// `detail` field, then the status reason phrase, then a generic fallback.
async fn check_status(resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .map(|b| b.detail)
        .filter(|d| !d.trim().is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    Err(AppError::Api {
        status: status.as_u16(),
        detail,
    })
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T, AppError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
