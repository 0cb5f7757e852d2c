use anyhow::{Context, Result};
use console::style;
use pcremote_api::ApiClient;
use pcremote_core::config::HOOK_POLL_INTERVAL;
use pcremote_core::{AppError, ClientConfig};
use std::time::Duration;

/// Parameters for raising an approval request.
pub struct HookParams {
    pub config: ClientConfig,
    pub tool: String,
    pub description: String,
    pub timeout: Duration,
}

/// Raise a pending action and block until it is decided.
///
/// Returns `true` when approved. Denials and timeouts both return `false`.
pub async fn run(params: HookParams) -> Result<bool> {
    let client = ApiClient::new(params.config)?;

    let hook_id = client
        .submit_hook(&params.tool, &params.description)
        .await
        .context("Failed to raise the approval request")?;
    eprintln!(
        "Waiting for approval of {} ({hook_id})...",
        style(&params.tool).bold()
    );

    match client
        .wait_for_decision(&hook_id, HOOK_POLL_INTERVAL, params.timeout)
        .await
    {
        Ok(true) => {
            eprintln!("{}", style("✓ Approved").green());
            Ok(true)
        }
        Ok(false) => {
            eprintln!("{}", style("✗ Denied").red());
            Ok(false)
        }
        Err(AppError::Timeout(what)) => {
            eprintln!("{}", style(format!("⏱ Timed out waiting for {what}")).yellow());
            Ok(false)
        }
        Err(e) => Err(e).context("Failed while waiting for a decision"),
    }
}
