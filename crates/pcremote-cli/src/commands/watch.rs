use crate::commands::status::panel_for;
use anyhow::Result;
use pcremote_api::ApiClient;
use pcremote_core::config::{ClientConfig, STATUS_REFRESH_INTERVAL, TOAST_TTL};
use pcremote_core::{AppError, Decision};
use pcremote_sync::{spawn_poller, Notice, PendingActionSync, PendingList};
use pcremote_ui::TerminalView;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Parameters for the live view.
pub struct WatchParams {
    pub config: ClientConfig,
    pub interval: Duration,
}

/// Which action a typed command refers to: its position on screen or its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Number(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Decide { target: Target, decision: Decision },
    Refresh,
    Quit,
    Empty,
}

/// Parse one line typed in the live view.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(Input::Empty);
    };

    let decision = match verb.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(Input::Quit),
        "r" | "refresh" => return Ok(Input::Refresh),
        "a" | "approve" | "y" => Decision::Approve,
        "d" | "deny" | "n" => Decision::Deny,
        other => return Err(format!("Unknown command '{other}'")),
    };

    let Some(arg) = parts.next() else {
        return Err(format!("Usage: {verb} <number|id>"));
    };
    if parts.next().is_some() {
        return Err(format!("Usage: {verb} <number|id>"));
    }

    let target = match arg.parse::<usize>() {
        Ok(0) => return Err("Actions are numbered from 1".into()),
        Ok(n) => Target::Number(n),
        Err(_) => Target::Id(arg.to_string()),
    };
    Ok(Input::Decide { target, decision })
}

/// Map a target to an action id using the list as it was drawn.
fn resolve_target(shown: &PendingList, target: &Target) -> Result<String, String> {
    match target {
        Target::Id(id) => Ok(id.clone()),
        Target::Number(n) => shown
            .entries()
            .get(n - 1)
            .map(|e| e.id.clone())
            .ok_or_else(|| format!("No pending action #{n}")),
    }
}

/// Live view: background sync, status panel, and decisions typed on stdin.
pub async fn run(params: WatchParams) -> Result<()> {
    let client = Arc::new(ApiClient::new(params.config)?);
    let view = TerminalView::new(client.config().base_url().as_str(), TOAST_TTL);
    let sync = Arc::new(PendingActionSync::new(client.clone(), view.clone()));

    view.redraw();
    let poller = spawn_poller(sync.clone(), params.interval);
    let status_task = tokio::spawn(status_loop(client.clone(), view.clone(), poller.token()));
    let mut decisions = JoinSet::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line(), if stdin_open => {
                // Without input the view keeps running until Ctrl+C.
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Empty) => view.redraw(),
                    Ok(Input::Refresh) => {
                        let sync = sync.clone();
                        decisions.spawn(async move {
                            sync.sync_once().await;
                        });
                    }
                    Ok(Input::Decide { target, decision }) => {
                        let id = match resolve_target(&view.shown_list(), &target) {
                            Ok(id) => id,
                            Err(msg) => {
                                view.flash(Notice::error(msg));
                                continue;
                            }
                        };
                        let sync = sync.clone();
                        let view = view.clone();
                        decisions.spawn(async move {
                            match sync.decide(&id, decision.approved()).await {
                                Err(
                                    e @ (AppError::UnknownAction(_)
                                    | AppError::DecisionInFlight(_)),
                                ) => view.flash(Notice::error(e.to_string())),
                                // Server rejections are already shown by the sync component.
                                _ => {}
                            }
                        });
                    }
                    Err(msg) => view.flash(Notice::error(msg)),
                }
            }
            Some(_) = decisions.join_next(), if !decisions.is_empty() => {}
        }
    }

    poller.shutdown().await;
    decisions.abort_all();
    if let Err(e) = status_task.await {
        tracing::debug!(error = %e, "status task ended abnormally");
    }
    println!("\nStopped.");
    Ok(())
}

/// Refresh the status panel until cancelled. Failures show as offline, never as errors.
async fn status_loop(client: Arc<ApiClient>, view: Arc<TerminalView>, token: CancellationToken) {
    let mut ticker = tokio::time::interval(STATUS_REFRESH_INTERVAL);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let report = tokio::select! {
                    _ = token.cancelled() => break,
                    report = client.status() => report,
                };
                if let Err(e) = &report {
                    tracing::debug!(error = %e, "status refresh failed");
                }
                view.set_status(panel_for(report));
            }
        }
    }
}
