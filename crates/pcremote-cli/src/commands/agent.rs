use anyhow::Result;
use console::style;
use pcremote_api::ApiClient;
use pcremote_core::ClientConfig;
use pcremote_sync::run_agent;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Answer relayed commands on this machine until Ctrl+C.
pub async fn run(config: ClientConfig, interval: Duration) -> Result<()> {
    let client = Arc::new(ApiClient::new(config)?);
    println!(
        "{} polling {} every {}s. Press Ctrl+C to stop.",
        style("pcremote agent").bold().cyan(),
        client.config().base_url(),
        interval.as_secs()
    );

    let token = CancellationToken::new();
    let task = tokio::spawn(run_agent(client, interval, token.clone()));

    tokio::signal::ctrl_c().await?;
    token.cancel();
    if let Err(e) = task.await {
        tracing::debug!(error = %e, "agent task ended abnormally");
    }
    println!("\nStopped.");
    Ok(())
}
