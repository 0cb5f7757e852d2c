use anyhow::{Context, Result};
use console::style;
use pcremote_api::ApiClient;
use pcremote_core::ClientConfig;
use pcremote_ui::spinner;

/// Print the pending actions once.
pub async fn run(config: ClientConfig) -> Result<()> {
    let client = ApiClient::new(config)?;

    let sp = spinner("Fetching pending actions...");
    let pending = client.list_pending().await;
    sp.finish_and_clear();
    let pending = pending.context("Failed to fetch pending actions")?;

    if pending.is_empty() {
        println!("No pending actions.");
        return Ok(());
    }

    println!("  {:<38}  {:<14}  Description", "ID", "Tool");
    println!("  {}", "-".repeat(80));
    for action in &pending {
        println!(
            "  {:<38}  {:<14}  {}",
            action.id,
            style(&action.tool).bold(),
            action.description
        );
    }

    println!("\n  Total: {} pending action(s)", pending.len());
    Ok(())
}
