use anyhow::{Context, Result};
use pcremote_api::ApiClient;
use pcremote_core::ClientConfig;
use pcremote_ui::{spinner, status};

/// List the predefined commands.
pub async fn list(config: ClientConfig) -> Result<()> {
    let client = ApiClient::new(config)?;

    let commands = client
        .list_commands()
        .await
        .context("Failed to fetch the command list")?;
    status::print_commands(&commands);
    Ok(())
}

/// Run one predefined command and print what it produced.
pub async fn exec(config: ClientConfig, key: &str) -> Result<()> {
    let client = ApiClient::new(config)?;

    let sp = spinner(&format!("Running '{key}' on the PC..."));
    let result = client.execute(key).await;
    sp.finish_and_clear();

    let result = result.with_context(|| format!("Command '{key}' failed"))?;
    status::print_execute_result(&result);
    Ok(())
}
