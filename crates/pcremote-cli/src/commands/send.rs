use anyhow::{Context, Result};
use pcremote_api::ApiClient;
use pcremote_core::ClientConfig;
use pcremote_ui::{spinner, status};

/// Send text to the PC's clipboard.
pub async fn run(config: ClientConfig, text: &str) -> Result<()> {
    let client = ApiClient::new(config)?;

    let sp = spinner("Sending text...");
    let result = client.send_text(text).await;
    sp.finish_and_clear();

    let result = result.context("Failed to send text")?;
    status::print_execute_result(&result);
    Ok(())
}
