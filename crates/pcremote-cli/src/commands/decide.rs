use anyhow::{Context, Result};
use console::style;
use pcremote_api::ApiClient;
use pcremote_core::{ClientConfig, Decision};

/// Approve or deny one action without the live view.
pub async fn run(config: ClientConfig, id: &str, approved: bool) -> Result<()> {
    let client = ApiClient::new(config)?;
    let decision = Decision::from_approved(approved);

    client
        .decide(id, approved)
        .await
        .with_context(|| format!("Decision on '{id}' failed"))?;

    let label = match decision {
        Decision::Approve => style(format!("✓ {}", decision.past_tense())).green(),
        Decision::Deny => style(format!("✗ {}", decision.past_tense())).red(),
    };
    println!("{label}: {id}");
    Ok(())
}
