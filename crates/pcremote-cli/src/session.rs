use anyhow::{bail, Context, Result};
use console::{style, Term};
use pcremote_core::{ClientConfig, Settings};
use pcremote_ui::prompt;

/// Build the session's client configuration.
///
/// The server URL comes from `--server`/`PCREMOTE_SERVER`, then the saved setting,
/// and failing both from the configuration prompt (whose answer is saved).
pub fn resolve(server: Option<String>, init_data: String) -> Result<ClientConfig> {
    let base_url = match server.filter(|s| !s.trim().is_empty()) {
        Some(url) => url,
        None => match Settings::load().context("Failed to read saved settings")?.base_url {
            Some(url) => url,
            None => first_run_setup()?,
        },
    };

    ClientConfig::new(&base_url, init_data).context("Invalid server URL")
}

fn first_run_setup() -> Result<String> {
    if !Term::stdout().is_term() {
        bail!(
            "No server URL configured. Pass --server, set PCREMOTE_SERVER, or run `pcremote config set-url <URL>`."
        );
    }

    println!("{}", style("No server configured yet.").yellow());
    let url = prompt::prompt_base_url(None)?;

    let mut settings = Settings::load()?;
    settings.set_base_url(&url)?;
    let path = settings.save().context("Failed to save settings")?;
    println!("Saved to {}\n", path.display());
    Ok(url)
}
