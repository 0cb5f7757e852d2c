use anyhow::{Context, Result};
use console::style;
use pcremote_core::config::settings_path;
use pcremote_core::Settings;
use pcremote_ui::prompt;

pub fn show() -> Result<()> {
    let path = settings_path()?;
    let settings = Settings::load().context("Failed to read saved settings")?;

    println!("  Settings file: {}", path.display());
    println!(
        "  Server URL:    {}",
        settings
            .base_url
            .as_deref()
            .map(|u| style(u).green().to_string())
            .unwrap_or_else(|| style("(not set)").yellow().to_string())
    );
    Ok(())
}

pub fn set_url(url: &str) -> Result<()> {
    let mut settings = Settings::load().context("Failed to read saved settings")?;
    settings.set_base_url(url)?;
    let path = settings.save().context("Failed to save settings")?;

    println!(
        "Server URL set to {} ({})",
        settings.base_url.as_deref().unwrap_or_default(),
        path.display()
    );
    Ok(())
}

pub fn clear() -> Result<()> {
    let mut settings = Settings::load().context("Failed to read saved settings")?;
    if settings.base_url.is_none() {
        println!("No server URL saved; nothing to clear.");
        return Ok(());
    }

    if !prompt::confirm("Forget the saved server URL?")? {
        println!("Cancelled.");
        return Ok(());
    }

    settings.base_url = None;
    settings.save().context("Failed to save settings")?;
    println!("Server URL cleared.");
    Ok(())
}

/// Open the configuration prompt on demand.
pub fn edit() -> Result<()> {
    let mut settings = Settings::load().context("Failed to read saved settings")?;
    let url = prompt::prompt_base_url(settings.base_url.as_deref())?;
    settings.set_base_url(&url)?;
    let path = settings.save().context("Failed to save settings")?;
    println!("Saved to {}", path.display());
    Ok(())
}
