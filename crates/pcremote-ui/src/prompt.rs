use console::style;
use dialoguer::{Confirm, Input};
use pcremote_core::config::parse_base_url;

/// The configuration panel: ask for the server URL, pre-filled with the current one.
pub fn prompt_base_url(current: Option<&str>) -> Result<String, anyhow::Error> {
    println!(
        "{}",
        style("Enter the address of the pcremote server (e.g. https://pc.example.com).").dim()
    );

    let mut input = Input::<String>::new()
        .with_prompt("Server URL")
        .validate_with(|value: &String| -> Result<(), String> {
            parse_base_url(value).map(|_| ()).map_err(|e| e.to_string())
        });
    if let Some(current) = current {
        input = input.default(current.to_string());
    }

    let raw = input.interact_text()?;
    Ok(parse_base_url(&raw)?.to_string())
}

/// Yes/no confirmation, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool, anyhow::Error> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
