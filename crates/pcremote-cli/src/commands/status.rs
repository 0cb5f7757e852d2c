use anyhow::Result;
use pcremote_api::ApiClient;
use pcremote_core::ClientConfig;
use pcremote_ui::status::{self, StatusPanel};
use pcremote_ui::{parse_status, spinner};

/// Print the PC's status once.
pub async fn run(config: ClientConfig) -> Result<()> {
    let client = ApiClient::new(config)?;

    let sp = spinner("Asking the PC for its status...");
    let report = client.status().await;
    sp.finish_and_clear();

    for line in status::status_lines(&panel_for(report)) {
        println!("{line}");
    }
    Ok(())
}

/// Map a status response to what the panel shows. Any failure reads as offline.
pub fn panel_for<E>(report: Result<pcremote_core::types::StatusReport, E>) -> StatusPanel {
    match report {
        Ok(report) if report.ok => StatusPanel::Rows(parse_status(&report.info)),
        _ => StatusPanel::Offline,
    }
}
