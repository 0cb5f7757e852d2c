use pcremote_api::ApiClient;
use pcremote_core::types::{AgentCommand, ExecuteResult};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Consecutive poll failures between two "server unavailable" warnings.
const FAILURE_LOG_EVERY: u32 = 10;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Machine figures reported by `system_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub host: Option<String>,
    pub cpu_percent: f32,
    pub ram_used: u64,
    pub ram_total: u64,
    pub disk_used: u64,
    pub disk_total: u64,
}

impl SystemSnapshot {
    /// Sample the local machine. CPU usage needs two readings, so this takes a moment.
    pub async fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let (disk_used, disk_total) = disks.list().iter().fold((0, 0), |(used, total), d| {
            (
                used + d.total_space().saturating_sub(d.available_space()),
                total + d.total_space(),
            )
        });

        Self {
            host: System::host_name(),
            cpu_percent: sys.global_cpu_usage(),
            ram_used: sys.used_memory(),
            ram_total: sys.total_memory(),
            disk_used,
            disk_total,
        }
    }

    /// `label: value` lines, one figure per line.
    pub fn to_status_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(host) = &self.host {
            lines.push(format!("Host: {host}"));
        }
        lines.push(format!("CPU: {:.1}%", self.cpu_percent));
        lines.push(format!(
            "RAM: {} MB / {} MB ({}%)",
            self.ram_used / MIB,
            self.ram_total / MIB,
            percent(self.ram_used, self.ram_total)
        ));
        lines.push(format!(
            "Disk: {} GB / {} GB ({}%)",
            self.disk_used / GIB,
            self.disk_total / GIB,
            percent(self.disk_used, self.disk_total)
        ));
        lines.join("\n")
    }
}

fn percent(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        0
    } else {
        part.saturating_mul(100) / whole
    }
}

/// Run one relayed command locally.
pub async fn handle_command(command: &AgentCommand) -> ExecuteResult {
    match command.key.as_str() {
        "system_info" => ExecuteResult {
            ok: true,
            output: SystemSnapshot::collect().await.to_status_text(),
        },
        other => ExecuteResult {
            ok: false,
            output: format!("Unknown command: {other}"),
        },
    }
}

/// Poll the server for relayed commands and answer them until `token` is cancelled.
///
/// Failures are logged and the loop carries on; a warning goes out on the first
/// failure of a streak and every tenth one after that.
pub async fn run_agent(client: Arc<ApiClient>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures: u32 = 0;

    tracing::info!(server = %client.config().base_url(), "agent started");
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let cycle = tokio::select! {
                    _ = token.cancelled() => break,
                    cycle = agent_cycle(&client) => cycle,
                };
                match cycle {
                    Ok(handled) => {
                        if failures > 0 {
                            tracing::info!(after = failures, "server reachable again");
                        }
                        failures = 0;
                        if handled > 0 {
                            tracing::debug!(handled, "agent cycle done");
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        if failures % FAILURE_LOG_EVERY == 1 {
                            tracing::warn!(error = %e, failures, "server unavailable");
                        } else {
                            tracing::debug!(error = %e, failures, "agent poll failed");
                        }
                    }
                }
            }
        }
    }
    tracing::info!("agent stopped");
}

async fn agent_cycle(client: &ApiClient) -> Result<usize, pcremote_core::AppError> {
    let commands = client.poll_commands().await?;
    for command in &commands {
        tracing::info!(id = %command.id, key = %command.key, "running command");
        let result = handle_command(command).await;
        client.report_result(&command.id, &result).await?;
    }
    Ok(commands.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_is_label_value_lines() {
        let snapshot = SystemSnapshot {
            host: Some("desk".into()),
            cpu_percent: 12.34,
            ram_used: 4096 * MIB,
            ram_total: 16384 * MIB,
            disk_used: 100 * GIB,
            disk_total: 400 * GIB,
        };
        assert_eq!(
            snapshot.to_status_text(),
            "Host: desk\nCPU: 12.3%\nRAM: 4096 MB / 16384 MB (25%)\nDisk: 100 GB / 400 GB (25%)"
        );
    }

    #[test]
    fn empty_totals_do_not_divide_by_zero() {
        let snapshot = SystemSnapshot {
            host: None,
            cpu_percent: 0.0,
            ram_used: 0,
            ram_total: 0,
            disk_used: 0,
            disk_total: 0,
        };
        let text = snapshot.to_status_text();
        assert!(!text.contains("Host"));
        assert!(text.contains("RAM: 0 MB / 0 MB (0%)"));
    }

    #[tokio::test]
    async fn unknown_keys_are_refused() {
        let result = handle_command(&AgentCommand {
            id: "c1".into(),
            key: "open_vscode".into(),
            text: None,
        })
        .await;
        assert!(!result.ok);
        assert_eq!(result.output, "Unknown command: open_vscode");
    }
}
