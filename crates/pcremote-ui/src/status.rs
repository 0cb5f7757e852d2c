use console::style;
use pcremote_core::types::{CommandInfo, ExecuteResult};

pub const OFFLINE_MESSAGE: &str = "PC offline or agent not running";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub label: String,
    pub value: String,
}

/// What the status panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPanel {
    Loading,
    Rows(Vec<StatusRow>),
    Offline,
}

/// Split `label: value` lines. Only the first `": "` separates; blank lines are skipped.
pub fn parse_status(info: &str) -> Vec<StatusRow> {
    info.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(": ") {
            Some((label, value)) => StatusRow {
                label: label.to_string(),
                value: value.to_string(),
            },
            None => StatusRow {
                label: line.to_string(),
                value: String::new(),
            },
        })
        .collect()
}

/// Lines for the status panel, label column padded to the widest label.
pub fn status_lines(panel: &StatusPanel) -> Vec<String> {
    match panel {
        StatusPanel::Loading => vec![format!("  {}", style("Loading...").dim())],
        StatusPanel::Offline => vec![format!("  {}", style(OFFLINE_MESSAGE).red())],
        StatusPanel::Rows(rows) => {
            let width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
            rows.iter()
                .map(|r| format!("  {:<width$}  {}", r.label, style(&r.value).bold()))
                .collect()
        }
    }
}

/// Print the command catalog as a table.
pub fn print_commands(commands: &[CommandInfo]) {
    if commands.is_empty() {
        println!("No commands available.");
        return;
    }

    println!("  {:<4}  {:<22}  {:<30}", "", "Key", "Label");
    println!("  {}", "-".repeat(60));
    for cmd in commands {
        println!("  {:<4}  {:<22}  {:<30}", cmd.icon, cmd.key, cmd.label);
    }
    println!("\n  Total: {} command(s)", commands.len());
}

/// Print a relayed command's result: its output if there is any, otherwise a one-word verdict.
pub fn print_execute_result(result: &ExecuteResult) {
    let output = result.output.trim();
    if output.is_empty() {
        if result.ok {
            println!("{}", style("✓ Done").green());
        } else {
            println!("{}", style("✗ Failed").red());
        }
    } else if result.ok {
        println!("{output}");
    } else {
        println!("{}", style(output).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_separator_only() {
        let rows = parse_status("CPU: 12%\nRAM: 4 GB / 16 GB (25%)\nUptime: 1d: 2h\n\nodd line");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].label, "CPU");
        assert_eq!(rows[0].value, "12%");
        assert_eq!(rows[2].label, "Uptime");
        assert_eq!(rows[2].value, "1d: 2h");
        assert_eq!(rows[3].label, "odd line");
        assert_eq!(rows[3].value, "");
    }

    #[test]
    fn offline_panel_says_so() {
        let lines = status_lines(&StatusPanel::Offline);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(OFFLINE_MESSAGE));
    }

    #[test]
    fn rows_are_aligned() {
        let lines = status_lines(&StatusPanel::Rows(parse_status("CPU: 1%\nDisk C: 10 GB")));
        assert!(lines[0].starts_with("  CPU     "));
        assert!(lines[1].starts_with("  Disk C  "));
    }
}
