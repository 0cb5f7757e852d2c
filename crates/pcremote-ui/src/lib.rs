//! Terminal front end for pcremote: the pending-action screen, status panel,
//! toasts, prompts, and progress spinners.

pub mod prompt;
pub mod status;
pub mod terminal;
pub mod toast;

pub use status::{parse_status, StatusPanel};
pub use terminal::TerminalView;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
