use crate::status::{self, StatusPanel};
use crate::toast::Toast;
use chrono::{DateTime, Local};
use console::{style, Term};
use pcremote_sync::{Notice, NoticeKind, PendingEntry, PendingList, PendingView};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

pub const NO_PENDING: &str = "No pending actions";
pub const HELP_LINE: &str = "a N approve · d N deny · r refresh · q quit";

/// Everything on screen. Redrawn in full on every change.
#[derive(Debug)]
pub struct Frame {
    pub server: String,
    pub status: StatusPanel,
    pub list: PendingList,
    pub toast: Toast,
    pub last_sync: Option<DateTime<Local>>,
}

impl Frame {
    pub fn new(server: impl Into<String>, toast_ttl: Duration) -> Self {
        Self {
            server: server.into(),
            status: StatusPanel::Loading,
            list: PendingList::Empty,
            toast: Toast::new(toast_ttl),
            last_sync: None,
        }
    }

    /// The screen as lines of text.
    pub fn compose(&self, now: Instant) -> Vec<String> {
        let mut lines = Vec::new();
        let divider = "=".repeat(60);

        lines.push(divider.clone());
        lines.push(format!("  {}  {}", style("pcremote").bold().cyan(), self.server));
        lines.push(divider.clone());

        lines.push(style("  System status").bold().to_string());
        lines.extend(status::status_lines(&self.status));
        lines.push(String::new());

        let synced = self
            .last_sync
            .map(|t| format!(" (synced {})", t.format("%H:%M:%S")))
            .unwrap_or_default();
        lines.push(format!("  {}{}", style("Pending actions").bold(), style(synced).dim()));

        match &self.list {
            PendingList::Empty => lines.push(format!("  {}", style(NO_PENDING).dim())),
            PendingList::Entries(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    lines.extend(entry_lines(i + 1, entry));
                }
            }
        }

        lines.push(divider);
        if let Some(notice) = self.toast.visible(now) {
            let text = match notice.kind {
                NoticeKind::Success => style(&notice.text).green(),
                NoticeKind::Error => style(&notice.text).red(),
            };
            lines.push(format!("  {text}"));
        }
        lines.push(format!("  {}", style(HELP_LINE).dim()));
        lines
    }
}

fn entry_lines(number: usize, entry: &PendingEntry) -> Vec<String> {
    let controls = if entry.is_busy() {
        style("deciding…").yellow().to_string()
    } else {
        format!(
            "{}   {}",
            style(format!("[a {number}] approve")).green(),
            style(format!("[d {number}] deny")).red()
        )
    };
    vec![
        format!("  {number}. 🔧 {}", style(&entry.tool).bold()),
        format!("     {}", entry.description),
        format!("     {controls}"),
    ]
}

/// [`PendingView`] that draws to the terminal.
pub struct TerminalView {
    term: Term,
    frame: Mutex<Frame>,
    this: Weak<TerminalView>,
}

impl TerminalView {
    pub fn new(server: impl Into<String>, toast_ttl: Duration) -> Arc<Self> {
        let frame = Frame::new(server, toast_ttl);
        Arc::new_cyclic(|this| Self {
            term: Term::stdout(),
            frame: Mutex::new(frame),
            this: this.clone(),
        })
    }

    fn frame(&self) -> MutexGuard<'_, Frame> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_status(&self, panel: StatusPanel) {
        let mut frame = self.frame();
        frame.status = panel;
        self.draw(&frame);
    }

    /// The pending list as last drawn, which is what the user is reading.
    pub fn shown_list(&self) -> PendingList {
        self.frame().list.clone()
    }

    /// Redraw without changing anything (e.g. after the user typed a line).
    pub fn redraw(&self) {
        let frame = self.frame();
        self.draw(&frame);
    }

    /// Show a notice that did not come from the sync component (input errors and the like).
    pub fn flash(&self, notice: Notice) {
        self.notify(notice);
    }

    fn draw(&self, frame: &Frame) {
        let lines = frame.compose(Instant::now());
        let result = self
            .term
            .clear_screen()
            .and_then(|_| self.term.write_line(&lines.join("\n")));
        if let Err(e) = result {
            tracing::debug!(error = %e, "terminal redraw failed");
        }
    }

    fn schedule_toast_expiry(&self, ttl: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let this = self.this.clone();
        runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(view) = this.upgrade() {
                let mut frame = view.frame();
                if frame.toast.clear_expired(Instant::now()) {
                    view.draw(&frame);
                }
            }
        });
    }
}

impl PendingView for TerminalView {
    fn render(&self, list: &PendingList) {
        let mut frame = self.frame();
        frame.list = list.clone();
        frame.last_sync = Some(Local::now());
        self.draw(&frame);
    }

    fn notify(&self, notice: Notice) {
        let ttl = {
            let mut frame = self.frame();
            frame.toast.show(notice, Instant::now());
            self.draw(&frame);
            frame.toast.ttl()
        };
        self.schedule_toast_expiry(ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::parse_status;
    use pcremote_core::PendingAction;
    use std::collections::HashSet;

    fn joined(frame: &Frame) -> String {
        console::strip_ansi_codes(&frame.compose(Instant::now()).join("\n")).to_string()
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let frame = Frame::new("http://pc.local/", Duration::from_secs(2));
        let text = joined(&frame);
        assert!(text.contains(NO_PENDING));
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn entries_show_tool_description_and_controls() {
        let mut frame = Frame::new("http://pc.local/", Duration::from_secs(2));
        let actions = vec![PendingAction::new("a1", "shell", "rm -rf /tmp/x")];
        frame.list = pcremote_sync::view::render(&actions, &HashSet::new());
        frame.status = StatusPanel::Rows(parse_status("CPU: 3%"));

        let text = joined(&frame);
        assert!(text.contains("1. 🔧 shell"));
        assert!(text.contains("rm -rf /tmp/x"));
        assert!(text.contains("[a 1] approve"));
        assert!(text.contains("[d 1] deny"));
        assert!(text.contains("3%"));
        assert!(!text.contains(NO_PENDING));
    }

    #[test]
    fn busy_entry_hides_controls() {
        let mut frame = Frame::new("http://pc.local/", Duration::from_secs(2));
        let actions = vec![PendingAction::new("a1", "shell", "ls")];
        let busy: HashSet<String> = ["a1".to_string()].into_iter().collect();
        frame.list = pcremote_sync::view::render(&actions, &busy);

        let text = joined(&frame);
        assert!(text.contains("deciding…"));
        assert!(!text.contains("[a 1] approve"));
    }

    #[test]
    fn toast_appears_until_expiry() {
        let mut frame = Frame::new("http://pc.local/", Duration::from_millis(2500));
        let now = Instant::now();
        frame.toast.show(Notice::success("Denied"), now);

        let shown = frame.compose(now + Duration::from_secs(1)).join("\n");
        assert!(console::strip_ansi_codes(&shown).contains("Denied"));
        let gone = frame.compose(now + Duration::from_secs(3)).join("\n");
        assert!(!console::strip_ansi_codes(&gone).contains("Denied"));
    }
}
