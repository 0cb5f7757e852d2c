use pcremote_core::{Decision, PendingAction};
use std::collections::HashSet;

/// One of the two controls attached to every rendered action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub decision: Decision,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub id: String,
    pub tool: String,
    pub description: String,
    pub approve: Control,
    pub deny: Control,
}

impl PendingEntry {
    /// Both controls are disabled while a decision for this entry is in flight.
    pub fn is_busy(&self) -> bool {
        !self.approve.enabled
    }
}

/// What the pending panel shows. Never an empty list: no actions means the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingList {
    Empty,
    Entries(Vec<PendingEntry>),
}

impl PendingList {
    pub fn entries(&self) -> &[PendingEntry] {
        match self {
            PendingList::Empty => &[],
            PendingList::Entries(entries) => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PendingList::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message shown after a user-initiated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Render target for the pending panel.
///
/// `render` replaces whatever was shown before; implementations do no diffing.
pub trait PendingView: Send + Sync {
    fn render(&self, list: &PendingList);

    fn notify(&self, notice: Notice);
}

/// Build the view model for `actions`, preserving their order.
pub fn render(actions: &[PendingAction], in_flight: &HashSet<String>) -> PendingList {
    if actions.is_empty() {
        return PendingList::Empty;
    }

    let entries = actions
        .iter()
        .map(|action| {
            let enabled = !in_flight.contains(&action.id);
            PendingEntry {
                id: action.id.clone(),
                tool: action.tool.clone(),
                description: action.description.clone(),
                approve: Control {
                    decision: Decision::Approve,
                    enabled,
                },
                deny: Control {
                    decision: Decision::Deny,
                    enabled,
                },
            }
        })
        .collect();

    PendingList::Entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_placeholder() {
        let list = render(&[], &HashSet::new());
        assert_eq!(list, PendingList::Empty);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn entries_keep_order_and_get_two_controls() {
        let actions = vec![
            PendingAction::new("a1", "shell", "rm -rf /tmp/x"),
            PendingAction::new("b2", "edit", "patch main.rs"),
        ];
        let list = render(&actions, &HashSet::new());

        let entries = list.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a1");
        assert_eq!(entries[0].tool, "shell");
        assert_eq!(entries[0].description, "rm -rf /tmp/x");
        assert_eq!(entries[0].approve.decision, Decision::Approve);
        assert_eq!(entries[0].deny.decision, Decision::Deny);
        assert!(entries[0].approve.enabled && entries[0].deny.enabled);
        assert_eq!(entries[1].id, "b2");
    }

    #[test]
    fn in_flight_entry_has_both_controls_disabled() {
        let actions = vec![
            PendingAction::new("a1", "shell", "ls"),
            PendingAction::new("b2", "edit", "x"),
        ];
        let busy: HashSet<String> = ["a1".to_string()].into_iter().collect();
        let list = render(&actions, &busy);

        assert!(list.entries()[0].is_busy());
        assert!(!list.entries()[0].deny.enabled);
        assert!(!list.entries()[1].is_busy());
    }
}
