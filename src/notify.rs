//! Notification callback plumbing: the external collaborator that
//! observes what the patch engine (and other mutators) actually did.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyAction {
    Skip,
    Delete,
    Add,
    Patch,
    PatchAppliedHunk,
    PatchRejectedHunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentState {
    Changed,
    Merged,
    Conflicted,
    Missing,
    Obstructed,
    Unknown,
}

/// Per-hunk detail carried on `PatchAppliedHunk`/`PatchRejectedHunk`
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkDetails {
    pub original_start: u32,
    pub original_length: u32,
    pub modified_start: u32,
    pub modified_length: u32,
    pub matched_line: u32,
    pub fuzz: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub abspath: String,
    pub action: NotifyAction,
    pub content_state: ContentState,
    pub hunk: Option<HunkDetails>,
}

/// Implemented by whatever the caller wants notified: a terminal adapter
/// (`cli::TerminalNotify`), a test collector, or a no-op.
pub trait Notify: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Drops every notification. Used where a caller doesn't care, and as the
/// default for library-internal helper functions exercised by unit tests.
pub struct NullNotify;

impl Notify for NullNotify {
    fn notify(&self, _notification: &Notification) {}
}

/// Collects notifications in order, for tests that assert on them.
#[derive(Default)]
pub struct RecordingNotify {
    events: std::sync::Mutex<Vec<Notification>>,
}

impl RecordingNotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }
}

impl Notify for RecordingNotify {
    fn notify(&self, notification: &Notification) {
        self.events.lock().unwrap().push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notify_preserves_order() {
        let notify = RecordingNotify::new();
        notify.notify(&Notification {
            abspath: "a.txt".into(),
            action: NotifyAction::Skip,
            content_state: ContentState::Missing,
            hunk: None,
        });
        notify.notify(&Notification {
            abspath: "b.txt".into(),
            action: NotifyAction::Add,
            content_state: ContentState::Changed,
            hunk: None,
        });
        let events = notify.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].abspath, "a.txt");
        assert_eq!(events[1].action, NotifyAction::Add);
    }
}
