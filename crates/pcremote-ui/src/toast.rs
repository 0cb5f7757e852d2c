use pcremote_sync::Notice;
use std::time::{Duration, Instant};

/// A single transient notice. Showing a new one replaces the old and restarts the clock.
#[derive(Debug)]
pub struct Toast {
    ttl: Duration,
    current: Option<(Notice, Instant)>,
}

impl Toast {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn show(&mut self, notice: Notice, now: Instant) {
        self.current = Some((notice, now));
    }

    pub fn visible(&self, now: Instant) -> Option<&Notice> {
        match &self.current {
            Some((notice, shown)) if now.saturating_duration_since(*shown) < self.ttl => {
                Some(notice)
            }
            _ => None,
        }
    }

    /// Drop the notice if its time is up. Returns true if something was removed.
    pub fn clear_expired(&mut self, now: Instant) -> bool {
        if self.current.is_some() && self.visible(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let start = Instant::now();
        let mut toast = Toast::new(Duration::from_millis(2500));
        toast.show(Notice::success("Approved"), start);

        assert!(toast.visible(start + Duration::from_millis(2499)).is_some());
        assert!(toast.visible(start + Duration::from_millis(2500)).is_none());
        assert!(!toast.clear_expired(start + Duration::from_secs(1)));
        assert!(toast.clear_expired(start + Duration::from_secs(3)));
        assert!(!toast.clear_expired(start + Duration::from_secs(4)));
    }

    #[test]
    fn newer_notice_restarts_the_clock() {
        let start = Instant::now();
        let mut toast = Toast::new(Duration::from_millis(2500));
        toast.show(Notice::success("Approved"), start);
        toast.show(Notice::error("✗ unauthorized"), start + Duration::from_secs(2));

        let at = start + Duration::from_secs(3);
        assert_eq!(toast.visible(at).map(|n| n.text.as_str()), Some("✗ unauthorized"));
        assert!(!toast.clear_expired(at));
    }
}
