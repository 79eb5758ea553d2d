// Last-activity bookkeeping for synthetic idle injection.

#[derive(Debug)]
pub struct IdleTracker {
    idle_after_ms: u64,
    last_activity_ms: u64,
}

impl IdleTracker {
    pub fn new(idle_after_ms: u64, now_ms: u64) -> Self {
        Self {
            idle_after_ms,
            last_activity_ms: now_ms,
        }
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    /// Records activity. Never moves the clock backwards.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    pub fn is_idle(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) >= self.idle_after_ms
    }

    /// Returns true at most once per idle period: when idle, the activity
    /// clock is reset to `now_ms` before returning.
    pub fn take_if_idle(&mut self, now_ms: u64) -> bool {
        if !self.is_idle(now_ms) {
            return false;
        }
        self.last_activity_ms = now_ms;
        true
    }
}
