// Per-submitter cooldown bookkeeping.
// Invariants: a submitter is allowed at most once per cooldown window; records
// idle for longer than twice the cooldown are eligible for eviction.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Denied { remaining_secs: u64 },
}

impl ThrottleDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ThrottleDecision::Allowed)
    }
}

#[derive(Debug)]
pub struct Throttle {
    cooldown_ms: u64,
    last_submit_ms: HashMap<String, u64>,
}

impl Throttle {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_submit_ms: HashMap::new(),
        }
    }

    /// Allows and records `now_ms` when the submitter is outside its cooldown.
    /// Denied attempts leave the existing record untouched.
    pub fn check_and_record(&mut self, submitter_id: &str, now_ms: u64) -> ThrottleDecision {
        if let Some(&last_ms) = self.last_submit_ms.get(submitter_id) {
            let elapsed_ms = now_ms.saturating_sub(last_ms);
            if elapsed_ms < self.cooldown_ms {
                let remaining_ms = self.cooldown_ms - elapsed_ms;
                return ThrottleDecision::Denied {
                    remaining_secs: remaining_ms.div_ceil(1_000),
                };
            }
        }
        self.last_submit_ms.insert(submitter_id.to_string(), now_ms);
        ThrottleDecision::Allowed
    }

    /// Drops records older than twice the cooldown. Returns how many went.
    pub fn sweep(&mut self, now_ms: u64) -> usize {
        let max_age_ms = self.cooldown_ms.saturating_mul(2);
        let before = self.last_submit_ms.len();
        self.last_submit_ms
            .retain(|_, last_ms| now_ms.saturating_sub(*last_ms) <= max_age_ms);
        before - self.last_submit_ms.len()
    }

    pub fn len(&self) -> usize {
        self.last_submit_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_submit_ms.is_empty()
    }

    pub fn clear(&mut self) {
        self.last_submit_ms.clear();
    }
}
