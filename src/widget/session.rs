use std::sync::atomic::{AtomicBool, Ordering};

/// Per-widget state. `previous_score` only moves on a confirmed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSession {
    account_id: String,
    pub current_score: u8,
    pub previous_score: u8,
}

impl WidgetSession {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            current_score: 0,
            previous_score: 0,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Sets both scores from a freshly loaded account.
    pub fn loaded(&mut self, score: u8) {
        self.current_score = score;
        self.previous_score = score;
    }

    pub fn commit(&mut self, score: u8) {
        self.previous_score = score;
        self.current_score = score;
    }

    /// Drops the unsaved edit and returns the score to display.
    pub fn revert(&mut self) -> u8 {
        self.current_score = self.previous_score;
        self.previous_score
    }
}

/// Single-slot save guard: at most one ticket exists at a time, and a failed
/// acquisition is dropped rather than queued.
#[derive(Debug, Default)]
pub struct SaveGuard {
    in_flight: AtomicBool,
}

impl SaveGuard {
    pub fn try_acquire(&self) -> Option<SaveTicket<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveTicket { guard: self })
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SaveTicket<'a> {
    guard: &'a SaveGuard,
}

impl Drop for SaveTicket<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}
