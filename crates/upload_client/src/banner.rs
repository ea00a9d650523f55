//! Transient display of the latest submission outcome.

use std::time::Duration;

use shared::domain::UploadOutcome;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ShownOutcome {
    outcome: UploadOutcome,
    generation: u64,
    /// `None` when the display duration runs past the clock's range.
    expires_at: Option<Instant>,
}

/// Holds at most one outcome. Each `show` bumps the generation so a pending
/// expiry for an older outcome becomes a no-op instead of being cancelled.
#[derive(Debug)]
pub struct OutcomeBanner {
    display_for: Duration,
    generation: u64,
    shown: Option<ShownOutcome>,
}

impl OutcomeBanner {
    pub fn new(display_for: Duration) -> Self {
        Self {
            display_for,
            generation: 0,
            shown: None,
        }
    }

    pub fn display_for(&self) -> Duration {
        self.display_for
    }

    /// Replaces whatever is displayed and returns the generation the caller
    /// must pass to [`OutcomeBanner::expire`].
    pub fn show(&mut self, outcome: UploadOutcome, now: Instant) -> u64 {
        self.generation += 1;
        self.shown = Some(ShownOutcome {
            outcome,
            generation: self.generation,
            expires_at: now.checked_add(self.display_for),
        });
        self.generation
    }

    /// Returns whether an outcome was removed.
    pub fn clear(&mut self) -> bool {
        self.shown.take().is_some()
    }

    /// Hides the banner only if `generation` is still the one on display.
    pub fn expire(&mut self, generation: u64) -> bool {
        match &self.shown {
            Some(shown) if shown.generation == generation => {
                self.shown = None;
                true
            }
            _ => false,
        }
    }

    pub fn visible(&self, now: Instant) -> Option<&UploadOutcome> {
        self.shown
            .as_ref()
            .filter(|shown| shown.expires_at.map_or(true, |expires_at| now < expires_at))
            .map(|shown| &shown.outcome)
    }
}
