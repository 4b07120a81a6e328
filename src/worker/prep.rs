use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Simulated preparation time for one order.
///
/// A fixed `base_ms`, plus a uniformly random extra in `0..=jitter_ms` when
/// jitter is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepTime {
    pub base_ms: u64,
    pub jitter_ms: u64,
}

impl Default for PrepTime {
    fn default() -> Self {
        Self {
            base_ms: 2000,
            jitter_ms: 0,
        }
    }
}

impl PrepTime {
    pub fn fixed(base_ms: u64) -> Self {
        Self {
            base_ms,
            jitter_ms: 0,
        }
    }

    /// No delay at all; orders are "cooked" instantly.
    pub fn instant() -> Self {
        Self::fixed(0)
    }

    pub fn with_jitter(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    /// Draws the delay for one order.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let extra = if self.jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.base_ms.saturating_add(extra))
    }

    /// Longest delay `sample` can return.
    pub fn upper_bound(&self) -> Duration {
        Duration::from_millis(self.base_ms.saturating_add(self.jitter_ms))
    }
}
