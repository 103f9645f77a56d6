//! Per-index delay offsets for fanning one trigger out into a sequence

use serde::{Deserialize, Serialize};

/// Linear stagger: `delay(index) = index * unit_ms`
///
/// Negative units are accepted and produce non-increasing delays; consumers
/// that schedule against a clock clamp negative offsets to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stagger {
    unit_ms: f64,
}

/// Build a stagger with the given per-index unit in milliseconds
pub fn stagger(unit_ms: f64) -> Stagger {
    Stagger::new(unit_ms)
}

impl Stagger {
    pub fn new(unit_ms: f64) -> Self {
        Self { unit_ms }
    }

    pub fn unit_ms(&self) -> f64 {
        self.unit_ms
    }

    /// Delay for the item at `index`, in milliseconds
    #[inline]
    pub fn delay_ms(&self, index: usize) -> f64 {
        index as f64 * self.unit_ms
    }

    /// The stagger as a plain delay function
    pub fn as_fn(self) -> impl Fn(usize) -> f64 {
        move |index| self.delay_ms(index)
    }
}
