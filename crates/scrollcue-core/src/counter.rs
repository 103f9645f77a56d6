//! Count-up animation for statistics
//!
//! Counts from 0 to a target with an ease-out-quart curve once started,
//! typically when the stat first becomes visible.

use std::time::Duration;

use crate::scroll::timing::progress_at;

#[derive(Debug, Clone, PartialEq)]
pub struct CountUp {
    target: u64,
    duration: Duration,
    started_at: Option<Duration>,
}

impl CountUp {
    pub fn new(target: u64, duration: Duration) -> Self {
        Self {
            target,
            duration,
            started_at: None,
        }
    }

    /// Begin counting at `now`. Later calls are ignored.
    pub fn start(&mut self, now: Duration) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.value(now) == self.target
    }

    /// Displayed value at `now`: `floor(target * (1 - (1 - t)^4))`
    pub fn value(&self, now: Duration) -> u64 {
        let Some(start) = self.started_at else {
            return 0;
        };
        let t = progress_at(start, self.duration, now);
        let eased = 1.0 - (1.0 - t).powi(4);
        ((self.target as f64 * eased).floor() as u64).min(self.target)
    }

    pub fn target(&self) -> u64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_not_started_is_zero() {
        let counter = CountUp::new(50, ms(2500));
        assert_eq!(counter.value(ms(10_000)), 0);
        assert!(!counter.is_started());
    }

    #[test]
    fn test_ease_out_quart() {
        let mut counter = CountUp::new(100, ms(1000));
        counter.start(ms(0));
        // 1 - 0.5^4 = 0.9375
        assert_eq!(counter.value(ms(500)), 93);
        assert_eq!(counter.value(ms(1000)), 100);
        assert!(counter.is_finished(ms(1500)));
    }

    #[test]
    fn test_monotonic_and_restart_ignored() {
        let mut counter = CountUp::new(98, ms(2500));
        counter.start(ms(100));
        counter.start(ms(900));
        let mut last = 0;
        for frame in 0..200 {
            let value = counter.value(ms(100 + frame * 16));
            assert!(value >= last);
            last = value;
        }
        assert_eq!(last, 98);
    }
}
