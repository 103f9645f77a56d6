//! Leading + trailing rate limiter for scroll handlers
//!
//! The scroll tracker processes every sample it is given; hosts that produce
//! samples faster than they want to handle them put a `Throttle` in front.

use std::time::Duration;

use crate::config::ThrottleConfig;

/// Passes the first value of a burst straight through, holds back the rest,
/// and releases the latest held value once the interval has elapsed.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_run: Option<Duration>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a value at `now`
    ///
    /// Returns it when the handler may run immediately. Otherwise the value
    /// replaces any held one and `None` is returned.
    pub fn offer(&mut self, value: T, now: Duration) -> Option<T> {
        let ready = match self.last_run {
            None => true,
            Some(last) => now.saturating_sub(last) > self.interval,
        };
        if ready {
            self.pending = None;
            self.last_run = Some(now);
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the held value if its trailing deadline has passed
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_run = Some(now);
        self.pending.take()
    }

    /// When the held value becomes due, if one is held
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref()?;
        Some(self.last_run.unwrap_or_default() + self.interval)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the held value regardless of timing
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn reset(&mut self) {
        self.last_run = None;
        self.pending = None;
    }
}

impl<T> Default for Throttle<T> {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_leading_call_passes() {
        let mut throttle = Throttle::new(ms(16));
        assert_eq!(throttle.offer(1, ms(0)), Some(1));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_burst_keeps_latest_for_trailing() {
        let mut throttle = Throttle::new(ms(16));
        throttle.offer(1, ms(100));
        assert_eq!(throttle.offer(2, ms(104)), None);
        assert_eq!(throttle.offer(3, ms(108)), None);
        assert_eq!(throttle.deadline(), Some(ms(116)));

        assert_eq!(throttle.poll(ms(110)), None);
        assert_eq!(throttle.poll(ms(116)), Some(3));
        assert_eq!(throttle.poll(ms(200)), None);
    }

    #[test]
    fn test_interval_is_exclusive() {
        let mut throttle = Throttle::new(ms(16));
        throttle.offer((), ms(0));
        assert_eq!(throttle.offer((), ms(16)), None);
        assert_eq!(throttle.offer((), ms(17)), Some(()));
        // the leading call dropped the held value
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_flush_and_reset() {
        let mut throttle = Throttle::default();
        assert_eq!(throttle.interval(), ms(16));
        throttle.offer("a", ms(0));
        throttle.offer("b", ms(1));
        assert_eq!(throttle.flush(), Some("b"));
        throttle.reset();
        assert_eq!(throttle.offer("c", ms(2)), Some("c"));
    }
}
