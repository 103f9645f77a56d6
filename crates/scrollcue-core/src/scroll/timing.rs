//! Time calculation utilities for scroll-driven animations
//!
//! All times are offsets from the start of the page session, supplied by the
//! host with every event and frame tick.

use std::time::Duration;

/// Calculate animation progress (0.0 to 1.0) from the time since start
///
/// # Arguments
/// * `elapsed` - Time since the animation started (zero before it starts)
/// * `duration` - Total animation duration
///
/// # Returns
/// Progress value clamped to [0.0, 1.0]
#[inline]
pub fn progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let ratio = elapsed.as_secs_f64() / duration.as_secs_f64();
    ratio.clamp(0.0, 1.0)
}

/// Progress of an animation that starts at `start`, sampled at `now`
#[inline]
pub fn progress_at(start: Duration, duration: Duration, now: Duration) -> f64 {
    if now < start {
        return 0.0;
    }
    progress(now - start, duration)
}

/// Check if an animation starting at `start` has finished by `now`
#[inline]
pub fn is_complete(start: Duration, duration: Duration, now: Duration) -> bool {
    now >= start + duration
}

/// Linear interpolation between two values
///
/// # Arguments
/// * `from` - Start value
/// * `to` - End value
/// * `t` - Interpolation factor [0.0, 1.0]
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Convert a millisecond offset to a `Duration`, treating negative and
/// non-finite values as zero
#[inline]
pub fn millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_nanos((ms * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// Milliseconds as f64, the unit used for velocities and delays
#[inline]
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
