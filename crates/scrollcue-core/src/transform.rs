//! Scroll-linked value transforms
//!
//! Continuous effects (parallax, fade with scroll) derived from scroll
//! progress rather than triggered once.

use crate::scroll::timing::lerp;

/// Piecewise-linear map of `value` through matching `input`/`output` stops
///
/// `input` must be ascending. Values outside the input range clamp to the
/// first or last output. Mismatched or empty stops return `value` unchanged.
pub fn map_range(value: f64, input: &[f64], output: &[f64]) -> f64 {
    if input.len() != output.len() || input.is_empty() {
        tracing::warn!(
            inputs = input.len(),
            outputs = output.len(),
            "Mismatched transform stops, passing value through"
        );
        return value;
    }
    let value = if value.is_nan() { input[0] } else { value };
    let last = input.len() - 1;
    if value <= input[0] {
        return output[0];
    }
    if value >= input[last] {
        return output[last];
    }
    let upper = input.partition_point(|stop| *stop <= value).min(last);
    let lower = upper - 1;
    let span = input[upper] - input[lower];
    if span <= 0.0 {
        return output[upper];
    }
    lerp(output[lower], output[upper], (value - input[lower]) / span)
}

/// Progress of an element through the viewport
///
/// 0 when its top reaches the viewport bottom, 1 when its bottom leaves the
/// viewport top.
pub fn element_progress(
    element_top: f64,
    element_height: f64,
    scroll_y: f64,
    viewport_height: f64,
) -> f64 {
    let travel = element_height + viewport_height;
    if travel.is_nan() || travel <= 0.0 || !scroll_y.is_finite() {
        return 0.0;
    }
    ((scroll_y + viewport_height - element_top) / travel).clamp(0.0, 1.0)
}

/// Vertical drift of a section as it scrolls past
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parallax {
    /// Pixel offset at entry; the section ends at `-speed`
    pub speed: f64,
}

impl Parallax {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    /// Offset in pixels for an element progress in [0, 1]
    pub fn offset(&self, progress: f64) -> f64 {
        map_range(progress, &[0.0, 1.0], &[self.speed, -self.speed])
    }
}
