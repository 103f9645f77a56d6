//! Smooth scroll controller
//!
//! Eases programmatic page scrolls (anchor jumps, wheel input, paging)
//! towards a target offset. The host calls [`SmoothScroller::update`] once per
//! frame and feeds the returned offset back into the page and the
//! [`super::ScrollTracker`].

use std::time::Duration;

use super::timing::{is_complete, lerp, progress_at};
use crate::config::SmoothScrollConfig;
use crate::easing::Easing;

/// One eased glide between two page offsets
#[derive(Debug, Clone)]
struct Glide {
    started_at: Duration,
    from: f64,
    to: f64,
    duration: Duration,
    easing: Easing,
}

/// Lenis-style page scroller driven by host time
///
/// Offsets are page pixels in `[0, max_scroll]`; `max_scroll` is passed on
/// every call since the document can grow or shrink between frames.
#[derive(Debug, Clone, Default)]
pub struct SmoothScroller {
    glide: Option<Glide>,
    config: SmoothScrollConfig,
    offset: f64,
    /// Wheel and paging input collected since the last frame
    queued: f64,
}

impl SmoothScroller {
    pub fn new(config: SmoothScrollConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn set_config(&mut self, config: SmoothScrollConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SmoothScrollConfig {
        &self.config
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.glide.is_some()
    }

    /// A glide is running or wheel input is waiting for the next frame
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.glide.is_some() || self.queued != 0.0
    }

    /// Where the page comes to rest
    pub fn target_scroll(&self) -> f64 {
        self.glide.as_ref().map(|g| g.to).unwrap_or(self.offset)
    }

    #[inline]
    pub fn current_scroll(&self) -> f64 {
        self.offset
    }

    /// Jump to an offset, dropping any glide or queued input
    pub fn set_scroll(&mut self, scroll: f64) {
        self.glide = None;
        self.offset = sanitize(scroll, 0.0);
        self.queued = 0.0;
    }

    /// Glide to `target`, clamped to `[0, max_scroll]`
    ///
    /// Jumps when smooth scrolling is off. A new target mid-glide restarts
    /// from the offset currently on screen.
    pub fn scroll_to(&mut self, target: f64, max_scroll: f64, now: Duration) {
        let target = clamp_scroll(target, max_scroll, self.offset);

        if !self.config.is_smooth() {
            self.offset = target;
            self.glide = None;
            return;
        }

        if self.offset == target {
            self.glide = None;
            return;
        }

        tracing::debug!(from = self.offset, to = target, "Smooth scroll");
        self.glide_to(target, now);
    }

    /// Bring an element's top edge to `anchor_offset` pixels below the
    /// viewport top
    pub fn scroll_to_element(&mut self, element_top: f64, max_scroll: f64, now: Duration) {
        self.scroll_to(element_top - self.config.anchor_offset, max_scroll, now);
    }

    /// Queue wheel input; positive moves down the page
    ///
    /// Everything queued before the next [`update`](Self::update) folds into
    /// a single glide.
    pub fn scroll_by(&mut self, delta: f64, max_scroll: f64) {
        let delta = sanitize(delta, 0.0) * self.config.wheel_multiplier;
        if !self.config.is_smooth() {
            self.offset = clamp_scroll(self.offset + delta, max_scroll, self.offset);
            self.glide = None;
            return;
        }
        self.queued += delta;
    }

    pub fn page_down(&mut self, viewport_height: f64, max_scroll: f64) {
        self.scroll_by(viewport_height, max_scroll);
    }

    pub fn page_up(&mut self, viewport_height: f64, max_scroll: f64) {
        self.scroll_by(-viewport_height, max_scroll);
    }

    /// Apply queued input, advance the glide to `now` and return the offset
    pub fn update(&mut self, max_scroll: f64, now: Duration) -> f64 {
        if self.queued != 0.0 {
            let target = clamp_scroll(self.target_scroll() + self.queued, max_scroll, self.offset);
            self.queued = 0.0;
            if target != self.offset {
                self.glide_to(target, now);
            }
        }

        if let Some(glide) = &self.glide {
            if is_complete(glide.started_at, glide.duration, now) {
                self.offset = clamp_scroll(glide.to, max_scroll, glide.to);
                self.glide = None;
            } else {
                let eased = glide.easing.apply(progress_at(glide.started_at, glide.duration, now));
                self.offset = clamp_scroll(lerp(glide.from, glide.to, eased), max_scroll, glide.from);
            }
        }

        self.offset
    }

    /// Freeze the page where it is and drop queued input
    pub fn cancel(&mut self) {
        self.glide = None;
        self.queued = 0.0;
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.offset = 0.0;
    }

    fn glide_to(&mut self, to: f64, now: Duration) {
        self.glide = Some(Glide {
            started_at: now,
            from: self.offset,
            to,
            duration: self.config.animation_duration(),
            easing: self.config.easing,
        });
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn clamp_scroll(value: f64, max_scroll: f64, fallback: f64) -> f64 {
    let max_scroll = sanitize(max_scroll, 0.0).max(0.0);
    sanitize(value, fallback).clamp(0.0, max_scroll)
}
