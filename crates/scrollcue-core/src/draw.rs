//! Drawable animation driver
//!
//! Plays a sequence of path-drawing keyframes on a [`Drawable`] once its
//! trigger condition is met: the drawable intersects the viewport, and with
//! `autoplay_sync` the page scroll progress is also past a threshold.
//!
//! A run is inert until the host advances it with [`AnimationRun::tick`] (or
//! [`DrawDriver::tick`] for every run at once), passing the session time.
//!
//! # Schedule
//!
//! Each consecutive keyframe pair is one segment. With trigger time `T`,
//! segment duration `D` and per-segment delay `delay(i)`:
//!
//! ```text
//! start(i) = max(T + i * D + delay(i), start(i - 1) + D)
//! ```
//!
//! so a segment never overlaps the one before it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{default_keyframes, DrawConfig};
use crate::easing::Easing;
use crate::intersection::{
    ElementId, IntersectionEntry, IntersectionHandle, IntersectionOptions, IntersectionTracker,
};
use crate::scroll::timing::{lerp, millis, progress_at};
use crate::scroll::{self, ScrollState, ScrollSubscription, ScrollTracker};
use crate::stagger::Stagger;
use crate::{Error, Result};

/// Visible window of a path as `(start, end)` fractions of its length
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DrawFrame {
    pub start: f64,
    pub end: f64,
}

impl DrawFrame {
    /// Nothing drawn
    pub const HIDDEN: DrawFrame = DrawFrame { start: 0.0, end: 0.0 };

    /// Build a frame, clamping both fractions to [0, 1] (NaN becomes 0)
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: unit(start),
            end: unit(end),
        }
    }

    /// Fraction of the path currently visible
    pub fn visible(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn lerp(&self, to: &DrawFrame, t: f64) -> DrawFrame {
        DrawFrame::new(lerp(self.start, to.start, t), lerp(self.end, to.end, t))
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl From<f64> for DrawFrame {
    fn from(end: f64) -> Self {
        DrawFrame::new(0.0, end)
    }
}

impl From<(f64, f64)> for DrawFrame {
    fn from((start, end): (f64, f64)) -> Self {
        DrawFrame::new(start, end)
    }
}

impl FromStr for DrawFrame {
    type Err = Error;

    /// Parses `"start end"`, or a single `"end"` meaning `"0 end"`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidKeyframe(s.to_string());
        let values = s
            .split_whitespace()
            .map(|part| part.parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<f64>>>()?;
        if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(invalid());
        }
        match values.as_slice() {
            [end] => Ok(DrawFrame::from(*end)),
            [start, end] => Ok(DrawFrame::new(*start, *end)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for DrawFrame {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DrawFrame> for String {
    fn from(frame: DrawFrame) -> String {
        frame.to_string()
    }
}

impl fmt::Display for DrawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.end)
    }
}

/// Parse keyframe strings; one malformed entry replaces the whole list with
/// the default draw
pub fn parse_keyframes<S: AsRef<str>>(values: &[S]) -> Vec<DrawFrame> {
    values
        .iter()
        .map(|value| value.as_ref().parse())
        .collect::<Result<Vec<DrawFrame>>>()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid draw keyframes, using default draw");
            default_keyframes()
        })
}

/// `deserialize_with` helper for keyframe lists in config files
pub fn deserialize_keyframes<'de, D>(deserializer: D) -> std::result::Result<Vec<DrawFrame>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<String>::deserialize(deserializer)?;
    Ok(parse_keyframes(&values))
}

/// SVG stroke properties that render a [`DrawFrame`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrokeDash {
    /// `stroke-dasharray`: visible dash, then a gap covering the rest
    pub dash_array: [f64; 2],
    /// `stroke-dashoffset`
    pub dash_offset: f64,
}

impl StrokeDash {
    pub fn for_frame(frame: DrawFrame, path_length: f64) -> Self {
        let length = if path_length.is_finite() { path_length.max(0.0) } else { 0.0 };
        Self {
            dash_array: [frame.visible() * length, length],
            dash_offset: -frame.start * length,
        }
    }
}

impl fmt::Display for StrokeDash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stroke-dasharray: {} {}; stroke-dashoffset: {}",
            self.dash_array[0], self.dash_array[1], self.dash_offset
        )
    }
}

/// Delay before each keyframe segment, in milliseconds
#[derive(Clone)]
pub enum Delay {
    Fixed(f64),
    /// `base_ms + stagger.delay_ms(index)`
    Staggered { base_ms: f64, stagger: Stagger },
    Custom(Rc<dyn Fn(usize) -> f64>),
}

impl Delay {
    pub fn custom<F>(delay: F) -> Self
    where
        F: Fn(usize) -> f64 + 'static,
    {
        Delay::Custom(Rc::new(delay))
    }

    /// Delay for segment `index`, finite and never negative
    pub fn delay_ms(&self, index: usize) -> f64 {
        let ms = match self {
            Delay::Fixed(ms) => *ms,
            Delay::Staggered { base_ms, stagger } => base_ms + stagger.delay_ms(index),
            Delay::Custom(delay) => delay(index),
        };
        if !ms.is_finite() {
            tracing::warn!(index, delay = ms, "Non-finite segment delay, using 0");
            return 0.0;
        }
        ms.max(0.0)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Fixed(0.0)
    }
}

impl From<f64> for Delay {
    fn from(ms: f64) -> Self {
        Delay::Fixed(ms)
    }
}

impl From<Stagger> for Delay {
    fn from(stagger: Stagger) -> Self {
        Delay::Staggered {
            base_ms: 0.0,
            stagger,
        }
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Fixed(ms) => f.debug_tuple("Fixed").field(ms).finish(),
            Delay::Staggered { base_ms, stagger } => f
                .debug_struct("Staggered")
                .field("base_ms", base_ms)
                .field("stagger", stagger)
                .finish(),
            Delay::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Everything one run needs; immutable once handed to [`DrawDriver::animate`]
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    pub keyframes: Vec<DrawFrame>,
    pub delay: Delay,
    pub easing: Easing,
    /// Wait for scroll progress to pass `threshold` as well as intersection
    pub autoplay_sync: bool,
    /// Scroll progress a synced run must exceed
    pub threshold: f64,
    pub segment_duration: Duration,
    pub intersection: IntersectionOptions,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::from(&DrawConfig::default())
    }
}

impl From<&DrawConfig> for AnimationConfig {
    fn from(config: &DrawConfig) -> Self {
        Self {
            keyframes: config.keyframes.clone(),
            delay: Delay::default(),
            easing: config.easing,
            autoplay_sync: false,
            threshold: config.threshold,
            segment_duration: config.segment_duration(),
            intersection: IntersectionOptions::default(),
        }
    }
}

impl AnimationConfig {
    pub fn with_keyframes<I, K>(mut self, keyframes: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<DrawFrame>,
    {
        self.keyframes = keyframes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delay(mut self, delay: impl Into<Delay>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Named easing; unknown names fall back to ease-in-out
    pub fn with_easing_name(self, name: &str) -> Self {
        self.with_easing(Easing::from_name(name))
    }

    pub fn autoplay_sync(mut self, sync: bool) -> Self {
        self.autoplay_sync = sync;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_segment_duration(mut self, duration: Duration) -> Self {
        self.segment_duration = duration;
        self
    }

    pub fn with_intersection(mut self, options: IntersectionOptions) -> Self {
        self.intersection = options;
        self
    }

    /// Keyframes actually played: never empty
    fn frames(&self) -> Vec<DrawFrame> {
        if self.keyframes.is_empty() {
            tracing::warn!("Empty keyframe sequence, using default draw");
            return default_keyframes();
        }
        let mut frames: Vec<DrawFrame> = self
            .keyframes
            .iter()
            .map(|frame| DrawFrame::new(frame.start, frame.end))
            .collect();
        if frames.len() == 1 {
            // a lone keyframe is drawn from nothing
            frames.insert(0, DrawFrame::HIDDEN);
        }
        frames
    }
}

struct DrawableState {
    generation: Cell<u64>,
    frame: Cell<DrawFrame>,
}

/// A path-like element whose reveal is a [`DrawFrame`]
///
/// Owned by the component that renders it. Dropping it terminates any run
/// still driving it.
pub struct Drawable {
    id: ElementId,
    path_length: f64,
    state: Rc<DrawableState>,
}

impl Drawable {
    pub fn new(path_length: f64) -> Self {
        Self::with_id(ElementId::new(), path_length)
    }

    pub fn with_id(id: ElementId, path_length: f64) -> Self {
        Self {
            id,
            path_length,
            state: Rc::new(DrawableState {
                generation: Cell::new(0),
                frame: Cell::new(DrawFrame::HIDDEN),
            }),
        }
    }

    /// Element identity used for intersection reports
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn path_length(&self) -> f64 {
        self.path_length
    }

    /// Frame written by the most recent tick of the current run
    pub fn frame(&self) -> DrawFrame {
        self.state.frame.get()
    }

    pub fn stroke_dash(&self) -> StrokeDash {
        StrokeDash::for_frame(self.frame(), self.path_length)
    }

    fn supersede(&self) -> u64 {
        let generation = self.state.generation.get() + 1;
        self.state.generation.set(generation);
        generation
    }
}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawable")
            .field("id", &self.id)
            .field("path_length", &self.path_length)
            .field("frame", &self.frame())
            .finish()
    }
}

/// Lifecycle of an [`AnimationRun`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Trigger condition not met yet
    Waiting,
    /// Triggered; segments are delayed or playing
    Running,
    Complete,
    /// Superseded, cancelled, or the drawable went away
    Cancelled,
}

impl RunPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Cancelled)
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Waiting,
    /// Conditions were already met at creation; starts on the next tick
    NextTick,
    At(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: Duration,
    from: DrawFrame,
    to: DrawFrame,
}

struct RunState {
    element: Option<ElementId>,
    target: Weak<DrawableState>,
    generation: u64,
    frames: Vec<DrawFrame>,
    config: AnimationConfig,
    phase: RunPhase,
    trigger: Trigger,
    segments: Vec<Segment>,
    frame: DrawFrame,
    progress: f64,
    intersecting: bool,
    completions: Vec<Box<dyn FnOnce()>>,
    visibility: Option<IntersectionHandle>,
    scroll: Option<ScrollSubscription>,
}

impl RunState {
    fn is_current(&self) -> bool {
        match self.target.upgrade() {
            Some(target) => target.generation.get() == self.generation,
            None => self.element.is_none(),
        }
    }

    fn on_visibility(&mut self, visible: bool, scroll_progress: f64, at: Duration) {
        self.intersecting = visible;
        if visible && (!self.config.autoplay_sync || scroll_progress > self.config.threshold) {
            self.fire(Trigger::At(at));
        }
    }

    fn on_scroll(&mut self, state: &ScrollState) {
        if self.intersecting && state.progress > self.config.threshold {
            self.fire(Trigger::At(state.at));
        }
    }

    fn fire(&mut self, trigger: Trigger) {
        if !matches!(self.trigger, Trigger::Waiting) || self.phase != RunPhase::Waiting {
            return;
        }
        self.trigger = trigger;
        self.detach();
        match trigger {
            Trigger::At(at) => self.schedule(at),
            _ => self.phase = RunPhase::Running,
        }
    }

    fn schedule(&mut self, trigger: Duration) {
        let duration = self.config.segment_duration;
        let mut previous_end = trigger;
        self.segments = self
            .frames
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let offset = duration * index as u32 + millis(self.config.delay.delay_ms(index));
                let start = (trigger + offset).max(previous_end);
                previous_end = start + duration;
                Segment {
                    start,
                    from: pair[0],
                    to: pair[1],
                }
            })
            .collect();
        self.phase = RunPhase::Running;
        tracing::debug!(
            element = ?self.element,
            trigger_ms = trigger.as_millis() as u64,
            segments = self.segments.len(),
            "Draw run started"
        );
    }

    /// Drop intersection and scroll subscriptions
    fn detach(&mut self) {
        self.visibility = None;
        self.scroll = None;
    }

    fn terminate(&mut self, reason: &'static str) {
        self.phase = RunPhase::Cancelled;
        self.completions.clear();
        self.detach();
        tracing::debug!(element = ?self.element, reason, "Draw run cancelled");
    }

    /// Advance to `now`; returns completion callbacks to run once the borrow
    /// is released
    fn advance(&mut self, now: Duration) -> Vec<Box<dyn FnOnce()>> {
        if self.phase.is_finished() {
            return Vec::new();
        }
        let Some(target) = self.target.upgrade() else {
            self.terminate("drawable dropped");
            return Vec::new();
        };
        if target.generation.get() != self.generation {
            self.terminate("superseded");
            return Vec::new();
        }

        match self.trigger {
            Trigger::Waiting => return Vec::new(),
            Trigger::NextTick => {
                self.trigger = Trigger::At(now);
                self.schedule(now);
            }
            Trigger::At(_) => {}
        }

        let duration = self.config.segment_duration;
        let total = self.segments.len().max(1) as f64;
        let mut frame = self.frames[0];
        let mut done = 0.0;
        let mut finished = true;
        for segment in &self.segments {
            if now < segment.start {
                finished = false;
                break;
            }
            let t = progress_at(segment.start, duration, now);
            if t < 1.0 {
                frame = segment.from.lerp(&segment.to, self.config.easing.apply(t));
                done += t;
                finished = false;
                break;
            }
            frame = segment.to;
            done += 1.0;
        }

        self.frame = frame;
        self.progress = (done / total).clamp(0.0, 1.0);
        target.frame.set(frame);
        tracing::trace!(element = ?self.element, progress = self.progress, %frame, "Draw tick");

        if finished {
            self.phase = RunPhase::Complete;
            self.progress = 1.0;
            tracing::debug!(element = ?self.element, "Draw run complete");
            std::mem::take(&mut self.completions)
        } else {
            Vec::new()
        }
    }
}

/// Live execution of one [`AnimationConfig`] against one [`Drawable`]
///
/// Cheap to clone; clones share the run.
#[derive(Clone)]
pub struct AnimationRun {
    state: Rc<RefCell<RunState>>,
}

impl AnimationRun {
    /// A run with nothing to draw, complete from the start
    fn completed(config: AnimationConfig) -> Self {
        let frames = config.frames();
        let last = frames.last().copied().unwrap_or(DrawFrame::HIDDEN);
        Self {
            state: Rc::new(RefCell::new(RunState {
                element: None,
                target: Weak::new(),
                generation: 0,
                frames,
                config,
                phase: RunPhase::Complete,
                trigger: Trigger::Waiting,
                segments: Vec::new(),
                frame: last,
                progress: 1.0,
                intersecting: false,
                completions: Vec::new(),
                visibility: None,
                scroll: None,
            })),
        }
    }

    /// Advance the run to `now` and return the frame to render
    pub fn tick(&self, now: Duration) -> DrawFrame {
        let (frame, completions) = {
            let mut state = self.state.borrow_mut();
            let completions = state.advance(now);
            (state.frame, completions)
        };
        for completion in completions {
            completion();
        }
        frame
    }

    /// Overall progress through the keyframe segments, in [0, 1]
    pub fn progress(&self) -> f64 {
        self.state.borrow().progress
    }

    pub fn frame(&self) -> DrawFrame {
        self.state.borrow().frame
    }

    pub fn phase(&self) -> RunPhase {
        let state = self.state.borrow();
        if !state.phase.is_finished() && !state.is_current() {
            // superseded elsewhere; the next tick records it
            return RunPhase::Cancelled;
        }
        state.phase
    }

    pub fn element(&self) -> Option<ElementId> {
        self.state.borrow().element
    }

    /// Waiting or running, and still the drawable's current run
    pub fn is_active(&self) -> bool {
        !self.phase().is_finished()
    }

    pub fn is_complete(&self) -> bool {
        self.state.borrow().phase == RunPhase::Complete
    }

    /// Call `callback` once when the final segment finishes
    ///
    /// Runs immediately if the run is already complete; never runs for a
    /// cancelled run.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let phase = {
            let mut state = self.state.borrow_mut();
            if !state.phase.is_finished() {
                state.completions.push(Box::new(callback));
                return;
            }
            state.phase
        };
        if phase == RunPhase::Complete {
            callback();
        }
    }

    /// Stop the run where it is. No-op once finished.
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        if !state.phase.is_finished() {
            state.terminate("cancelled");
        }
    }
}

impl fmt::Debug for AnimationRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("AnimationRun")
            .field("element", &state.element)
            .field("phase", &state.phase)
            .field("progress", &state.progress)
            .field("frame", &state.frame)
            .finish()
    }
}

/// Starts runs and advances all of them from one frame loop
pub struct DrawDriver {
    intersection: IntersectionTracker,
    scroll: ScrollTracker,
    runs: Vec<AnimationRun>,
}

impl DrawDriver {
    /// Driver gated on the session scroll tracker
    pub fn new(intersection: IntersectionTracker) -> Self {
        Self::with_scroll_tracker(intersection, scroll::session())
    }

    pub fn with_scroll_tracker(intersection: IntersectionTracker, scroll: ScrollTracker) -> Self {
        Self {
            intersection,
            scroll,
            runs: Vec::new(),
        }
    }

    /// Start a run of `config` on `drawable`
    ///
    /// Any earlier run on the same drawable is cancelled. A missing drawable
    /// yields a run that is already complete.
    pub fn animate(&mut self, drawable: Option<&Drawable>, config: AnimationConfig) -> AnimationRun {
        let Some(drawable) = drawable else {
            tracing::debug!("No drawable, returning completed run");
            return AnimationRun::completed(config);
        };

        let element = drawable.id();
        let generation = drawable.supersede();
        for run in &self.runs {
            if run.element() == Some(element) {
                run.cancel();
            }
        }
        self.runs.retain(AnimationRun::is_active);

        let frames = config.frames();
        let sync = config.autoplay_sync;
        let options = config.intersection;
        let state = Rc::new(RefCell::new(RunState {
            element: Some(element),
            target: Rc::downgrade(&drawable.state),
            generation,
            frame: frames[0],
            frames,
            config,
            phase: RunPhase::Waiting,
            trigger: Trigger::Waiting,
            segments: Vec::new(),
            progress: 0.0,
            intersecting: false,
            completions: Vec::new(),
            visibility: None,
            scroll: None,
        }));
        drawable.state.frame.set(state.borrow().frame);

        let weak = Rc::downgrade(&state);
        let scroll = self.scroll.clone();
        let (handle, visible) = self.intersection.observe(element, options, move |entry: &IntersectionEntry| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let progress = scroll.state().progress;
            if let Ok(mut state) = state.try_borrow_mut() {
                state.on_visibility(entry.visible, progress, entry.at);
            };
        });

        let subscription = sync.then(|| {
            let weak = Rc::downgrade(&state);
            self.scroll.subscribe(move |scroll_state| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                if let Ok(mut state) = state.try_borrow_mut() {
                    state.on_scroll(scroll_state);
                };
            })
        });

        {
            let mut run = state.borrow_mut();
            run.visibility = Some(handle);
            run.scroll = subscription;
            run.intersecting = visible;
            let ready = visible && (!sync || self.scroll.state().progress > run.config.threshold);
            if ready {
                run.fire(Trigger::NextTick);
            }
        }

        tracing::debug!(%element, generation, sync, "Draw run created");
        let run = AnimationRun { state };
        self.runs.push(run.clone());
        run
    }

    /// Advance every tracked run to `now`, dropping finished ones
    ///
    /// Returns the number of runs still active.
    pub fn tick(&mut self, now: Duration) -> usize {
        let runs = self.runs.clone();
        for run in &runs {
            run.tick(now);
        }
        self.runs.retain(AnimationRun::is_active);
        self.runs.len()
    }

    pub fn active_runs(&self) -> usize {
        self.runs.iter().filter(|run| run.is_active()).count()
    }

    pub fn intersection(&self) -> &IntersectionTracker {
        &self.intersection
    }

    pub fn scroll_tracker(&self) -> &ScrollTracker {
        &self.scroll
    }
}

impl fmt::Debug for DrawDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawDriver")
            .field("runs", &self.runs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::ScrollSample;
    use crate::stagger::stagger;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn driver() -> DrawDriver {
        DrawDriver::with_scroll_tracker(IntersectionTracker::new(), ScrollTracker::new())
    }

    fn fast() -> AnimationConfig {
        AnimationConfig::default()
            .with_segment_duration(ms(100))
            .with_easing(Easing::Linear)
    }

    fn scroll_to(tracker: &ScrollTracker, progress: f64, at: Duration) {
        tracker.record(ScrollSample {
            scroll_y: progress * 1000.0,
            viewport_height: 1000.0,
            document_height: 2000.0,
            at,
        });
    }

    #[test]
    fn test_parse_draw_frame() {
        assert_eq!("0 1".parse::<DrawFrame>().unwrap(), DrawFrame::new(0.0, 1.0));
        assert_eq!("0.5".parse::<DrawFrame>().unwrap(), DrawFrame::new(0.0, 0.5));
        assert!("0 1 1".parse::<DrawFrame>().is_err());
        assert!("0 1.5".parse::<DrawFrame>().is_err());
        assert!("".parse::<DrawFrame>().is_err());
        assert_eq!(DrawFrame::new(0.25, 1.0).to_string(), "0.25 1");
    }

    #[test]
    fn test_parse_keyframes_falls_back_as_a_whole() {
        assert_eq!(
            parse_keyframes(&["0 0", "0.5"]),
            vec![DrawFrame::HIDDEN, DrawFrame::new(0.0, 0.5)]
        );
        assert_eq!(parse_keyframes(&["0 0", "0 2"]), default_keyframes());
        assert!(parse_keyframes::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_frame_clamps_and_nan() {
        assert_eq!(DrawFrame::new(f64::NAN, 3.0), DrawFrame::new(0.0, 1.0));
        assert_eq!(DrawFrame::from(-0.5), DrawFrame::HIDDEN);
    }

    #[test]
    fn test_stroke_dash() {
        let dash = StrokeDash::for_frame(DrawFrame::new(0.0, 0.25), 400.0);
        assert_eq!(dash.dash_array, [100.0, 400.0]);
        assert_eq!(dash.dash_offset, 0.0);

        let dash = StrokeDash::for_frame(DrawFrame::new(0.5, 1.0), 400.0);
        assert_eq!(dash.dash_array, [200.0, 400.0]);
        assert_eq!(dash.dash_offset, -200.0);
    }

    #[test]
    fn test_delay_variants() {
        assert_eq!(Delay::Fixed(-20.0).delay_ms(3), 0.0);
        let staggered = Delay::Staggered {
            base_ms: 10.0,
            stagger: stagger(40.0),
        };
        assert_eq!(staggered.delay_ms(0), 10.0);
        assert_eq!(staggered.delay_ms(2), 90.0);
        assert_eq!(Delay::custom(|i| i as f64 * 5.0).delay_ms(4), 20.0);
        assert_eq!(Delay::custom(|_| f64::NAN).delay_ms(1), 0.0);
        assert_eq!(Delay::custom(|_| f64::INFINITY).delay_ms(1), 0.0);
        assert_eq!(Delay::Fixed(f64::NEG_INFINITY).delay_ms(0), 0.0);
    }

    #[test]
    fn test_infinite_delay_schedules_like_zero() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let run = driver.animate(
            Some(&drawable),
            fast().with_delay(Delay::custom(|_| f64::INFINITY)),
        );
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        assert_eq!(run.tick(ms(50)), DrawFrame::new(0.0, 0.5));
        run.tick(ms(200));
        assert!(run.is_complete());
    }

    #[test]
    fn test_missing_drawable_is_complete() {
        let mut driver = driver();
        let run = driver.animate(None, AnimationConfig::default());
        assert!(run.is_complete());
        assert!(!run.is_active());
        assert_eq!(run.progress(), 1.0);

        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        run.on_complete(move || counter.set(counter.get() + 1));
        assert_eq!(fired.get(), 1);
        run.tick(ms(10));
        assert_eq!(fired.get(), 1);
        assert_eq!(driver.active_runs(), 0);
    }

    #[test]
    fn test_waits_for_intersection() {
        let mut driver = driver();
        let drawable = Drawable::new(300.0);
        let run = driver.animate(Some(&drawable), fast());

        run.tick(ms(500));
        assert_eq!(run.phase(), RunPhase::Waiting);
        assert_eq!(run.progress(), 0.0);

        driver.intersection().report_ratio(drawable.id(), 0.5, ms(600));
        assert_eq!(run.phase(), RunPhase::Running);

        // default keyframes: 0 0 -> 0 1 -> 1 1
        assert_eq!(run.tick(ms(650)), DrawFrame::new(0.0, 0.5));
        assert_eq!(drawable.frame(), DrawFrame::new(0.0, 0.5));
        assert_eq!(run.tick(ms(750)), DrawFrame::new(0.5, 1.0));
        assert!((run.progress() - 0.75).abs() < 1e-9);
        assert_eq!(run.tick(ms(800)), DrawFrame::new(1.0, 1.0));
        assert!(run.is_complete());
        // run no longer observes its element
        assert_eq!(driver.intersection().observer_count(), 0);
    }

    #[test]
    fn test_already_visible_starts_on_next_tick() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let (_watcher, _) =
            driver
                .intersection()
                .observe(drawable.id(), IntersectionOptions::default(), |_| {});
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));

        let run = driver.animate(Some(&drawable), fast());
        assert_eq!(run.phase(), RunPhase::Running);
        run.tick(ms(1000));
        assert_eq!(run.progress(), 0.0);
        run.tick(ms(1200));
        assert!(run.is_complete());
    }

    #[test]
    fn test_rerun_on_visible_drawable_starts_next_tick() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let first = driver.animate(Some(&drawable), fast());
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        driver.tick(ms(300));
        assert!(first.is_complete());
        assert_eq!(driver.intersection().observer_count(), 0);

        // no new report: the element is still on screen
        let second = driver.animate(Some(&drawable), fast());
        assert_eq!(second.phase(), RunPhase::Running);
        driver.tick(ms(1000));
        driver.tick(ms(1050));
        assert_eq!(drawable.frame(), DrawFrame::new(0.0, 0.5));
        driver.tick(ms(1200));
        assert!(second.is_complete());
    }

    #[test]
    fn test_superseding_run() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let first = driver.animate(Some(&drawable), fast());
        let second = driver.animate(Some(&drawable), fast().with_keyframes([0.0, 0.3]));

        assert_eq!(first.phase(), RunPhase::Cancelled);
        assert!(second.is_active());
        assert_eq!(driver.active_runs(), 1);

        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        first.on_complete(move || flag.set(true));

        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        driver.tick(ms(100));
        assert_eq!(drawable.frame(), DrawFrame::new(0.0, 0.3));
        assert!(second.is_complete());
        assert!(!fired.get());
    }

    #[test]
    fn test_superseded_by_another_driver() {
        let tracker = IntersectionTracker::new();
        let mut a = DrawDriver::with_scroll_tracker(tracker.clone(), ScrollTracker::new());
        let mut b = DrawDriver::with_scroll_tracker(tracker, ScrollTracker::new());
        let drawable = Drawable::new(100.0);

        let old = a.animate(Some(&drawable), fast());
        let new = b.animate(Some(&drawable), fast());
        assert!(!old.is_active());
        assert!(new.is_active());
        assert_eq!(a.tick(ms(0)), 0);
    }

    #[test]
    fn test_dropping_drawable_cancels() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast());
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        run.tick(ms(50));
        drop(drawable);

        assert_eq!(driver.tick(ms(60)), 0);
        assert_eq!(run.phase(), RunPhase::Cancelled);
    }

    #[test]
    fn test_autoplay_sync_waits_for_scroll_threshold() {
        let scroll = ScrollTracker::new();
        let mut driver = DrawDriver::with_scroll_tracker(IntersectionTracker::new(), scroll.clone());
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast().autoplay_sync(true).with_threshold(0.3));

        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        scroll_to(&scroll, 0.3, ms(10));
        assert_eq!(run.phase(), RunPhase::Waiting);

        // above threshold but not intersecting any more
        driver.intersection().report_ratio(drawable.id(), 0.0, ms(20));
        scroll_to(&scroll, 0.5, ms(30));
        assert_eq!(run.phase(), RunPhase::Waiting);

        driver.intersection().report_ratio(drawable.id(), 1.0, ms(40));
        assert_eq!(run.phase(), RunPhase::Running);
        assert_eq!(scroll.subscriber_count(), 0);

        run.tick(ms(240));
        assert!(run.is_complete());
    }

    #[test]
    fn test_autoplay_sync_starts_on_scroll() {
        let scroll = ScrollTracker::new();
        let mut driver = DrawDriver::with_scroll_tracker(IntersectionTracker::new(), scroll.clone());
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast().autoplay_sync(true));

        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        assert_eq!(run.phase(), RunPhase::Waiting);
        scroll_to(&scroll, 0.2, ms(500));
        assert_eq!(run.phase(), RunPhase::Running);

        run.tick(ms(550));
        assert_eq!(drawable.frame(), DrawFrame::new(0.0, 0.5));
    }

    #[test]
    fn test_empty_keyframes_fall_back() {
        let config = fast().with_keyframes(Vec::<DrawFrame>::new());
        assert_eq!(config.frames(), default_keyframes());
    }

    #[test]
    fn test_single_keyframe_draws_from_hidden() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast().with_keyframes([0.8]));
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        assert_eq!(run.tick(ms(50)), DrawFrame::new(0.0, 0.4));
        assert_eq!(run.tick(ms(100)), DrawFrame::new(0.0, 0.8));
        assert!(run.is_complete());
    }

    #[test]
    fn test_regressing_keyframes() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast().with_keyframes([0.0, 1.0, 0.0]));
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        assert_eq!(run.tick(ms(100)), DrawFrame::new(0.0, 1.0));
        assert_eq!(run.tick(ms(150)), DrawFrame::new(0.0, 0.5));
        assert_eq!(run.tick(ms(200)), DrawFrame::HIDDEN);
    }

    #[test]
    fn test_segments_wait_for_staggered_delay() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let config = fast().with_delay(Delay::Staggered {
            base_ms: 0.0,
            stagger: stagger(250.0),
        });
        let run = driver.animate(Some(&drawable), config);
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));

        // segment 0 at 0..100, segment 1 at max(100 + 250, 100) = 350..450
        run.tick(ms(100));
        assert_eq!(run.frame(), DrawFrame::new(0.0, 1.0));
        run.tick(ms(300));
        assert_eq!(run.frame(), DrawFrame::new(0.0, 1.0));
        assert_eq!(run.phase(), RunPhase::Running);
        run.tick(ms(400));
        assert_eq!(run.frame(), DrawFrame::new(0.5, 1.0));
        run.tick(ms(450));
        assert!(run.is_complete());
    }

    #[test]
    fn test_completion_fires_once_and_may_reenter() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast());
        let fired = Rc::new(Cell::new(0));

        let counter = fired.clone();
        let inner = run.clone();
        run.on_complete(move || {
            assert!(inner.is_complete());
            counter.set(counter.get() + 1);
        });
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        for frame in 0..30 {
            driver.tick(ms(frame * 16));
        }
        run.tick(ms(1000));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut driver = driver();
        let drawable = Drawable::new(100.0);
        let run = driver.animate(Some(&drawable), fast());
        run.cancel();
        run.cancel();
        assert_eq!(run.phase(), RunPhase::Cancelled);
        assert_eq!(driver.intersection().observer_count(), 0);
        driver.intersection().report_ratio(drawable.id(), 1.0, ms(0));
        assert_eq!(run.tick(ms(100)), DrawFrame::HIDDEN);
    }
}
