//! Reveal wrapper
//!
//! Maps an element's visibility to an entrance transition for arbitrary
//! content. Until the element is first seen the content renders in a hidden
//! state derived from the reveal direction; after that it eases to neutral.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::{CubicBezier, Easing};
use crate::intersection::{
    ElementId, IntersectionEntry, IntersectionHandle, IntersectionOptions, IntersectionTracker,
};
use crate::scroll::timing::{lerp, progress_at};
use crate::stagger::Stagger;

/// Where hidden content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
    Scale,
    RotateY,
}

/// Reveal options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealProps {
    #[serde(default)]
    pub direction: RevealDirection,
    /// Delay between the element becoming visible and the entrance starting
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default = "default_duration")]
    pub duration_ms: u64,
    /// Offset of the hidden state in pixels
    #[serde(default = "default_distance")]
    pub distance: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Reveal once and never hide again
    #[serde(default = "default_once")]
    pub once: bool,
}

impl Default for RevealProps {
    fn default() -> Self {
        Self {
            direction: RevealDirection::default(),
            delay_ms: 0,
            duration_ms: default_duration(),
            distance: default_distance(),
            threshold: default_threshold(),
            once: default_once(),
        }
    }
}

fn default_duration() -> u64 {
    600
}

fn default_distance() -> f64 {
    30.0
}

fn default_threshold() -> f64 {
    0.1
}

fn default_once() -> bool {
    true
}

impl RevealProps {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    fn intersection_options(&self) -> IntersectionOptions {
        IntersectionOptions::default()
            .with_threshold(self.threshold)
            .once(self.once)
    }
}

/// Presentation values for revealed content
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualState {
    pub opacity: f64,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Degrees
    pub rotate_y: f64,
}

impl VisualState {
    /// Fully revealed
    pub const NEUTRAL: VisualState = VisualState {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
        rotate_y: 0.0,
    };

    /// Initial state for a direction; content starts offset opposite to the
    /// direction it moves in
    pub fn hidden(direction: RevealDirection, distance: f64) -> Self {
        let base = VisualState {
            opacity: 0.0,
            ..Self::NEUTRAL
        };
        match direction {
            RevealDirection::Up => VisualState { y: distance, ..base },
            RevealDirection::Down => VisualState { y: -distance, ..base },
            RevealDirection::Left => VisualState { x: distance, ..base },
            RevealDirection::Right => VisualState { x: -distance, ..base },
            RevealDirection::Scale => VisualState { scale: 0.8, ..base },
            RevealDirection::RotateY => VisualState {
                rotate_y: 90.0,
                ..base
            },
        }
    }

    pub fn lerp(&self, to: &VisualState, t: f64) -> VisualState {
        VisualState {
            opacity: lerp(self.opacity, to.opacity, t),
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            scale: lerp(self.scale, to.scale, t),
            rotate_y: lerp(self.rotate_y, to.rotate_y, t),
        }
    }

    /// CSS `transform` value
    pub fn transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}) rotateY({}deg)",
            self.x, self.y, self.scale, self.rotate_y
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: VisualState,
    to: VisualState,
    start: Duration,
    duration: Duration,
}

impl Transition {
    fn sample(&self, now: Duration) -> VisualState {
        if now < self.start {
            return self.from;
        }
        let t = progress_at(self.start, self.duration, now);
        if t >= 1.0 {
            return self.to;
        }
        self.from
            .lerp(&self.to, Easing::Bezier(CubicBezier::REVEAL).apply(t))
    }
}

#[derive(Debug)]
struct RevealState {
    props: RevealProps,
    hidden: VisualState,
    visible: bool,
    /// Visible at mount; the entrance starts on the first render
    pending: bool,
    transition: Option<Transition>,
}

impl RevealState {
    fn sample(&self, now: Duration) -> VisualState {
        self.transition
            .map(|transition| transition.sample(now))
            .unwrap_or(self.hidden)
    }

    fn on_visibility(&mut self, visible: bool, at: Duration) {
        // a reported change supersedes visibility captured at mount
        self.pending = false;
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        let from = self.sample(at);
        let (to, delay) = if visible {
            (VisualState::NEUTRAL, self.props.delay())
        } else {
            (self.hidden, Duration::ZERO)
        };
        self.transition = Some(Transition {
            from,
            to,
            start: at + delay,
            duration: self.props.duration(),
        });
        tracing::trace!(visible, at_ms = at.as_millis() as u64, "Reveal transition");
    }
}

/// Content wrapped in an entrance transition
pub struct Reveal<C> {
    content: C,
    element: ElementId,
    state: Rc<RefCell<RevealState>>,
    _handle: IntersectionHandle,
}

impl<C> Reveal<C> {
    /// Start observing `element` and wrap `content`
    pub fn mount(
        tracker: &IntersectionTracker,
        element: ElementId,
        props: RevealProps,
        content: C,
    ) -> Self {
        let state = Rc::new(RefCell::new(RevealState {
            props,
            hidden: VisualState::hidden(props.direction, props.distance),
            visible: false,
            pending: false,
            transition: None,
        }));

        let weak: Weak<RefCell<RevealState>> = Rc::downgrade(&state);
        let (handle, visible) = tracker.observe(
            element,
            props.intersection_options(),
            move |entry: &IntersectionEntry| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                if let Ok(mut state) = state.try_borrow_mut() {
                    state.on_visibility(entry.visible, entry.at);
                };
            },
        );
        state.borrow_mut().pending = visible;

        Self {
            content,
            element,
            state,
            _handle: handle,
        }
    }

    /// Content and the visual state to draw it with at `now`
    pub fn render(&self, now: Duration) -> (&C, VisualState) {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.pending) {
            state.on_visibility(true, now);
        }
        (&self.content, state.sample(now))
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn props(&self) -> RevealProps {
        self.state.borrow().props
    }

    /// Whether the content is revealed or revealing
    pub fn is_revealed(&self) -> bool {
        let state = self.state.borrow();
        state.visible || state.pending
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    pub fn into_inner(self) -> C {
        self.content
    }
}

impl<C: fmt::Debug> fmt::Debug for Reveal<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reveal")
            .field("element", &self.element)
            .field("content", &self.content)
            .field("revealed", &self.is_revealed())
            .finish()
    }
}

/// Children of one section, revealed together with a per-child stagger
#[derive(Debug)]
pub struct RevealGroup<C> {
    children: Vec<Reveal<C>>,
}

impl<C> RevealGroup<C> {
    /// Reveal every child when `element` becomes visible; child `i` waits an
    /// extra `stagger.delay_ms(i)`
    pub fn mount<I>(
        tracker: &IntersectionTracker,
        element: ElementId,
        props: RevealProps,
        stagger: Stagger,
        contents: I,
    ) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let children = contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let extra = stagger.delay_ms(index).max(0.0).round() as u64;
                let props = RevealProps {
                    delay_ms: props.delay_ms + extra,
                    ..props
                };
                Reveal::mount(tracker, element, props, content)
            })
            .collect();
        Self { children }
    }

    pub fn render(&self, now: Duration) -> Vec<(&C, VisualState)> {
        self.children.iter().map(|child| child.render(now)).collect()
    }

    pub fn children(&self) -> &[Reveal<C>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stagger::stagger;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_hidden_states() {
        let up = VisualState::hidden(RevealDirection::Up, 30.0);
        assert_eq!(up.opacity, 0.0);
        assert_eq!((up.x, up.y), (0.0, 30.0));
        assert_eq!(VisualState::hidden(RevealDirection::Down, 30.0).y, -30.0);
        assert_eq!(VisualState::hidden(RevealDirection::Left, 30.0).x, 30.0);
        assert_eq!(VisualState::hidden(RevealDirection::Right, 30.0).x, -30.0);
        assert_eq!(VisualState::hidden(RevealDirection::Scale, 30.0).scale, 0.8);
        assert_eq!(VisualState::hidden(RevealDirection::RotateY, 30.0).rotate_y, 90.0);
    }

    #[test]
    fn test_reveal_after_delay() {
        let tracker = IntersectionTracker::new();
        let element = ElementId::new();
        let props = RevealProps {
            delay_ms: 100,
            ..Default::default()
        };
        let reveal = Reveal::mount(&tracker, element, props, "card");

        let (content, hidden) = reveal.render(ms(0));
        assert_eq!(*content, "card");
        assert_eq!(hidden, VisualState::hidden(RevealDirection::Up, 30.0));

        tracker.report_ratio(element, 0.5, ms(1000));
        assert!(reveal.is_revealed());
        // still waiting out the delay
        assert_eq!(reveal.render(ms(1050)).1, hidden);

        let (_, mid) = reveal.render(ms(1400));
        assert!(mid.opacity > 0.0 && mid.opacity < 1.0);
        assert!(mid.y > 0.0 && mid.y < 30.0);

        assert_eq!(reveal.render(ms(1700)).1, VisualState::NEUTRAL);
    }

    #[test]
    fn test_once_never_rehides() {
        let tracker = IntersectionTracker::new();
        let element = ElementId::new();
        let reveal = Reveal::mount(&tracker, element, RevealProps::default(), ());

        tracker.report_ratio(element, 1.0, ms(0));
        tracker.report_ratio(element, 0.0, ms(700));
        assert_eq!(reveal.render(ms(2000)).1, VisualState::NEUTRAL);
        assert_eq!(tracker.observer_count(), 0);
    }

    #[test]
    fn test_repeatable_reveal_hides_again() {
        let tracker = IntersectionTracker::new();
        let element = ElementId::new();
        let props = RevealProps {
            direction: RevealDirection::Scale,
            once: false,
            ..Default::default()
        };
        let reveal = Reveal::mount(&tracker, element, props, ());

        tracker.report_ratio(element, 1.0, ms(0));
        assert_eq!(reveal.render(ms(600)).1, VisualState::NEUTRAL);

        tracker.report_ratio(element, 0.0, ms(1000));
        assert!(!reveal.is_revealed());
        let hidden = VisualState::hidden(RevealDirection::Scale, 30.0);
        assert_eq!(reveal.render(ms(1600)).1, hidden);
    }

    #[test]
    fn test_exit_starts_from_current_state() {
        let tracker = IntersectionTracker::new();
        let element = ElementId::new();
        let props = RevealProps {
            once: false,
            ..Default::default()
        };
        let reveal = Reveal::mount(&tracker, element, props, ());

        tracker.report_ratio(element, 1.0, ms(0));
        let partway = reveal.render(ms(300)).1;
        tracker.report_ratio(element, 0.0, ms(300));
        // no jump when the direction reverses mid-flight
        assert_eq!(reveal.render(ms(300)).1, partway);
    }

    #[test]
    fn test_mount_when_already_visible() {
        let tracker = IntersectionTracker::new();
        let element = ElementId::new();
        let (_watcher, _) = tracker.observe(element, IntersectionOptions::default(), |_| {});
        tracker.report_ratio(element, 1.0, ms(0));

        let reveal = Reveal::mount(&tracker, element, RevealProps::default(), ());
        assert!(reveal.is_revealed());
        assert_eq!(reveal.render(ms(5000)).1.opacity, 0.0);
        assert_eq!(reveal.render(ms(5600)).1, VisualState::NEUTRAL);
    }

    #[test]
    fn test_drop_unobserves() {
        let tracker = IntersectionTracker::new();
        let element = ElementId::new();
        let reveal = Reveal::mount(&tracker, element, RevealProps::default(), 1);
        assert_eq!(tracker.subscriber_count(element), 1);
        assert_eq!(reveal.into_inner(), 1);
        assert_eq!(tracker.observer_count(), 0);
    }

    #[test]
    fn test_group_staggers_children() {
        let tracker = IntersectionTracker::new();
        let section = ElementId::new();
        let group = RevealGroup::mount(
            &tracker,
            section,
            RevealProps::default(),
            stagger(100.0),
            ["a", "b", "c"],
        );
        assert_eq!(group.len(), 3);
        // one underlying observer for the whole section
        assert_eq!(tracker.observer_count(), 1);
        assert_eq!(tracker.subscriber_count(section), 3);

        tracker.report_ratio(section, 1.0, ms(0));
        let frame = group.render(ms(650));
        assert_eq!(frame[0].1, VisualState::NEUTRAL);
        assert!(frame[1].1.opacity < 1.0);
        assert!(frame[2].1.opacity < frame[1].1.opacity);
        assert_eq!(*frame[2].0, "c");

        let delays: Vec<u64> = group.children().iter().map(|c| c.props().delay_ms).collect();
        assert_eq!(delays, vec![0, 100, 200]);
    }

    #[test]
    fn test_props_deserialize_defaults() {
        let props: RevealProps = toml::from_str(r#"direction = "left""#).unwrap();
        assert_eq!(props.direction, RevealDirection::Left);
        assert_eq!(props.duration_ms, 600);
        assert_eq!(props.distance, 30.0);
        assert!(props.once);
    }
}
