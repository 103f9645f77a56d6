//! Scroll progress tracker
//!
//! Turns raw scroll samples into a normalized [`ScrollState`] and fans it out
//! to subscribers. Every sample is processed; rate limiting belongs to the
//! caller (see [`crate::throttle`]).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::timing::as_millis_f64;

/// Sign of the most recent scroll velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    #[default]
    None,
}

impl ScrollDirection {
    fn from_velocity(velocity: f64) -> Self {
        if velocity > 0.0 {
            ScrollDirection::Down
        } else if velocity < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::None
        }
    }
}

/// Snapshot of the page scroll
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    /// Page progress in [0, 1]
    pub progress: f64,
    /// Signed pixels per millisecond
    pub velocity: f64,
    pub direction: ScrollDirection,
    pub scroll_y: f64,
    /// Session time of the sample that produced this state
    pub at: Duration,
}

/// One raw scroll event from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
    pub at: Duration,
}

/// `clamp(scroll_y / (document_height - viewport_height), 0, 1)`, or 0 when
/// the document does not scroll
pub fn scroll_progress(scroll_y: f64, viewport_height: f64, document_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable.is_nan() || scrollable <= 0.0 || !scroll_y.is_finite() {
        return 0.0;
    }
    let progress = scroll_y / scrollable;
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

type Callback = Rc<RefCell<dyn FnMut(&ScrollState)>>;

struct Subscriber {
    token: u64,
    live: Rc<Cell<bool>>,
    callback: Callback,
}

#[derive(Default)]
struct TrackerInner {
    state: ScrollState,
    /// Position and time of the previous sample
    previous: Option<(f64, Duration)>,
    subscribers: Vec<Subscriber>,
    next_token: u64,
}

/// Owner of the page's `ScrollState`; clones share the same state
#[derive(Clone, Default)]
pub struct ScrollTracker {
    inner: Rc<RefCell<TrackerInner>>,
}

impl fmt::Debug for ScrollTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollTracker")
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state snapshot
    pub fn state(&self) -> ScrollState {
        self.inner.borrow().state
    }

    /// Fold one scroll event into the state and notify subscribers
    ///
    /// The state is fully written before any subscriber runs, and every
    /// subscriber of this tick receives the same snapshot.
    pub fn record(&self, sample: ScrollSample) -> ScrollState {
        let (state, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            let previous_state = inner.state;

            let scroll_y = if sample.scroll_y.is_finite() {
                sample.scroll_y
            } else {
                tracing::warn!("Non-finite scroll position, keeping previous");
                previous_state.scroll_y
            };

            let velocity = match inner.previous {
                Some((prev_y, prev_at)) if sample.at > prev_at => {
                    (scroll_y - prev_y) / as_millis_f64(sample.at - prev_at)
                }
                // no elapsed time: keep the last estimate
                Some(_) => previous_state.velocity,
                None => 0.0,
            };

            let state = ScrollState {
                progress: scroll_progress(scroll_y, sample.viewport_height, sample.document_height),
                velocity,
                direction: ScrollDirection::from_velocity(velocity),
                scroll_y,
                at: sample.at,
            };
            inner.state = state;
            inner.previous = Some((scroll_y, sample.at));

            let callbacks: Vec<_> = inner
                .subscribers
                .iter()
                .map(|sub| (sub.live.clone(), sub.callback.clone()))
                .collect();
            (state, callbacks)
        };

        tracing::trace!(
            progress = state.progress,
            velocity = state.velocity,
            direction = ?state.direction,
            "Scroll tick"
        );

        for (live, callback) in callbacks {
            if !live.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(&state),
                Err(_) => tracing::trace!("Skipping re-entrant scroll callback"),
            };
        }
        state
    }

    /// Subscribe to every future state update
    pub fn subscribe<F>(&self, callback: F) -> ScrollSubscription
    where
        F: FnMut(&ScrollState) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;
        let live = Rc::new(Cell::new(true));
        let callback: Callback = Rc::new(RefCell::new(callback));
        inner.subscribers.push(Subscriber {
            token,
            live: live.clone(),
            callback,
        });
        ScrollSubscription {
            token,
            inner: Rc::downgrade(&self.inner),
            live,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Forget history and state, keeping subscribers
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.state = ScrollState::default();
        inner.previous = None;
    }
}

/// Handle to a scroll subscription; dropping it unsubscribes
pub struct ScrollSubscription {
    token: u64,
    inner: Weak<RefCell<TrackerInner>>,
    live: Rc<Cell<bool>>,
}

impl ScrollSubscription {
    pub fn is_active(&self) -> bool {
        self.live.get()
    }

    /// Stop delivery. Idempotent; unknown or stale handles are a no-op.
    pub fn unsubscribe(&self) {
        if !self.live.replace(false) {
            return;
        }
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let removed = {
            let Ok(mut inner) = inner.try_borrow_mut() else {
                return;
            };
            inner
                .subscribers
                .iter()
                .position(|sub| sub.token == self.token)
                .map(|index| inner.subscribers.remove(index))
        };
        drop(removed);
    }
}

impl Drop for ScrollSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for ScrollSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollSubscription")
            .field("token", &self.token)
            .field("active", &self.is_active())
            .finish()
    }
}
