//! Viewport intersection tracker
//!
//! Produces a per-subscriber "is this element visible" signal from raw
//! intersection ratios or element geometry reported by the host.
//!
//! Each observed element has exactly one registry record, however many logical
//! subscribers it has. Subscribers carry their own threshold, root margin and
//! `once` policy, and get a callback only when their own visibility flips.
//! The latest report for an element is kept until [`IntersectionTracker::forget`],
//! so a late subscriber starts from the element's actual state.
//!
//! Callbacks never run while the registry is borrowed, so a callback may freely
//! observe or unobserve. Every dispatch checks the subscriber's liveness flag
//! first: once `unobserve` returns, no further callback is delivered.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{intersection_ratio, Rect, RootMargin};

/// Opaque identity of a visual element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-subscriber observation options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionOptions {
    /// Minimum visible ratio that counts as visible
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Margin applied to the viewport before computing ratios from geometry
    #[serde(default)]
    pub root_margin: RootMargin,
    /// Stop observing after the first transition to visible
    #[serde(default)]
    pub once: bool,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            root_margin: RootMargin::default(),
            once: false,
        }
    }
}

impl IntersectionOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    fn normalized(mut self) -> Self {
        if self.threshold.is_nan() {
            tracing::warn!("NaN intersection threshold, using default");
            self.threshold = default_threshold();
        }
        self.threshold = self.threshold.clamp(0.0, 1.0);
        self
    }
}

fn default_threshold() -> f64 {
    0.1
}

#[inline]
fn is_visible(ratio: f64, threshold: f64) -> bool {
    ratio > 0.0 && ratio >= threshold
}

/// Delivered to a subscriber whenever its visibility flips
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub element: ElementId,
    pub visible: bool,
    pub ratio: f64,
    pub at: Duration,
}

type Callback = Rc<RefCell<dyn FnMut(&IntersectionEntry)>>;

struct Subscriber {
    token: u64,
    options: IntersectionOptions,
    visible: Rc<Cell<bool>>,
    live: Rc<Cell<bool>>,
    callback: Callback,
}

/// What the host last told us about an element
#[derive(Debug, Clone, Copy)]
enum Sample {
    Ratio(f64),
    Geometry { bounds: Rect, viewport: Rect },
}

impl Sample {
    fn ratio_for(&self, options: &IntersectionOptions) -> f64 {
        match self {
            Sample::Ratio(ratio) => *ratio,
            Sample::Geometry { bounds, viewport } => {
                intersection_ratio(bounds, viewport, &options.root_margin)
            }
        }
    }
}

/// Registry record for one observed element
struct ObservedElement {
    subscribers: Vec<Subscriber>,
}

#[derive(Default)]
struct Registry {
    next_token: u64,
    elements: HashMap<ElementId, ObservedElement>,
    /// Latest report per element; outlives subscribers until `forget`
    samples: HashMap<ElementId, Sample>,
}

struct Dispatch {
    live: Rc<Cell<bool>>,
    callback: Callback,
    entry: IntersectionEntry,
    retire: bool,
}

/// Shared, single-threaded intersection registry
#[derive(Clone, Default)]
pub struct IntersectionTracker {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for IntersectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntersectionTracker")
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl IntersectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `element`
    ///
    /// Returns the subscription handle and the element's current visibility
    /// under `options`. With `once` set and the element already visible, the
    /// returned handle is already inactive and the callback never fires.
    pub fn observe<F>(
        &self,
        element: ElementId,
        options: IntersectionOptions,
        callback: F,
    ) -> (IntersectionHandle, bool)
    where
        F: FnMut(&IntersectionEntry) + 'static,
    {
        let options = options.normalized();
        let mut registry = self.registry.borrow_mut();

        let current = registry
            .samples
            .get(&element)
            .map(|sample| is_visible(sample.ratio_for(&options), options.threshold))
            .unwrap_or(false);

        if current && options.once {
            tracing::debug!(%element, "Element already visible, once-subscription satisfied");
            return (IntersectionHandle::detached(element, true), true);
        }

        let token = registry.next_token;
        registry.next_token += 1;

        let live = Rc::new(Cell::new(true));
        let visible = Rc::new(Cell::new(current));
        let callback: Callback = Rc::new(RefCell::new(callback));

        registry
            .elements
            .entry(element)
            .or_insert_with(|| {
                tracing::trace!(%element, "Attaching element observer");
                ObservedElement {
                    subscribers: Vec::new(),
                }
            })
            .subscribers
            .push(Subscriber {
                token,
                options,
                visible: visible.clone(),
                live: live.clone(),
                callback,
            });

        let handle = IntersectionHandle {
            element,
            token,
            registry: Rc::downgrade(&self.registry),
            live,
            visible,
        };
        (handle, current)
    }

    /// Report a raw intersection ratio for an element, as measured by the host
    ///
    /// The ratio is used as-is for every subscriber; root margins only apply
    /// to geometry reports.
    pub fn report_ratio(&self, element: ElementId, ratio: f64, at: Duration) {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        self.dispatch(element, Sample::Ratio(ratio), at);
    }

    /// Report element bounds and viewport bounds in the same coordinate space
    pub fn report_geometry(&self, element: ElementId, bounds: Rect, viewport: Rect, at: Duration) {
        self.dispatch(element, Sample::Geometry { bounds, viewport }, at);
    }

    /// Tear down every subscription on an element and drop its last report,
    /// e.g. when it unmounts
    pub fn forget(&self, element: ElementId) {
        let removed = {
            let mut registry = self.registry.borrow_mut();
            registry.samples.remove(&element);
            registry.elements.remove(&element)
        };
        if let Some(observed) = removed {
            for sub in &observed.subscribers {
                sub.live.set(false);
            }
            tracing::trace!(%element, count = observed.subscribers.len(), "Forgot element");
        }
    }

    /// Number of elements with at least one live subscriber
    pub fn observer_count(&self) -> usize {
        self.registry.borrow().elements.len()
    }

    /// Number of live subscribers on an element
    pub fn subscriber_count(&self, element: ElementId) -> usize {
        self.registry
            .borrow()
            .elements
            .get(&element)
            .map(|observed| observed.subscribers.len())
            .unwrap_or(0)
    }

    fn dispatch(&self, element: ElementId, sample: Sample, at: Duration) {
        let mut pending = Vec::new();
        let mut retired = Vec::new();
        {
            let mut registry = self.registry.borrow_mut();
            registry.samples.insert(element, sample);
            let Some(observed) = registry.elements.get_mut(&element) else {
                return;
            };

            for sub in std::mem::take(&mut observed.subscribers) {
                if !sub.live.get() {
                    retired.push(sub);
                    continue;
                }
                let ratio = sample.ratio_for(&sub.options);
                let visible = is_visible(ratio, sub.options.threshold);
                if visible == sub.visible.get() {
                    observed.subscribers.push(sub);
                    continue;
                }
                sub.visible.set(visible);
                let retire = visible && sub.options.once;
                pending.push(Dispatch {
                    live: sub.live.clone(),
                    callback: sub.callback.clone(),
                    entry: IntersectionEntry {
                        element,
                        visible,
                        ratio,
                        at,
                    },
                    retire,
                });
                if retire {
                    retired.push(sub);
                } else {
                    observed.subscribers.push(sub);
                }
            }

            if observed.subscribers.is_empty() {
                registry.elements.remove(&element);
            }
        }
        // Retired subscribers may own handles whose drop touches the registry
        drop(retired);

        for Dispatch {
            live,
            callback,
            entry,
            retire,
        } in pending
        {
            if live.get() {
                match callback.try_borrow_mut() {
                    Ok(mut callback) => (&mut *callback)(&entry),
                    Err(_) => tracing::trace!(%element, "Skipping re-entrant intersection callback"),
                }
            }
            if retire {
                live.set(false);
            }
        }
    }
}

/// Subscription to one element's visibility; dropping it unobserves
pub struct IntersectionHandle {
    element: ElementId,
    token: u64,
    registry: Weak<RefCell<Registry>>,
    live: Rc<Cell<bool>>,
    visible: Rc<Cell<bool>>,
}

impl IntersectionHandle {
    fn detached(element: ElementId, visible: bool) -> Self {
        Self {
            element,
            token: u64::MAX,
            registry: Weak::new(),
            live: Rc::new(Cell::new(false)),
            visible: Rc::new(Cell::new(visible)),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Latest visibility seen by this subscription
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Whether callbacks can still be delivered
    pub fn is_active(&self) -> bool {
        self.live.get()
    }

    /// Stop observing. Safe to call any number of times, and after the
    /// tracker or the element is gone.
    pub fn unobserve(&self) {
        if !self.live.replace(false) {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = {
            let Ok(mut registry) = registry.try_borrow_mut() else {
                // liveness flag already blocks delivery; the record is swept
                // on the element's next dispatch
                return;
            };
            let Some(observed) = registry.elements.get_mut(&self.element) else {
                return;
            };
            let removed = observed
                .subscribers
                .iter()
                .position(|sub| sub.token == self.token)
                .map(|index| observed.subscribers.remove(index));
            if observed.subscribers.is_empty() {
                registry.elements.remove(&self.element);
                tracing::trace!(element = %self.element, "Detached element observer");
            }
            removed
        };
        drop(removed);
    }
}

impl Drop for IntersectionHandle {
    fn drop(&mut self) {
        self.unobserve();
    }
}

impl fmt::Debug for IntersectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntersectionHandle")
            .field("element", &self.element)
            .field("active", &self.is_active())
            .field("visible", &self.is_visible())
            .finish()
    }
}
