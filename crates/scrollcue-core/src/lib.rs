pub mod config;
pub mod counter;
pub mod draw;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod intersection;
pub mod reveal;
pub mod scroll;
pub mod stagger;
pub mod throttle;
pub mod transform;

pub use config::{MotionConfig, SmoothScrollConfig};
pub use draw::{AnimationConfig, AnimationRun, Delay, DrawDriver, DrawFrame, Drawable, RunPhase};
pub use easing::{CubicBezier, Easing};
pub use error::{Error, Result};
pub use geometry::{Rect, RootMargin};
pub use intersection::{ElementId, IntersectionEntry, IntersectionHandle, IntersectionOptions, IntersectionTracker};
pub use reveal::{Reveal, RevealDirection, RevealGroup, RevealProps, VisualState};
pub use scroll::{get_scroll_state, on_scroll_state, ScrollState, ScrollTracker};
pub use stagger::{stagger, Stagger};
