//! Page scroll tracking and smooth scrolling
//!
//! # Layout
//!
//! - `timing` - Pure time helpers (progress, interpolation, ms conversion)
//! - `tracker` - `ScrollTracker`: scroll samples → `ScrollState` + subscribers
//! - `smooth` - `SmoothScroller`: eased programmatic scrolling
//!
//! # Session state
//!
//! A page session has one scroll state. It lives in a thread-local
//! `ScrollTracker` reached through [`session`]; tests and embedders swap it
//! with [`install_session`] or clear it with [`reset_session`].
//!
//! ```ignore
//! use scrollcue_core::scroll::{self, ScrollSample};
//!
//! let _sub = scroll::on_scroll_state(|state| {
//!     println!("{:.0}% scrolled", state.progress * 100.0);
//! });
//! scroll::session().record(ScrollSample {
//!     scroll_y: 1200.0,
//!     viewport_height: 800.0,
//!     document_height: 4800.0,
//!     at: now,
//! });
//! let state = scroll::get_scroll_state();
//! ```

pub mod smooth;
pub mod timing;
pub mod tracker;

use std::cell::RefCell;

pub use smooth::SmoothScroller;
pub use tracker::{
    scroll_progress, ScrollDirection, ScrollSample, ScrollState, ScrollSubscription, ScrollTracker,
};

thread_local! {
    static SESSION: RefCell<ScrollTracker> = RefCell::new(ScrollTracker::new());
}

/// The scroll tracker for the current page session
pub fn session() -> ScrollTracker {
    SESSION.with(|session| session.borrow().clone())
}

/// Replace the session tracker, returning the previous one
pub fn install_session(tracker: ScrollTracker) -> ScrollTracker {
    SESSION.with(|session| session.replace(tracker))
}

/// Start a fresh session; existing subscriptions stay on the old tracker
pub fn reset_session() {
    drop(install_session(ScrollTracker::new()));
}

/// Snapshot of the session's scroll state
pub fn get_scroll_state() -> ScrollState {
    session().state()
}

/// Subscribe to the session's scroll state
pub fn on_scroll_state<F>(callback: F) -> ScrollSubscription
where
    F: FnMut(&ScrollState) + 'static,
{
    session().subscribe(callback)
}
