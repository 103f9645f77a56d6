//! Frame-by-frame replay of a scenario through the trigger layer

use std::time::Duration;

use serde::Serialize;

use scrollcue_core::draw::StrokeDash;
use scrollcue_core::geometry::Rect;
use scrollcue_core::scroll::{ScrollDirection, ScrollSample, SmoothScroller};
use scrollcue_core::throttle::Throttle;
use scrollcue_core::{
    AnimationRun, DrawDriver, DrawFrame, Drawable, ElementId, IntersectionTracker, MotionConfig,
    Reveal, RunPhase, ScrollTracker, VisualState,
};

use crate::scenario::{Scenario, Waypoint};

/// Something observable that happened during a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Scroll {
        at_ms: u64,
        y: f64,
        progress: f64,
        direction: ScrollDirection,
    },
    Revealed {
        at_ms: u64,
        element: String,
    },
    Hidden {
        at_ms: u64,
        element: String,
    },
    Settled {
        at_ms: u64,
        element: String,
        visual: VisualState,
    },
    DrawPhase {
        at_ms: u64,
        element: String,
        phase: RunPhase,
        frame: DrawFrame,
        stroke: StrokeDash,
    },
}

struct RevealTrack {
    name: String,
    reveal: Reveal<()>,
    revealed: bool,
    settled: bool,
}

struct DrawTrack {
    name: String,
    drawable: Drawable,
    run: AnimationRun,
    phase: RunPhase,
}

struct Placement {
    id: ElementId,
    top: f64,
    height: f64,
}

pub struct Simulation {
    viewport: Rect,
    document_height: f64,
    max_scroll: f64,
    waypoints: Vec<Waypoint>,
    next_waypoint: usize,
    intersection: IntersectionTracker,
    scroll: ScrollTracker,
    driver: DrawDriver,
    scroller: SmoothScroller,
    throttle: Throttle<ScrollSample>,
    placements: Vec<Placement>,
    reveals: Vec<RevealTrack>,
    draws: Vec<DrawTrack>,
    last_direction: ScrollDirection,
}

impl Simulation {
    pub fn new(scenario: &Scenario, config: &MotionConfig) -> Self {
        let intersection = IntersectionTracker::new();
        let scroll = ScrollTracker::new();
        let mut driver = DrawDriver::with_scroll_tracker(intersection.clone(), scroll.clone());

        let mut placements = Vec::new();
        let mut reveals = Vec::new();
        let mut draws = Vec::new();
        for element in &scenario.elements {
            let id = ElementId::new();
            placements.push(Placement {
                id,
                top: element.top,
                height: element.height,
            });

            if let Some(props) = element.reveal_props(config) {
                reveals.push(RevealTrack {
                    name: element.name.clone(),
                    reveal: Reveal::mount(&intersection, id, props, ()),
                    revealed: false,
                    settled: false,
                });
            }

            if let Some(spec) = &element.draw {
                let drawable = Drawable::with_id(id, spec.path_length);
                let run = driver.animate(Some(&drawable), spec.animation_config(&config.draw));
                draws.push(DrawTrack {
                    name: element.name.clone(),
                    phase: run.phase(),
                    drawable,
                    run,
                });
            }
        }

        tracing::debug!(
            elements = placements.len(),
            reveals = reveals.len(),
            draws = draws.len(),
            "Simulation ready"
        );

        Self {
            viewport: Rect::new(0.0, 0.0, scenario.viewport_width, scenario.viewport_height),
            document_height: scenario.document_height,
            max_scroll: scenario.max_scroll(),
            waypoints: scenario.waypoints.clone(),
            next_waypoint: 0,
            intersection,
            scroll,
            driver,
            scroller: SmoothScroller::new(config.smooth_scroll.clone()),
            throttle: Throttle::from_config(&config.throttle),
            placements,
            reveals,
            draws,
            last_direction: ScrollDirection::None,
        }
    }

    /// Advance one frame to `now`
    pub fn step(&mut self, now: Duration) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let at_ms = now.as_millis() as u64;

        while let Some(waypoint) = self.waypoints.get(self.next_waypoint) {
            if waypoint.at_ms > at_ms {
                break;
            }
            self.scroller.scroll_to(waypoint.y, self.max_scroll, now);
            self.next_waypoint += 1;
        }

        let scroll_y = self.scroller.update(self.max_scroll, now);
        let sample = ScrollSample {
            scroll_y,
            viewport_height: self.viewport.height,
            document_height: self.document_height,
            at: now,
        };
        let due = self
            .throttle
            .offer(sample, now)
            .or_else(|| self.throttle.poll(now));
        if let Some(sample) = due {
            self.process(sample, &mut events);
        }

        self.driver.tick(now);
        self.collect(now, &mut events);
        events
    }

    /// Whether anything is still moving or waiting to move
    pub fn is_busy(&self) -> bool {
        self.next_waypoint < self.waypoints.len()
            || self.scroller.needs_update()
            || self.throttle.has_pending()
    }

    fn process(&mut self, sample: ScrollSample, events: &mut Vec<SimEvent>) {
        let state = self.scroll.record(sample);
        if state.direction != self.last_direction || state.direction != ScrollDirection::None {
            events.push(SimEvent::Scroll {
                at_ms: sample.at.as_millis() as u64,
                y: state.scroll_y,
                progress: state.progress,
                direction: state.direction,
            });
        }
        self.last_direction = state.direction;

        for placement in &self.placements {
            let bounds = Rect::new(
                0.0,
                placement.top - sample.scroll_y,
                self.viewport.width,
                placement.height,
            );
            self.intersection
                .report_geometry(placement.id, bounds, self.viewport, sample.at);
        }
    }

    fn collect(&mut self, now: Duration, events: &mut Vec<SimEvent>) {
        let at_ms = now.as_millis() as u64;

        for track in &mut self.reveals {
            let revealed = track.reveal.is_revealed();
            if revealed != track.revealed {
                track.revealed = revealed;
                track.settled = false;
                events.push(if revealed {
                    SimEvent::Revealed {
                        at_ms,
                        element: track.name.clone(),
                    }
                } else {
                    SimEvent::Hidden {
                        at_ms,
                        element: track.name.clone(),
                    }
                });
            }
            let (_, visual) = track.reveal.render(now);
            if revealed && !track.settled && visual == VisualState::NEUTRAL {
                track.settled = true;
                events.push(SimEvent::Settled {
                    at_ms,
                    element: track.name.clone(),
                    visual,
                });
            }
        }

        for track in &mut self.draws {
            let phase = track.run.phase();
            if phase != track.phase {
                track.phase = phase;
                events.push(SimEvent::DrawPhase {
                    at_ms,
                    element: track.name.clone(),
                    phase,
                    frame: track.drawable.frame(),
                    stroke: track.drawable.stroke_dash(),
                });
            }
        }
    }

    pub fn active_runs(&self) -> usize {
        self.driver.active_runs()
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroller.current_scroll()
    }
}
