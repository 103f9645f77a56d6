use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use scrollcue_core::MotionConfig;

use crate::scenario::Scenario;
use crate::simulation::{SimEvent, Simulation};

pub async fn run(
    config: &MotionConfig,
    path: &Path,
    fps: Option<u32>,
    json: bool,
    realtime: bool,
) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let mut smooth = config.smooth_scroll.clone();
    if let Some(fps) = fps {
        smooth.fps = fps;
    }
    let frame = smooth.tick_duration();
    let end = Duration::from_millis(scenario.duration_ms(config));

    let mut config = config.clone();
    config.smooth_scroll = smooth;
    let mut simulation = Simulation::new(&scenario, &config);

    info!(
        scenario = %path.display(),
        frame_ms = frame.as_millis() as u64,
        end_ms = end.as_millis() as u64,
        "Simulating"
    );

    let events = if realtime {
        drive_realtime(&mut simulation, frame, end).await
    } else {
        drive(&mut simulation, frame, end)
    };

    if json {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
    } else {
        print_events(&events);
    }

    Ok(())
}

/// Step through simulated time as fast as possible
pub fn drive(simulation: &mut Simulation, frame: Duration, end: Duration) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let mut now = Duration::ZERO;
    while now <= end {
        events.extend(simulation.step(now));
        now += frame;
    }
    events
}

/// Step on a wall-clock frame timer
pub async fn drive_realtime(
    simulation: &mut Simulation,
    frame: Duration,
    end: Duration,
) -> Vec<SimEvent> {
    let start = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(frame);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut events = Vec::new();
    loop {
        interval.tick().await;
        let now = start.elapsed();
        if now > end {
            break;
        }
        let frame_events = simulation.step(now);
        for event in &frame_events {
            info!("{}", describe(event));
        }
        events.extend(frame_events);
    }
    events
}

fn print_events(events: &[SimEvent]) {
    let mut scrolls = 0;
    for event in events {
        match event {
            SimEvent::Scroll { .. } => scrolls += 1,
            other => println!("{}", describe(other)),
        }
    }
    println!("\n{} events, {} scroll updates", events.len(), scrolls);
}

fn describe(event: &SimEvent) -> String {
    match event {
        SimEvent::Scroll {
            at_ms,
            y,
            progress,
            direction,
        } => format!(
            "{:>6}ms  scroll    y={:.0} progress={:.3} {:?}",
            at_ms, y, progress, direction
        ),
        SimEvent::Revealed { at_ms, element } => format!("{:>6}ms  revealed  {}", at_ms, element),
        SimEvent::Hidden { at_ms, element } => format!("{:>6}ms  hidden    {}", at_ms, element),
        SimEvent::Settled { at_ms, element, .. } => {
            format!("{:>6}ms  settled   {}", at_ms, element)
        }
        SimEvent::DrawPhase {
            at_ms,
            element,
            phase,
            frame,
            stroke,
        } => format!(
            "{:>6}ms  draw      {} {:?} [{}] {}",
            at_ms, element, phase, frame, stroke
        ),
    }
}
