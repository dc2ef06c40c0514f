//! Presentation engine — minifb window, input polling, and the frame loop.
//!
//! The framebuffer matches the configured display size with 32-bit ARGB
//! pixels; minifb stretches it when the window is resized. One simulation
//! tick per frame.

pub mod font;
pub mod headless;
pub mod raster;

use std::time::{Duration, Instant};

use anyhow::Result;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::game::draw::{palette, DrawList};
use crate::game::vehicle::Controls;
use crate::game::{SimEvent, Simulation};

use raster::Canvas;

/// Longest frame time fed to the simulation clock (after a stall)
const MAX_FRAME: Duration = Duration::from_millis(100);

const ANSWER_KEYS: [(Key, Key); 4] = [
    (Key::Key1, Key::NumPad1),
    (Key::Key2, Key::NumPad2),
    (Key::Key3, Key::NumPad3),
    (Key::Key4, Key::NumPad4),
];

/// Read the four control flags. Arrows and WASD are interchangeable.
fn poll_controls(window: &Window) -> Controls {
    let down = |a: Key, b: Key| window.is_key_down(a) || window.is_key_down(b);
    Controls {
        accelerate: down(Key::Up, Key::W),
        reverse: down(Key::Down, Key::S),
        turn_left: down(Key::Left, Key::A),
        turn_right: down(Key::Right, Key::D),
    }
}

/// Log what the simulation reports. Shared with the headless driver.
pub fn log_events(events: &[SimEvent]) {
    for event in events {
        match event {
            SimEvent::Started { session_id, scenarios } => {
                tracing::info!("Session {} started ({} scenarios)", session_id, scenarios)
            }
            SimEvent::ScenarioPresented(p) => {
                tracing::info!("Scenario {}/{}: {}", p.position, p.total, p.scenario.title)
            }
            SimEvent::AnswerResolved(r) => tracing::info!(
                "Answered '{}': {}",
                r.outcome.title,
                if r.outcome.is_correct { "correct" } else { "wrong" }
            ),
            SimEvent::DrivingResumed => tracing::debug!("Driving resumed"),
            SimEvent::Ended { summary, .. } => tracing::info!(
                "Session ended: {}/{} correct ({}%) in {}s",
                summary.correct,
                summary.total,
                summary.accuracy,
                summary.elapsed_secs
            ),
            SimEvent::Abandoned { persisted } => {
                tracing::info!("Session abandoned (partial result persisted: {})", persisted)
            }
        }
    }
}

/// Run the simulation in a window until it is closed
pub fn run(mut sim: Simulation, submit_timeout: Duration) -> Result<()> {
    let display = sim.config().display.clone();
    let (width, height) = (display.width, display.height);

    let options = WindowOptions {
        resize: true,
        scale_mode: minifb::ScaleMode::AspectRatioStretch,
        ..Default::default()
    };
    let mut window = Window::new("DriveSim", width, height, options)
        .map_err(|e| anyhow::anyhow!("Window creation failed: {}", e))?;
    window.set_target_fps(display.fps as usize);

    let mut framebuffer = vec![0u32; width * height];
    let mut scene = DrawList::new();
    let mut minimap = DrawList::new();
    let mut frame_count: u64 = 0;
    let mut last = Instant::now();

    tracing::info!("Engine initialized, entering frame loop");
    tracing::info!("Controls: Arrows/WASD=drive | 1-4=answer | P=pause | R=restart | Esc=end");
    log_events(&sim.start());

    while window.is_open() {
        let now = Instant::now();
        let dt = (now - last).min(MAX_FRAME);
        last = now;

        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            if sim.is_ended() {
                break;
            }
            log_events(&sim.end());
        }
        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            sim.toggle_pause();
        }
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            log_events(&sim.restart());
        }
        // Answer keys are ignored while paused
        if sim.is_running() && sim.prompt().is_some() {
            for (index, (key, pad)) in ANSWER_KEYS.iter().enumerate() {
                if window.is_key_pressed(*key, KeyRepeat::No) || window.is_key_pressed(*pad, KeyRepeat::No) {
                    match sim.answer(index) {
                        Ok(events) => log_events(&events),
                        Err(e) => tracing::debug!("Answer ignored: {}", e),
                    }
                    break;
                }
            }
        }

        let events = sim.tick(dt, poll_controls(&window));
        log_events(&events);
        sim.poll_submission();

        // Render
        scene.clear();
        minimap.clear();
        sim.render(&mut scene);
        sim.render_minimap(&mut minimap);
        let mut canvas = Canvas::new(&mut framebuffer, width, height);
        canvas.clear(palette::BLACK);
        canvas.draw(&scene);
        canvas.draw(&minimap);
        tracing::trace!("Frame {}: {} + {} draw commands", frame_count, scene.len(), minimap.len());

        frame_count += 1;
        if frame_count % 30 == 0 {
            let title = format!(
                "DriveSim - {} | {} km/h | {}/{} answered",
                sim.config().gateway.simulation_kind.display_name(),
                sim.vehicle().display_speed(),
                sim.stats().total(),
                sim.scenarios().session().len()
            );
            window.set_title(&title);
        }

        window
            .update_with_buffer(&framebuffer, width, height)
            .map_err(|e| anyhow::anyhow!("Display error: {}", e))?;
    }

    if !sim.is_ended() {
        log_events(&sim.abandon());
    }
    sim.wait_for_submission(submit_timeout);

    tracing::info!("Engine shutdown");
    Ok(())
}
