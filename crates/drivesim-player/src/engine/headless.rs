//! Headless driver — runs a session without a window.
//!
//! A scripted driver holds the throttle, steers away from the world edge,
//! and answers each scenario after a short "reading" pause with an option
//! picked by its own seeded RNG. Used for smoke runs and kiosk checks.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::game::stats::{DerivedMetrics, Summary};
use crate::game::vehicle::Controls;
use crate::game::{SimEvent, Simulation, Submission};

/// Ticks spent "reading" a question before answering
const THINK_TICKS: u32 = 45;
/// Start turning when the edge ahead is closer than this
const EDGE_LOOKAHEAD: f32 = 300.0;

#[derive(Debug, Clone, Serialize)]
pub struct HeadlessReport {
    pub ticks: u64,
    pub presented: u32,
    pub answered: u32,
    pub summary: Option<Summary>,
    pub metrics: Option<DerivedMetrics>,
    pub submission: String,
}

struct ScriptedDriver {
    rng: ChaCha8Rng,
    answer_in: Option<u32>,
}

impl ScriptedDriver {
    fn controls(&self, sim: &Simulation) -> Controls {
        let v = sim.vehicle();
        let world = sim.world();
        let ahead_x = v.x + v.heading.cos() * EDGE_LOOKAHEAD;
        let ahead_y = v.y + v.heading.sin() * EDGE_LOOKAHEAD;
        let near_edge = ahead_x < 0.0 || ahead_y < 0.0 || ahead_x > world.width || ahead_y > world.height;
        Controls {
            accelerate: true,
            reverse: false,
            turn_left: false,
            turn_right: near_edge,
        }
    }
}

/// Run at most `max_ticks` frames. A session still in progress after that
/// is ended explicitly, so its partial result is handed off too.
pub fn run(
    sim: &mut Simulation,
    max_ticks: u64,
    driver_seed: u64,
    submit_timeout: Duration,
) -> HeadlessReport {
    let fps = sim.config().display.fps.max(1);
    let dt = Duration::from_secs_f64(1.0 / fps as f64);
    let mut driver = ScriptedDriver {
        rng: ChaCha8Rng::seed_from_u64(driver_seed),
        answer_in: None,
    };
    let mut report = HeadlessReport {
        ticks: 0,
        presented: 0,
        answered: 0,
        summary: None,
        metrics: None,
        submission: String::new(),
    };

    let mut events = sim.start();
    super::log_events(&events);

    while report.ticks < max_ticks && !sim.is_ended() {
        let controls = driver.controls(sim);
        events.clear();
        events.extend(sim.tick(dt, controls));
        report.ticks += 1;

        if let Some(left) = driver.answer_in.as_mut() {
            if *left == 0 {
                driver.answer_in = None;
                let options = sim.prompt().map(|p| p.scenario.options.len()).unwrap_or(0);
                let choice = driver.rng.gen_range(0..options.max(1));
                match sim.answer(choice) {
                    Ok(more) => {
                        report.answered += 1;
                        events.extend(more);
                    }
                    Err(e) => tracing::warn!("Scripted answer rejected: {}", e),
                }
            } else {
                *left -= 1;
            }
        }

        for event in &events {
            match event {
                SimEvent::ScenarioPresented(_) => {
                    report.presented += 1;
                    driver.answer_in = Some(THINK_TICKS);
                }
                SimEvent::Ended { summary, metrics } => {
                    report.summary = Some(*summary);
                    report.metrics = Some(*metrics);
                }
                _ => {}
            }
        }
        super::log_events(&events);
    }

    if !sim.is_ended() {
        tracing::info!("Tick limit of {} reached, ending session", max_ticks);
        for event in sim.end() {
            if let SimEvent::Ended { summary, metrics } = event {
                report.summary = Some(summary);
                report.metrics = Some(metrics);
            }
        }
    }

    report.submission = match sim.wait_for_submission(submit_timeout) {
        Submission::NotSubmitted => "not submitted".to_string(),
        Submission::Pending => "pending".to_string(),
        Submission::Delivered(d) => format!("delivered: {:?}", d),
        Submission::Failed(e) => format!("failed: {}", e),
    };
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Catalog;
    use drivesim_common::{SimConfig, TriggerPolicy};
    use drivesim_gateway::MemoryGateway;

    fn sim(trigger: TriggerPolicy) -> (Simulation, MemoryGateway) {
        let mut config = SimConfig::default();
        config.scenarios.seed = Some(5);
        config.scenarios.trigger = trigger;
        config.scenarios.resume_delay_ms = 200;
        let gateway = MemoryGateway::new();
        let sim = Simulation::new(config, Catalog::builtin().unwrap(), Box::new(gateway.clone()));
        (sim, gateway)
    }

    #[test]
    fn scripted_session_completes() {
        let (mut sim, gateway) = sim(TriggerPolicy::DistanceTravelled { interval: 250.0 });
        let report = run(&mut sim, 20_000, 9, Duration::from_millis(50));
        assert!(report.ticks < 20_000);
        assert_eq!(report.presented, 5);
        assert_eq!(report.answered, 5);
        let summary = report.summary.unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.correct + summary.wrong, 5);
        assert_eq!(gateway.len(), 1);
        assert_eq!(report.submission, "delivered: Recorded");
    }

    #[test]
    fn tick_limit_ends_with_partial_result() {
        let (mut sim, gateway) = sim(TriggerPolicy::SpeedProportional { constant: 0.0 });
        let report = run(&mut sim, 120, 1, Duration::from_millis(50));
        assert_eq!(report.ticks, 120);
        assert_eq!(report.presented, 0);
        assert_eq!(report.summary.unwrap().total, 0);
        assert_eq!(gateway.len(), 1);
    }

    #[test]
    fn scripted_driver_stays_in_world() {
        let (mut sim, _) = sim(TriggerPolicy::SpeedProportional { constant: 0.0 });
        let report = run(&mut sim, 3_000, 2, Duration::from_millis(10));
        assert_eq!(report.ticks, 3_000);
        let v = sim.vehicle();
        assert!(v.x > 0.0 && v.x < sim.world().width);
        assert!(v.y > 0.0 && v.y < sim.world().height);
    }
}
