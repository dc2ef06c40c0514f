//! Simulation — one playthrough owning every component it drives.
//!
//! The presentation layer calls [`Simulation::tick`] once per frame with the
//! current control flags, forwards answers through [`Simulation::answer`],
//! and reacts to the [`SimEvent`]s both return. Rendering is a separate pass
//! that only reads state.
//!
//! Frozen vs. running:
//!   - `running == false` (paused, ended): `tick` does nothing at all
//!   - `frozen == true` (scenario on screen, resume delay): the clock keeps
//!     going and the camera keeps following, but the vehicle does not move
//!     and no new scenario can trigger

pub mod camera;
pub mod catalog;
pub mod draw;
pub mod hud;
pub mod scenario;
pub mod stats;
pub mod vehicle;
pub mod world;

use std::time::Duration;

use uuid::Uuid;

use drivesim_common::SimConfig;
use drivesim_gateway::{Delivery, PersistenceGateway, SubmitHandle};

use camera::Camera;
use catalog::Catalog;
use draw::DrawList;
use scenario::{Resolution, ScenarioError, ScenarioManager, ScenarioPhase, ScenarioPrompt};
use stats::{DerivedMetrics, StatsRecorder, Summary};
use vehicle::{Controls, Vehicle};
use world::World;

/// Everything the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Started { session_id: Uuid, scenarios: usize },
    ScenarioPresented(ScenarioPrompt),
    AnswerResolved(Resolution),
    /// Resume delay elapsed, the vehicle is free again
    DrivingResumed,
    Ended { summary: Summary, metrics: DerivedMetrics },
    /// Session dropped before completion; `persisted` if its partial result
    /// was handed to the gateway
    Abandoned { persisted: bool },
}

/// Progress of the result hand-off
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    NotSubmitted,
    Pending,
    Delivered(Delivery),
    Failed(String),
}

pub struct Simulation {
    config: SimConfig,
    world: World,
    vehicle: Vehicle,
    camera: Camera,
    scenarios: ScenarioManager,
    stats: StatsRecorder,
    gateway: Box<dyn PersistenceGateway>,

    view_w: f32,
    view_h: f32,

    frozen: bool,
    running: bool,
    ended: bool,
    /// Simulation time since start; paused time is not counted
    clock: Duration,
    resume_at: Option<Duration>,

    prompt: Option<ScenarioPrompt>,
    feedback: Option<Resolution>,
    result: Option<(Summary, DerivedMetrics)>,

    submit: Option<SubmitHandle>,
    submission: Submission,
}

impl Simulation {
    /// Build a simulation around its collaborators. Call [`start`](Self::start)
    /// before ticking.
    pub fn new(config: SimConfig, catalog: Catalog, gateway: Box<dyn PersistenceGateway>) -> Self {
        let world = World::generate(&config.world);
        let vehicle = Vehicle::new(&config.vehicle, world.spawn_point());
        let camera = Camera::new(config.camera.smoothing, world.bounds());
        let scenarios = ScenarioManager::new(
            catalog,
            config.scenarios.session_size,
            config.scenarios.trigger,
            config.scenarios.seed,
        );
        let stats = StatsRecorder::new(config.gateway.simulation_kind);

        tracing::info!(
            "{} simulation ready (trigger: {:?}, gateway: {})",
            config.gateway.simulation_kind.display_name(),
            scenarios.policy(),
            gateway.name()
        );

        Self {
            view_w: config.display.width as f32,
            view_h: config.display.height as f32,
            config,
            world,
            vehicle,
            camera,
            scenarios,
            stats,
            gateway,
            frozen: false,
            running: false,
            ended: false,
            clock: Duration::ZERO,
            resume_at: None,
            prompt: None,
            feedback: None,
            result: None,
            submit: None,
            submission: Submission::NotSubmitted,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Fresh session: vehicle at spawn, new scenarios, empty statistics
    pub fn start(&mut self) -> Vec<SimEvent> {
        self.vehicle.reset();
        self.scenarios.start();
        self.stats.reset();
        self.camera
            .snap_to(self.vehicle.x, self.vehicle.y, self.view_w, self.view_h);

        self.frozen = false;
        self.running = true;
        self.ended = false;
        self.clock = Duration::ZERO;
        self.resume_at = None;
        self.prompt = None;
        self.feedback = None;
        self.result = None;
        self.submit = None;
        self.submission = Submission::NotSubmitted;

        tracing::info!(
            "Session {} started with {} scenarios",
            self.stats.session_id,
            self.scenarios.session().len()
        );
        vec![SimEvent::Started {
            session_id: self.stats.session_id,
            scenarios: self.scenarios.session().len(),
        }]
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: Duration, controls: Controls) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        self.clock += dt;

        if let Some(at) = self.resume_at {
            if self.clock >= at {
                self.resume_at = None;
                self.frozen = false;
                self.feedback = None;
                tracing::debug!("Driving resumed at {:.1}s", self.clock.as_secs_f32());
                events.push(SimEvent::DrivingResumed);
            }
        }

        // Nothing to ask: an empty session ends on its first tick
        if self.scenarios.phase() == ScenarioPhase::Completed {
            events.extend(self.end());
            return events;
        }

        let distance = self.vehicle.advance(controls, self.frozen, self.world.bounds());
        self.camera
            .follow(self.vehicle.x, self.vehicle.y, self.view_w, self.view_h);

        if !self.frozen {
            if let Some(prompt) = self.scenarios.check_trigger(self.vehicle.speed, distance) {
                self.frozen = true;
                self.prompt = Some(prompt.clone());
                events.push(SimEvent::ScenarioPresented(prompt));
            }
        }

        tracing::trace!(
            "tick {:.3}s pos=({:.1}, {:.1}) speed={:.2} frozen={}",
            self.clock.as_secs_f32(),
            self.vehicle.x,
            self.vehicle.y,
            self.vehicle.speed,
            self.frozen
        );
        events
    }

    /// Answer the scenario on screen with option `index`. Rejected once the
    /// session is over (its result is already settled) and while paused.
    pub fn answer(&mut self, index: usize) -> Result<Vec<SimEvent>, ScenarioError> {
        if self.ended || self.stats.is_finalized() {
            return Err(ScenarioError::SessionEnded);
        }
        if !self.running {
            return Err(ScenarioError::Paused);
        }
        let resolution = self.scenarios.answer(index, self.clock, &mut self.stats)?;
        self.prompt = None;
        self.feedback = Some(resolution.clone());

        let completed = resolution.completed;
        let mut events = vec![SimEvent::AnswerResolved(resolution)];
        if completed {
            events.extend(self.end());
        } else {
            let delay = Duration::from_millis(self.config.scenarios.resume_delay_ms);
            self.resume_at = Some(self.clock + delay);
        }
        Ok(events)
    }

    /// Stop for good: finalize statistics once and hand the payload off.
    /// Later calls are no-ops.
    pub fn end(&mut self) -> Vec<SimEvent> {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.running = false;
        self.frozen = true;
        self.resume_at = None;
        self.prompt = None;

        if let Some(payload) = self.stats.finalize(self.clock) {
            if self.stats.kind.hands_off_results() {
                tracing::info!("Submitting session {} via {}", payload.session_id, self.gateway.name());
                self.submit = Some(self.gateway.submit(payload));
                self.submission = Submission::Pending;
                self.poll_submission();
            } else {
                tracing::info!(
                    "{} session {} finished, result kept local",
                    self.stats.kind.display_name(),
                    payload.session_id
                );
            }
        }

        let summary = self.stats.summary(self.clock);
        let metrics = self.stats.derived_metrics();
        self.result = Some((summary, metrics));
        vec![SimEvent::Ended { summary, metrics }]
    }

    /// Leave mid-session. Discards the partial result unless
    /// `persist_partial_on_abandon` is set, in which case this is `end()`.
    pub fn abandon(&mut self) -> Vec<SimEvent> {
        if self.ended {
            return Vec::new();
        }
        if self.config.scenarios.persist_partial_on_abandon {
            tracing::info!(
                "Session {} abandoned after {} answers, submitting partial result",
                self.stats.session_id,
                self.stats.total()
            );
            let mut events = self.end();
            events.push(SimEvent::Abandoned { persisted: true });
            return events;
        }

        tracing::info!(
            "Session {} abandoned after {} answers, result discarded",
            self.stats.session_id,
            self.stats.total()
        );
        self.ended = true;
        self.running = false;
        self.frozen = true;
        self.resume_at = None;
        self.prompt = None;
        vec![SimEvent::Abandoned { persisted: false }]
    }

    /// Abandon whatever is in progress and start over
    pub fn restart(&mut self) -> Vec<SimEvent> {
        let mut events = self.abandon();
        events.extend(self.start());
        events
    }

    pub fn pause(&mut self) {
        if self.running && !self.ended {
            self.running = false;
            tracing::debug!("Paused at {:.1}s", self.clock.as_secs_f32());
        }
    }

    pub fn resume(&mut self) {
        if !self.running && !self.ended {
            self.running = true;
            tracing::debug!("Unpaused at {:.1}s", self.clock.as_secs_f32());
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.resume();
        }
    }

    // -----------------------------------------------------------------------
    // Result hand-off
    // -----------------------------------------------------------------------

    /// Refresh [`Submission`] from the gateway without blocking
    pub fn poll_submission(&mut self) -> &Submission {
        if let Some(handle) = self.submit.as_mut() {
            if let Some(result) = handle.poll() {
                self.settle(result);
            }
        }
        &self.submission
    }

    /// Block up to `timeout` for the hand-off to settle
    pub fn wait_for_submission(&mut self, timeout: Duration) -> &Submission {
        if self.submission == Submission::Pending {
            if let Some(handle) = self.submit.as_mut() {
                match handle.wait(timeout) {
                    Some(result) => self.settle(result),
                    None => tracing::warn!("Result hand-off still pending after {:?}", timeout),
                }
            }
        }
        &self.submission
    }

    fn settle(&mut self, result: Result<Delivery, String>) {
        let next = match result {
            Ok(delivery) => Submission::Delivered(delivery),
            Err(e) => Submission::Failed(e),
        };
        if next != self.submission {
            match &next {
                Submission::Delivered(d) => tracing::info!("Result delivered: {:?}", d),
                Submission::Failed(e) => tracing::warn!("Result hand-off failed: {}", e),
                _ => {}
            }
            self.submission = next;
        }
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// World, vehicle and HUD for the main view
    pub fn render(&self, out: &mut DrawList) {
        let viewport = self.camera.viewport(self.view_w, self.view_h);
        self.world.render(&viewport, out);
        self.vehicle.render(&viewport, out);
        hud::render(self, out);
    }

    /// Scaled-down world with the vehicle and camera rectangle
    pub fn render_minimap(&self, out: &mut DrawList) {
        hud::render_minimap(self, out);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scenarios(&self) -> &ScenarioManager {
        &self.scenarios
    }

    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    pub fn view_size(&self) -> (f32, f32) {
        (self.view_w, self.view_h)
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_paused(&self) -> bool {
        !self.running && !self.ended
    }

    /// Scenario waiting for an answer
    pub fn prompt(&self) -> Option<&ScenarioPrompt> {
        self.prompt.as_ref()
    }

    /// Last answer, shown until driving resumes
    pub fn feedback(&self) -> Option<&Resolution> {
        self.feedback.as_ref()
    }

    /// Final summary once the session has ended
    pub fn result(&self) -> Option<&(Summary, DerivedMetrics)> {
        self.result.as_ref()
    }
}
