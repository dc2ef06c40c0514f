//! Scenario manager — decides when driving is interrupted and which
//! question comes next.
//!
//! State machine:
//!   Driving ──trigger──▶ AwaitingAnswer ──answer──▶ Driving … ──Nth answer──▶ Completed
//!
//! The trigger check is only evaluated in `Driving`, so a scenario can never
//! be presented on top of another. Answers are only accepted in
//! `AwaitingAnswer`.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use drivesim_common::TriggerPolicy;

use super::catalog::{Catalog, ScenarioDefinition};
use super::stats::{ScenarioOutcome, StatsRecorder};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("No scenario is awaiting an answer (phase: {0:?})")]
    NotAwaitingAnswer(ScenarioPhase),

    #[error("Session is over, answers are no longer recorded")]
    SessionEnded,

    #[error("Simulation is paused")]
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioPhase {
    Driving,
    AwaitingAnswer,
    Completed,
}

// ---------------------------------------------------------------------------
// Session: the drawn subset plus a cursor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ScenarioSession {
    scenarios: Vec<ScenarioDefinition>,
    cursor: usize,
}

impl ScenarioSession {
    /// Draw up to `size` distinct entries, uniformly without replacement.
    /// A catalog shorter than `size` yields all of its entries.
    pub fn draw<R: Rng>(catalog: &Catalog, size: usize, rng: &mut R) -> Self {
        let mut remaining: Vec<usize> = (0..catalog.len()).collect();
        let mut scenarios = Vec::with_capacity(size.min(remaining.len()));
        while scenarios.len() < size && !remaining.is_empty() {
            let pick = rng.gen_range(0..remaining.len());
            let index = remaining.swap_remove(pick);
            if let Some(def) = catalog.get(index) {
                scenarios.push(def.clone());
            }
        }
        if scenarios.len() < size {
            tracing::warn!(
                "Catalog has only {} scenarios, session of {} requested",
                scenarios.len(),
                size
            );
        }
        Self { scenarios, cursor: 0 }
    }

    pub fn current(&self) -> Option<&ScenarioDefinition> {
        self.scenarios.get(self.cursor)
    }

    /// 1-based position of the current scenario
    pub fn position(&self) -> usize {
        (self.cursor + 1).min(self.scenarios.len())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenarios(&self) -> &[ScenarioDefinition] {
        &self.scenarios
    }

    fn advance(&mut self) {
        if self.cursor < self.scenarios.len() {
            self.cursor += 1;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.cursor == self.scenarios.len()
    }
}

// ---------------------------------------------------------------------------
// Events handed back to the engine
// ---------------------------------------------------------------------------

/// A scenario just interrupted driving
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPrompt {
    pub scenario: ScenarioDefinition,
    /// 1-based
    pub position: usize,
    pub total: usize,
}

/// Result of answering the active scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: ScenarioOutcome,
    pub explanation: String,
    pub correct_option: String,
    /// The last scenario of the session was just answered
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct ScenarioManager {
    catalog: Catalog,
    session: ScenarioSession,
    phase: ScenarioPhase,
    policy: TriggerPolicy,
    session_size: usize,
    rng: ChaCha8Rng,
    /// Distance since the last trigger (distance policy only)
    travelled: f32,
}

impl ScenarioManager {
    pub fn new(catalog: Catalog, session_size: usize, policy: TriggerPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => {
                tracing::debug!("Scenario RNG seeded with {}", seed);
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            catalog,
            session: ScenarioSession::default(),
            phase: ScenarioPhase::Driving,
            policy,
            session_size,
            rng,
            travelled: 0.0,
        }
    }

    /// Draw a fresh session. An empty draw is immediately `Completed`.
    pub fn start(&mut self) {
        self.session = ScenarioSession::draw(&self.catalog, self.session_size, &mut self.rng);
        self.travelled = 0.0;
        self.phase = if self.session.is_empty() {
            ScenarioPhase::Completed
        } else {
            ScenarioPhase::Driving
        };
        tracing::info!(
            "Scenario session drawn: [{}]",
            self.session
                .scenarios()
                .iter()
                .map(|s| s.title.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    pub fn phase(&self) -> ScenarioPhase {
        self.phase
    }

    pub fn session(&self) -> &ScenarioSession {
        &self.session
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    /// Evaluate the trigger policy for this tick. `distance` is how far the
    /// vehicle moved during the tick.
    pub fn check_trigger(&mut self, speed: f32, distance: f32) -> Option<ScenarioPrompt> {
        if self.phase != ScenarioPhase::Driving || self.session.current().is_none() {
            return None;
        }

        let fire = match self.policy {
            TriggerPolicy::SpeedProportional { constant } => {
                let p = speed.abs() * constant;
                p > 0.0 && self.rng.gen::<f32>() < p
            }
            TriggerPolicy::DistanceTravelled { interval } => {
                self.travelled += distance;
                self.travelled >= interval
            }
        };
        if !fire {
            return None;
        }

        let scenario = self.session.current()?.clone();
        self.travelled = 0.0;
        self.phase = ScenarioPhase::AwaitingAnswer;
        let prompt = ScenarioPrompt {
            scenario,
            position: self.session.position(),
            total: self.session.len(),
        };
        tracing::debug!(
            "Scenario {}/{} triggered: {}",
            prompt.position,
            prompt.total,
            prompt.scenario.title
        );
        Some(prompt)
    }

    /// Resolve the active scenario. Indices past the option list count as
    /// wrong answers.
    pub fn answer(
        &mut self,
        chosen: usize,
        at: Duration,
        stats: &mut StatsRecorder,
    ) -> Result<Resolution, ScenarioError> {
        if self.phase != ScenarioPhase::AwaitingAnswer {
            return Err(ScenarioError::NotAwaitingAnswer(self.phase));
        }
        let Some(scenario) = self.session.current().cloned() else {
            return Err(ScenarioError::NotAwaitingAnswer(self.phase));
        };
        if chosen >= scenario.options.len() {
            tracing::warn!(
                "Answer {} out of range for '{}' ({} options), recorded as wrong",
                chosen,
                scenario.title,
                scenario.options.len()
            );
        }

        let outcome = ScenarioOutcome::new(&scenario.title, chosen, scenario.correct, at);
        stats.record_outcome(outcome.clone());
        self.session.advance();

        let completed = self.session.is_completed();
        self.phase = if completed {
            ScenarioPhase::Completed
        } else {
            ScenarioPhase::Driving
        };
        if completed {
            tracing::info!("All {} scenarios answered", self.session.len());
        }

        Ok(Resolution {
            outcome,
            correct_option: scenario.options.get(scenario.correct).cloned().unwrap_or_default(),
            explanation: scenario.explanation,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{Difficulty, TriggerCategory};
    use drivesim_common::SimulationKind;
    use std::collections::HashSet;

    const ALWAYS: TriggerPolicy = TriggerPolicy::SpeedProportional { constant: 1.0 };

    fn manager(policy: TriggerPolicy, seed: u64) -> ScenarioManager {
        let mut m = ScenarioManager::new(Catalog::builtin().unwrap(), 5, policy, Some(seed));
        m.start();
        m
    }

    fn small_catalog(n: usize) -> Catalog {
        let entries = (0..n)
            .map(|i| ScenarioDefinition {
                title: format!("S{}", i),
                question: "?".into(),
                options: vec!["a".into(), "b".into()],
                correct: 0,
                explanation: "because".into(),
                category: TriggerCategory::Weather,
                difficulty: Difficulty::Easy,
            })
            .collect();
        Catalog::new(entries).unwrap()
    }

    #[test]
    fn draws_five_distinct_for_any_seed() {
        let catalog = Catalog::builtin().unwrap();
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let session = ScenarioSession::draw(&catalog, 5, &mut rng);
            let titles: HashSet<&str> = session.scenarios().iter().map(|s| s.title.as_str()).collect();
            assert_eq!(session.len(), 5);
            assert_eq!(titles.len(), 5, "duplicate drawn with seed {}", seed);
        }
    }

    #[test]
    fn same_seed_same_session() {
        let a = manager(ALWAYS, 7);
        let b = manager(ALWAYS, 7);
        assert_eq!(a.session().scenarios(), b.session().scenarios());
    }

    #[test]
    fn short_catalog_draws_everything() {
        let mut m = ScenarioManager::new(small_catalog(3), 5, ALWAYS, Some(1));
        m.start();
        assert_eq!(m.session().len(), 3);
        assert_eq!(m.phase(), ScenarioPhase::Driving);
    }

    #[test]
    fn empty_catalog_completes_immediately() {
        let mut m = ScenarioManager::new(small_catalog(0), 5, ALWAYS, Some(1));
        m.start();
        assert_eq!(m.phase(), ScenarioPhase::Completed);
        assert!(m.check_trigger(8.0, 8.0).is_none());
    }

    #[test]
    fn stationary_vehicle_never_triggers() {
        let mut m = manager(TriggerPolicy::SpeedProportional { constant: 0.5 }, 3);
        for _ in 0..1000 {
            assert!(m.check_trigger(0.0, 0.0).is_none());
        }
        assert_eq!(m.phase(), ScenarioPhase::Driving);
    }

    #[test]
    fn no_retrigger_while_awaiting() {
        let mut m = manager(ALWAYS, 11);
        let first = m.check_trigger(8.0, 8.0).unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(m.phase(), ScenarioPhase::AwaitingAnswer);
        for _ in 0..500 {
            assert!(m.check_trigger(8.0, 8.0).is_none());
        }
        assert_eq!(m.session().current(), Some(&first.scenario));
    }

    #[test]
    fn speed_policy_frequency_scales_with_speed() {
        let constant = 0.1;
        let fires = |speed: f32| {
            let mut count = 0;
            for seed in 0..400 {
                let mut m = manager(TriggerPolicy::SpeedProportional { constant }, seed);
                if m.check_trigger(speed, speed).is_some() {
                    count += 1;
                }
            }
            count
        };
        assert!(fires(8.0) > fires(1.0));
    }

    #[test]
    fn distance_policy_fires_on_interval() {
        let mut m = manager(TriggerPolicy::DistanceTravelled { interval: 100.0 }, 5);
        for _ in 0..12 {
            assert!(m.check_trigger(8.0, 8.0).is_none());
        }
        // 13 * 8 = 104
        assert!(m.check_trigger(8.0, 8.0).is_some());

        let mut stats = StatsRecorder::new(SimulationKind::CityDriving);
        m.answer(0, Duration::from_secs(1), &mut stats).unwrap();
        // Counter restarts after a trigger
        assert!(m.check_trigger(8.0, 50.0).is_none());
        assert!(m.check_trigger(8.0, 50.0).is_some());
    }

    #[test]
    fn answer_outside_awaiting_is_rejected() {
        let mut m = manager(ALWAYS, 2);
        let mut stats = StatsRecorder::new(SimulationKind::CityDriving);
        let err = m.answer(0, Duration::ZERO, &mut stats).unwrap_err();
        assert_eq!(err, ScenarioError::NotAwaitingAnswer(ScenarioPhase::Driving));
        assert_eq!(stats.total(), 0);
        assert_eq!(m.session().position(), 1);
    }

    #[test]
    fn correct_answer_recorded_once() {
        let mut m = manager(ALWAYS, 9);
        let mut stats = StatsRecorder::new(SimulationKind::CityDriving);
        let prompt = m.check_trigger(5.0, 5.0).unwrap();
        let res = m
            .answer(prompt.scenario.correct, Duration::from_secs(3), &mut stats)
            .unwrap();
        assert!(res.outcome.is_correct);
        assert!(!res.completed);
        assert_eq!(stats.correct(), 1);
        assert_eq!(stats.wrong(), 0);
        assert_eq!(m.phase(), ScenarioPhase::Driving);
        assert_eq!(m.session().position(), 2);
    }

    #[test]
    fn out_of_range_answer_is_wrong() {
        let mut m = manager(ALWAYS, 4);
        let mut stats = StatsRecorder::new(SimulationKind::CityDriving);
        m.check_trigger(5.0, 5.0).unwrap();
        let res = m.answer(99, Duration::ZERO, &mut stats).unwrap();
        assert!(!res.outcome.is_correct);
        assert_eq!(stats.wrong(), 1);
    }

    #[test]
    fn fifth_answer_completes() {
        let mut m = manager(ALWAYS, 21);
        let mut stats = StatsRecorder::new(SimulationKind::CityDriving);
        for i in 0..5 {
            let prompt = m.check_trigger(6.0, 6.0).unwrap();
            assert_eq!(prompt.position, i + 1);
            assert_eq!(prompt.total, 5);
            let res = m.answer(0, Duration::from_secs(i as u64), &mut stats).unwrap();
            assert_eq!(res.completed, i == 4);
        }
        assert_eq!(m.phase(), ScenarioPhase::Completed);
        assert!(m.session().is_completed());
        assert!(m.check_trigger(8.0, 8.0).is_none());
        assert_eq!(stats.total(), 5);
    }
}
