//! Statistics recorder — scores one session and produces its result payload.
//!
//! Holds the running counters and the ordered outcome list. Timestamps are
//! offsets on the simulation clock (paused time does not count), so every
//! operation takes the current clock value instead of reading the wall
//! clock itself.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use drivesim_common::SimulationKind;
use drivesim_gateway::{score_percentage, OutcomeRecord, SessionPayload};

/// One resolved scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub title: String,
    pub chosen: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
    /// Offset from session start
    pub at: Duration,
}

impl ScenarioOutcome {
    pub fn new(title: &str, chosen: usize, correct_answer: usize, at: Duration) -> Self {
        Self {
            title: title.to_string(),
            chosen,
            correct_answer,
            is_correct: chosen == correct_answer,
            at,
        }
    }

    fn to_record(&self) -> OutcomeRecord {
        OutcomeRecord {
            title: self.title.clone(),
            chosen_answer: self.chosen,
            correct_answer: self.correct_answer,
            is_correct: self.is_correct,
            timestamp: self.at.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub correct: u32,
    pub wrong: u32,
    pub total: u32,
    /// Whole percent, 0 when nothing was answered
    pub accuracy: u32,
    pub elapsed_secs: u64,
}

/// Informational only, never used for pass/fail
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DerivedMetrics {
    pub average_secs_per_scenario: f64,
    pub longest_correct_streak: u32,
    /// Shortest gap between consecutive answers (the first measured from start)
    pub fastest_interval_secs: Option<f64>,
    pub slowest_interval_secs: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StatsRecorder {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub kind: SimulationKind,
    correct: u32,
    wrong: u32,
    total: u32,
    outcomes: Vec<ScenarioOutcome>,
    finalized: bool,
}

impl StatsRecorder {
    pub fn new(kind: SimulationKind) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            kind,
            correct: 0,
            wrong: 0,
            total: 0,
            outcomes: Vec::new(),
            finalized: false,
        }
    }

    /// Fresh session: new id, new start time, empty counters
    pub fn reset(&mut self) {
        *self = Self::new(self.kind);
        tracing::debug!("Statistics reset for session {}", self.session_id);
    }

    pub fn record_outcome(&mut self, outcome: ScenarioOutcome) {
        if outcome.is_correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
        self.total += 1;
        tracing::debug!(
            "Outcome '{}': chose {} (correct {}) → {} [{}/{}]",
            outcome.title,
            outcome.chosen,
            outcome.correct_answer,
            if outcome.is_correct { "correct" } else { "wrong" },
            self.correct,
            self.total
        );
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ScenarioOutcome] {
        &self.outcomes
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn summary(&self, elapsed: Duration) -> Summary {
        let accuracy = if self.total == 0 {
            0
        } else {
            (self.correct as f64 / self.total as f64 * 100.0).round() as u32
        };
        Summary {
            correct: self.correct,
            wrong: self.wrong,
            total: self.total,
            accuracy,
            elapsed_secs: elapsed.as_secs(),
        }
    }

    pub fn derived_metrics(&self) -> DerivedMetrics {
        let Some(last) = self.outcomes.last() else {
            return DerivedMetrics::default();
        };

        let mut longest = 0;
        let mut run = 0;
        for o in &self.outcomes {
            if o.is_correct {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }

        let mut prev = Duration::ZERO;
        let mut fastest = f64::MAX;
        let mut slowest = 0.0f64;
        for o in &self.outcomes {
            let gap = o.at.saturating_sub(prev).as_secs_f64();
            fastest = fastest.min(gap);
            slowest = slowest.max(gap);
            prev = o.at;
        }

        DerivedMetrics {
            average_secs_per_scenario: last.at.as_secs_f64() / self.outcomes.len() as f64,
            longest_correct_streak: longest,
            fastest_interval_secs: Some(fastest),
            slowest_interval_secs: Some(slowest),
        }
    }

    /// Build the result payload without marking the session finalized
    pub fn serialize(&self, elapsed: Duration) -> SessionPayload {
        SessionPayload {
            session_id: self.session_id.to_string(),
            simulation_type: self.kind.tag().to_string(),
            total_scenarios: self.total,
            correct_answers: self.correct,
            wrong_answers: self.wrong,
            score_percentage: score_percentage(self.correct, self.total),
            completion_time: elapsed.as_secs(),
            scenario_results: self.outcomes.iter().map(ScenarioOutcome::to_record).collect(),
            started_at: self.started_at,
        }
    }

    /// The payload, the first time only; `None` once already finalized
    pub fn finalize(&mut self, elapsed: Duration) -> Option<SessionPayload> {
        if self.finalized {
            tracing::warn!("Session {} already finalized", self.session_id);
            return None;
        }
        self.finalized = true;
        let payload = self.serialize(elapsed);
        tracing::info!(
            "Session {} finalized: {}/{} correct ({}%) in {}s",
            payload.session_id,
            payload.correct_answers,
            payload.total_scenarios,
            payload.score_percentage,
            payload.completion_time
        );
        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn recorder_with(results: &[(bool, u64)]) -> StatsRecorder {
        let mut rec = StatsRecorder::new(SimulationKind::CityDriving);
        for (i, &(ok, at)) in results.iter().enumerate() {
            let chosen = if ok { 0 } else { 1 };
            rec.record_outcome(ScenarioOutcome::new(&format!("S{}", i), chosen, 0, secs(at)));
        }
        rec
    }

    #[test]
    fn counters_stay_consistent() {
        let mut rec = StatsRecorder::new(SimulationKind::CityDriving);
        let pattern = [true, false, false, true, true, false, true];
        for (i, ok) in pattern.iter().enumerate() {
            let chosen = if *ok { 2 } else { 3 };
            rec.record_outcome(ScenarioOutcome::new("x", chosen, 2, secs(i as u64)));
            assert_eq!(rec.correct() + rec.wrong(), rec.total());
            assert_eq!(rec.total() as usize, rec.outcomes().len());
        }
        assert_eq!((rec.correct(), rec.wrong()), (4, 3));
    }

    #[test]
    fn accuracy_rounds_and_guards_zero() {
        let empty = StatsRecorder::new(SimulationKind::CityDriving);
        assert_eq!(empty.summary(secs(5)).accuracy, 0);

        // 2/3 = 66.67 → 67
        let rec = recorder_with(&[(true, 1), (true, 2), (false, 3)]);
        let summary = rec.summary(secs(10));
        assert_eq!(summary.accuracy, 67);
        assert_eq!(summary.elapsed_secs, 10);

        // 1/3 = 33.33 → 33
        let rec = recorder_with(&[(true, 1), (false, 2), (false, 3)]);
        assert_eq!(rec.summary(secs(3)).accuracy, 33);
    }

    #[test]
    fn correct_answer_increments_only_correct() {
        let mut rec = StatsRecorder::new(SimulationKind::CityDriving);
        rec.record_outcome(ScenarioOutcome::new("Four-Way Stop", 0, 0, secs(4)));
        assert_eq!(rec.correct(), 1);
        assert_eq!(rec.wrong(), 0);
        assert!(rec.outcomes()[0].is_correct);
    }

    #[test]
    fn derived_metrics_streaks_and_intervals() {
        let rec = recorder_with(&[(true, 10), (true, 14), (false, 30), (true, 33), (true, 40), (true, 48)]);
        let m = rec.derived_metrics();
        assert_eq!(m.longest_correct_streak, 3);
        assert_eq!(m.average_secs_per_scenario, 8.0);
        assert_eq!(m.fastest_interval_secs, Some(3.0));
        assert_eq!(m.slowest_interval_secs, Some(16.0));
    }

    #[test]
    fn first_interval_counts_from_session_start() {
        let rec = recorder_with(&[(true, 2), (false, 20)]);
        let m = rec.derived_metrics();
        assert_eq!(m.fastest_interval_secs, Some(2.0));
        assert_eq!(m.slowest_interval_secs, Some(18.0));
    }

    #[test]
    fn derived_metrics_empty() {
        let rec = StatsRecorder::new(SimulationKind::CityDriving);
        let m = rec.derived_metrics();
        assert_eq!(m.longest_correct_streak, 0);
        assert_eq!(m.fastest_interval_secs, None);
    }

    #[test]
    fn payload_fields() {
        let rec = recorder_with(&[(true, 5), (false, 12), (true, 20)]);
        let payload = rec.serialize(Duration::from_millis(21_900));
        assert_eq!(payload.simulation_type, "driving_simulation");
        assert_eq!(payload.total_scenarios, 3);
        assert_eq!(payload.correct_answers, 2);
        assert_eq!(payload.wrong_answers, 1);
        assert_eq!(payload.score_percentage, 66.67);
        assert_eq!(payload.completion_time, 21);
        assert_eq!(payload.scenario_results.len(), 3);
        assert_eq!(payload.scenario_results[1].timestamp, 12_000);
        assert!(!payload.scenario_results[1].is_correct);
        assert_eq!(payload.session_id, rec.session_id.to_string());
    }

    #[test]
    fn finalize_only_once() {
        let mut rec = recorder_with(&[(true, 1)]);
        assert!(rec.finalize(secs(2)).is_some());
        assert!(rec.is_finalized());
        assert!(rec.finalize(secs(3)).is_none());
    }

    #[test]
    fn reset_starts_a_new_session() {
        let mut rec = recorder_with(&[(true, 1), (false, 2)]);
        let old_id = rec.session_id;
        rec.finalize(secs(2));
        rec.reset();
        assert_ne!(rec.session_id, old_id);
        assert_eq!(rec.total(), 0);
        assert!(rec.outcomes().is_empty());
        assert!(!rec.is_finalized());
    }
}
