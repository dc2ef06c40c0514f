//! Result payload — the one document a finished session produces.
//!
//! Field names follow the portal's results endpoint. `scenario_results` is
//! sent as a JSON-encoded string rather than a nested array, because the
//! backend stores it verbatim in a text column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resolved scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub title: String,
    pub chosen_answer: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
    /// Milliseconds since the session started
    pub timestamp: u64,
}

/// Everything the backend receives for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub session_id: String,
    pub simulation_type: String,
    pub total_scenarios: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub score_percentage: f64,
    /// Whole seconds from start to finalization
    pub completion_time: u64,
    #[serde(with = "json_string")]
    pub scenario_results: Vec<OutcomeRecord>,
    pub started_at: DateTime<Utc>,
}

/// `round(correct / total * 100, 2)`, 0 for an empty session
pub fn score_percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = correct as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

mod json_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::OutcomeRecord;

    pub fn serialize<S>(value: &[OutcomeRecord], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<OutcomeRecord>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RecordsInput {
            Encoded(String),
            Inline(Vec<OutcomeRecord>),
        }

        match RecordsInput::deserialize(deserializer)? {
            RecordsInput::Encoded(raw) => serde_json::from_str(&raw).map_err(D::Error::custom),
            RecordsInput::Inline(records) => Ok(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionPayload {
        SessionPayload {
            session_id: "abc".into(),
            simulation_type: "driving_simulation".into(),
            total_scenarios: 3,
            correct_answers: 2,
            wrong_answers: 1,
            score_percentage: score_percentage(2, 3),
            completion_time: 94,
            scenario_results: vec![OutcomeRecord {
                title: "Stop Sign".into(),
                chosen_answer: 1,
                correct_answer: 1,
                is_correct: true,
                timestamp: 12_500,
            }],
            started_at: DateTime::parse_from_rfc3339("2026-01-05T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn score_rounds_to_two_decimals() {
        assert_eq!(score_percentage(2, 3), 66.67);
        assert_eq!(score_percentage(1, 3), 33.33);
        assert_eq!(score_percentage(5, 5), 100.0);
        assert_eq!(score_percentage(0, 0), 0.0);
    }

    #[test]
    fn results_are_sent_as_encoded_string() {
        let json = serde_json::to_value(sample()).unwrap();
        let results = json["scenario_results"].as_str().expect("string field");
        assert!(results.starts_with('['));
        assert!(results.contains("\"is_correct\":true"));
        assert_eq!(json["completion_time"], 94);
    }

    #[test]
    fn inline_results_are_accepted_on_read() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["scenario_results"] = serde_json::json!([{
            "title": "Fog",
            "chosen_answer": 0,
            "correct_answer": 2,
            "is_correct": false,
            "timestamp": 300
        }]);
        let parsed: SessionPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.scenario_results.len(), 1);
        assert!(!parsed.scenario_results[0].is_correct);
    }
}
