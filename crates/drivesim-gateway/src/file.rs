//! Offline sink — one pretty-printed JSON file per session.
//!
//! Useful for kiosks without network access and for inspecting what would
//! have been posted. Files are named after the session id, so a session
//! can never overwrite another.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::{Delivery, PersistenceGateway, SessionPayload, SubmitHandle};

pub struct JsonFileGateway {
    dir: PathBuf,
}

impl JsonFileGateway {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path a given session is written to
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("session-{}.json", session_id))
    }

    fn write(&self, payload: &SessionPayload) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&payload.session_id);
        let json = serde_json::to_string_pretty(payload)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn name(&self) -> &'static str {
        "file"
    }

    fn submit(&self, payload: SessionPayload) -> SubmitHandle {
        let result = self.write(&payload).map(|path| {
            tracing::info!("Saved session {} to {}", payload.session_id, path.display());
            Delivery::File { path }
        });
        if let Err(e) = &result {
            tracing::error!("Failed to save session {}: {}", payload.session_id, e);
        }
        SubmitHandle::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutcomeRecord;
    use chrono::Utc;
    use std::env;

    fn temp_dir(name: &str) -> PathBuf {
        env::temp_dir().join("drivesim_test_results").join(name)
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn writes_readable_payload() {
        let dir = temp_dir("roundtrip");
        cleanup(&dir);

        let gateway = JsonFileGateway::new(&dir);
        let payload = SessionPayload {
            session_id: "0f0e".into(),
            simulation_type: "driving_simulation".into(),
            total_scenarios: 1,
            correct_answers: 0,
            wrong_answers: 1,
            score_percentage: 0.0,
            completion_time: 33,
            scenario_results: vec![OutcomeRecord {
                title: "School Zone".into(),
                chosen_answer: 3,
                correct_answer: 0,
                is_correct: false,
                timestamp: 31_000,
            }],
            started_at: Utc::now(),
        };

        let mut handle = gateway.submit(payload.clone());
        let delivery = handle.poll().unwrap().unwrap();
        assert_eq!(
            delivery,
            Delivery::File {
                path: gateway.path_for("0f0e")
            }
        );

        let text = std::fs::read_to_string(gateway.path_for("0f0e")).unwrap();
        let loaded: SessionPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, payload);

        cleanup(&dir);
    }
}
