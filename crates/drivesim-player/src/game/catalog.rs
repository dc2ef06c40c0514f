//! Scenario catalog — the bank of safety questions a session draws from.
//!
//! The built-in bank is embedded JSON (`data/scenarios.json`, 20 entries
//! over five trigger categories). A replacement bank can be loaded from a
//! file with the same shape.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Scenario '{title}': correct option {correct} out of range ({options} options)")]
    BadAnswer {
        title: String,
        correct: usize,
        options: usize,
    },
}

/// What kind of road situation a scenario is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    Intersection,
    Pedestrian,
    TrafficSignal,
    Weather,
    Emergency,
}

impl TriggerCategory {
    pub fn all() -> &'static [TriggerCategory] {
        &[
            TriggerCategory::Intersection,
            TriggerCategory::Pedestrian,
            TriggerCategory::TrafficSignal,
            TriggerCategory::Weather,
            TriggerCategory::Emergency,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One catalog entry, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct: usize,
    pub explanation: String,
    pub category: TriggerCategory,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ScenarioDefinition>,
}

impl Catalog {
    /// The embedded 20-entry bank
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(include_str!("../../data/scenarios.json"))
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let entries: Vec<ScenarioDefinition> = serde_json::from_str(text)?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&text)?;
        tracing::info!("Loaded {} scenarios from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Reject entries whose correct index points past their options
    pub fn new(entries: Vec<ScenarioDefinition>) -> Result<Self, CatalogError> {
        if let Some(bad) = entries.iter().find(|e| e.correct >= e.options.len()) {
            return Err(CatalogError::BadAnswer {
                title: bad.title.clone(),
                correct: bad.correct,
                options: bad.options.len(),
            });
        }
        let catalog = Self { entries };
        for &category in TriggerCategory::all() {
            let n = catalog.by_category(category).count();
            if n == 0 {
                tracing::warn!("Scenario bank has no {:?} scenarios", category);
            } else {
                tracing::debug!("{:?}: {} scenarios", category, n);
            }
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScenarioDefinition> {
        self.entries.get(index)
    }

    pub fn by_category(&self, category: TriggerCategory) -> impl Iterator<Item = &ScenarioDefinition> {
        self.entries.iter().filter(move |e| e.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_has_twenty_entries() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 20);
        let titles: HashSet<&str> = (0..catalog.len())
            .filter_map(|i| catalog.get(i))
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles.len(), 20, "titles must be unique");
    }

    #[test]
    fn builtin_covers_all_categories() {
        let catalog = Catalog::builtin().unwrap();
        for &cat in TriggerCategory::all() {
            assert_eq!(catalog.by_category(cat).count(), 4, "{:?}", cat);
        }
    }

    #[test]
    fn builtin_answers_are_in_range() {
        let catalog = Catalog::builtin().unwrap();
        for e in (0..catalog.len()).filter_map(|i| catalog.get(i)) {
            assert_eq!(e.options.len(), 4, "{}", e.title);
            assert!(e.correct < e.options.len());
            assert!(!e.explanation.is_empty());
        }
    }

    #[test]
    fn out_of_range_correct_index_rejected() {
        let json = r#"[{
            "title": "Broken",
            "question": "?",
            "options": ["a", "b"],
            "correct": 2,
            "explanation": "",
            "category": "weather",
            "difficulty": "easy"
        }]"#;
        match Catalog::from_json(json) {
            Err(CatalogError::BadAnswer { correct, options, .. }) => {
                assert_eq!((correct, options), (2, 2));
            }
            other => panic!("expected BadAnswer, got {:?}", other),
        }
    }

    #[test]
    fn unknown_category_is_parse_error() {
        let json = r#"[{"title":"x","question":"?","options":["a"],"correct":0,
            "explanation":"","category":"space","difficulty":"easy"}]"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Parse(_))));
    }
}
