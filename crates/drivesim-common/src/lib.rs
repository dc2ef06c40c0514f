//! Common utilities and types shared across DriveSim crates

pub mod config;

pub use config::{
    CameraConfig, ConfigError, DisplayConfig, GatewayConfig, ScenarioConfig, SimConfig,
    TriggerPolicy, VehicleConfig, WorldConfig,
};

use serde::{Deserialize, Serialize};

/// Kind of simulation a session belongs to. Sent to the backend as the
/// `simulation_type` tag so results land in the right bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationKind {
    /// Free driving through the city grid with safety interruptions
    CityDriving,
    /// Practice mode: scored on screen, never handed to the backend
    Practice,
}

impl SimulationKind {
    /// Get the wire tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            SimulationKind::CityDriving => "driving_simulation",
            SimulationKind::Practice => "practice",
        }
    }

    /// Get the display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            SimulationKind::CityDriving => "City Driving",
            SimulationKind::Practice => "Practice",
        }
    }

    /// Whether finished sessions of this kind go to the persistence gateway
    pub fn hands_off_results(&self) -> bool {
        match self {
            SimulationKind::CityDriving => true,
            SimulationKind::Practice => false,
        }
    }
}

impl Default for SimulationKind {
    fn default() -> Self {
        SimulationKind::CityDriving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(SimulationKind::CityDriving.tag(), "driving_simulation");
        assert_eq!(SimulationKind::Practice.tag(), "practice");
    }

    #[test]
    fn test_default_kind_hands_off() {
        assert_eq!(SimulationKind::default(), SimulationKind::CityDriving);
        assert!(SimulationKind::CityDriving.hands_off_results());
        assert!(!SimulationKind::Practice.hands_off_results());
    }
}
