//! Simulation configuration — loaded from a TOML file, every section optional.
//!
//! ```toml
//! [vehicle]
//! max_speed = 8.0
//!
//! [scenarios]
//! session_size = 5
//! seed = 42
//!
//! [scenarios.trigger]
//! policy = "distance_travelled"
//! interval = 500.0
//!
//! [gateway]
//! endpoint = "https://portal.example/api/simulation/results/"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SimulationKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub vehicle: VehicleConfig,
    pub camera: CameraConfig,
    pub scenarios: ScenarioConfig,
    pub gateway: GatewayConfig,
    pub display: DisplayConfig,
}

/// World dimensions and road layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Width of both road corridors
    pub road_width: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 2400.0,
            height: 2400.0,
            road_width: 120.0,
        }
    }
}

/// Vehicle footprint and tunables (internal units per tick)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub width: f32,
    pub height: f32,
    pub acceleration: f32,
    /// Multiplied into speed every coasting tick, in (0, 1)
    pub friction: f32,
    /// Heading change per tick at full speed (radians)
    pub turn_rate: f32,
    /// Forward limit; reverse is limited to half of it
    pub max_speed: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 20.0,
            acceleration: 0.2,
            friction: 0.95,
            turn_rate: 0.05,
            max_speed: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Exponential smoothing coefficient, in (0, 1]
    pub smoothing: f32,
    /// World → minimap scale factor
    pub minimap_scale: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.1,
            minimap_scale: 0.06,
        }
    }
}

/// When to interrupt driving with the next scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Per-tick chance `|speed| * constant`
    SpeedProportional { constant: f32 },
    /// Fire every `interval` units of accumulated movement
    DistanceTravelled { interval: f32 },
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        TriggerPolicy::SpeedProportional { constant: 0.0005 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Scenarios drawn per session
    pub session_size: usize,
    pub trigger: TriggerPolicy,
    /// How long the vehicle stays frozen after an answer, so the
    /// explanation can be read
    pub resume_delay_ms: u64,
    /// Submit a partial result when a session is abandoned mid-way
    pub persist_partial_on_abandon: bool,
    /// Fixed RNG seed; random per run when absent
    pub seed: Option<u64>,
    /// JSON file replacing the built-in scenario bank
    pub catalog: Option<PathBuf>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            session_size: 5,
            trigger: TriggerPolicy::default(),
            resume_delay_ms: 1500,
            persist_partial_on_abandon: false,
            seed: None,
            catalog: None,
        }
    }
}

/// Where finished sessions go
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Results endpoint; no HTTP hand-off when absent
    pub endpoint: Option<String>,
    /// Bearer token sent with the request
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub simulation_kind: SimulationKind,
    /// Write payloads as JSON files here instead of (or without) HTTP
    pub offline_dir: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: 10,
            simulation_kind: SimulationKind::CityDriving,
            offline_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 640,
            fps: 60,
        }
    }
}

impl SimConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given and present, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                tracing::warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let v = &self.vehicle;
        if !(v.max_speed > 0.0) {
            return Err(invalid("vehicle.max_speed", "must be positive"));
        }
        if !(v.acceleration > 0.0) {
            return Err(invalid("vehicle.acceleration", "must be positive"));
        }
        if !(v.friction > 0.0 && v.friction < 1.0) {
            return Err(invalid("vehicle.friction", "must be in (0, 1)"));
        }
        if !(self.camera.smoothing > 0.0 && self.camera.smoothing <= 1.0) {
            return Err(invalid("camera.smoothing", "must be in (0, 1]"));
        }
        if self.world.width < v.width || self.world.height < v.height {
            return Err(invalid("world", "smaller than the vehicle footprint"));
        }
        if self.scenarios.session_size == 0 {
            return Err(invalid("scenarios.session_size", "must be at least 1"));
        }
        match self.scenarios.trigger {
            TriggerPolicy::SpeedProportional { constant } if constant < 0.0 => {
                Err(invalid("scenarios.trigger.constant", "must not be negative"))
            }
            TriggerPolicy::DistanceTravelled { interval } if !(interval > 0.0) => {
                Err(invalid("scenarios.trigger.interval", "must be positive"))
            }
            _ => Ok(()),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
