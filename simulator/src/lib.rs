//! Replay host for the dRICH stepping action.
//!
//! Reads a YAML configuration, builds one stepping action per worker, and feeds it
//! recorded step streams event by event. A fatal stepping error stops the run.

use drich_stepping::{
    DetectorGeometry, GeometryError, ParamError, ParameterSet, StepParams, VolumeEntry,
    VolumeTags,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr};
use thiserror::Error;
use tracing::Level;

pub mod defaults;
pub mod replay;
pub mod truth;

pub use replay::{load_events, replay, Event, EventResult, ReplayError, RunReport};
pub use truth::{HitLink, TrackInfo, TruthSummary, TruthTable};

/// Host configuration, as read from YAML.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_detector")]
    pub detector: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_json")]
    pub log_json: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_parameters")]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub tags: VolumeTags,
    #[serde(default)]
    pub volumes: Vec<VolumeEntry>,
}

fn default_detector() -> String {
    defaults::DEFAULT_DETECTOR.to_string()
}

fn default_log_level() -> String {
    defaults::DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_json() -> bool {
    defaults::DEFAULT_LOG_JSON
}

fn default_workers() -> usize {
    defaults::DEFAULT_WORKERS
}

fn default_parameters() -> ParameterSet {
    let mut parameters = ParameterSet::default();
    parameters
        .set_int(StepParams::ACTIVE, defaults::DEFAULT_ACTIVE)
        .set_int(StepParams::VERBOSITY, defaults::DEFAULT_VERBOSITY);
    parameters
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: default_detector(),
            log_level: default_log_level(),
            log_json: default_log_json(),
            workers: default_workers(),
            parameters: default_parameters(),
            tags: VolumeTags::default(),
            volumes: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("detector name must not be empty")]
    EmptyDetector,
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: usize },
    #[error("invalid parameters")]
    InvalidParameters(#[from] ParamError),
    #[error("invalid geometry")]
    InvalidGeometry(#[from] GeometryError),
}

pub struct ValidatedConfig {
    pub detector: String,
    pub log_level: Level,
    pub log_json: bool,
    pub workers: usize,
    pub params: StepParams,
    pub tags: VolumeTags,
    pub geometry: DetectorGeometry,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.detector.trim().is_empty() {
            return Err(ConfigError::EmptyDetector);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "workers",
                value: 0,
            });
        }
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        let params = StepParams::from_parameters(&self.parameters)?;
        let geometry = DetectorGeometry::new(&self.volumes)?;

        Ok(ValidatedConfig {
            detector: self.detector,
            log_level,
            log_json: self.log_json,
            workers: self.workers,
            params,
            tags: self.tags,
            geometry,
        })
    }
}
