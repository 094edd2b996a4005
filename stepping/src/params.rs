//! Detector parameter set and the settings the stepping action reads from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing integer parameter: {name}")]
    Missing { name: &'static str },
    #[error("{name} must be >= 0 (got {value})")]
    Negative { name: &'static str, value: i64 },
}

/// Named detector parameters, grouped by value type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub ints: BTreeMap<String, i64>,
    #[serde(default)]
    pub doubles: BTreeMap<String, f64>,
    #[serde(default)]
    pub strings: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn set_int(&mut self, name: &str, value: i64) -> &mut Self {
        self.ints.insert(name.to_string(), value);
        self
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.ints.get(name).copied()
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.doubles.get(name).copied()
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }
}

/// Diagnostic output level, ordered from silent to everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    #[default]
    Quiet,
    Some,
    More,
    EvenMore,
    ALot,
    Max,
}

impl From<i64> for Verbosity {
    fn from(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Verbosity::Quiet,
            1 => Verbosity::Some,
            2 => Verbosity::More,
            3 => Verbosity::EvenMore,
            4 => Verbosity::ALot,
            _ => Verbosity::Max,
        }
    }
}

/// Settings read once when the stepping action is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepParams {
    pub active: bool,
    pub verbosity: Verbosity,
}

impl StepParams {
    pub const ACTIVE: &'static str = "active";
    pub const VERBOSITY: &'static str = "verbosity";

    pub fn from_parameters(params: &ParameterSet) -> Result<Self, ParamError> {
        let active = params
            .get_int(Self::ACTIVE)
            .ok_or(ParamError::Missing { name: Self::ACTIVE })?;
        let verbosity = params.get_int(Self::VERBOSITY).unwrap_or(0);
        if verbosity < 0 {
            return Err(ParamError::Negative {
                name: Self::VERBOSITY,
                value: verbosity,
            });
        }
        Ok(Self {
            active: active != 0,
            verbosity: Verbosity::from(verbosity),
        })
    }
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            active: true,
            verbosity: Verbosity::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_active_and_verbosity() {
        let mut set = ParameterSet::default();
        set.set_int("active", 1).set_int("verbosity", 2);
        let params = StepParams::from_parameters(&set).unwrap();
        assert!(params.active);
        assert_eq!(params.verbosity, Verbosity::More);

        set.set_int("active", 0);
        assert!(!StepParams::from_parameters(&set).unwrap().active);
    }

    #[test]
    fn test_active_is_required() {
        let set = ParameterSet::default();
        assert_eq!(
            StepParams::from_parameters(&set),
            Err(ParamError::Missing { name: "active" })
        );
    }

    #[test]
    fn test_negative_verbosity_rejected() {
        let mut set = ParameterSet::default();
        set.set_int("active", 1).set_int("verbosity", -3);
        assert!(matches!(
            StepParams::from_parameters(&set),
            Err(ParamError::Negative { .. })
        ));
    }

    #[test]
    fn test_verbosity_levels_are_ordered() {
        assert!(Verbosity::from(7) >= Verbosity::More);
        assert!(Verbosity::from(1) < Verbosity::More);
        assert_eq!(Verbosity::from(0), Verbosity::Quiet);
    }

    #[test]
    fn test_parameter_set_from_yaml() {
        let set: ParameterSet = serde_yaml::from_str("ints: { active: 1 }\n").unwrap();
        assert_eq!(set.get_int("active"), Some(1));
        assert_eq!(set.get_double("active"), None);
        assert_eq!(set.get_string("active"), None);
    }
}
