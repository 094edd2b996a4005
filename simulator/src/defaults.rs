//! Values used when the configuration file omits a field.

pub const DEFAULT_DETECTOR: &str = "dRICH";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = false;
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_ACTIVE: i64 = 1;
pub const DEFAULT_VERBOSITY: i64 = 0;
