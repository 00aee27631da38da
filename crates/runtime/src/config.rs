//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use autofarm_core::FarmConfig;

/// Everything needed to assemble the registry, scheduler and logging.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub farm: FarmConfig,
    /// Scheduler period.
    pub tick_period: Duration,
    /// JSON store for hunter records; in-memory storage when unset.
    pub data_file: Option<PathBuf>,
    pub log: LogConfig,
}

impl RuntimeConfig {
    pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `AUTOFARM_TICK_MS` - Scheduler period in milliseconds (default: 1000)
    /// - `AUTOFARM_SAVE_INTERVAL` - Ticks between batch saves (default: 60)
    /// - `AUTOFARM_BATCH_SIZE` - Rows per storage batch chunk (default: 500)
    /// - `AUTOFARM_MAX_RADIUS` - Largest accepted search radius (default: 3000)
    /// - `AUTOFARM_ARRIVAL_RADIUS` - Return-to-origin arrival radius (default: 150)
    /// - `AUTOFARM_HIT_TIMEOUT_SECS` - Seconds without damage before a target is stuck (default: 15)
    /// - `AUTOFARM_SAME_TARGET_SECS` - Longest engagement with one target (default: 60)
    /// - `AUTOFARM_DATA_FILE` - Hunter record file (default: in-memory)
    /// - `AUTOFARM_LOG_DIR` - Directory for daily log files (default: stderr only)
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| read(key).and_then(|v| v.trim().parse::<u64>().ok());

        let mut config = Self::default();
        let farm = &mut config.farm;

        if let Some(ms) = number("AUTOFARM_TICK_MS") {
            config.tick_period = Duration::from_millis(ms.max(1));
        }
        if let Some(ticks) = number("AUTOFARM_SAVE_INTERVAL") {
            farm.save_interval = saturate(ticks);
        }
        if let Some(rows) = number("AUTOFARM_BATCH_SIZE") {
            farm.batch_size = usize::try_from(rows).unwrap_or(usize::MAX);
        }
        if let Some(radius) = number("AUTOFARM_MAX_RADIUS") {
            farm.max_radius = saturate(radius);
        }
        if let Some(radius) = number("AUTOFARM_ARRIVAL_RADIUS") {
            farm.arrival_radius = saturate(radius);
        }
        if let Some(secs) = number("AUTOFARM_HIT_TIMEOUT_SECS") {
            farm.hit_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = number("AUTOFARM_SAME_TARGET_SECS") {
            farm.same_target_timeout = Duration::from_secs(secs);
        }
        config.farm = config.farm.normalized();

        config.data_file = read("AUTOFARM_DATA_FILE").map(PathBuf::from);
        config.log.directory = read("AUTOFARM_LOG_DIR").map(PathBuf::from);

        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            farm: FarmConfig::default(),
            tick_period: Self::DEFAULT_TICK_PERIOD,
            data_file: None,
            log: LogConfig::default(),
        }
    }
}

/// Where and how much to log.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Daily rolling log files go here when set.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "autofarm.log".to_owned(),
            default_filter: "info".to_owned(),
        }
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
