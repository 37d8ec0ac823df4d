use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Environment lookups scoped to a profile.
///
/// `get("KEY")` tries `{PROFILE}_KEY` first, then `KEY`. Empty values count
/// as unset; unparsable values fall back to the default.
#[derive(Debug, Clone, Copy)]
struct ProfiledEnv<'a> {
    profile: &'a str,
}

impl<'a> ProfiledEnv<'a> {
    fn new(profile: &'a str) -> Self {
        Self { profile }
    }

    fn get(&self, key: &str) -> Option<String> {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        if !self.profile.is_empty() {
            if let Some(v) = non_empty(&format!("{}_{}", self.profile, key)) {
                return Some(v);
            }
        }
        non_empty(key)
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("true" | "1" | "yes") => true,
            Some("false" | "0" | "no") => false,
            _ => default,
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub detection: DetectionConfig,
    pub scan: ScanConfig,
    pub input: InputConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `EVENTWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env::var("EVENTWATCH_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let profile = profile.to_uppercase();
        let env = ProfiledEnv::new(&profile);
        Self {
            detection: DetectionConfig::from_env(env),
            scan: ScanConfig::from_env(env),
            input: InputConfig::from_env(env),
            profile,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let d = &self.detection;
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  detection:   period={}, robust={}, std_parameter={}, dynamic_threshold={}",
            d.period, d.robust, d.std_parameter, d.dynamic_threshold
        );
        tracing::info!(
            "  low-volume:  window={}d, mean<{}, floor={}, min_history={}d",
            d.recent_window_days, d.low_volume_mean, d.threshold_floor, d.min_history_days
        );
        tracing::info!("  scan:        worker_threads={}", self.scan.worker_threads);
        tracing::info!(
            "  input:       events={}, thresholds={}",
            self.input.events_path.display(),
            self.input.thresholds_source
        );
    }
}

// ── Detection ─────────────────────────────────────────────────

/// Parameters of the decomposition detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Seasonal cycle length in days.
    pub period: usize,
    /// Use outlier-resistant fitting.
    pub robust: bool,
    /// Multiplier on the residual standard deviation.
    pub std_parameter: f64,
    /// Widen the band for low-volume series and apply the absolute floor.
    pub dynamic_threshold: bool,
    /// Shorter series are never flagged.
    pub min_history_days: usize,
    /// Window used for the recent-volume mean.
    pub recent_window_days: usize,
    /// Recent mean below this counts as low volume.
    pub low_volume_mean: f64,
    /// Thresholds below this get the floor added.
    pub threshold_floor: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            period: 14,
            robust: true,
            std_parameter: 3.0,
            dynamic_threshold: true,
            min_history_days: 30,
            recent_window_days: 30,
            low_volume_mean: 500.0,
            threshold_floor: 15.0,
        }
    }
}

impl DetectionConfig {
    fn from_env(env: ProfiledEnv<'_>) -> Self {
        let d = Self::default();
        Self {
            period: env.parsed("STL_PERIOD", d.period),
            robust: env.flag("STL_ROBUST", d.robust),
            std_parameter: env.parsed("STD_PARAMETER", d.std_parameter),
            dynamic_threshold: env.flag("DYNAMIC_THRESHOLD", d.dynamic_threshold),
            min_history_days: env.parsed("MIN_HISTORY_DAYS", d.min_history_days),
            recent_window_days: env.parsed("RECENT_WINDOW_DAYS", d.recent_window_days),
            low_volume_mean: env.parsed("LOW_VOLUME_MEAN", d.low_volume_mean),
            threshold_floor: env.parsed("THRESHOLD_FLOOR", d.threshold_floor),
        }
    }
}

// ── Scan ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of scoring threads. 0 = available parallelism.
    pub worker_threads: usize,
}

impl ScanConfig {
    fn from_env(env: ProfiledEnv<'_>) -> Self {
        Self {
            worker_threads: env.parsed("SCAN_WORKER_THREADS", 0),
        }
    }

    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }
}

// ── Input ─────────────────────────────────────────────────────

const DEFAULT_EVENTS_PATH: &str = "api_ga4_event_data.csv";
const DEFAULT_THRESHOLDS_SOURCE: &str = "thresholds.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub events_path: PathBuf,
    /// Local CSV path or an http(s) URL to a CSV export.
    pub thresholds_source: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            events_path: PathBuf::from(DEFAULT_EVENTS_PATH),
            thresholds_source: DEFAULT_THRESHOLDS_SOURCE.to_string(),
        }
    }
}

impl InputConfig {
    fn from_env(env: ProfiledEnv<'_>) -> Self {
        Self {
            events_path: PathBuf::from(env.string("EVENTS_PATH", DEFAULT_EVENTS_PATH)),
            thresholds_source: env.string("THRESHOLDS_PATH", DEFAULT_THRESHOLDS_SOURCE),
        }
    }
}
