use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::console::VerbosityLevel;
use crate::source::MockSourceConfig;
use crate::window::{Edge, SortOrder};

pub mod error;

pub use error::{ConfigError, ConfigResult};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "TIMELINE_WINDOW_CONFIG";

/// Tuning knobs of the windowed list engine. The defaults are empirical; none
/// of them is load-bearing on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Items per trim batch, and the base of the per-edge size limit.
    #[serde(default = "default_trim_threshold")]
    pub trim_threshold: usize,
    /// Window may hold `trim_threshold * trim_factor_top` items before the
    /// top edge is trimmed.
    #[serde(default = "default_trim_factor_top")]
    pub trim_factor_top: f64,
    #[serde(default = "default_trim_factor_bottom")]
    pub trim_factor_bottom: f64,
    #[serde(default = "default_guard_band_size")]
    pub guard_band_size: usize,
    /// Distance from the viewport, in adapter units, at which an edge
    /// sentinel counts as visible.
    #[serde(default = "default_scroll_margin")]
    pub scroll_margin_up: f64,
    #[serde(default = "default_scroll_margin")]
    pub scroll_margin_down: f64,
    #[serde(default = "default_debounce_top_ms")]
    pub debounce_top_ms: u64,
    #[serde(default = "default_debounce_bottom_ms")]
    pub debounce_bottom_ms: u64,
    #[serde(default = "default_trim_throttle_ms")]
    pub trim_throttle_ms: u64,
    #[serde(default = "default_exhausted_cooldown_ms")]
    pub exhausted_cooldown_ms: u64,
    /// Milliseconds of continued motion added to prepend corrections.
    #[serde(default = "default_velocity_correction_ms")]
    pub velocity_correction_ms: f64,
    #[serde(default = "default_velocity_idle_ms")]
    pub velocity_idle_ms: u64,
    #[serde(default = "default_follow_live_edge")]
    pub follow_live_edge: bool,
    #[serde(default)]
    pub order: SortOrder,
}

fn default_page_size() -> usize {
    25
}

fn default_trim_threshold() -> usize {
    25
}

fn default_trim_factor_top() -> f64 {
    2.0
}

fn default_trim_factor_bottom() -> f64 {
    3.0
}

fn default_guard_band_size() -> usize {
    3
}

fn default_scroll_margin() -> f64 {
    5.0
}

fn default_debounce_top_ms() -> u64 {
    1000
}

fn default_debounce_bottom_ms() -> u64 {
    3000
}

fn default_trim_throttle_ms() -> u64 {
    100
}

fn default_exhausted_cooldown_ms() -> u64 {
    1000
}

fn default_velocity_correction_ms() -> f64 {
    16.0
}

fn default_velocity_idle_ms() -> u64 {
    150
}

fn default_follow_live_edge() -> bool {
    true
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            trim_threshold: default_trim_threshold(),
            trim_factor_top: default_trim_factor_top(),
            trim_factor_bottom: default_trim_factor_bottom(),
            guard_band_size: default_guard_band_size(),
            scroll_margin_up: default_scroll_margin(),
            scroll_margin_down: default_scroll_margin(),
            debounce_top_ms: default_debounce_top_ms(),
            debounce_bottom_ms: default_debounce_bottom_ms(),
            trim_throttle_ms: default_trim_throttle_ms(),
            exhausted_cooldown_ms: default_exhausted_cooldown_ms(),
            velocity_correction_ms: default_velocity_correction_ms(),
            velocity_idle_ms: default_velocity_idle_ms(),
            follow_live_edge: default_follow_live_edge(),
            order: SortOrder::default(),
        }
    }
}

impl WindowConfig {
    /// Largest window size tolerated before `edge` becomes a trim candidate.
    pub fn trim_limit(&self, edge: Edge) -> usize {
        let factor = match edge {
            Edge::Top => self.trim_factor_top,
            Edge::Bottom => self.trim_factor_bottom,
        };
        (self.trim_threshold as f64 * factor).ceil() as usize
    }

    pub fn debounce(&self, edge: Edge) -> Duration {
        match edge {
            Edge::Top => Duration::from_millis(self.debounce_top_ms),
            Edge::Bottom => Duration::from_millis(self.debounce_bottom_ms),
        }
    }

    pub fn scroll_margin(&self, edge: Edge) -> f64 {
        match edge {
            Edge::Top => self.scroll_margin_up,
            Edge::Bottom => self.scroll_margin_down,
        }
    }

    pub fn trim_throttle(&self) -> Duration {
        Duration::from_millis(self.trim_throttle_ms)
    }

    pub fn exhausted_cooldown(&self) -> Duration {
        Duration::from_millis(self.exhausted_cooldown_ms)
    }

    pub fn velocity_idle(&self) -> Duration {
        Duration::from_millis(self.velocity_idle_ms)
    }

    /// The edge new live items arrive at.
    pub fn live_edge(&self) -> Edge {
        match self.order {
            SortOrder::Ascending => Edge::Bottom,
            SortOrder::Descending => Edge::Top,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::invalid("window.page_size", self.page_size));
        }
        if self.trim_threshold == 0 {
            return Err(ConfigError::invalid(
                "window.trim_threshold",
                self.trim_threshold,
            ));
        }
        if !(self.trim_factor_top >= 1.0) {
            return Err(ConfigError::invalid(
                "window.trim_factor_top",
                self.trim_factor_top,
            ));
        }
        if !(self.trim_factor_bottom >= 1.0) {
            return Err(ConfigError::invalid(
                "window.trim_factor_bottom",
                self.trim_factor_bottom,
            ));
        }
        if !(self.scroll_margin_up >= 0.0) {
            return Err(ConfigError::invalid(
                "window.scroll_margin_up",
                self.scroll_margin_up,
            ));
        }
        if !(self.scroll_margin_down >= 0.0) {
            return Err(ConfigError::invalid(
                "window.scroll_margin_down",
                self.scroll_margin_down,
            ));
        }
        if !(self.velocity_correction_ms >= 0.0) {
            return Err(ConfigError::invalid(
                "window.velocity_correction_ms",
                self.velocity_correction_ms,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub mock: MockSourceConfig,
}

impl AppConfig {
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.window.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the configured verbosity level, falling back to Normal if not set
    pub fn get_verbosity(&self) -> VerbosityLevel {
        self.verbosity
            .as_deref()
            .and_then(VerbosityLevel::parse)
            .unwrap_or(VerbosityLevel::Normal)
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = Some(verbosity.to_string());
    }

    /// Applies a `section.field = value` update as typed by `config set`.
    pub fn update_setting(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let window = &mut self.window;
        let mock = &mut self.mock;

        match key {
            "verbosity" => {
                let level =
                    VerbosityLevel::parse(value).ok_or_else(|| ConfigError::invalid(key, value))?;
                self.verbosity = Some(level.to_string());
            }
            "window.page_size" => window.page_size = parse(key, value)?,
            "window.trim_threshold" => window.trim_threshold = parse(key, value)?,
            "window.trim_factor_top" => window.trim_factor_top = parse(key, value)?,
            "window.trim_factor_bottom" => window.trim_factor_bottom = parse(key, value)?,
            "window.guard_band_size" => window.guard_band_size = parse(key, value)?,
            "window.scroll_margin_up" => window.scroll_margin_up = parse(key, value)?,
            "window.scroll_margin_down" => window.scroll_margin_down = parse(key, value)?,
            "window.debounce_top_ms" => window.debounce_top_ms = parse(key, value)?,
            "window.debounce_bottom_ms" => window.debounce_bottom_ms = parse(key, value)?,
            "window.trim_throttle_ms" => window.trim_throttle_ms = parse(key, value)?,
            "window.exhausted_cooldown_ms" => window.exhausted_cooldown_ms = parse(key, value)?,
            "window.velocity_correction_ms" => {
                window.velocity_correction_ms = parse(key, value)?
            }
            "window.velocity_idle_ms" => window.velocity_idle_ms = parse(key, value)?,
            "window.follow_live_edge" => window.follow_live_edge = parse(key, value)?,
            "window.order" => {
                window.order = match value {
                    "ascending" => SortOrder::Ascending,
                    "descending" => SortOrder::Descending,
                    _ => return Err(ConfigError::invalid(key, value)),
                }
            }
            "mock.total_messages" => mock.total_messages = parse(key, value)?,
            "mock.latency_ms" => mock.latency_ms = parse(key, value)?,
            "mock.failure_rate" => {
                let rate: f64 = parse(key, value)?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(ConfigError::invalid(key, value));
                }
                mock.failure_rate = rate;
            }
            "mock.live_interval_ms" => mock.live_interval_ms = parse(key, value)?,
            "mock.seed" => mock.seed = Some(parse(key, value)?),
            _ => {
                return Err(ConfigError::UnknownConfigKey {
                    key: key.to_string(),
                });
            }
        }

        self.window.validate()
    }

    pub fn config_path() -> ConfigResult<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let mut path = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        path.push(".config");
        path.push("timeline-window");
        path.push("config.toml");
        Ok(path)
    }
}

fn parse<V: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<V> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, value))
}

#[cfg(test)]
mod mod_tests;
