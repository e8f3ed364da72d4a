use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::generation::PlanDuration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generation: GenerationConfig,
    pub notifications: NotificationsConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: RequestDefaults,
}

/// Pacing of a generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Simulated substep work, lower bound in ms (default: 1500)
    pub substep_min_ms: u64,
    /// Simulated substep work, upper bound in ms (default: 2500)
    pub substep_max_ms: u64,
    /// Simulated work for a step without substeps, lower bound (default: 2000)
    pub step_min_ms: u64,
    /// Simulated work for a step without substeps, upper bound (default: 3000)
    pub step_max_ms: u64,
    /// Pause between steps in ms (default: 500)
    #[serde(default = "default_step_gap")]
    pub step_gap_ms: u64,
    /// Pause after the last step before the run closes (default: 1000)
    #[serde(default = "default_finish_delay")]
    pub finish_delay_ms: u64,
    /// Give up on a single unit of work after this many ms (0 = never)
    #[serde(default)]
    pub unit_timeout_ms: u64,
}

fn default_step_gap() -> u64 {
    500
}

fn default_finish_delay() -> u64 {
    1000
}

impl GenerationConfig {
    pub fn step_gap(&self) -> Duration {
        Duration::from_millis(self.step_gap_ms)
    }

    pub fn finish_delay(&self) -> Duration {
        Duration::from_millis(self.finish_delay_ms)
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        (self.unit_timeout_ms > 0).then(|| Duration::from_millis(self.unit_timeout_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub enabled: bool,
    /// How long a toast stays on screen (default: 5000)
    #[serde(default = "default_toast_duration")]
    pub toast_duration_ms: u64,
    /// Also write every event to the log
    #[serde(default = "default_true")]
    pub log_events: bool,
}

fn default_toast_duration() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    /// Runs listed on the results screen
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub state: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

/// Request fields the brief form does not ask for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDefaults {
    #[serde(default = "default_brand_id")]
    pub brand_id: String,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub duration: PlanDuration,
    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,
    /// Tone used when the brief leaves brand voice empty
    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_brand_id() -> String {
    "default".to_string()
}

fn default_platforms() -> Vec<String> {
    ["instagram", "twitter", "linkedin", "facebook", "youtube", "blog"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_content_types() -> Vec<String> {
    ["posts", "stories", "articles", "videos"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_tone() -> String {
    "professional".to_string()
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            brand_id: default_brand_id(),
            platforms: default_platforms(),
            duration: PlanDuration::default(),
            content_types: default_content_types(),
            tone: default_tone(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".contentgen/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Embedded defaults so contentgen works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/contentgen/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("contentgen").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. CONTENTGEN__GENERATION__STEP_GAP_MS=0
        builder = builder.add_source(
            config::Environment::with_prefix("CONTENTGEN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .contentgen/config.toml
    pub fn save(&self) -> Result<()> {
        let config_path = Self::local_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create contentgen config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(&config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.notifications.toast_duration_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig {
                substep_min_ms: 1500,
                substep_max_ms: 2500,
                step_min_ms: 2000,
                step_max_ms: 3000,
                step_gap_ms: default_step_gap(),
                finish_delay_ms: default_finish_delay(),
                unit_timeout_ms: 0,
            },
            notifications: NotificationsConfig {
                enabled: true,
                toast_duration_ms: default_toast_duration(),
                log_events: true,
            },
            ui: UiConfig {
                refresh_rate_ms: 100,
                history_limit: 20,
            },
            paths: PathsConfig {
                state: ".contentgen".to_string(), // Relative to cwd
            },
            logging: LoggingConfig::default(),
            defaults: RequestDefaults::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_pacing() {
        let config = Config::default();
        assert_eq!(config.generation.substep_min_ms, 1500);
        assert_eq!(config.generation.substep_max_ms, 2500);
        assert_eq!(config.generation.step_gap(), Duration::from_millis(500));
        assert_eq!(config.generation.finish_delay(), Duration::from_millis(1000));
        assert_eq!(config.generation.unit_timeout(), None);
    }

    #[test]
    fn test_unit_timeout_enabled_when_positive() {
        let mut config = Config::default();
        config.generation.unit_timeout_ms = 250;
        assert_eq!(
            config.generation.unit_timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_default_request_fields() {
        let defaults = RequestDefaults::default();
        assert_eq!(defaults.brand_id, "default");
        assert_eq!(defaults.tone, "professional");
        assert_eq!(defaults.platforms.len(), 6);
        assert_eq!(defaults.duration, PlanDuration::OneMonth);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ui.history_limit, config.ui.history_limit);
        assert_eq!(parsed.defaults.platforms, config.defaults.platforms);
    }

    #[test]
    fn test_partial_toml_fills_serde_defaults() {
        let text = r#"
            [generation]
            substep_min_ms = 0
            substep_max_ms = 0
            step_min_ms = 0
            step_max_ms = 0

            [notifications]
            enabled = false

            [ui]
            refresh_rate_ms = 50
            history_limit = 5

            [paths]
            state = "/tmp/contentgen"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.generation.step_gap_ms, 500);
        assert_eq!(config.notifications.toast_duration_ms, 5000);
        assert!(config.notifications.log_events);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.brand_id, "default");
        assert_eq!(config.state_path(), PathBuf::from("/tmp/contentgen"));
        assert!(config.logs_path().ends_with("logs"));
    }
}
