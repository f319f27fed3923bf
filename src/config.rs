use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::{BaselineCapabilitySet, DEFAULT_CANONICAL, DEFAULT_IGNORED};
use crate::error::Result;
use crate::fleet::{ThrottleOptions, DEFAULT_MAX_CONCURRENT};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub hub: HubConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Action API endpoint serving `action=sitematrix`
    pub api_url: String,
    /// Sent with every request; Wikimedia requires contact information
    pub user_agent: String,
    /// Bot password user name (e.g. "Example@groupscan")
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyConfig {
    /// Maximum number of wikis probed at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-probe deadline in seconds (unset = wait forever)
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            probe_timeout_secs: None,
        }
    }
}

impl SurveyConfig {
    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_secs.map(Duration::from_secs)
    }

    pub fn throttle_options(&self) -> ThrottleOptions {
        ThrottleOptions {
            max_concurrent: self.max_concurrent,
            probe_timeout: self.probe_timeout(),
            ..ThrottleOptions::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where the JSON artifact is written
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String {
    "groups.json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineConfig {
    #[serde(default = "default_ignored")]
    pub ignored: Vec<String>,
    #[serde(default = "default_canonical")]
    pub canonical: Vec<String>,
}

fn default_ignored() -> Vec<String> {
    DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect()
}

fn default_canonical() -> Vec<String> {
    DEFAULT_CANONICAL.iter().map(|s| s.to_string()).collect()
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            ignored: default_ignored(),
            canonical: default_canonical(),
        }
    }
}

impl BaselineConfig {
    pub fn build(&self) -> Result<BaselineCapabilitySet> {
        BaselineCapabilitySet::new(self.ignored.clone(), self.canonical.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("hub.api_url", "https://meta.wikimedia.org/w/api.php")?
            .set_default(
                "hub.user_agent",
                concat!("groupscan/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("survey.max_concurrent", DEFAULT_MAX_CONCURRENT as i64)?
            .set_default("output.path", "groups.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("GROUPSCAN_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (GROUPSCAN_HUB__PASSWORD, etc.)
            .add_source(
                Environment::with_prefix("GROUPSCAN")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = url::Url::parse(&self.hub.api_url) {
            errors.push(format!("hub.api_url is not a valid URL: {e}"));
        }

        if self.hub.user_agent.trim().is_empty() {
            errors.push("hub.user_agent must not be empty".to_string());
        }

        if self.hub.username.is_some() != self.hub.password.is_some() {
            errors.push("hub.username and hub.password must be set together".to_string());
        }

        if self.survey.max_concurrent == 0 {
            errors.push("survey.max_concurrent must be positive".to_string());
        }

        if self.survey.probe_timeout_secs == Some(0) {
            errors.push("survey.probe_timeout_secs must be positive when set".to_string());
        }

        if self.output.path.trim().is_empty() {
            errors.push("output.path must not be empty".to_string());
        }

        if let Err(e) = self.baseline.build() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
