//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/davsearch/config.toml` by default. Every section is optional:
//!
//! ```toml
//! [store]
//! root = "/var/lib/davsearch"
//!
//! [search]
//! default_limit = 20
//! max_limit = 200
//! collation = "i;unicode-casemap"
//! parallel_scan = true
//!
//! [links]
//! base_url = "https://cloud.example.com/"
//!
//! [display]
//! date_format = "%d.%m.%y"
//! time_format = "%H:%M"
//!
//! [features]
//! disabled = ["tasks"]
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use davsearch_core::{TracingConfig, TracingOutputFormat, parse_level};
use davsearch_engine::{Collation, DEFAULT_MAX_LIMIT, EngineConfig};
use davsearch_providers::{BaseUrlGenerator, FormatOptions, StaticFeatureGate};

use crate::error::{CliError, CliResult};

/// Configuration for the davsearch CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where calendar data is read from.
    pub store: StoreSettings,

    /// Search limits and matching.
    pub search: SearchSettings,

    /// Link generation.
    pub links: LinkSettings,

    /// Entry formatting.
    pub display: FormatOptions,

    /// Disabled features.
    pub features: FeatureSettings,

    /// Log output.
    pub logging: LoggingSettings,
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Root of the calendar tree; defaults to the user data directory.
    pub root: Option<PathBuf>,
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Page size when `--limit` is not given.
    pub default_limit: usize,
    /// Largest accepted page size.
    pub max_limit: usize,
    /// RFC 4790 collation name.
    pub collation: String,
    /// Scan containers concurrently.
    pub parallel_scan: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: DEFAULT_MAX_LIMIT,
            collation: Collation::default().to_string(),
            parallel_scan: true,
        }
    }
}

/// Link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Base URL that thumbnails and deep links are resolved against.
    pub base_url: String,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
        }
    }
}

/// Feature settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Features turned off for everyone ("calendar", "tasks").
    pub disabled: Vec<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: TracingOutputFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: TracingOutputFormat::Compact,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default path, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the file exists but cannot be parsed.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] on invalid TOML or unknown values.
    pub fn parse(content: &str) -> CliResult<Self> {
        toml::from_str(content).map_err(|e| CliError::config(format!("failed to parse config: {e}")))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("davsearch")
    }

    /// Returns the default calendar tree location.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("davsearch")
    }

    /// Returns the calendar tree root.
    pub fn store_root(&self) -> PathBuf {
        self.store
            .root
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Builds the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for an unknown collation.
    pub fn engine_config(&self) -> CliResult<EngineConfig> {
        let collation: Collation = self
            .search
            .collation
            .parse()
            .map_err(|e| CliError::config(format!("[search] {e}")))?;
        Ok(EngineConfig::default()
            .with_max_limit(Some(self.search.max_limit))
            .with_parallel_scan(self.search.parallel_scan)
            .with_collation(collation))
    }

    /// Builds the URL generator.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if `base_url` is unusable.
    pub fn url_generator(&self) -> CliResult<BaseUrlGenerator> {
        BaseUrlGenerator::new(&self.links.base_url)
            .map_err(|e| CliError::config(format!("[links] {e}")))
    }

    /// Builds the feature gate.
    pub fn feature_gate(&self) -> StaticFeatureGate {
        self.features
            .disabled
            .iter()
            .fold(StaticFeatureGate::allow_all(), |gate, feature| {
                gate.without(feature.as_str())
            })
    }

    /// Builds the tracing configuration; `debug` forces debug output.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for an unknown level.
    pub fn tracing_config(&self, debug: bool) -> CliResult<TracingConfig> {
        if debug {
            return Ok(TracingConfig::debug().with_format(self.logging.format));
        }
        let level = parse_level(&self.logging.level)
            .map_err(|e| CliError::config(format!("[logging] {e}")))?;
        Ok(TracingConfig::default()
            .with_level(level)
            .with_format(self.logging.format))
    }

    /// Checks every setting that is only interpreted later.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> CliResult<()> {
        if self.search.default_limit == 0 {
            return Err(CliError::config("[search] default_limit must be positive"));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(CliError::config(format!(
                "[search] default_limit {} exceeds max_limit {}",
                self.search.default_limit, self.search.max_limit
            )));
        }
        self.engine_config()?;
        self.url_generator()?;
        self.tracing_config(false)?;
        self.display
            .validate()
            .map_err(|pattern| CliError::config(format!("[display] invalid pattern {pattern:?}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use davsearch_providers::{FeatureGate, User};

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.search.default_limit, 20);
        assert_eq!(config.search.max_limit, 200);
        assert_eq!(config.search.collation, "i;unicode-casemap");
        assert_eq!(config.display.date_format, "%d.%m.%y");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_file() {
        let config = AppConfig::parse(
            r#"
[store]
root = "/srv/calendars"

[search]
default_limit = 5
max_limit = 50
collation = "i;ascii-casemap"
parallel_scan = false

[links]
base_url = "https://cloud.example.com/"

[display]
date_format = "%Y-%m-%d"

[features]
disabled = ["tasks"]

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.store_root(), PathBuf::from("/srv/calendars"));
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.max_limit, Some(50));
        assert!(!engine.parallel_scan);
        assert_eq!(engine.collation, Collation::AsciiCasemap);
        assert_eq!(config.display.time_format, "%H:%M");
        assert_eq!(config.logging.format, TracingOutputFormat::Json);

        let gate = config.feature_gate();
        assert!(gate.is_enabled(&User::new("alice"), "calendar"));
        assert!(!gate.is_enabled(&User::new("alice"), "tasks"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_errors() {
        let config = AppConfig::parse("[search]\ncollation = \"i;basic\"").unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("i;basic"));

        let config = AppConfig::parse("[search]\ndefault_limit = 500").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::parse("[links]\nbase_url = \"nope\"").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::parse("[logging]\nlevel = \"loud\"").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::parse("[display]\ntime_format = \"%Q\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\ndefault_limit = 7\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.search.default_limit, 7);

        let missing = AppConfig::load_from(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(CliError::Config(_))));
    }

    #[test]
    fn dump_round_trips() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&text).unwrap();
        assert_eq!(parsed.search.collation, config.search.collation);
    }
}
