//! Generator configuration.
//!
//! Settings come from an optional file (`config/config.toml` unless a path is
//! given; JSON and YAML work too since the format follows the extension)
//! layered under `SCHEMAGEN__*` environment variables. Every field has a
//! default, so a missing file yields a usable configuration.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

const ENV_PREFIX: &str = "SCHEMAGEN";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub sorting: SortingConfig,
    #[serde(default)]
    pub formatting: FormattingConfig,
    #[serde(default)]
    pub lob_defaults: LobDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_true")]
    pub clean_script: bool,
    /// Render worker count; 0 picks one per available CPU
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
    #[serde(default = "default_schema_file")]
    pub schema_file: String,
    #[serde(default = "default_grants_file")]
    pub grants_file: String,
    #[serde(default = "default_build_file")]
    pub build_file: String,
    #[serde(default = "default_clean_file")]
    pub clean_file: String,
}

/// History trigger options
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HistoryConfig {
    /// Route history triggers through a per-schema `<ACCOUNT>_HISTORY` package
    #[serde(default)]
    pub use_procedures: bool,
    #[serde(default)]
    pub use_logging: bool,
}

/// Loader package options
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoaderConfig {
    #[serde(default)]
    pub enable: bool,
    /// Trim character inputs with SUBSTR to the column size
    #[serde(default)]
    pub enforce_char_lengths: bool,
    #[serde(default)]
    pub use_logging: bool,
    #[serde(default)]
    pub include_delete: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SortingConfig {
    /// Move NOT NULL columns ahead of nullable ones (stable)
    #[serde(default)]
    pub columns_nullable: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormattingConfig {
    /// Approximate characters before a list wraps onto a new line
    #[serde(default = "default_split_on")]
    pub split_on: usize,
    /// Approximate distance between line start and the second element
    #[serde(default = "default_table_min_spacing")]
    pub table_min_spacing: usize,
}

/// Fallbacks for LOB storage options when a row leaves them blank or invalid
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LobDefaults {
    #[serde(default = "default_yes")]
    pub deduplication: String,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_no")]
    pub caching: String,
    #[serde(default = "default_yes")]
    pub logging: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default `env_logger` filter when neither --verbose nor --quiet is given
    #[serde(default = "default_level")]
    pub level: String,
    /// PL/SQL procedure called by generated code when logging is enabled
    #[serde(default = "default_plsql_logger")]
    pub plsql_logger: String,
}

fn default_true() -> bool {
    true
}

fn default_output_directory() -> String {
    "output".to_string()
}

fn default_schema_file() -> String {
    "Schema.csv".to_string()
}

fn default_grants_file() -> String {
    "Grants.csv".to_string()
}

fn default_build_file() -> String {
    "build.sql".to_string()
}

fn default_clean_file() -> String {
    "clean.sql".to_string()
}

fn default_split_on() -> usize {
    100
}

fn default_table_min_spacing() -> usize {
    30
}

fn default_yes() -> String {
    "Y".to_string()
}

fn default_no() -> String {
    "N".to_string()
}

fn default_compression() -> String {
    "MEDIUM".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_plsql_logger() -> String {
    "LOGGING_UTL.LOG".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            files: FilesConfig::default(),
            history: HistoryConfig::default(),
            loader: LoaderConfig::default(),
            sorting: SortingConfig::default(),
            formatting: FormattingConfig::default(),
            lob_defaults: LobDefaults::default(),
            logging: LoggingConfig::default(),
            clean_script: true,
            workers: 0,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            schema_file: default_schema_file(),
            grants_file: default_grants_file(),
            build_file: default_build_file(),
            clean_file: default_clean_file(),
        }
    }
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            split_on: default_split_on(),
            table_min_spacing: default_table_min_spacing(),
        }
    }
}

impl Default for LobDefaults {
    fn default() -> Self {
        Self {
            deduplication: default_yes(),
            compression: default_compression(),
            caching: default_no(),
            logging: default_yes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            plsql_logger: default_plsql_logger(),
        }
    }
}

impl GeneratorConfig {
    /// Load from `config/config.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from the given file (optional) layered under `SCHEMAGEN__*` variables.
    ///
    /// A file that exists but cannot be parsed is reported and skipped; the
    /// environment alone is then used.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "Failed to load config file {}, falling back to env. Error: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        settings.try_deserialize::<GeneratorConfig>().map_err(|e| {
            ConfigError::Message(format!(
                "Generator configuration could not be loaded from file or environment: {}",
                e
            ))
        })
    }

    /// Effective configuration as pretty JSON, suitable for writing a starter file.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Worker count with the "0 means all CPUs" rule applied.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = GeneratorConfig::default();
        assert_eq!(cfg.formatting.split_on, 100);
        assert_eq!(cfg.formatting.table_min_spacing, 30);
        assert_eq!(cfg.lob_defaults.deduplication, "Y");
        assert_eq!(cfg.lob_defaults.compression, "MEDIUM");
        assert_eq!(cfg.lob_defaults.caching, "N");
        assert_eq!(cfg.lob_defaults.logging, "Y");
        assert!(!cfg.history.use_procedures);
        assert!(!cfg.loader.enable);
        assert_eq!(cfg.files.build_file, "build.sql");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = GeneratorConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.files.output_directory, "output");
        assert!(cfg.clean_script);
    }

    #[test]
    fn test_load_toml_overrides_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
workers = 3

[history]
use_procedures = true

[formatting]
split_on = 60

[lob_defaults]
compression = "HIGH"
"#,
        )
        .unwrap();

        let cfg = GeneratorConfig::load_from(&path).unwrap();
        assert_eq!(cfg.workers, 3);
        assert!(cfg.history.use_procedures);
        assert_eq!(cfg.formatting.split_on, 60);
        // untouched keys keep their defaults
        assert_eq!(cfg.formatting.table_min_spacing, 30);
        assert_eq!(cfg.lob_defaults.compression, "HIGH");
        assert_eq!(cfg.lob_defaults.deduplication, "Y");
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let json = GeneratorConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"split_on\": 100"));
        assert!(json.contains("\"plsql_logger\": \"LOGGING_UTL.LOG\""));
    }
}
