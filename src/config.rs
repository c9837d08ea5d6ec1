use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::grid::GridPolicy;
use crate::import::parallel::BatchConfig;
use crate::logging::LogConfig;
use crate::store::DirectoryStore;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Where activity files are stored
    pub store: StoreSettings,

    /// Durations the curve is evaluated at
    pub grid: GridPolicy,

    /// Batch processing settings
    pub engine: BatchConfig,

    /// Logging settings
    pub logging: LogConfig,

    /// Athlete used when `--athlete` is not given
    pub default_athlete: Option<String>,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Activity storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Root directory; activities live in `<data_dir>/<athlete>/`
    pub data_dir: PathBuf,

    /// File extensions treated as activity files
    pub extensions: Vec<String>,

    /// Show a progress bar while reading files
    pub show_progress: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_dir: AppConfig::config_dir().join("activities"),
            extensions: vec!["fit".to_string()],
            show_progress: true,
        }
    }
}

impl StoreSettings {
    pub fn directory_store(&self) -> DirectoryStore {
        DirectoryStore::new(&self.data_dir)
            .with_extensions(self.extensions.clone())
            .with_progress(self.show_progress)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metadata: ConfigMetadata::default(),
            store: StoreSettings::default(),
            grid: GridPolicy::default(),
            engine: BatchConfig::default(),
            logging: LogConfig::default(),
            default_athlete: None,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config
            .grid
            .build()
            .with_context(|| "Invalid duration grid in configuration")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// `~/.powercurve`
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".powercurve")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from `path`, or from the default location, falling back to defaults
    /// when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else if path.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display())
        } else {
            tracing::debug!("Config file not found, using defaults: {}", config_path.display());
            Ok(Self::default())
        }
    }

    /// Save to default location
    pub fn save_default(&mut self) -> Result<PathBuf> {
        let path = Self::default_config_path();
        self.save_to_file(&path)?;
        Ok(path)
    }
}
