//! Service configuration
//!
//! Settings come from `config/<environment>.toml` when the file exists and
//! from built-in defaults otherwise; `LOADCAST_*` environment variables are
//! applied on top. A variable that is empty or fails to parse leaves the
//! previous value in place.

use crate::errors::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
    Testing,
}

impl Environment {
    /// Read `LOADCAST_ENV`, then `ENVIRONMENT`; development when neither is set
    pub fn detect() -> Result<Self> {
        let raw = env::var("LOADCAST_ENV")
            .or_else(|_| env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "development".to_string());
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" | "stage" => Ok(Environment::Staging),
            "testing" | "test" => Ok(Environment::Testing),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ServiceError::Config(format!("Unknown environment: {raw}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Testing => "testing",
        }
    }

    /// Config file for this environment under `dir`
    pub fn config_file(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.toml", self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locations of the three serving artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub columns_path: PathBuf,
    pub metadata_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            columns_path: PathBuf::from("artifacts/columns.json"),
            metadata_path: PathBuf::from("artifacts/metadata.json"),
            model_path: PathBuf::from("artifacts/model.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactPaths,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

/// Configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ServiceConfig,
    environment: Environment,
}

impl ConfigManager {
    /// Detect the environment and load from `./config`
    pub fn new() -> Result<Self> {
        let environment = Environment::detect()?;
        Self::load(environment, Path::new("config"), |key| env::var(key).ok())
    }

    /// Load for `environment` from `dir`, applying overrides from `lookup`
    pub fn load<F>(environment: Environment, dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = environment.config_file(dir);
        let mut config = if path.exists() {
            Self::load_config_from_file(&path)?
        } else {
            ServiceConfig::default()
        };
        Self::apply_env_overrides(&mut config, lookup);

        Ok(Self {
            config,
            environment,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn into_config(self) -> ServiceConfig {
        self.config
    }

    fn load_config_from_file(path: &Path) -> Result<ServiceConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Io(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            ServiceError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = non_empty("LOADCAST_HOST") {
            config.server.host = value;
        }

        if let Some(value) = non_empty("LOADCAST_PORT") {
            if let Ok(parsed) = value.parse::<u16>() {
                config.server.port = parsed;
            }
        }

        if let Some(value) = non_empty("LOADCAST_COLUMNS_PATH") {
            config.artifacts.columns_path = PathBuf::from(value);
        }

        if let Some(value) = non_empty("LOADCAST_METADATA_PATH") {
            config.artifacts.metadata_path = PathBuf::from(value);
        }

        if let Some(value) = non_empty("LOADCAST_MODEL_PATH") {
            config.artifacts.model_path = PathBuf::from(value);
        }

        if let Some(value) = non_empty("LOADCAST_CORS_ORIGINS") {
            let origins: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                config.cors.allowed_origins = origins;
            }
        }

        if let Some(value) = non_empty("LOADCAST_LOG_LEVEL") {
            config.logging.level = value;
        }

        if let Some(value) = non_empty("LOADCAST_LOG_FORMAT") {
            if let Some(parsed) = LogFormat::parse(&value) {
                config.logging.format = parsed;
            }
        }
    }
}
