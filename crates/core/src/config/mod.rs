//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Logical name and generation tag of one cache partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSettings {
    pub name: String,
    pub version: String,
}

impl PartitionSettings {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into() }
    }

    /// Physical partition name: `<name>-<version>`.
    pub fn physical_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that relative request paths and shell assets resolve against.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Store name shown in the offline page title.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// CSS/JS/font partition, also holds the install-time shell.
    ///
    /// Set via SHELLCACHE_STATIC_PARTITION__NAME / __VERSION.
    #[serde(default = "default_static_partition")]
    pub static_partition: PartitionSettings,

    /// HTML page and API/JSON partition.
    #[serde(default = "default_dynamic_partition")]
    pub dynamic_partition: PartitionSettings,

    /// Image partition.
    #[serde(default = "default_image_partition")]
    pub image_partition: PartitionSettings,

    /// Routes pre-cached at install time.
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Path fragments that are never intercepted.
    ///
    /// Set via SHELLCACHE_EXCLUDED_PATHS environment variable.
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Host fragments that are never intercepted.
    ///
    /// Set via SHELLCACHE_EXCLUDED_HOSTS environment variable.
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:9292".into()
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_store_name() -> String {
    "Kala Aabharanam".into()
}

fn default_static_partition() -> PartitionSettings {
    PartitionSettings::new("kala-static", "v2.0")
}

fn default_dynamic_partition() -> PartitionSettings {
    PartitionSettings::new("kala-dynamic", "v2.0")
}

fn default_image_partition() -> PartitionSettings {
    PartitionSettings::new("kala-images", "v2.0")
}

fn default_shell_assets() -> Vec<String> {
    ["/", "/collections/all", "/pages/about", "/pages/contact", "/search"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excluded_paths() -> Vec<String> {
    ["/admin", "/checkout", "/cart"].into_iter().map(String::from).collect()
}

fn default_excluded_hosts() -> Vec<String> {
    vec!["shopify".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            store_name: default_store_name(),
            static_partition: default_static_partition(),
            dynamic_partition: default_dynamic_partition(),
            image_partition: default_image_partition(),
            shell_assets: default_shell_assets(),
            excluded_paths: default_excluded_paths(),
            excluded_hosts: default_excluded_hosts(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Physical names of the three current-generation partitions.
    pub fn current_partitions(&self) -> [String; 3] {
        [
            self.static_partition.physical_name(),
            self.dynamic_partition.physical_name(),
            self.image_partition.physical_name(),
        ]
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
