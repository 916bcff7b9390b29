//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `store_name` is empty
    /// - `origin` is not an http(s) URL
    /// - a partition name or version is empty, or two partitions collide
    /// - a shell asset is not an absolute path
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.store_name.is_empty() {
            return Err(invalid("store_name", "must not be empty"));
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(origin) => return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme()))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        for (field, partition) in [
            ("static_partition", &self.static_partition),
            ("dynamic_partition", &self.dynamic_partition),
            ("image_partition", &self.image_partition),
        ] {
            if partition.name.is_empty() {
                return Err(invalid(field, "name must not be empty"));
            }
            if partition.version.is_empty() {
                return Err(invalid(field, "version must not be empty"));
            }
        }

        let names: HashSet<String> = self.current_partitions().into_iter().collect();
        if names.len() != 3 {
            return Err(invalid("partitions", "static, dynamic and image partitions must have distinct names"));
        }

        if let Some(asset) = self.shell_assets.iter().find(|a| !a.starts_with('/')) {
            return Err(invalid("shell_assets", format!("{asset} must start with '/'")));
        }

        if self.excluded_paths.is_empty() {
            tracing::warn!(
                "excluded_paths is empty; admin, checkout and cart requests will be intercepted and cached"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartitionSettings;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_origin() {
        let config = AppConfig { origin: "ftp://store.example".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));

        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_empty_partition_version() {
        let config = AppConfig { image_partition: PartitionSettings::new("kala-images", ""), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "image_partition"));
    }

    #[test]
    fn test_validate_colliding_partitions() {
        let config = AppConfig { image_partition: PartitionSettings::new("kala-static", "v2.0"), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "partitions"));
    }

    #[test]
    fn test_validate_relative_shell_asset() {
        let config = AppConfig { shell_assets: vec!["/".into(), "search".into()], ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "shell_assets"));
    }

    #[test]
    fn test_validate_empty_exclusions_allowed() {
        let config = AppConfig { excluded_paths: Vec::new(), excluded_hosts: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
