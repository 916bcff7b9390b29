//! Router configuration: partition names, shell manifest, exclusions.

use shellcache_core::{AppConfig, Error};
use url::Url;

use super::rules::ExclusionRules;

/// The three logical partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    Static,
    Dynamic,
    Image,
}

/// Physical (versioned) names of the current-generation partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    pub static_assets: String,
    pub dynamic: String,
    pub image: String,
}

impl PartitionNames {
    pub fn name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_assets,
            PartitionKind::Dynamic => &self.dynamic,
            PartitionKind::Image => &self.image,
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_assets, &self.dynamic, &self.image]
    }

    /// Whether `name` belongs to the current generation.
    pub fn is_current(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

/// Everything the router needs to know up front.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origin that shell paths resolve against.
    pub origin: Url,
    pub partitions: PartitionNames,
    /// Paths fetched and stored in the static partition at install time.
    pub shell_assets: Vec<String>,
    pub exclusions: ExclusionRules,
    /// Shown in the offline page title.
    pub store_name: String,
}

impl RouterConfig {
    /// Build from loaded application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let [static_assets, dynamic, image] = config.current_partitions();

        Ok(Self {
            origin,
            partitions: PartitionNames { static_assets, dynamic, image },
            shell_assets: config.shell_assets.clone(),
            exclusions: ExclusionRules::new(config.excluded_paths.clone(), config.excluded_hosts.clone()),
            store_name: config.store_name.clone(),
        })
    }
}
