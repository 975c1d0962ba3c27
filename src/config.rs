//! Layered configuration.
//!
//! Uses Figment to merge the bundled `config/default.toml`, an optional user
//! file and `CATALOG_*` environment variables (`__` separates sections, e.g.
//! `CATALOG_CLUSTERING__SEED=7`). The rating ordinal map and the rating
//! descriptions live in the versioned `[ratings]` table rather than in code.

use crate::error::CatalogError;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration schema version understood by this build.
pub const CONFIG_VERSION: u32 = 1;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "catalog-lens.toml";

/// Text shown for ratings without an entry in the description table.
pub const NO_DESCRIPTION: &str = "no description available";

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
const ENV_PREFIX: &str = "CATALOG_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub data: DataConfig,
    pub filters: FilterConfig,
    pub aggregation: AggregationConfig,
    pub clustering: ClusteringConfig,
    pub geo: GeoConfig,
    pub ratings: RatingTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub catalog_path: PathBuf,
    pub geo_reference_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Domain bounds for the movie-duration filter, in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterConfig {
    pub duration_min: u32,
    pub duration_max: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub top_n: usize,
    pub histogram_bins: usize,
    pub preview_rows: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iterations: u64,
    pub tolerance: f64,
}

/// Column names of the country reference table and map marker sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub name_column: String,
    pub longitude_column: String,
    pub latitude_column: String,
    pub marker_scale: f64,
}

/// Rating vocabulary: ordinal values for clustering and display descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingTable {
    pub ordinal: HashMap<String, u8>,
    pub descriptions: HashMap<String, String>,
}

impl RatingTable {
    /// Ordinal value of a rating; ratings outside the table are missing.
    pub fn ordinal(&self, rating: &str) -> Option<f64> {
        self.ordinal.get(rating).map(|&v| f64::from(v))
    }

    pub fn description(&self, rating: &str) -> &str {
        self.descriptions
            .get(rating)
            .map(String::as_str)
            .unwrap_or(NO_DESCRIPTION)
    }
}

impl Config {
    /// Bundled defaults only.
    pub fn defaults() -> crate::Result<Self> {
        Self::from_figment(Figment::from(Toml::string(DEFAULT_CONFIG)))
    }

    /// Load defaults, then `path` (or `catalog-lens.toml` if present), then env.
    ///
    /// An explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut figment = Figment::from(Toml::string(DEFAULT_CONFIG));
        match path {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!(CatalogError::InvalidConfig(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> crate::Result<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| CatalogError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        tracing::debug!(version = config.version, "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.version != CONFIG_VERSION {
            anyhow::bail!(CatalogError::UnsupportedConfigVersion {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }
        if self.filters.duration_min > self.filters.duration_max {
            anyhow::bail!(CatalogError::InvalidConfig(format!(
                "duration bounds {}..{} are reversed",
                self.filters.duration_min, self.filters.duration_max
            )));
        }
        if self.clustering.n_clusters == 0 {
            anyhow::bail!(CatalogError::InvalidConfig(
                "clustering.n_clusters must be at least 1".to_string()
            ));
        }
        if self.clustering.tolerance <= 0.0 {
            anyhow::bail!(CatalogError::InvalidConfig(
                "clustering.tolerance must be positive".to_string()
            ));
        }
        if self.aggregation.histogram_bins == 0 {
            anyhow::bail!(CatalogError::InvalidConfig(
                "aggregation.histogram_bins must be at least 1".to_string()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::defaults().unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.clustering.n_clusters, 3);
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(config.filters.duration_max, 300);
        assert_eq!(config.aggregation.top_n, 10);
        assert_eq!(config.ratings.ordinal("PG-13"), Some(3.0));
        assert_eq!(config.ratings.ordinal("TV-MA"), None);
    }

    #[test]
    fn test_rating_descriptions() {
        let config = Config::defaults().unwrap();
        assert!(config.ratings.description("TV-MA").starts_with("Mature"));
        assert_eq!(config.ratings.description("XYZ"), NO_DESCRIPTION);
    }

    #[test]
    fn test_file_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [clustering]
                seed = 7
                "#,
            )?;
            jail.set_env("CATALOG_AGGREGATION__TOP_N", "5");

            let config = Config::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.clustering.seed, 7);
            assert_eq!(config.aggregation.top_n, 5);
            assert_eq!(config.clustering.n_clusters, 3);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_| {
            let err = Config::load(Some(Path::new("absent.toml"))).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CatalogError>(),
                Some(CatalogError::InvalidConfig(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_version() {
        Jail::expect_with(|jail| {
            jail.create_file("catalog-lens.toml", "version = 2")?;
            let err = Config::load(None).unwrap_err();
            assert_eq!(
                err.downcast_ref::<CatalogError>(),
                Some(&CatalogError::UnsupportedConfigVersion { found: 2, expected: 1 })
            );
            Ok(())
        });
    }

    #[test]
    fn test_reversed_duration_bounds() {
        Jail::expect_with(|jail| {
            jail.set_env("CATALOG_FILTERS__DURATION_MIN", "400");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }
}
