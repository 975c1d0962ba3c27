//! catalog-lens: exploration of a static streaming catalog
//!
//! This library loads a title catalog into an immutable record store, applies
//! a single active filter, and computes the summaries behind each dashboard
//! view: category counts, descriptive statistics, duration analysis, a
//! country map join and K-Means grouping of movies by rating and duration.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod details;
pub mod duration;
pub mod error;
pub mod filter;
pub mod geo;
pub mod model;
pub mod stats;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::Config;
pub use dashboard::{Dashboard, DashboardView};
pub use data::{load_catalog, Catalog, ContentType, TitleRecord};
pub use error::CatalogError;
pub use filter::{apply_filter, FilterOptions, FilterSelection, FilterSpec, FilteredView};
pub use geo::{geo_join, load_geo_reference, GeoReference};
pub use model::{cluster_movies, ClusterOutcome, ClusterResult};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
