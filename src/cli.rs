//! Command-line interface definitions and argument parsing

use crate::config::FilterConfig;
use crate::dashboard::DashboardView;
use crate::data::ContentType;
use crate::details::DetailQuery;
use crate::error::CatalogError;
use crate::filter::{FilterOptions, FilterSelection, FilterSpec};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Explore a streaming catalog: summaries, charts, a country map and movie clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// View to render
    #[arg(value_enum, default_value_t = DashboardView::Home)]
    pub view: DashboardView,

    /// Path to the catalog CSV (overrides the configured path)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Country reference CSV for the map view (overrides the configured path)
    #[arg(short, long)]
    pub geo: Option<PathBuf>,

    /// Configuration file layered over the bundled defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for chart PNGs
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print tables only
    #[arg(long)]
    pub no_charts: bool,

    /// Filter category to select
    #[arg(short, long, value_enum)]
    pub filter: Option<FilterKind>,

    /// Release year range for `--filter year`, e.g. "2015,2020"
    #[arg(long)]
    pub years: Option<String>,

    /// Ratings for `--filter rating`; defaults to every rating in the catalog
    #[arg(long, value_delimiter = ',')]
    pub ratings: Vec<String>,

    /// Countries for `--filter country`, exact names
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Movie duration range in minutes for `--filter duration`, e.g. "60,120"
    #[arg(long)]
    pub minutes: Option<String>,

    /// Commit the selected filter; without it the full catalog is shown
    #[arg(short, long)]
    pub apply: bool,

    /// Rows shown by the dataset view
    #[arg(long)]
    pub rows: Option<usize>,

    /// Show every row in the dataset view
    #[arg(long)]
    pub all: bool,

    /// Details view: content type selector
    #[arg(long, value_enum)]
    pub detail_type: Option<DetailType>,

    /// Details view: exact country selector
    #[arg(long)]
    pub detail_country: Option<String>,

    /// Details view: release year selector
    #[arg(long)]
    pub detail_year: Option<i32>,

    /// Details view: title to show (first match when titles repeat)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterKind {
    Year,
    Rating,
    Country,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetailType {
    Movie,
    TvShow,
}

impl From<DetailType> for ContentType {
    fn from(value: DetailType) -> Self {
        match value {
            DetailType::Movie => ContentType::Movie,
            DetailType::TvShow => ContentType::TvShow,
        }
    }
}

impl Args {
    /// Build the sidebar state from the filter flags
    ///
    /// `--filter rating` without `--ratings` selects every rating in
    /// `options`, unrated titles included. The selection is only committed
    /// with `--apply`.
    pub fn filter_selection(
        &self,
        bounds: &FilterConfig,
        options: &FilterOptions,
    ) -> crate::Result<FilterSelection> {
        let mut selection = FilterSelection::default();
        let Some(kind) = self.filter else {
            return Ok(selection);
        };

        let spec = match kind {
            FilterKind::Year => {
                let raw = self.years.as_deref().ok_or_else(|| missing_parameter("--years"))?;
                let (lo, hi) = parse_pair::<i32>(raw, "release year")?;
                FilterSpec::year_range(lo, hi)?
            }
            FilterKind::Rating => {
                if self.ratings.is_empty() {
                    options.default_rating_filter()
                } else {
                    FilterSpec::rating_set(self.ratings.iter().map(|r| r.trim().to_string()))
                }
            }
            FilterKind::Country => {
                if self.countries.is_empty() {
                    return Err(missing_parameter("--countries").into());
                }
                FilterSpec::country_set(self.countries.iter().map(|c| c.trim().to_string()))
            }
            FilterKind::Duration => {
                let (lo, hi) = match self.minutes.as_deref() {
                    Some(raw) => parse_pair::<f64>(raw, "duration")?,
                    None => (f64::from(bounds.duration_min), f64::from(bounds.duration_max)),
                };
                FilterSpec::duration_range(lo, hi, bounds)?
            }
        };

        selection.select(spec);
        if self.apply {
            selection.apply();
        } else {
            tracing::info!("filter selected but not applied; pass --apply to use it");
        }
        Ok(selection)
    }

    pub fn detail_query(&self) -> DetailQuery {
        DetailQuery {
            content_type: self.detail_type.map(ContentType::from),
            country: self.detail_country.clone(),
            release_year: self.detail_year,
        }
    }
}

fn missing_parameter(flag: &str) -> CatalogError {
    CatalogError::InvalidFilter(format!("{flag} is required for this filter"))
}

/// Parse "lo,hi"
fn parse_pair<T: std::str::FromStr>(raw: &str, what: &str) -> crate::Result<(T, T)> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!(CatalogError::InvalidFilter(format!(
            "{what} range must be in format 'lo,hi'"
        )));
    }

    let lo: T = parts[0]
        .trim()
        .parse()
        .map_err(|_| CatalogError::InvalidFilter(format!("Invalid {what} value: {}", parts[0])))?;
    let hi: T = parts[1]
        .trim()
        .parse()
        .map_err(|_| CatalogError::InvalidFilter(format!("Invalid {what} value: {}", parts[1])))?;

    Ok((lo, hi))
}
