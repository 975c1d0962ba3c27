//! Filter engine: one active predicate over the record store.
//!
//! A [`FilterSpec`] lowers to a Polars expression that is evaluated over a
//! frame of the full catalog; the surviving row indices select the records.

use crate::config::FilterConfig;
use crate::data::{records_to_frame, Catalog, ContentType, TitleRecord};
use crate::duration::minutes_or_zero;
use crate::error::CatalogError;
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// Row position column added before filtering
const ROW_INDEX: &str = "row";
/// Movie minutes with missing durations as zero
const MINUTES: &str = "minutes";

/// The single active filter.
///
/// Applying a spec always starts from the full catalog, so switching category
/// discards whatever the previous spec selected.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FilterSpec {
    #[default]
    Unfiltered,
    YearRange { lo: i32, hi: i32 },
    RatingSet {
        ratings: BTreeSet<String>,
        /// Also keep titles without a rating
        include_unrated: bool,
    },
    CountrySet(BTreeSet<String>),
    /// Movies only, minutes, inclusive.
    DurationRange { lo: f64, hi: f64 },
}

impl FilterSpec {
    pub fn year_range(lo: i32, hi: i32) -> crate::Result<Self> {
        if lo > hi {
            anyhow::bail!(CatalogError::InvalidFilter(format!(
                "release year range {lo}..{hi} is reversed"
            )));
        }
        Ok(FilterSpec::YearRange { lo, hi })
    }

    /// Duration range, checked against the configured domain bounds.
    pub fn duration_range(lo: f64, hi: f64, bounds: &FilterConfig) -> crate::Result<Self> {
        let (min, max) = (f64::from(bounds.duration_min), f64::from(bounds.duration_max));
        if lo > hi {
            anyhow::bail!(CatalogError::InvalidFilter(format!(
                "duration range {lo}..{hi} is reversed"
            )));
        }
        if lo < min || hi > max {
            anyhow::bail!(CatalogError::InvalidFilter(format!(
                "duration range {lo}..{hi} is outside {min}..{max}"
            )));
        }
        Ok(FilterSpec::DurationRange { lo, hi })
    }

    /// Explicit ratings; unrated titles are excluded.
    pub fn rating_set<I, S>(ratings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec::RatingSet {
            ratings: ratings.into_iter().map(Into::into).collect(),
            include_unrated: false,
        }
    }

    pub fn country_set<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec::CountrySet(countries.into_iter().map(Into::into).collect())
    }

    /// Predicate over a catalog frame carrying a `minutes` column.
    ///
    /// Null ratings and countries never equal a selected value, so they only
    /// survive through `include_unrated`.
    pub fn to_expr(&self) -> Expr {
        match self {
            FilterSpec::Unfiltered => lit(true),
            FilterSpec::YearRange { lo, hi } => col("release_year")
                .gt_eq(lit(*lo))
                .and(col("release_year").lt_eq(lit(*hi))),
            FilterSpec::RatingSet {
                ratings,
                include_unrated,
            } => {
                let rated = any_of("rating", ratings);
                if *include_unrated {
                    rated.or(col("rating").is_null())
                } else {
                    rated
                }
            }
            FilterSpec::CountrySet(countries) => any_of("country", countries),
            FilterSpec::DurationRange { lo, hi } => col("type")
                .eq(lit(ContentType::Movie.as_str()))
                .and(col(MINUTES).gt_eq(lit(*lo)))
                .and(col(MINUTES).lt_eq(lit(*hi))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FilterSpec::Unfiltered => "no filter".to_string(),
            FilterSpec::YearRange { lo, hi } => format!("release year {lo}-{hi}"),
            FilterSpec::RatingSet {
                ratings,
                include_unrated,
            } => {
                let mut text = format!("rating in {}", join(ratings));
                if *include_unrated {
                    text.push_str(" or unrated");
                }
                text
            }
            FilterSpec::CountrySet(countries) => format!("country in {}", join(countries)),
            FilterSpec::DurationRange { lo, hi } => format!("movie duration {lo}-{hi} min"),
        }
    }
}

fn any_of(column: &str, values: &BTreeSet<String>) -> Expr {
    values
        .iter()
        .map(|value| col(column).eq(lit(value.as_str())))
        .reduce(|acc, expr| acc.or(expr))
        .unwrap_or_else(|| lit(false))
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Read-only subset of the catalog.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a TitleRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn all(catalog: &'a Catalog) -> Self {
        Self {
            records: catalog.records().iter().collect(),
        }
    }

    pub fn from_records(records: Vec<&'a TitleRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[&'a TitleRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TitleRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Narrow to movies, the only rows with minute-denominated durations.
    pub fn movies(&self) -> FilteredView<'a> {
        self.of_type(ContentType::Movie)
    }

    pub fn of_type(&self, content_type: ContentType) -> FilteredView<'a> {
        Self {
            records: self
                .iter()
                .filter(|r| r.content_type == content_type)
                .collect(),
        }
    }
}

/// Apply `spec` to the full catalog.
pub fn apply_filter<'a>(
    catalog: &'a Catalog,
    spec: &FilterSpec,
) -> crate::Result<FilteredView<'a>> {
    let kept = filter_frame(catalog)?
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .filter(spec.to_expr())
        .select([col(ROW_INDEX)])
        .collect()?;

    let rows = kept.column(ROW_INDEX)?.cast(&DataType::UInt64)?;
    let records: Vec<&TitleRecord> = rows
        .u64()?
        .into_no_null_iter()
        .filter_map(|row| catalog.records().get(row as usize))
        .collect();
    tracing::debug!(
        filter = %spec.describe(),
        kept = records.len(),
        total = catalog.len(),
        "filter applied"
    );
    Ok(FilteredView { records })
}

/// Catalog frame plus the numeric duration used by range filters
fn filter_frame(catalog: &Catalog) -> crate::Result<DataFrame> {
    let minutes: Vec<f64> = catalog
        .records()
        .iter()
        .map(|r| minutes_or_zero(r.duration.as_deref()))
        .collect();
    let mut frame = records_to_frame(catalog.records())?;
    frame.with_column(Series::new(MINUTES, minutes))?;
    Ok(frame)
}

/// What the filter controls can offer for a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Distinct ratings, first-seen order.
    pub ratings: Vec<String>,
    /// Distinct non-null countries, first-seen order.
    pub countries: Vec<String>,
    pub duration_min: u32,
    pub duration_max: u32,
}

impl FilterOptions {
    pub fn from_catalog(catalog: &Catalog, bounds: &FilterConfig) -> Self {
        let records = catalog.records();
        Self {
            year_min: records.iter().map(|r| r.release_year).min(),
            year_max: records.iter().map(|r| r.release_year).max(),
            ratings: distinct(records.iter().filter_map(|r| r.rating.as_deref())),
            countries: distinct(records.iter().filter_map(|r| r.country.as_deref())),
            duration_min: bounds.duration_min,
            duration_max: bounds.duration_max,
        }
    }

    /// Rating spec selecting every rating present, unrated titles included,
    /// so applying it keeps the whole catalog.
    pub fn default_rating_filter(&self) -> FilterSpec {
        FilterSpec::RatingSet {
            ratings: self.ratings.iter().cloned().collect(),
            include_unrated: true,
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

/// Sidebar state: a selected filter takes effect only once applied.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    selected: FilterSpec,
    active: FilterSpec,
}

impl FilterSelection {
    pub fn select(&mut self, spec: FilterSpec) {
        self.selected = spec;
    }

    /// Commit the selected spec, replacing whatever was active.
    pub fn apply(&mut self) {
        self.active = self.selected.clone();
    }

    pub fn active(&self) -> &FilterSpec {
        &self.active
    }

    pub fn view<'a>(&self, catalog: &'a Catalog) -> crate::Result<FilteredView<'a>> {
        apply_filter(catalog, &self.active)
    }
}
