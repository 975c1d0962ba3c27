//! Aggregations over a filtered view.
//!
//! Counting, cross tabulation and descriptive statistics run as Polars lazy
//! queries over a frame of the view. Empty input yields an empty result or
//! `None`, never a division by zero.

use crate::data::{records_to_frame, ContentType};
use crate::duration::{impute_median, parse_minutes};
use crate::filter::FilteredView;
use polars::prelude::*;

/// Categorical columns that can be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Rating,
    Type,
    Country,
}

impl Category {
    pub fn column(&self) -> &'static str {
        match self {
            Category::Rating => "rating",
            Category::Type => "type",
            Category::Country => "country",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// Share of the non-null population, 0-100.
    pub percent: f64,
}

fn view_frame(view: &FilteredView<'_>) -> crate::Result<LazyFrame> {
    Ok(records_to_frame(view.iter())?.lazy())
}

/// Read a count column as `usize`
fn counts(df: &DataFrame, name: &str) -> crate::Result<Vec<usize>> {
    let series = df.column(name)?.cast(&DataType::UInt64)?;
    let values = series
        .u64()?
        .into_iter()
        .map(|v| v.unwrap_or(0) as usize)
        .collect();
    Ok(values)
}

/// Count non-null values of `category`.
///
/// Ordered by count descending; equal counts keep first-appearance order.
pub fn value_counts(view: &FilteredView<'_>, category: Category) -> crate::Result<Vec<ValueCount>> {
    let column = category.column();
    let df = view_frame(view)?
        .filter(col(column).is_not_null())
        .group_by_stable([col(column)])
        .agg([len().alias("count")])
        .with_columns([(col("count").cast(DataType::Float64) * lit(100.0)
            / col("count").sum().cast(DataType::Float64))
        .alias("percent")])
        .sort(
            ["count"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let values = df.column(column)?.cast(&DataType::String)?;
    let percents = df.column("percent")?.cast(&DataType::Float64)?;
    let result = values
        .str()?
        .into_iter()
        .zip(counts(&df, "count")?)
        .zip(percents.f64()?.into_iter())
        .map(|((value, count), percent)| ValueCount {
            value: value.unwrap_or_default().to_string(),
            count,
            percent: percent.unwrap_or(0.0),
        })
        .collect();
    Ok(result)
}

/// First `n` entries of an already ordered count list.
pub fn top_n(counts: &[ValueCount], n: usize) -> Vec<ValueCount> {
    counts.iter().take(n).cloned().collect()
}

/// Titles released per year, ascending by year.
pub fn release_year_counts(view: &FilteredView<'_>) -> crate::Result<Vec<(i32, usize)>> {
    let df = view_frame(view)?
        .group_by([col("release_year")])
        .agg([len().alias("count")])
        .sort(["release_year"], SortMultipleOptions::default())
        .collect()?;

    let years = df.column("release_year")?.cast(&DataType::Int32)?;
    let result = years
        .i32()?
        .into_no_null_iter()
        .zip(counts(&df, "count")?)
        .collect();
    Ok(result)
}

/// Rating x type counts. Rows are ratings in text order, columns follow
/// [`ContentType::ALL`]; missing combinations are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<ContentType>,
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn get(&self, rating: &str, content_type: ContentType) -> usize {
        let row = self.rows.iter().position(|r| r == rating);
        let col = self.columns.iter().position(|c| *c == content_type);
        match (row, col) {
            (Some(row), Some(col)) => self.counts[row][col],
            _ => 0,
        }
    }

    pub fn row_total(&self, row: usize) -> usize {
        self.counts.get(row).map(|r| r.iter().sum()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cross tabulation of rating against content type. Unrated rows are left out.
pub fn cross_tab(view: &FilteredView<'_>) -> crate::Result<CrossTab> {
    let df = view_frame(view)?
        .filter(col("rating").is_not_null())
        .group_by([col("rating"), col("type")])
        .agg([len().alias("count")])
        .sort(["rating", "type"], SortMultipleOptions::default())
        .collect()?;

    let columns = ContentType::ALL.to_vec();
    let mut rows: Vec<String> = Vec::new();
    let mut grid: Vec<Vec<usize>> = Vec::new();

    let ratings = df.column("rating")?.cast(&DataType::String)?;
    let types = df.column("type")?.cast(&DataType::String)?;
    let cells = ratings
        .str()?
        .into_no_null_iter()
        .zip(types.str()?.into_no_null_iter())
        .zip(counts(&df, "count")?);
    for ((rating, kind), count) in cells {
        // Sorted by rating, so a new rating always starts a new row
        if rows.last().map(String::as_str) != Some(rating) {
            rows.push(rating.to_string());
            grid.push(vec![0; columns.len()]);
        }
        let column = ContentType::parse(kind).and_then(|t| columns.iter().position(|c| *c == t));
        if let (Some(column), Some(row)) = (column, grid.last_mut()) {
            row[column] = count;
        }
    }

    Ok(CrossTab {
        rows,
        columns,
        counts: grid,
    })
}

/// Sample descriptive statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); undefined below two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Describe a numeric sample; `None` when empty.
///
/// Quartiles interpolate linearly between the closest ranks.
pub fn describe(values: &[f64]) -> crate::Result<Option<Describe>> {
    if values.is_empty() {
        return Ok(None);
    }
    let value = || col("value");
    let df = DataFrame::new(vec![Series::new("value", values)])?
        .lazy()
        .select([
            value().mean().alias("mean"),
            value().std(1).alias("std"),
            value().min().alias("min"),
            value()
                .quantile(lit(0.25), QuantileInterpolOptions::Linear)
                .alias("q25"),
            value().median().alias("median"),
            value()
                .quantile(lit(0.75), QuantileInterpolOptions::Linear)
                .alias("q75"),
            value().max().alias("max"),
        ])
        .collect()?;

    let scalar = |name: &str| -> crate::Result<f64> {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        Ok(series.f64()?.get(0).unwrap_or(f64::NAN))
    };
    Ok(Some(Describe {
        count: values.len(),
        mean: scalar("mean")?,
        std: (values.len() > 1).then(|| scalar("std")).transpose()?,
        min: scalar("min")?,
        q25: scalar("q25")?,
        median: scalar("median")?,
        q75: scalar("q75")?,
        max: scalar("max")?,
    }))
}

/// Describe every numeric column of the record (release year).
pub fn describe_view(view: &FilteredView<'_>) -> crate::Result<Vec<(&'static str, Describe)>> {
    let years: Vec<f64> = view.iter().map(|r| f64::from(r.release_year)).collect();
    Ok(describe(&years)?
        .map(|d| vec![("release_year", d)])
        .unwrap_or_default())
}

/// Mean, shortest and longest movie duration.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationSummary {
    pub movies: usize,
    /// Movies whose duration parsed; the rest hold the median.
    pub parsed: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// One duration per movie in the view, unparsable values filled with the
/// median of the parsable ones. Empty when no movie duration parses.
pub fn movie_minutes(view: &FilteredView<'_>) -> Vec<f64> {
    let parsed: Vec<Option<f64>> = view
        .iter()
        .filter(|r| r.is_movie())
        .map(|r| parse_minutes(r.duration.as_deref()))
        .collect();
    impute_median(&parsed).into_iter().flatten().collect()
}

/// `None` when the view has no movie with a parsable duration.
pub fn duration_summary(view: &FilteredView<'_>) -> crate::Result<Option<DurationSummary>> {
    let movies = view.movies();
    let parsed = movies
        .iter()
        .filter(|r| parse_minutes(r.duration.as_deref()).is_some())
        .count();
    let minutes = movie_minutes(view);
    let Some(described) = describe(&minutes)? else {
        return Ok(None);
    };
    Ok(Some(DurationSummary {
        movies: movies.len(),
        parsed,
        mean: described.mean,
        min: described.min,
        max: described.max,
    }))
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Equal-width bins spanning min..max; the last bin includes max.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A single distinct value still gets a bin of width one
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lo: min + width * i as f64,
            hi: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &value in values {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        result[idx].count += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Catalog, TitleRecord};

    fn record(
        content_type: ContentType,
        year: i32,
        rating: Option<&str>,
        duration: &str,
        country: Option<&str>,
    ) -> TitleRecord {
        TitleRecord {
            show_id: None,
            content_type,
            title: format!("title {year}"),
            director: None,
            cast: None,
            country: country.map(str::to_owned),
            date_added: None,
            release_year: year,
            rating: rating.map(str::to_owned),
            duration: Some(duration.to_string()),
            listed_in: None,
            description: None,
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::new(
            vec![
                record(ContentType::Movie, 2015, Some("PG"), "90 min", Some("India")),
                record(ContentType::TvShow, 2020, Some("TV-MA"), "2 Seasons", None),
                record(ContentType::Movie, 2020, Some("TV-MA"), "120 min", Some("United States")),
                record(ContentType::Movie, 2019, Some("R"), "abc", Some("India")),
                record(ContentType::TvShow, 2018, None, "1 Season", Some("Japan")),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_value_counts_order_and_percent() {
        let catalog = create_test_catalog();
        let view = FilteredView::all(&catalog);
        let counts = value_counts(&view, Category::Rating).unwrap();

        let values: Vec<&str> = counts.iter().map(|c| c.value.as_str()).collect();
        // TV-MA leads; PG and R tie and keep first-seen order
        assert_eq!(values, vec!["TV-MA", "PG", "R"]);
        assert_eq!(counts[0].count, 2);
        assert!((counts[0].percent - 50.0).abs() < 1e-9);

        let total: f64 = counts.iter().map(|c| c.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_counts_empty() {
        let catalog = Catalog::new(Vec::new(), Vec::new());
        assert!(value_counts(&FilteredView::all(&catalog), Category::Country)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_top_n() {
        let catalog = create_test_catalog();
        let counts = value_counts(&FilteredView::all(&catalog), Category::Country).unwrap();
        let top = top_n(&counts, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].value, "India");
        assert_eq!(top[1].value, "United States");
    }

    #[test]
    fn test_release_year_counts() {
        let catalog = create_test_catalog();
        let counts = release_year_counts(&FilteredView::all(&catalog)).unwrap();
        assert_eq!(counts, vec![(2015, 1), (2018, 1), (2019, 1), (2020, 2)]);
    }

    #[test]
    fn test_cross_tab() {
        let catalog = create_test_catalog();
        let tab = cross_tab(&FilteredView::all(&catalog)).unwrap();
        assert_eq!(tab.rows, vec!["PG", "R", "TV-MA"]);
        assert_eq!(tab.get("TV-MA", ContentType::Movie), 1);
        assert_eq!(tab.get("TV-MA", ContentType::TvShow), 1);
        assert_eq!(tab.get("PG", ContentType::TvShow), 0);
        assert_eq!(tab.get("NC-17", ContentType::Movie), 0);
        assert_eq!(tab.row_total(2), 2);
    }

    #[test]
    fn test_describe() {
        let d = describe(&[1.0, 2.0, 3.0, 4.0]).unwrap().unwrap();
        assert_eq!(d.count, 4);
        assert!((d.mean - 2.5).abs() < 1e-12);
        assert!((d.std.unwrap() - 1.2909944487358056).abs() < 1e-9);
        assert!((d.q25 - 1.75).abs() < 1e-12);
        assert!((d.median - 2.5).abs() < 1e-12);
        assert!((d.q75 - 3.25).abs() < 1e-12);
        assert_eq!((d.min, d.max), (1.0, 4.0));

        let single = describe(&[7.0]).unwrap().unwrap();
        assert_eq!(single.std, None);
        assert_eq!(single.median, 7.0);

        assert!(describe(&[]).unwrap().is_none());
    }

    #[test]
    fn test_describe_view() {
        let catalog = create_test_catalog();
        let described = describe_view(&FilteredView::all(&catalog)).unwrap();
        assert_eq!(described.len(), 1);
        assert_eq!(described[0].0, "release_year");
        assert_eq!(described[0].1.count, 5);
    }

    #[test]
    fn test_duration_summary() {
        let catalog = create_test_catalog();
        let summary = duration_summary(&FilteredView::all(&catalog)).unwrap().unwrap();
        assert_eq!(summary.movies, 3);
        assert_eq!(summary.parsed, 2);
        assert!((summary.mean - 105.0).abs() < 1e-9);
        assert_eq!((summary.min, summary.max), (90.0, 120.0));

        let shows = FilteredView::all(&catalog).of_type(ContentType::TvShow);
        assert!(duration_summary(&shows).unwrap().is_none());
    }

    #[test]
    fn test_unparsable_duration_takes_the_median() {
        let catalog = Catalog::new(
            vec![
                record(ContentType::Movie, 2001, Some("PG"), "90 min", None),
                record(ContentType::Movie, 2002, Some("PG"), "100 min", None),
                record(ContentType::Movie, 2003, Some("PG"), "200 min", None),
                record(ContentType::Movie, 2004, Some("PG"), "abc", None),
                record(ContentType::TvShow, 2005, Some("TV-MA"), "2 Seasons", None),
            ],
            Vec::new(),
        );
        let view = FilteredView::all(&catalog);

        assert_eq!(movie_minutes(&view), vec![90.0, 100.0, 200.0, 100.0]);

        let summary = duration_summary(&view).unwrap().unwrap();
        assert_eq!(summary.movies, 4);
        assert_eq!(summary.parsed, 3);
        assert!((summary.mean - 122.5).abs() < 1e-9);
        assert_eq!((summary.min, summary.max), (90.0, 200.0));

        let bins = histogram(&movie_minutes(&view), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_no_parsable_duration() {
        let catalog = Catalog::new(
            vec![record(ContentType::Movie, 2001, Some("PG"), "abc", None)],
            Vec::new(),
        );
        let view = FilteredView::all(&catalog);
        assert!(movie_minutes(&view).is_empty());
        assert!(duration_summary(&view).unwrap().is_none());
    }

    #[test]
    fn test_histogram() {
        let values = [90.0, 95.0, 100.0, 150.0, 60.0];
        let bins = histogram(&values, 3);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].lo, 60.0);
        assert_eq!(bins[2].hi, 150.0);
        assert_eq!(bins[2].count, 1);

        let flat = histogram(&[42.0, 42.0], 30);
        assert_eq!(flat[0].count, 2);

        assert!(histogram(&[], 30).is_empty());
    }
}
