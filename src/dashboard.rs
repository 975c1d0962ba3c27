//! The twelve dashboard views.
//!
//! A view prints its tables to the given writer and, when an output
//! directory is set, saves its charts there. Views over an empty filtered
//! result print a "no data" notice instead of computing anything.

use crate::config::Config;
use crate::data::{records_to_frame, Catalog};
use crate::details::{detail_lines, find_title, titles, DetailQuery};
use crate::filter::FilteredView;
use crate::geo::{geo_join, load_geo_reference, plottable};
use crate::model::{cluster_movies, ClusterOutcome};
use crate::stats::{self, Category, ValueCount};
use crate::viz;
use clap::ValueEnum;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const NO_DATA: &str = "No data for the current filter.";

/// Navigation menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DashboardView {
    Home,
    Dataset,
    Statistics,
    ReleaseYears,
    Ratings,
    TypeComparison,
    TopCountries,
    RatingByType,
    Durations,
    CountryMap,
    Clustering,
    Details,
}

impl DashboardView {
    pub fn title(&self) -> &'static str {
        match self {
            DashboardView::Home => "Overview",
            DashboardView::Dataset => "Dataset Introduction",
            DashboardView::Statistics => "Basic Statistics",
            DashboardView::ReleaseYears => "Release Year Distribution",
            DashboardView::Ratings => "Rating Distribution",
            DashboardView::TypeComparison => "Movies vs TV Shows",
            DashboardView::TopCountries => "Top Countries by Titles",
            DashboardView::RatingByType => "Titles per Rating",
            DashboardView::Durations => "Movie Duration Analysis",
            DashboardView::CountryMap => "Titles per Country (Map)",
            DashboardView::Clustering => "Movie Clustering",
            DashboardView::Details => "Title Details",
        }
    }
}

/// Per-view parameters that come from the controls
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub preview_rows: Option<usize>,
    pub show_all: bool,
    pub details: DetailQuery,
    pub title: Option<String>,
}

/// One recompute pass over a filtered view
pub struct Dashboard<'a> {
    catalog: &'a Catalog,
    view: FilteredView<'a>,
    config: &'a Config,
    geo_reference_path: PathBuf,
    /// Charts are only drawn when set
    output_dir: Option<PathBuf>,
}

impl<'a> Dashboard<'a> {
    pub fn new(catalog: &'a Catalog, view: FilteredView<'a>, config: &'a Config) -> Self {
        Self {
            catalog,
            view,
            config,
            geo_reference_path: config.data.geo_reference_path.clone(),
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_geo_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.geo_reference_path = path.into();
        self
    }

    pub fn render<W: Write>(
        &self,
        selected: DashboardView,
        options: &RenderOptions,
        out: &mut W,
    ) -> crate::Result<()> {
        writeln!(out, "=== {} ===", selected.title())?;
        tracing::debug!(view = ?selected, rows = self.view.len(), "rendering view");

        // Details select from the full catalog, everything else needs data
        if selected != DashboardView::Details && self.view.is_empty() {
            writeln!(out, "{NO_DATA}")?;
            return Ok(());
        }

        match selected {
            DashboardView::Home => self.home(out),
            DashboardView::Dataset => self.dataset(options, out),
            DashboardView::Statistics => self.statistics(out),
            DashboardView::ReleaseYears => self.release_years(out),
            DashboardView::Ratings => self.ratings(out),
            DashboardView::TypeComparison => self.type_comparison(out),
            DashboardView::TopCountries => self.top_countries(out),
            DashboardView::RatingByType => self.rating_by_type(out),
            DashboardView::Durations => self.durations(out),
            DashboardView::CountryMap => self.country_map(out),
            DashboardView::Clustering => self.clustering(out),
            DashboardView::Details => self.details(options, out),
        }
    }

    fn chart_path(&self, name: &str) -> Option<PathBuf> {
        self.output_dir.as_ref().map(|dir| dir.join(name))
    }

    fn home<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let years = stats::release_year_counts(&self.view)?;
        let ratings = stats::value_counts(&self.view, Category::Rating)?;
        let types = stats::value_counts(&self.view, Category::Type)?;
        let countries = stats::top_n(
            &stats::value_counts(&self.view, Category::Country)?,
            self.config.aggregation.top_n,
        );
        let tab = stats::cross_tab(&self.view)?;
        let minutes = stats::movie_minutes(&self.view);

        writeln!(out, "Titles: {}", self.view.len())?;
        if let (Some(first), Some(last)) = (years.first(), years.last()) {
            writeln!(out, "Release years: {}-{}", first.0, last.0)?;
        }
        if let Some(top) = ratings.first() {
            writeln!(out, "Most common rating: {} ({:.2}%)", top.value, top.percent)?;
        }
        for t in &types {
            writeln!(out, "{}: {} ({:.2}%)", t.value, t.count, t.percent)?;
        }
        if let Some(top) = countries.first() {
            writeln!(out, "Top country: {} ({} titles)", top.value, top.count)?;
        }

        if let Some(dir) = &self.output_dir {
            viz::release_year_chart(&years, &dir.join("release_years.png"))?;
            viz::bar_chart(&ratings, "Rating Distribution", "Rating", &dir.join("ratings.png"))?;
            viz::bar_chart(&types, "Movies vs TV Shows", "Content type", &dir.join("types.png"))?;
            viz::bar_chart(&countries, "Top Countries", "Country", &dir.join("top_countries.png"))?;
            viz::stacked_bar_chart(&tab, &dir.join("rating_by_type.png"))?;
            let bins = stats::histogram(&minutes, self.config.aggregation.histogram_bins);
            viz::duration_histogram(&bins, &dir.join("durations.png"))?;
        }
        Ok(())
    }

    fn dataset<W: Write>(&self, options: &RenderOptions, out: &mut W) -> crate::Result<()> {
        let rows = if options.show_all {
            self.view.len()
        } else {
            options
                .preview_rows
                .unwrap_or(self.config.aggregation.preview_rows)
        };
        let mut frame = records_to_frame(self.view.iter().take(rows))?;
        // Keep the columns the catalog file carried, in file order
        let loaded: Vec<&str> = self
            .catalog
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|name| frame.column(name).is_ok())
            .collect();
        if !loaded.is_empty() {
            frame = frame.select(loaded)?;
        }

        writeln!(out, "Rows: {}", self.view.len())?;
        writeln!(out, "Columns: {}", frame.width())?;
        writeln!(out, "{frame}")?;
        Ok(())
    }

    fn statistics<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        writeln!(
            out,
            "{:<14} {:>7} {:>10} {:>10} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for (column, d) in stats::describe_view(&self.view)? {
            let std = d.std.map_or_else(|| "NaN".to_string(), |s| format!("{s:.4}"));
            writeln!(
                out,
                "{:<14} {:>7} {:>10.4} {:>10} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
                column, d.count, d.mean, std, d.min, d.q25, d.median, d.q75, d.max
            )?;
        }
        Ok(())
    }

    fn release_years<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let years = stats::release_year_counts(&self.view)?;
        writeln!(out, "{:<14} {:>8}", "release_year", "count")?;
        for (year, count) in &years {
            writeln!(out, "{year:<14} {count:>8}")?;
        }
        if let Some(peak) = years.iter().max_by_key(|(_, c)| *c) {
            writeln!(out, "Peak year: {} ({} titles)", peak.0, peak.1)?;
        }
        if let Some(path) = self.chart_path("release_years.png") {
            viz::release_year_chart(&years, &path)?;
        }
        Ok(())
    }

    fn ratings<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let counts = stats::value_counts(&self.view, Category::Rating)?;
        writeln!(out, "{:<10} {:>7} {:>8}  description", "rating", "count", "percent")?;
        for c in &counts {
            writeln!(
                out,
                "{:<10} {:>7} {:>7.2}%  {}",
                c.value,
                c.count,
                c.percent,
                self.config.ratings.description(&c.value)
            )?;
        }
        if let Some(path) = self.chart_path("ratings.png") {
            viz::bar_chart(&counts, "Rating Distribution", "Rating", &path)?;
        }
        Ok(())
    }

    fn type_comparison<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let counts = stats::value_counts(&self.view, Category::Type)?;
        write_counts(out, "type", &counts)?;
        if let Some(path) = self.chart_path("types.png") {
            viz::bar_chart(&counts, "Movies vs TV Shows", "Content type", &path)?;
        }
        Ok(())
    }

    fn top_countries<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let counts = stats::top_n(
            &stats::value_counts(&self.view, Category::Country)?,
            self.config.aggregation.top_n,
        );
        if counts.is_empty() {
            writeln!(out, "{NO_DATA}")?;
            return Ok(());
        }
        write_counts(out, "country", &counts)?;
        if let Some(path) = self.chart_path("top_countries.png") {
            viz::bar_chart(&counts, "Top Countries", "Country", &path)?;
        }
        Ok(())
    }

    fn rating_by_type<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let tab = stats::cross_tab(&self.view)?;
        if tab.is_empty() {
            writeln!(out, "{NO_DATA}")?;
            return Ok(());
        }
        write!(out, "{:<10}", "rating")?;
        for column in &tab.columns {
            write!(out, " {:>8}", column.as_str())?;
        }
        writeln!(out)?;
        for (row, rating) in tab.rows.iter().enumerate() {
            write!(out, "{rating:<10}")?;
            for count in &tab.counts[row] {
                write!(out, " {count:>8}")?;
            }
            writeln!(out)?;
        }
        if let Some(path) = self.chart_path("rating_by_type.png") {
            viz::stacked_bar_chart(&tab, &path)?;
        }
        Ok(())
    }

    fn durations<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let Some(summary) = stats::duration_summary(&self.view)? else {
            tracing::warn!("no movie durations in the current view");
            writeln!(out, "No movie data available.")?;
            return Ok(());
        };
        writeln!(
            out,
            "Movies: {} ({} with a parsable duration, the rest take the median)",
            summary.movies, summary.parsed
        )?;
        writeln!(out, "Average duration: {:.2} minutes", summary.mean)?;
        writeln!(out, "Shortest: {} minutes", summary.min)?;
        writeln!(out, "Longest: {} minutes", summary.max)?;
        if let Some(path) = self.chart_path("durations.png") {
            let minutes = stats::movie_minutes(&self.view);
            let bins = stats::histogram(&minutes, self.config.aggregation.histogram_bins);
            viz::duration_histogram(&bins, &path)?;
        }
        Ok(())
    }

    fn country_map<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let counts = stats::value_counts(&self.view, Category::Country)?;
        let reference = load_geo_reference(&self.geo_reference_path, &self.config.geo)?;
        let rows = geo_join(&counts, &reference);
        let plotted = plottable(&rows);

        writeln!(out, "{:<30} {:>7} {:>11} {:>10}", "country", "count", "longitude", "latitude")?;
        for (row, point) in &plotted {
            writeln!(
                out,
                "{:<30} {:>7} {:>11.3} {:>10.3}",
                row.country, row.count, point.longitude, point.latitude
            )?;
        }
        let dropped = rows.len() - plotted.len();
        if dropped > 0 {
            writeln!(out, "{dropped} countries without an exact reference match are not shown")?;
        }
        if let Some(path) = self.chart_path("country_map.png") {
            viz::country_map(&rows, self.config.geo.marker_scale, &path)?;
        }
        Ok(())
    }

    fn clustering<W: Write>(&self, out: &mut W) -> crate::Result<()> {
        let outcome = cluster_movies(&self.view, &self.config.clustering, &self.config.ratings)?;
        let result = match outcome {
            ClusterOutcome::Clustered(result) => result,
            ClusterOutcome::Insufficient { rows, required } => {
                writeln!(
                    out,
                    "Warning: not enough data to cluster \
                     ({rows} usable movies, {required} clusters requested)."
                )?;
                return Ok(());
            }
        };

        writeln!(out, "{:<40} {:<8} {:<10} {:>7}", "title", "rating", "duration", "cluster")?;
        for a in result.assignments.iter().take(self.config.aggregation.preview_rows) {
            writeln!(out, "{:<40} {:<8} {:<10} {:>7}", a.title, a.rating, a.duration, a.cluster)?;
        }

        let total = result.assignments.len();
        for (cluster, size) in result.cluster_sizes().iter().enumerate() {
            let centroid = result.centroids.row(cluster);
            writeln!(
                out,
                "Cluster {}: {} movies ({:.1}%), centroid rating {:.2}, duration {:.1} min",
                cluster,
                size,
                100.0 * *size as f64 / total as f64,
                centroid[0],
                centroid[1]
            )?;
        }
        writeln!(out, "Within-cluster sum of squares: {:.2}", result.inertia)?;

        if let Some(path) = self.chart_path("clusters.png") {
            viz::cluster_scatter(&result, &path)?;
        }
        Ok(())
    }

    fn details<W: Write>(&self, options: &RenderOptions, out: &mut W) -> crate::Result<()> {
        let matches = options.details.apply(self.catalog);
        let available = titles(&matches);
        if available.is_empty() {
            writeln!(out, "No titles match the selected type, country and year.")?;
            return Ok(());
        }

        let selected = options.title.as_deref().unwrap_or(available[0]);
        let Some(record) = find_title(&matches, selected) else {
            writeln!(
                out,
                "Title '{selected}' is not among the {} matching titles.",
                available.len()
            )?;
            return Ok(());
        };
        for (label, value) in detail_lines(record) {
            writeln!(out, "{label}: {value}")?;
        }
        Ok(())
    }
}

fn write_counts<W: Write>(out: &mut W, label: &str, counts: &[ValueCount]) -> std::io::Result<()> {
    writeln!(out, "{:<30} {:>7} {:>8}", label, "count", "percent")?;
    for c in counts {
        writeln!(out, "{:<30} {:>7} {:>7.2}%", c.value, c.count, c.percent)?;
    }
    Ok(())
}

/// Make sure the chart directory exists
pub fn prepare_output_dir(dir: &Path) -> crate::Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ContentType, TitleRecord};
    use crate::filter::{apply_filter, FilterSpec};

    fn record(
        title: &str,
        content_type: ContentType,
        year: i32,
        rating: &str,
        duration: &str,
        country: Option<&str>,
    ) -> TitleRecord {
        TitleRecord {
            show_id: None,
            content_type,
            title: title.to_string(),
            director: None,
            cast: None,
            country: country.map(str::to_owned),
            date_added: None,
            release_year: year,
            rating: Some(rating.to_string()),
            duration: Some(duration.to_string()),
            listed_in: None,
            description: None,
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::new(
            vec![
                record("First", ContentType::Movie, 2015, "PG", "90 min", Some("India")),
                record("Second", ContentType::TvShow, 2020, "TV-MA", "2 Seasons", None),
            ],
            vec!["type".into(), "title".into(), "release_year".into()],
        )
    }

    fn render(catalog: &Catalog, spec: &FilterSpec, selected: DashboardView) -> String {
        let config = Config::defaults().unwrap();
        let dashboard = Dashboard::new(catalog, apply_filter(catalog, spec).unwrap(), &config);
        let mut out = Vec::new();
        dashboard
            .render(selected, &RenderOptions::default(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_view_reports_no_data() {
        let catalog = create_test_catalog();
        let spec = FilterSpec::country_set(["Atlantis"]);
        for selected in DashboardView::value_variants() {
            if *selected == DashboardView::Details {
                continue;
            }
            let text = render(&catalog, &spec, *selected);
            assert!(text.contains(NO_DATA), "{selected:?} printed {text}");
        }
    }

    #[test]
    fn test_ratings_view() {
        let catalog = create_test_catalog();
        let text = render(&catalog, &FilterSpec::Unfiltered, DashboardView::Ratings);
        assert!(text.contains("PG"));
        assert!(text.contains("50.00%"));
        assert!(text.contains("Mature audiences"));
    }

    #[test]
    fn test_clustering_view_warns() {
        let catalog = create_test_catalog();
        let text = render(&catalog, &FilterSpec::Unfiltered, DashboardView::Clustering);
        assert!(text.contains("Warning: not enough data"));
    }

    #[test]
    fn test_durations_without_movies() {
        let catalog = create_test_catalog();
        let spec = FilterSpec::year_range(2020, 2020).unwrap();
        let text = render(&catalog, &spec, DashboardView::Durations);
        assert!(text.contains("No movie data available."));
    }

    #[test]
    fn test_details_ignore_sidebar_filter() {
        let catalog = create_test_catalog();
        let spec = FilterSpec::country_set(["Atlantis"]);
        let text = render(&catalog, &spec, DashboardView::Details);
        assert!(text.contains("Title: First"));
        assert!(text.contains("Director: not available"));
    }

    #[test]
    fn test_dataset_view_shows_loaded_columns() {
        let catalog = create_test_catalog();
        let text = render(&catalog, &FilterSpec::Unfiltered, DashboardView::Dataset);
        assert!(text.contains("Rows: 2"));
        assert!(text.contains("Columns: 3"));
        assert!(text.contains("shape: (2, 3)"));
    }

    #[test]
    fn test_statistics_view() {
        let catalog = create_test_catalog();
        let text = render(&catalog, &FilterSpec::Unfiltered, DashboardView::Statistics);
        assert!(text.contains("release_year"));
        assert!(text.contains("2017.5000"));
    }
}
