//! Chart rendering with Plotters
//!
//! Every function writes one PNG and returns without drawing when handed no
//! data, so empty filtered views never reach the plotting backend.

use crate::geo::GeoJoinRow;
use crate::model::ClusterResult;
use crate::stats::{CrossTab, HistogramBin, ValueCount};
use plotters::prelude::*;
use std::path::Path;

/// Color palette for clusters and stacked series
const PALETTE: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

const TEAL: RGBColor = RGBColor(0, 128, 128);
const ROYAL_BLUE: RGBColor = RGBColor(65, 105, 225);
const LIGHT_GREY: RGBColor = RGBColor(211, 211, 211);

fn palette(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

fn axis_max(max: usize) -> f64 {
    (max.max(1) as f64) * 1.1
}

/// Line chart of titles per release year
pub fn release_year_chart(counts: &[(i32, usize)], output_path: &Path) -> crate::Result<()> {
    let (Some(first), Some(last)) = (counts.first(), counts.last()) else {
        tracing::info!(path = %output_path.display(), "no data, release year chart skipped");
        return Ok(());
    };
    let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(1);

    let root = BitMapBackend::new(output_path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Release Year Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(first.0..last.0 + 1, 0f64..axis_max(max_count))?;

    chart
        .configure_mesh()
        .x_desc("Release year")
        .y_desc("Titles")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(LineSeries::new(
        counts.iter().map(|&(year, count)| (year, count as f64)),
        TEAL.stroke_width(2),
    ))?;

    root.present()?;
    tracing::info!(path = %output_path.display(), "release year chart saved");
    Ok(())
}

/// Bar chart of category counts
pub fn bar_chart(
    counts: &[ValueCount],
    title: &str,
    x_desc: &str,
    output_path: &Path,
) -> crate::Result<()> {
    if counts.is_empty() {
        tracing::info!(path = %output_path.display(), "no data, bar chart skipped");
        return Ok(());
    }
    let labels: Vec<String> = counts.iter().map(|c| c.value.clone()).collect();
    let max_count = counts.iter().map(|c| c.count).max().unwrap_or(1);

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(counts.len() as f64 - 0.5), 0f64..axis_max(max_count))?;

    let label_at = |x: &f64| category_label(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&label_at)
        .x_desc(x_desc)
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, count) in counts.iter().enumerate() {
        let color = palette(i);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, count.count as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    tracing::info!(path = %output_path.display(), "bar chart saved");
    Ok(())
}

/// Stacked bars of rating x type
pub fn stacked_bar_chart(tab: &CrossTab, output_path: &Path) -> crate::Result<()> {
    if tab.is_empty() {
        tracing::info!(path = %output_path.display(), "no data, stacked bar chart skipped");
        return Ok(());
    }
    let max_total = (0..tab.rows.len()).map(|r| tab.row_total(r)).max().unwrap_or(1);

    let root = BitMapBackend::new(output_path, (1400, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Movies and TV Shows per Rating", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(tab.rows.len() as f64 - 0.5), 0f64..axis_max(max_total))?;

    let label_at = |x: &f64| category_label(&tab.rows, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(tab.rows.len())
        .x_label_formatter(&label_at)
        .x_desc("Rating")
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let mut base = vec![0usize; tab.rows.len()];
    for (col, content_type) in tab.columns.iter().enumerate() {
        let color = palette(col * 2);
        chart
            .draw_series(tab.counts.iter().enumerate().map(|(row, counts)| {
                let bottom = base[row] as f64;
                let top = (base[row] + counts[col]) as f64;
                let x = row as f64;
                Rectangle::new([(x - 0.4, bottom), (x + 0.4, top)], color.filled())
            }))?
            .label(content_type.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
        for (row, counts) in tab.counts.iter().enumerate() {
            base[row] += counts[col];
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!(path = %output_path.display(), "stacked bar chart saved");
    Ok(())
}

/// Histogram of movie durations
pub fn duration_histogram(bins: &[HistogramBin], output_path: &Path) -> crate::Result<()> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        tracing::info!(path = %output_path.display(), "no data, duration histogram skipped");
        return Ok(());
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1);

    let root = BitMapBackend::new(output_path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Movie Duration Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(first.lo..last.hi, 0f64..axis_max(max_count))?;

    chart
        .configure_mesh()
        .x_desc("Duration (minutes)")
        .y_desc("Frequency")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bins.iter().map(|bin| {
        Rectangle::new([(bin.lo, 0.0), (bin.hi, bin.count as f64)], ROYAL_BLUE.mix(0.7).filled())
    }))?;

    root.present()?;
    tracing::info!(path = %output_path.display(), "duration histogram saved");
    Ok(())
}

/// Scatter of (rating ordinal, duration) colored by cluster, centroids as squares
pub fn cluster_scatter(result: &ClusterResult, output_path: &Path) -> crate::Result<()> {
    if result.assignments.is_empty() {
        tracing::info!(path = %output_path.display(), "no data, cluster scatter skipped");
        return Ok(());
    }
    let max_minutes = result
        .assignments
        .iter()
        .map(|a| a.duration_minutes)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_minutes = result
        .assignments
        .iter()
        .map(|a| a.duration_minutes)
        .fold(f64::INFINITY, f64::min);

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Movies by Rating and Duration", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..6f64, (min_minutes - 10.0)..(max_minutes + 10.0))?;

    chart
        .configure_mesh()
        .x_desc("Rating (ordinal)")
        .y_desc("Duration (minutes)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for cluster in 0..result.n_clusters {
        let color = palette(cluster);
        chart
            .draw_series(
                result
                    .assignments
                    .iter()
                    .filter(|a| a.cluster == cluster)
                    .map(|a| {
                        Circle::new((a.rating_ordinal, a.duration_minutes), 5, color.filled())
                    }),
            )?
            .label(format!("Cluster {}", cluster))
            .legend(move |(x, y)| Circle::new((x + 5, y), 5, color.filled()));
    }

    // Plot centroids as larger squares
    for (cluster_id, centroid) in result.centroids.outer_iter().enumerate() {
        let (x, y) = (centroid[0], centroid[1]);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.05, y - 2.0), (x + 0.05, y + 2.0)],
            palette(cluster_id).stroke_width(3),
        )))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    tracing::info!(path = %output_path.display(), "cluster scatter saved");
    Ok(())
}

/// Country points sized by title count; unmatched countries are not drawn
pub fn country_map(
    rows: &[GeoJoinRow],
    marker_scale: f64,
    output_path: &Path,
) -> crate::Result<()> {
    let points = crate::geo::plottable(rows);
    if points.is_empty() {
        tracing::info!(path = %output_path.display(), "no data, country map skipped");
        return Ok(());
    }

    let root = BitMapBackend::new(output_path, (1500, 1000)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Titles by Country", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-180f64..180f64, -90f64..90f64)?;

    chart
        .configure_mesh()
        .light_line_style(LIGHT_GREY)
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()?;

    let red = RED.mix(0.7);
    chart.draw_series(points.iter().map(|(row, point)| {
        // Marker area follows count * scale, as a point size
        let radius = (row.count as f64 * marker_scale).sqrt().max(2.0) as i32;
        Circle::new((point.longitude, point.latitude), radius, red.filled())
    }))?;

    root.present()?;
    tracing::info!(path = %output_path.display(), plotted = points.len(), "country map saved");
    Ok(())
}

fn category_label(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}
