//! Country reference points and the exact-name geo join

use crate::config::GeoConfig;
use crate::error::CatalogError;
use crate::stats::ValueCount;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// Country name -> representative point
#[derive(Debug, Clone, Default)]
pub struct GeoReference {
    points: HashMap<String, GeoPoint>,
}

impl GeoReference {
    pub fn new(points: HashMap<String, GeoPoint>) -> Self {
        Self { points }
    }

    pub fn get(&self, country: &str) -> Option<GeoPoint> {
        self.points.get(country).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Load a country attribute table exported to CSV (e.g. Natural Earth admin-0)
///
/// # Arguments
/// * `file_path` - Path to the CSV export
/// * `geo` - Names of the country, longitude and latitude columns
pub fn load_geo_reference(file_path: &Path, geo: &GeoConfig) -> crate::Result<GeoReference> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;

    let column = |name: &str| {
        df.column(name)
            .map_err(|_| CatalogError::MissingColumn(name.to_string()))
    };
    let names = column(&geo.name_column)?.cast(&DataType::String)?;
    let lons = column(&geo.longitude_column)?.cast(&DataType::Float64)?;
    let lats = column(&geo.latitude_column)?.cast(&DataType::Float64)?;

    let mut points = HashMap::new();
    for ((name, lon), lat) in names.str()?.into_iter().zip(lons.f64()?).zip(lats.f64()?) {
        if let (Some(name), Some(longitude), Some(latitude)) = (name, lon, lat) {
            // First row wins for duplicated names
            points
                .entry(name.to_string())
                .or_insert(GeoPoint { longitude, latitude });
        }
    }

    tracing::info!(path = %file_path.display(), countries = points.len(), "geo reference loaded");
    Ok(GeoReference::new(points))
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoJoinRow {
    pub country: String,
    pub count: usize,
    /// `None` when the reference has no country with exactly this name
    pub point: Option<GeoPoint>,
}

/// Attach reference points to country counts by exact name
pub fn geo_join(counts: &[ValueCount], reference: &GeoReference) -> Vec<GeoJoinRow> {
    counts
        .iter()
        .map(|c| {
            let point = reference.get(&c.value);
            if point.is_none() {
                tracing::debug!(country = %c.value, "no reference geometry, dropped from map");
            }
            GeoJoinRow {
                country: c.value.clone(),
                count: c.count,
                point,
            }
        })
        .collect()
}

/// Rows that can be drawn
pub fn plottable(rows: &[GeoJoinRow]) -> Vec<(&GeoJoinRow, GeoPoint)> {
    rows.iter()
        .filter_map(|row| row.point.map(|p| (row, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn geo_config() -> GeoConfig {
        GeoConfig {
            name_column: "NAME".to_string(),
            longitude_column: "LABEL_X".to_string(),
            latitude_column: "LABEL_Y".to_string(),
            marker_scale: 10.0,
        }
    }

    fn create_test_reference() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "NAME,ISO_A3,LABEL_X,LABEL_Y").unwrap();
        writeln!(file, "India,IND,79.358105,22.686852").unwrap();
        writeln!(file, "United States of America,USA,-97.482602,39.538479").unwrap();
        writeln!(file, "Japan,JPN,138.44217,36.142538").unwrap();
        file
    }

    fn count(value: &str, count: usize) -> ValueCount {
        ValueCount {
            value: value.to_string(),
            count,
            percent: 0.0,
        }
    }

    #[test]
    fn test_load_geo_reference() {
        let file = create_test_reference();
        let reference = load_geo_reference(file.path(), &geo_config()).unwrap();
        assert_eq!(reference.len(), 3);
        let india = reference.get("India").unwrap();
        assert!((india.longitude - 79.358105).abs() < 1e-9);
    }

    #[test]
    fn test_missing_geo_column() {
        let file = create_test_reference();
        let mut config = geo_config();
        config.latitude_column = "LAT".to_string();
        let err = load_geo_reference(file.path(), &config).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::MissingColumn("LAT".to_string()))
        );
    }

    #[test]
    fn test_exact_match_only() {
        let file = create_test_reference();
        let reference = load_geo_reference(file.path(), &geo_config()).unwrap();

        let counts = vec![count("India", 5), count("United States", 3), count("japan", 1)];
        let rows = geo_join(&counts, &reference);

        assert_eq!(rows.len(), 3);
        assert!(rows[0].point.is_some());
        // Naming differs from the reference, so no point is plotted
        assert!(rows[1].point.is_none());
        assert!(rows[2].point.is_none());

        let points = plottable(&rows);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].0.country, "India");
    }
}
