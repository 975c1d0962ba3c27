//! Catalog loading with Polars and the immutable record store

use crate::error::CatalogError;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fmt;
use std::path::Path;

/// Placeholder rendered for absent optional fields.
pub const NOT_AVAILABLE: &str = "not available";

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    Movie,
    TvShow,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Movie, ContentType::TvShow];

    /// Label as it appears in the catalog file
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "Movie",
            ContentType::TvShow => "TV Show",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Movie" => Some(ContentType::Movie),
            "TV Show" => Some(ContentType::TvShow),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRecord {
    pub show_id: Option<String>,
    pub content_type: ContentType,
    pub title: String,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub country: Option<String>,
    /// Raw text such as "September 25, 2021"
    pub date_added: Option<String>,
    pub release_year: i32,
    pub rating: Option<String>,
    /// "<N> min" for movies, season count text for shows
    pub duration: Option<String>,
    pub listed_in: Option<String>,
    pub description: Option<String>,
}

impl TitleRecord {
    pub fn is_movie(&self) -> bool {
        self.content_type == ContentType::Movie
    }

    /// Parsed `date_added`, if it is in the catalog's "Month D, YYYY" form
    pub fn added_on(&self) -> Option<NaiveDate> {
        let raw = self.date_added.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%B %d, %Y").ok()
    }
}

/// Render an optional field, substituting the "not available" placeholder
pub fn or_not_available(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

/// Immutable record store, loaded once per process
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<TitleRecord>,
    /// Column names of the source file, in file order
    columns: Vec<String>,
}

impl Catalog {
    pub fn new(records: Vec<TitleRecord>, columns: Vec<String>) -> Self {
        Self { records, columns }
    }

    pub fn records(&self) -> &[TitleRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Columns every catalog file must carry
const REQUIRED_COLUMNS: [&str; 3] = ["type", "title", "release_year"];

/// Load the catalog CSV into a [`Catalog`]
///
/// Every column is read as text and converted here, so odd values in one
/// column never change how the others are parsed.
///
/// # Arguments
/// * `file_path` - Path to the catalog CSV
///
/// # Returns
/// * `Catalog` with one record per data row
pub fn load_catalog(file_path: &Path) -> crate::Result<Catalog> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;

    let catalog = catalog_from_frame(&df)?;
    tracing::info!(
        path = %file_path.display(),
        rows = catalog.len(),
        columns = catalog.columns().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Convert a string-typed frame into typed records
pub fn catalog_from_frame(df: &DataFrame) -> crate::Result<Catalog> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            anyhow::bail!(CatalogError::MissingColumn(required.to_string()));
        }
    }

    let show_ids = text_column(df, "show_id")?;
    let types = text_column(df, "type")?;
    let titles = text_column(df, "title")?;
    let directors = text_column(df, "director")?;
    let casts = text_column(df, "cast")?;
    let countries = text_column(df, "country")?;
    let dates = text_column(df, "date_added")?;
    let years = text_column(df, "release_year")?;
    let ratings = text_column(df, "rating")?;
    let durations = text_column(df, "duration")?;
    let genres = text_column(df, "listed_in")?;
    let descriptions = text_column(df, "description")?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        // 1-based data rows, header excluded
        let row = i + 1;
        let invalid = |reason: String| CatalogError::InvalidRecord { row, reason };

        let content_type = match types[i].as_deref() {
            Some(raw) => ContentType::parse(raw)
                .ok_or_else(|| invalid(format!("unknown content type '{raw}'")))?,
            None => return Err(invalid("missing content type".to_string()).into()),
        };
        let release_year = match years[i].as_deref() {
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|_| invalid(format!("release_year '{raw}' is not an integer")))?,
            None => return Err(invalid("missing release_year".to_string()).into()),
        };

        records.push(TitleRecord {
            show_id: show_ids[i].clone(),
            content_type,
            title: titles[i].clone().unwrap_or_default(),
            director: directors[i].clone(),
            cast: casts[i].clone(),
            country: countries[i].clone(),
            date_added: dates[i].clone(),
            release_year,
            rating: ratings[i].clone(),
            duration: durations[i].clone(),
            listed_in: genres[i].clone(),
            description: descriptions[i].clone(),
        });
    }

    Ok(Catalog::new(records, columns))
}

/// Extract a column as trimmed optional strings; blank cells and absent
/// optional columns become `None`
fn text_column(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    let Ok(series) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let values = series.cast(&DataType::String)?;
    let values = values
        .str()?
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        })
        .collect();
    Ok(values)
}

/// Build a frame with every catalog column, in file order
///
/// Used for table previews and as the input of the grouped aggregations.
pub fn records_to_frame<'a, I>(records: I) -> crate::Result<DataFrame>
where
    I: IntoIterator<Item = &'a TitleRecord>,
{
    let mut show_ids = Vec::new();
    let mut types = Vec::new();
    let mut titles = Vec::new();
    let mut directors = Vec::new();
    let mut casts = Vec::new();
    let mut countries = Vec::new();
    let mut dates = Vec::new();
    let mut years = Vec::new();
    let mut ratings = Vec::new();
    let mut durations = Vec::new();
    let mut genres = Vec::new();
    let mut descriptions = Vec::new();

    for record in records {
        show_ids.push(record.show_id.clone());
        types.push(record.content_type.as_str().to_string());
        titles.push(record.title.clone());
        directors.push(record.director.clone());
        casts.push(record.cast.clone());
        countries.push(record.country.clone());
        dates.push(record.date_added.clone());
        years.push(record.release_year);
        ratings.push(record.rating.clone());
        durations.push(record.duration.clone());
        genres.push(record.listed_in.clone());
        descriptions.push(record.description.clone());
    }

    let df = DataFrame::new(vec![
        Series::new("show_id", show_ids),
        Series::new("type", types),
        Series::new("title", titles),
        Series::new("director", directors),
        Series::new("cast", casts),
        Series::new("country", countries),
        Series::new("date_added", dates),
        Series::new("release_year", years),
        Series::new("rating", ratings),
        Series::new("duration", durations),
        Series::new("listed_in", genres),
        Series::new("description", descriptions),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "show_id,type,title,director,cast,country,date_added,release_year,rating,duration,listed_in,description").unwrap();
        writeln!(file, "s1,Movie,Dick Johnson Is Dead,Kirsten Johnson,,United States,\"September 25, 2021\",2020,PG-13,90 min,Documentaries,A filmmaker honors her father.").unwrap();
        writeln!(file, "s2,TV Show,Blood & Water,,\"Ama Qamata, Khosi Ngema\",South Africa,\"September 24, 2021\",2021,TV-MA,2 Seasons,\"International TV Shows, TV Dramas\",Two teens cross paths.").unwrap();
        writeln!(file, "s3,TV Show,Ganglands,Julien Leclercq,Sami Bouajila,,\"September 24, 2021\",2021,,1 Season,Crime TV Shows,A protector gets caught up.").unwrap();
        file
    }

    #[test]
    fn test_load_catalog() {
        let test_file = create_test_csv();
        let catalog = load_catalog(test_file.path()).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.columns().len(), 12);

        let first = &catalog.records()[0];
        assert_eq!(first.content_type, ContentType::Movie);
        assert_eq!(first.release_year, 2020);
        assert_eq!(first.duration.as_deref(), Some("90 min"));
        assert_eq!(first.cast, None);

        let second = &catalog.records()[1];
        assert_eq!(second.content_type, ContentType::TvShow);
        assert_eq!(second.cast.as_deref(), Some("Ama Qamata, Khosi Ngema"));

        let third = &catalog.records()[2];
        assert_eq!(third.country, None);
        assert_eq!(third.rating, None);
    }

    #[test]
    fn test_missing_required_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "type,title").unwrap();
        writeln!(file, "Movie,Alone").unwrap();

        let err = load_catalog(file.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::MissingColumn("release_year".to_string()))
        );
    }

    #[test]
    fn test_non_integer_year_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "type,title,release_year").unwrap();
        writeln!(file, "Movie,Alone,20x0").unwrap();

        let err = load_catalog(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::InvalidRecord { row: 1, .. })
        ));
    }

    #[test]
    fn test_added_on() {
        let test_file = create_test_csv();
        let catalog = load_catalog(test_file.path()).unwrap();
        assert_eq!(
            catalog.records()[0].added_on(),
            NaiveDate::from_ymd_opt(2021, 9, 25)
        );
    }

    #[test]
    fn test_records_to_frame() {
        let test_file = create_test_csv();
        let catalog = load_catalog(test_file.path()).unwrap();
        let df = records_to_frame(catalog.records().iter().take(2)).unwrap();
        assert_eq!(df.shape(), (2, 12));
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, catalog.columns());
        assert_eq!(df.column("release_year").unwrap().dtype(), &DataType::Int32);
    }

    #[test]
    fn test_or_not_available() {
        assert_eq!(or_not_available(None), NOT_AVAILABLE);
        assert_eq!(or_not_available(Some("Kirsten Johnson")), "Kirsten Johnson");
    }
}
