//! Title lookup for the details view.
//!
//! The details selectors work on the full catalog and ignore the sidebar
//! filter.

use crate::data::{or_not_available, Catalog, ContentType, TitleRecord};
use crate::filter::FilteredView;
use std::collections::HashSet;

/// Type / country / year selectors; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailQuery {
    pub content_type: Option<ContentType>,
    pub country: Option<String>,
    pub release_year: Option<i32>,
}

impl DetailQuery {
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> FilteredView<'a> {
        let records = catalog
            .records()
            .iter()
            .filter(|r| self.content_type.map_or(true, |t| r.content_type == t))
            .filter(|r| {
                self.country
                    .as_deref()
                    .map_or(true, |c| r.country.as_deref() == Some(c))
            })
            .filter(|r| self.release_year.map_or(true, |y| r.release_year == y))
            .collect();
        FilteredView::from_records(records)
    }
}

/// Distinct titles in view order.
pub fn titles<'a>(view: &FilteredView<'a>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    view.iter()
        .map(|r| r.title.as_str())
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .collect()
}

/// First record carrying `title`; titles are not unique.
pub fn find_title<'a>(view: &FilteredView<'a>, title: &str) -> Option<&'a TitleRecord> {
    view.iter().find(|r| r.title == title)
}

/// Labelled fields for display, with placeholders for absent values.
pub fn detail_lines(record: &TitleRecord) -> Vec<(&'static str, String)> {
    let added = match record.added_on() {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => or_not_available(record.date_added.as_deref()).to_string(),
    };
    vec![
        ("Title", record.title.clone()),
        ("Type", record.content_type.to_string()),
        ("Director", or_not_available(record.director.as_deref()).to_string()),
        ("Cast", or_not_available(record.cast.as_deref()).to_string()),
        ("Country", or_not_available(record.country.as_deref()).to_string()),
        ("Date added", added),
        ("Release year", record.release_year.to_string()),
        ("Rating", or_not_available(record.rating.as_deref()).to_string()),
        ("Duration", or_not_available(record.duration.as_deref()).to_string()),
        ("Categories", or_not_available(record.listed_in.as_deref()).to_string()),
        ("Description", or_not_available(record.description.as_deref()).to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NOT_AVAILABLE;

    fn record(
        title: &str,
        content_type: ContentType,
        country: Option<&str>,
        year: i32,
    ) -> TitleRecord {
        TitleRecord {
            show_id: None,
            content_type,
            title: title.to_string(),
            director: None,
            cast: Some("Sami Bouajila".to_string()),
            country: country.map(str::to_owned),
            date_added: Some("September 24, 2021".to_string()),
            release_year: year,
            rating: None,
            duration: Some("1 Season".to_string()),
            listed_in: None,
            description: Some("A protector gets caught up.".to_string()),
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::new(
            vec![
                record("Ganglands", ContentType::TvShow, Some("France"), 2021),
                record("Sankofa", ContentType::Movie, Some("United States"), 1993),
                record("Ganglands", ContentType::Movie, Some("France"), 2020),
                record("Midnight Mass", ContentType::TvShow, None, 2021),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_query_all() {
        let catalog = create_test_catalog();
        let view = DetailQuery::default().apply(&catalog);
        assert_eq!(view.len(), 4);
        assert_eq!(titles(&view), vec!["Ganglands", "Sankofa", "Midnight Mass"]);
    }

    #[test]
    fn test_query_selectors() {
        let catalog = create_test_catalog();
        let query = DetailQuery {
            content_type: Some(ContentType::TvShow),
            country: None,
            release_year: Some(2021),
        };
        assert_eq!(titles(&query.apply(&catalog)), vec!["Ganglands", "Midnight Mass"]);

        let query = DetailQuery {
            country: Some("France".to_string()),
            ..DetailQuery::default()
        };
        assert_eq!(query.apply(&catalog).len(), 2);

        let query = DetailQuery {
            release_year: Some(1800),
            ..DetailQuery::default()
        };
        assert!(query.apply(&catalog).is_empty());
    }

    #[test]
    fn test_find_title_returns_first_match() {
        let catalog = create_test_catalog();
        let view = DetailQuery::default().apply(&catalog);
        let found = find_title(&view, "Ganglands").unwrap();
        assert_eq!(found.release_year, 2021);
        assert!(find_title(&view, "Nope").is_none());
    }

    #[test]
    fn test_detail_lines_placeholders() {
        let catalog = create_test_catalog();
        let lines = detail_lines(&catalog.records()[3]);
        let get = |label: &str| lines.iter().find(|(l, _)| *l == label).unwrap().1.clone();

        assert_eq!(get("Director"), NOT_AVAILABLE);
        assert_eq!(get("Country"), NOT_AVAILABLE);
        assert_eq!(get("Rating"), NOT_AVAILABLE);
        assert_eq!(get("Cast"), "Sami Bouajila");
        assert_eq!(get("Date added"), "2021-09-24");
        assert_eq!(get("Type"), "TV Show");
    }
}
