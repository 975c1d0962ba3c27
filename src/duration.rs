//! Duration text normalization.
//!
//! Movie durations arrive as free text such as `"90 min"`. Every numeric use
//! of a duration (filtering, histograms, statistics, clustering) goes through
//! [`parse_minutes`]; the raw text is never compared numerically.

const MINUTES_SUFFIX: &str = " min";

/// Parse a duration field into minutes.
///
/// Strips a trailing `" min"` and parses the rest as a float. Absent,
/// unparsable and non-finite values are reported as missing.
pub fn parse_minutes(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    let number = text.strip_suffix(MINUTES_SUFFIX).unwrap_or(text).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Filter context: missing durations count as zero minutes.
pub fn minutes_or_zero(raw: Option<&str>) -> f64 {
    parse_minutes(raw).unwrap_or(0.0)
}

/// Median of the present values, `None` when nothing is present.
///
/// Even-sized inputs average the two middle values.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Statistics/clustering context: fill missing values with the column median.
///
/// If every value is missing the column stays missing.
pub fn impute_median(values: &[Option<f64>]) -> Vec<Option<f64>> {
    match median(values) {
        Some(fill) => values.iter().map(|v| Some(v.unwrap_or(fill))).collect(),
        None => values.to_vec(),
    }
}
