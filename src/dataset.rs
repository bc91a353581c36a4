use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::csv_reader::Row;

pub const CITY_FIELD: &str = "City";
pub const COUNTY_FIELD: &str = "County";

/// Per-capita values of one city, one entry per year category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRecord {
    pub city: String,
    pub county: Option<String>,
    pub data: Vec<f64>,
}

/// Entry of the city multi-select; value and label are both the city name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityOption {
    pub value: String,
    pub label: String,
}

impl CityOption {
    pub fn new(city: &str) -> Self {
        CityOption {
            value: city.to_string(),
            label: city.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct YearColumn {
    field: String,
    label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub series: Vec<SeriesRecord>,
    pub counties: Vec<String>,
    pub cities: Vec<CityOption>,
    pub categories: Vec<String>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn year_columns(first: &Row) -> Vec<YearColumn> {
    first
        .field_names()
        .filter(|name| *name != CITY_FIELD && *name != COUNTY_FIELD)
        .map(|name| YearColumn {
            field: name.to_string(),
            label: name.trim().to_string(),
        })
        .collect()
}

/// Numeric-string coercion for a year cell.
///
/// Blank cells are `0.0`, absent cells and anything unparseable are NaN.
pub fn coerce_number(cell: Option<&str>) -> f64 {
    let Some(cell) = cell else {
        return f64::NAN;
    };
    let text = cell.trim();
    if text.is_empty() {
        return 0.0;
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|value| value as f64)
                .unwrap_or(f64::NAN);
        }
    }

    let (sign, unsigned) = match text.as_bytes()[0] {
        b'-' => (-1.0, &text[1..]),
        b'+' => (1.0, &text[1..]),
        _ => (1.0, text),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    // f64::from_str also takes "inf" and "nan" spellings
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

fn dedup_first_seen<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Turns parsed rows into per-city series plus the derived option lists.
///
/// Year columns come from the first row only. Rows without a `City` value
/// are skipped with a warning.
pub fn build_dataset(rows: &[Row]) -> Dataset {
    let Some(first) = rows.first() else {
        return Dataset::default();
    };
    let years = year_columns(first);

    let mut series = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let city = match row.get(CITY_FIELD).map(str::trim) {
            Some(city) if !city.is_empty() => city.to_string(),
            _ => {
                warn!(record = index + 1, "skipping record without a City value");
                continue;
            }
        };
        let county = row.get(COUNTY_FIELD).map(|county| county.trim().to_string());
        let data = years
            .iter()
            .map(|year| coerce_number(row.get(&year.field)))
            .collect();
        series.push(SeriesRecord { city, county, data });
    }

    let counties = dedup_first_seen(series.iter().filter_map(|r| r.county.clone()));
    let cities = dedup_first_seen(series.iter().map(|r| r.city.as_str()))
        .into_iter()
        .map(CityOption::new)
        .collect::<Vec<_>>();
    debug!(
        series = series.len(),
        counties = counties.len(),
        cities = cities.len(),
        years = years.len(),
        "built dataset"
    );

    Dataset {
        series,
        counties,
        cities,
        categories: years.into_iter().map(|year| year.label).collect(),
    }
}
