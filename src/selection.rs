use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::dataset::{CityOption, Dataset, SeriesRecord};
use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded { loaded_at: DateTime<Local> },
    Failed { reason: String },
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadState::Loading => write!(f, "Loading"),
            LoadState::Loaded { loaded_at } => write!(f, "Loaded {}", loaded_at.format("%H:%M:%S")),
            LoadState::Failed { reason } => write!(f, "Failed to load data: {}", reason),
        }
    }
}

/// Options for every city whose county equals `county`, in dataset order.
pub fn cities_in_county(series: &[SeriesRecord], county: &str) -> Vec<CityOption> {
    let mut seen = HashSet::new();
    series
        .iter()
        .filter(|record| record.county.as_deref() == Some(county))
        .filter(|record| seen.insert(record.city.as_str()))
        .map(|record| CityOption::new(&record.city))
        .collect()
}

/// Records whose city matches the label of a selected option, in dataset order.
pub fn visible_series(series: &[SeriesRecord], selected: &[CityOption]) -> Vec<SeriesRecord> {
    series
        .iter()
        .filter(|record| selected.iter().any(|option| option.label == record.city))
        .cloned()
        .collect()
}

/// The only mutable application state: dataset, county filter and city
/// selection. Visible series are recomputed by every transition.
#[derive(Debug, Clone)]
pub struct AppState {
    dataset: Dataset,
    county: String,
    selected: Vec<CityOption>,
    visible: Vec<SeriesRecord>,
    load_state: LoadState,
}

pub trait SelectionController {
    fn replace_dataset(&mut self, dataset: Dataset);
    fn set_county(&mut self, county: &str);
    fn set_selected_cities(&mut self, selection: Option<Vec<CityOption>>);
    fn toggle_city(&mut self, city: &str);
    fn reset_to_county(&mut self);
}

impl AppState {
    pub fn new(county: &str) -> Self {
        AppState {
            dataset: Dataset::default(),
            county: county.to_string(),
            selected: Vec::new(),
            visible: Vec::new(),
            load_state: LoadState::Loading,
        }
    }

    /// Applies the outcome of the startup load. A failure leaves an empty
    /// dataset behind and is remembered so the UI can tell it apart from
    /// a file with no rows.
    pub fn finish_load(&mut self, result: Result<Dataset, LoadError>) {
        match result {
            Ok(dataset) => {
                info!(series = dataset.series.len(), "dataset loaded");
                self.replace_dataset(dataset);
                self.load_state = LoadState::Loaded {
                    loaded_at: Local::now(),
                };
            }
            Err(err) => {
                error!(error = %err, "failed to load dataset");
                self.replace_dataset(Dataset::default());
                self.load_state = LoadState::Failed {
                    reason: err.to_string(),
                };
            }
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn county(&self) -> &str {
        &self.county
    }

    pub fn selected(&self) -> &[CityOption] {
        &self.selected
    }

    pub fn visible(&self) -> &[SeriesRecord] {
        &self.visible
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_selected(&self, city: &str) -> bool {
        self.selected.iter().any(|option| option.label == city)
    }

    fn select_county_cities(&mut self) {
        self.selected = cities_in_county(&self.dataset.series, &self.county);
        self.refresh_visible();
    }

    fn refresh_visible(&mut self) {
        self.visible = visible_series(&self.dataset.series, &self.selected);
    }
}

impl SelectionController for AppState {
    fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.select_county_cities();
    }

    fn set_county(&mut self, county: &str) {
        info!(county, "county changed");
        self.county = county.to_string();
        self.select_county_cities();
    }

    fn set_selected_cities(&mut self, selection: Option<Vec<CityOption>>) {
        self.selected = selection.unwrap_or_default();
        self.refresh_visible();
    }

    fn toggle_city(&mut self, city: &str) {
        let mut selection = self.selected.clone();
        if self.is_selected(city) {
            selection.retain(|option| option.label != city);
        } else {
            selection.push(CityOption::new(city));
        }
        self.set_selected_cities(Some(selection));
    }

    fn reset_to_county(&mut self) {
        self.select_county_cities();
    }
}
