use serde::Serialize;
use tui::style::Color;

use crate::dataset::SeriesRecord;

pub const PALETTE: [&str; 11] = [
    "#528b8b", "#eea2ad", "#eed8ae", "#8b3626", "#d8bfd8", "#6ca6cd", "#cd6839", "#bbffff",
    "#daa520", "#b4eeb4", "#9bcd9b",
];

const DEFAULT_SERIES_PREFIX: &str = "series-";

#[derive(Debug, Clone, Serialize)]
pub struct ChartKind {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub name: String,
    /// Non-finite values serialize as `null`, which the chart draws as a gap.
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct XAxis {
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub show: bool,
}

/// Line-chart configuration as consumed by a web charting widget.
#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig {
    pub chart: ChartKind,
    pub series: Vec<ChartSeries>,
    pub xaxis: XAxis,
    pub colors: Vec<&'static str>,
    pub legend: Legend,
}

pub fn series_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn chart_config(visible: &[SeriesRecord], categories: &[String]) -> ChartConfig {
    ChartConfig {
        chart: ChartKind { kind: "line" },
        series: visible
            .iter()
            .map(|record| ChartSeries {
                name: record.city.clone(),
                data: record.data.clone(),
            })
            .collect(),
        xaxis: XAxis {
            categories: categories.to_vec(),
        },
        colors: PALETTE.to_vec(),
        legend: Legend { show: false },
    }
}

/// Name the charting widget gives the series at `index` when none is set.
pub fn default_series_name(index: usize) -> String {
    format!("{}{}", DEFAULT_SERIES_PREFIX, index + 1)
}

/// Tooltip title for a chart-assigned series name such as `series-3`
/// (1-based): the city of that visible series.
pub fn tooltip_title<'a>(visible: &'a [SeriesRecord], series_name: &str) -> Option<&'a str> {
    let position: usize = series_name
        .strip_prefix(DEFAULT_SERIES_PREFIX)?
        .parse()
        .ok()?;
    visible
        .get(position.checked_sub(1)?)
        .map(|record| record.city.as_str())
}

pub fn series_terminal_color(index: usize) -> Color {
    hex_color(series_color(index))
}

fn hex_color(hex: &str) -> Color {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    match (channel(1..3), channel(3..5), channel(5..7)) {
        (Some(r), Some(g), Some(b)) if hex.len() == 7 => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerminalSeries {
    pub name: String,
    pub color: Color,
    /// (category index, value); NaN values are left out.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerminalChart {
    pub series: Vec<TerminalSeries>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
}

fn axis_labels(categories: &[String]) -> Vec<String> {
    match categories.len() {
        0 => Vec::new(),
        1 | 2 => categories.to_vec(),
        n => vec![
            categories[0].clone(),
            categories[n / 2].clone(),
            categories[n - 1].clone(),
        ],
    }
}

fn value_bounds(series: &[TerminalSeries]) -> [f64; 2] {
    let values = series.iter().flat_map(|s| s.points.iter().map(|(_, y)| *y));
    let (min, max) = values
        .filter(|y| y.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if min > max {
        return [0.0, 1.0];
    }
    if min == max {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

/// Points, colours and axes for the terminal line chart.
pub fn terminal_chart(visible: &[SeriesRecord], categories: &[String]) -> TerminalChart {
    let series: Vec<TerminalSeries> = visible
        .iter()
        .enumerate()
        .map(|(index, record)| TerminalSeries {
            name: default_series_name(index),
            color: series_terminal_color(index),
            points: record
                .data
                .iter()
                .enumerate()
                .filter(|(_, value)| value.is_finite())
                .map(|(x, value)| (x as f64, *value))
                .collect(),
        })
        .collect();
    let y_bounds = value_bounds(&series);
    TerminalChart {
        x_bounds: [0.0, categories.len().saturating_sub(1).max(1) as f64],
        y_bounds,
        x_labels: axis_labels(categories),
        y_labels: vec![
            format!("{:.1}", y_bounds[0]),
            format!("{:.1}", (y_bounds[0] + y_bounds[1]) / 2.0),
            format!("{:.1}", y_bounds[1]),
        ],
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, data: Vec<f64>) -> SeriesRecord {
        SeriesRecord {
            city: city.to_string(),
            county: Some("Marin".to_string()),
            data,
        }
    }

    fn years(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn config_maps_series_and_categories() {
        let visible = vec![record("Novato", vec![10.0, 12.0]), record("Fairfax", vec![8.0, 9.0])];
        let config = chart_config(&visible, &years(&["2010", "2011"]));
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["chart"]["type"], "line");
        assert_eq!(json["series"][0]["name"], "Novato");
        assert_eq!(json["series"][1]["data"], serde_json::json!([8.0, 9.0]));
        assert_eq!(json["xaxis"]["categories"], serde_json::json!(["2010", "2011"]));
        assert_eq!(json["colors"].as_array().unwrap().len(), 11);
        assert_eq!(json["legend"]["show"], false);
    }

    #[test]
    fn missing_values_serialize_as_null() {
        let visible = vec![record("Novato", vec![f64::NAN, 12.0])];
        let text = serde_json::to_string(&chart_config(&visible, &years(&["2010", "2011"]))).unwrap();
        assert!(text.contains("\"data\":[null,12.0]"));
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), "#528b8b");
        assert_eq!(series_color(10), "#9bcd9b");
        assert_eq!(series_color(11), "#528b8b");
        assert_eq!(hex_color("#528b8b"), Color::Rgb(0x52, 0x8b, 0x8b));
        assert_eq!(hex_color("oops"), Color::White);
    }

    #[test]
    fn tooltip_resolves_default_series_names() {
        let visible = vec![record("Novato", vec![]), record("Fairfax", vec![])];
        assert_eq!(tooltip_title(&visible, "series-1"), Some("Novato"));
        assert_eq!(tooltip_title(&visible, "series-2"), Some("Fairfax"));
        assert_eq!(tooltip_title(&visible, "series-3"), None);
        assert_eq!(tooltip_title(&visible, "series-0"), None);
        assert_eq!(tooltip_title(&visible, "Novato"), None);
        assert_eq!(tooltip_title(&visible, &default_series_name(1)), Some("Fairfax"));
    }

    #[test]
    fn terminal_chart_skips_gaps_and_pads_bounds() {
        let visible = vec![
            record("Novato", vec![10.0, f64::NAN, 20.0]),
            record("Fairfax", vec![f64::NAN, f64::NAN, f64::NAN]),
        ];
        let chart = terminal_chart(&visible, &years(&["2010", "2011", "2012"]));

        assert_eq!(chart.series[0].name, "series-1");
        assert_eq!(chart.series[0].points, vec![(0.0, 10.0), (2.0, 20.0)]);
        assert!(chart.series[1].points.is_empty());
        assert_eq!(chart.series[1].color, hex_color(PALETTE[1]));
        assert_eq!(chart.x_bounds, [0.0, 2.0]);
        assert_eq!(chart.y_bounds, [9.5, 20.5]);
        assert_eq!(chart.x_labels, vec!["2010", "2011", "2012"]);
    }

    #[test]
    fn terminal_chart_of_nothing_has_usable_bounds() {
        let chart = terminal_chart(&[], &[]);
        assert!(chart.series.is_empty());
        assert_eq!(chart.x_bounds, [0.0, 1.0]);
        assert_eq!(chart.y_bounds, [0.0, 1.0]);
        assert!(chart.x_labels.is_empty());
    }
}
