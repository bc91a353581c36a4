use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_DATA_PATH: &str = "data/per-cap.csv";
pub const DEFAULT_COUNTY: &str = "Marin";
pub const DEFAULT_LOG_FILE: &str = "percap.log";
pub const DEFAULT_EXPORT_PATH: &str = "percap-chart.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "percap")]
#[command(about = "Per-capita values by city and year, charted in the terminal", long_about = None)]
pub struct Config {
    /// CSV with a City,County,<year>... header
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// County whose cities are selected at startup
    #[arg(long, default_value = DEFAULT_COUNTY)]
    pub county: String,

    /// Where log output goes; the terminal belongs to the UI
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Write the chart configuration as JSON and exit (`-` for stdout)
    #[arg(long)]
    pub export: Option<PathBuf>,
}
