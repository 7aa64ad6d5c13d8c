//! Input, output and run-tracking locations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::TableNames;

/// Where batch runs read the campaign tables from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    Csv,
    Database,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_input_source")]
    pub source: InputSource,

    /// Directory holding `<table>.csv` files
    #[serde(default = "default_input_dir")]
    pub csv_dir: PathBuf,

    /// SQLite file holding the input tables
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub tables: TableNames,
}

/// Where result collections go after a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputDestination {
    Csv,
    Database,
    /// Returned to the caller only
    Api,
    None,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_destination")]
    pub destination: OutputDestination,

    #[serde(default = "default_output_dir")]
    pub csv_dir: PathBuf,

    #[serde(default = "default_output_database")]
    pub database_path: PathBuf,
}

/// Experiment tracking written next to every run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_tracking_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_experiment")]
    pub experiment: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: default_input_source(),
            csv_dir: default_input_dir(),
            database_path: default_database_path(),
            tables: TableNames::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destination: default_output_destination(),
            csv_dir: default_output_dir(),
            database_path: default_output_database(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_tracking_dir(),
            experiment: default_experiment(),
        }
    }
}

fn default_input_source() -> InputSource {
    InputSource::Csv
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data/01_raw")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/campaign.db")
}

fn default_output_destination() -> OutputDestination {
    OutputDestination::Csv
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/07_model_output")
}

fn default_output_database() -> PathBuf {
    PathBuf::from("data/07_model_output/results.db")
}

fn default_tracking_dir() -> PathBuf {
    PathBuf::from("runs")
}

fn default_experiment() -> String {
    "Experiment-1".to_string()
}
