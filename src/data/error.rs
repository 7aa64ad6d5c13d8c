// Data preparation error types

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or incomplete campaign data. Never retried; every variant names
/// the offending table and key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataIntegrityError {
    #[error("table '{table}' is missing")]
    MissingTable { table: String },

    #[error("table '{table}' has no rows")]
    EmptyTable { table: String },

    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("table '{table}' row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("table '{table}' key {key}: value {value} must be a finite, non-negative number")]
    InvalidValue {
        table: String,
        key: String,
        value: f64,
    },

    #[error("table '{table}' contains duplicate key {key}")]
    DuplicateKey { table: String, key: String },

    #[error("table '{table}' references unknown cluster '{cluster}'")]
    UnknownCluster { table: String, cluster: String },

    #[error("table '{table}' references unknown product '{product}'")]
    UnknownProduct { table: String, product: String },

    #[error("table '{table}' has no value for cluster '{cluster}' and product '{product}'")]
    MissingEconomics {
        table: String,
        cluster: String,
        product: String,
    },

    #[error("customer '{customer}' is listed under clusters '{first}' and '{second}'")]
    CustomerInMultipleClusters {
        customer: String,
        first: String,
        second: String,
    },

    #[error("campaign target '{name}' has invalid value {value}")]
    InvalidTarget { name: &'static str, value: f64 },
}

/// Failure to acquire source data
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse CSV '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid request payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}
