//! Export of result collections
//!
//! A [`ResultBundle`] is flattened into four [`ResultTable`]s which the
//! writers persist unchanged. Allocation tables have one row per record;
//! summary tables are a single wide row of named metrics.

mod csv_writer;
mod sqlite_writer;

pub use csv_writer::write_csv_dir;
pub use sqlite_writer::write_sqlite;

use rusqlite::types::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{OutputConfig, OutputDestination};
use crate::results::{ResultBundle, SummaryMetrics};

pub const TACTICAL_ALLOCATION: &str = "tactical_allocation";
pub const TACTICAL_SUMMARY: &str = "tactical_summary";
pub const OPERATIONAL_ALLOCATION: &str = "operational_allocation";
pub const OPERATIONAL_SUMMARY: &str = "operational_summary";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("database export failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cannot serialise run record: {0}")]
    Json(#[from] serde_json::Error),
}

/// One output collection in tabular form
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub name: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    /// Storage name for a run with the given solver, e.g. `tactical_summary_cbc`.
    pub fn qualified_name(&self, solver: &str) -> String {
        format!("{}_{}", self.name, solver)
    }
}

/// The four collections of a bundle, in a fixed order.
pub fn tables(bundle: &ResultBundle) -> Vec<ResultTable> {
    let tactical_allocation = ResultTable {
        name: TACTICAL_ALLOCATION,
        headers: headers(&["cluster", "product", "count", "cost", "profit"]),
        rows: bundle
            .tactical_allocation
            .iter()
            .map(|r| {
                vec![
                    Value::Text(r.cluster.clone()),
                    Value::Text(r.product.clone()),
                    Value::Real(r.count),
                    Value::Real(r.cost),
                    Value::Real(r.profit),
                ]
            })
            .collect(),
    };

    let operational_allocation = ResultTable {
        name: OPERATIONAL_ALLOCATION,
        headers: headers(&["cluster", "customer", "product", "selected", "cost", "profit"]),
        rows: bundle
            .operational_allocation
            .iter()
            .map(|r| {
                vec![
                    Value::Text(r.cluster.clone()),
                    Value::Text(r.customer.clone()),
                    Value::Text(r.product.clone()),
                    Value::Integer(i64::from(r.selected)),
                    Value::Real(r.cost),
                    Value::Real(r.profit),
                ]
            })
            .collect(),
    };

    vec![
        tactical_allocation,
        summary_table(TACTICAL_SUMMARY, &bundle.tactical_summary),
        operational_allocation,
        summary_table(OPERATIONAL_SUMMARY, &bundle.operational_summary),
    ]
}

fn summary_table(name: &'static str, summary: &impl SummaryMetrics) -> ResultTable {
    let (headers, row): (Vec<String>, Vec<Value>) = summary
        .metrics()
        .into_iter()
        .map(|(metric, value)| (metric, value.map_or(Value::Null, Value::Real)))
        .unzip();
    ResultTable {
        name,
        headers,
        rows: vec![row],
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Persist `bundle` to the configured destination.
pub fn export(bundle: &ResultBundle, solver: &str, output: &OutputConfig) -> Result<(), ExportError> {
    match output.destination {
        OutputDestination::Csv => {
            let written = write_csv_dir(&output.csv_dir, &tables(bundle), solver)?;
            info!(dir = %output.csv_dir.display(), files = written.len(), "exported results as CSV");
        }
        OutputDestination::Database => {
            write_sqlite(&output.database_path, &tables(bundle), solver)?;
            info!(database = %output.database_path.display(), "exported results to database");
        }
        OutputDestination::Api | OutputDestination::None => {
            debug!(destination = ?output.destination, "results not persisted");
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use crate::results::{
        OperationalRecord, OperationalSummary, ResultBundle, TacticalRecord, TacticalSummary,
    };

    pub fn bundle() -> ResultBundle {
        ResultBundle {
            tactical_allocation: vec![
                TacticalRecord {
                    cluster: "k1".into(),
                    product: "p1".into(),
                    count: 2.0,
                    cost: 400.0,
                    profit: 4000.0,
                },
                TacticalRecord {
                    cluster: "k1".into(),
                    product: "p2".into(),
                    count: 0.0,
                    cost: 0.0,
                    profit: 0.0,
                },
            ],
            tactical_summary: TacticalSummary {
                total_profit: 4000.0,
                total_cost: 400.0,
                budget: 500.0,
                budget_overrun: 0.0,
                roi_percent: Some(1000.0),
                min_roi_percent: 120.0,
            },
            operational_allocation: vec![
                OperationalRecord {
                    cluster: "k1".into(),
                    customer: "c1".into(),
                    product: "p1".into(),
                    selected: 1,
                    cost: 200.0,
                    profit: 2000.0,
                },
                OperationalRecord {
                    cluster: "k1".into(),
                    customer: "c1".into(),
                    product: "p2".into(),
                    selected: 0,
                    cost: 0.0,
                    profit: 0.0,
                },
            ],
            operational_summary: OperationalSummary {
                total_profit: 2000.0,
                total_cost: 200.0,
                assignments: 1,
                assignments_by_cluster: BTreeMap::from([("k1".to_string(), 1)]),
                roi_percent: None,
                min_roi_percent: 120.0,
                budget: 500.0,
                budget_overrun: 0.0,
            },
        }
    }
}
