//! Experiment tracking
//!
//! Each tracked run gets its own directory:
//!
//! ```text
//! <dir>/<experiment>/<run_id>/
//!     params.json
//!     metrics.json
//!     artifacts/<collection>_<solver>.csv
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::domain::models::SolverStatistics;
use crate::domain::value_objects::{SolverBackend, SolverStatus, TerminationCondition};
use crate::export::{tables, write_csv_dir, ExportError};
use crate::results::{ResultBundle, SummaryMetrics};

/// Flattened numeric metrics, keyed `<stage>_<metric>`
pub type Metrics = BTreeMap<String, f64>;

/// Descriptive parameters of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunParams {
    pub solver: SolverBackend,
    pub tactical_status: SolverStatus,
    pub tactical_termination: TerminationCondition,
    pub operational_status: SolverStatus,
    pub operational_termination: TerminationCondition,
    pub clusters: usize,
    pub products: usize,
    pub customer_products: usize,
    pub budget: f64,
    pub min_roi_percent: f64,
}

#[derive(Serialize)]
struct ParamsFile<'a> {
    run_id: Uuid,
    experiment: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    #[serde(flatten)]
    params: &'a RunParams,
}

#[derive(Debug, Clone)]
pub struct ExperimentTracker {
    dir: PathBuf,
    experiment: String,
}

impl ExperimentTracker {
    pub fn new(dir: impl Into<PathBuf>, experiment: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            experiment: experiment.into(),
        }
    }

    /// Tracker for the configured location, `None` when tracking is off.
    pub fn from_config(config: &TrackingConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(&config.dir, &config.experiment))
    }

    pub fn start_run(&self) -> TrackedRun {
        let run_id = Uuid::new_v4();
        TrackedRun {
            run_id,
            started_at: Utc::now(),
            experiment: self.experiment.clone(),
            dir: self.dir.join(&self.experiment).join(run_id.to_string()),
        }
    }
}

/// A run in progress; nothing is written until [`TrackedRun::finish`]
#[derive(Debug, Clone)]
pub struct TrackedRun {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    experiment: String,
    dir: PathBuf,
}

impl TrackedRun {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record the run and return its directory.
    pub fn finish(
        self,
        params: &RunParams,
        metrics: &Metrics,
        bundle: &ResultBundle,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let params_file = ParamsFile {
            run_id: self.run_id,
            experiment: &self.experiment,
            started_at: self.started_at,
            finished_at: Utc::now(),
            params,
        };
        write_json(&self.dir.join("params.json"), &params_file)?;
        write_json(&self.dir.join("metrics.json"), metrics)?;
        write_csv_dir(
            &self.dir.join("artifacts"),
            &tables(bundle),
            params.solver.key(),
        )?;

        info!(run_id = %self.run_id, dir = %self.dir.display(), "tracked run");
        Ok(self.dir)
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Numeric summaries of both stages plus solver statistics. Undefined values
/// (an ROI without spend) are left out.
pub fn collect_metrics(
    bundle: &ResultBundle,
    tactical: &SolverStatistics,
    operational: &SolverStatistics,
) -> Metrics {
    let mut metrics = Metrics::new();
    let stages: [(&str, &dyn SummaryMetrics, &SolverStatistics); 2] = [
        ("tactical", &bundle.tactical_summary, tactical),
        ("operational", &bundle.operational_summary, operational),
    ];

    for (stage, summary, statistics) in stages {
        for (name, value) in summary.metrics() {
            if let Some(value) = value {
                metrics.insert(format!("{stage}_{name}"), value);
            }
        }
        for (name, value) in [
            ("solve_time_ms", statistics.solve_time_ms),
            ("num_variables", f64::from(statistics.num_variables)),
            ("num_constraints", f64::from(statistics.num_constraints)),
            ("num_integer_vars", f64::from(statistics.num_integer_vars)),
            ("fixed_variables", f64::from(statistics.fixed_variables)),
            (
                "deactivated_constraints",
                f64::from(statistics.deactivated_constraints),
            ),
        ] {
            metrics.insert(format!("{stage}_{name}"), value);
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;
    use testresult::TestResult;

    fn params() -> RunParams {
        RunParams {
            solver: SolverBackend::Microlp,
            tactical_status: SolverStatus::Ok,
            tactical_termination: TerminationCondition::Optimal,
            operational_status: SolverStatus::Ok,
            operational_termination: TerminationCondition::Optimal,
            clusters: 1,
            products: 2,
            customer_products: 2,
            budget: 500.0,
            min_roi_percent: 120.0,
        }
    }

    #[test]
    fn disabled_config_has_no_tracker() {
        assert!(ExperimentTracker::from_config(&TrackingConfig::default()).is_none());
    }

    #[test]
    fn writes_params_metrics_and_artifacts() -> TestResult {
        let root = tempfile::tempdir()?;
        let tracker = ExperimentTracker::new(root.path(), "Experiment-1");
        let bundle = fixtures::bundle();
        let stats = SolverStatistics {
            num_variables: 3,
            ..SolverStatistics::default()
        };
        let metrics = collect_metrics(&bundle, &stats, &SolverStatistics::default());

        let run = tracker.start_run();
        let run_id = run.run_id();
        let dir = run.finish(&params(), &metrics, &bundle)?;

        assert_eq!(
            dir,
            root.path().join("Experiment-1").join(run_id.to_string())
        );
        let params: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("params.json"))?)?;
        assert_eq!(params["run_id"], run_id.to_string());
        assert_eq!(params["solver"], "microlp");
        assert_eq!(params["tactical_termination"], "optimal");
        assert!(params["started_at"].as_str().is_some_and(|t| t.ends_with('Z')));

        let stored: Metrics = serde_json::from_str(&fs::read_to_string(dir.join("metrics.json"))?)?;
        assert_eq!(stored["tactical_num_variables"], 3.0);
        assert_eq!(stored["operational_total_profit"], 2000.0);

        assert!(dir
            .join("artifacts")
            .join("operational_allocation_microlp.csv")
            .is_file());
        Ok(())
    }

    #[test]
    fn undefined_roi_is_not_a_metric() {
        let metrics = collect_metrics(
            &fixtures::bundle(),
            &SolverStatistics::default(),
            &SolverStatistics::default(),
        );
        assert_eq!(metrics["tactical_roi_percent"], 1000.0);
        assert!(!metrics.contains_key("operational_roi_percent"));
        assert_eq!(metrics["operational_assignments[k1]"], 1.0);
    }
}
