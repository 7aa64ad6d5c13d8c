//! End-to-end optimisation run
//!
//! data preparation → tactical build/solve/interpret → operational
//! build/solve/interpret → export and tracking. Stages run strictly in order
//! and the first failure ends the run with a [`PipelineError`] naming its
//! stage.

use std::path::PathBuf;
use tracing::{info, info_span};

use crate::config::{AppConfig, InputConfig, InputSource};
use crate::data::{
    read_campaign_input, CampaignData, CampaignInput, CampaignPayload, CsvSource, SourceError,
    SqliteSource,
};
use crate::domain::records::CampaignTargets;
use crate::domain::value_objects::SolverBackend;
use crate::error::{PipelineError, PipelineFailure, Stage, StageContext};
use crate::export::export;
use crate::model::{OperationalModel, TacticalModel};
use crate::results::{self, ResultBundle};
use crate::solver::ModelSolver;
use crate::tracking::{collect_metrics, ExperimentTracker, RunParams};

/// A successful run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub solver: SolverBackend,
    pub bundle: ResultBundle,
    /// Directory of the tracked run, when tracking is enabled
    pub tracked_run: Option<PathBuf>,
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Run on the configured tabular input with the configured targets and solver.
    pub fn run_batch(&self) -> Result<RunOutcome, PipelineError> {
        let input = load_input(&self.config.input).stage(Stage::DataPreparation)?;
        self.run(
            input,
            self.config.campaign.targets(),
            self.config.optimisation.solver,
        )
    }

    /// Run on a request payload; its budget, ROI and solver override the
    /// configuration.
    pub fn run_payload(&self, payload: &CampaignPayload) -> Result<RunOutcome, PipelineError> {
        let defaults = self.config.campaign.targets();
        let targets = CampaignTargets {
            budget: payload.budget.unwrap_or(defaults.budget),
            min_roi_percent: payload.roi.unwrap_or(defaults.min_roi_percent),
        };
        let backend = match payload.solver_type.as_deref() {
            Some(name) => name.parse::<SolverBackend>().map_err(|message| {
                PipelineError::new(
                    Stage::DataPreparation,
                    PipelineFailure::InvalidRequest(message),
                )
            })?,
            None => self.config.optimisation.solver,
        };
        self.run(payload.to_input(), targets, backend)
    }

    pub fn run(
        &self,
        input: CampaignInput,
        targets: CampaignTargets,
        backend: SolverBackend,
    ) -> Result<RunOutcome, PipelineError> {
        let optimisation = &self.config.optimisation;
        let tracked = ExperimentTracker::from_config(&self.config.tracking).map(|t| t.start_run());

        let data = {
            let _span = info_span!("stage", stage = %Stage::DataPreparation).entered();
            CampaignData::prepare(input, targets).stage(Stage::DataPreparation)?
        };

        let solver = ModelSolver::new(
            backend,
            optimisation.options_for(backend),
            optimisation.fallback_for(backend),
        )
        .stage(Stage::Tactical)?;

        let (tactical, tactical_report) = {
            let _span = info_span!("stage", stage = %Stage::Tactical).entered();
            let model =
                TacticalModel::build(&data, optimisation.overrun_penalty).stage(Stage::Tactical)?;
            let solved = solver.solve(model).stage(Stage::Tactical)?;
            let report = results::tactical::interpret(&solved);
            (solved, report)
        };

        let (operational, operational_report) = {
            let _span = info_span!("stage", stage = %Stage::Operational).entered();
            let model = OperationalModel::build(&data, &tactical.allocation())
                .stage(Stage::Operational)?;
            let solved = solver.solve(model).stage(Stage::Operational)?;
            let report = results::operational::interpret(&solved, &tactical_report.summary);
            (solved, report)
        };

        let bundle = ResultBundle::new(tactical_report, operational_report);

        let _span = info_span!("stage", stage = %Stage::Export).entered();
        export(&bundle, backend.key(), &self.config.output).stage(Stage::Export)?;

        let tracked_run = match tracked {
            Some(run) => {
                let (tactical_solution, operational_solution) =
                    (tactical.solution(), operational.solution());
                let params = RunParams {
                    solver: backend,
                    tactical_status: tactical_solution.status,
                    tactical_termination: tactical_solution.termination,
                    operational_status: operational_solution.status,
                    operational_termination: operational_solution.termination,
                    clusters: data.clusters().len(),
                    products: data.products().len(),
                    customer_products: data.customer_products().len(),
                    budget: targets.budget,
                    min_roi_percent: targets.min_roi_percent,
                };
                let metrics = collect_metrics(
                    &bundle,
                    &tactical_solution.statistics,
                    &operational_solution.statistics,
                );
                Some(run.finish(&params, &metrics, &bundle).stage(Stage::Export)?)
            }
            None => None,
        };

        info!(solver = backend.key(), "optimisation run completed");
        Ok(RunOutcome {
            solver: backend,
            bundle,
            tracked_run,
        })
    }
}

/// Read the campaign tables from the configured source.
pub fn load_input(config: &InputConfig) -> Result<CampaignInput, SourceError> {
    match config.source {
        InputSource::Csv => read_campaign_input(&CsvSource::new(&config.csv_dir), &config.tables),
        InputSource::Database => read_campaign_input(
            &SqliteSource::open(&config.database_path)?,
            &config.tables,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputDestination;
    use crate::data::fixtures::{targets, worked_example};
    use crate::data::{DataIntegrityError, MatrixEntry};

    fn quiet_config() -> AppConfig {
        crate::logging::init_test();
        let mut config = AppConfig::default();
        config.output.destination = OutputDestination::None;
        config
    }

    #[test]
    fn unknown_solver_override_is_rejected() {
        let config = quiet_config();
        let payload = CampaignPayload {
            budget: None,
            roi: None,
            solver_type: Some("gurobi".into()),
            cluster: vec![],
            product: vec![],
            cost: vec![],
            profit: vec![],
            cust_cost_profit: vec![],
        };

        let err = Pipeline::new(&config).run_payload(&payload).unwrap_err();
        assert_eq!(err.stage, Stage::DataPreparation);
        assert_eq!(err.kind(), "invalid_request");
    }

    #[test]
    fn integrity_errors_stop_before_modelling() {
        let config = quiet_config();
        let mut input = worked_example();
        input.product_cost.push(MatrixEntry {
            cluster: "k9".into(),
            product: "p1".into(),
            value: 1.0,
        });

        let err = Pipeline::new(&config)
            .run(input, targets(), SolverBackend::Microlp)
            .unwrap_err();
        assert_eq!(err.stage, Stage::DataPreparation);
        assert!(matches!(
            err.failure,
            PipelineFailure::Source(SourceError::Integrity(DataIntegrityError::UnknownCluster { .. }))
        ));
    }

    #[test]
    fn missing_csv_directory_is_a_data_preparation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quiet_config();
        config.input.csv_dir = dir.path().join("absent");

        let err = Pipeline::new(&config).run_batch().unwrap_err();
        assert_eq!(err.stage, Stage::DataPreparation);
    }
}
