//! Model builders
//!
//! Both stages translate [`CampaignData`](crate::data::CampaignData) into a
//! backend-neutral [`OptimizationProblem`] and remember which variable stands
//! for which decision. A built model only becomes readable as a decision once
//! the solver adapter wraps it in [`Solved`].

pub mod operational;
pub mod tactical;

pub use operational::OperationalModel;
pub use tactical::{TacticalModel, DEFAULT_OVERRUN_PENALTY};

use thiserror::Error;

use crate::domain::models::{OptimizationProblem, Solution};
use crate::error::Stage;

/// Internal construction inconsistency; unreachable with prepared data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelDefinitionError {
    #[error("{stage} model: no {parameter} for {key}")]
    MissingParameter {
        stage: Stage,
        parameter: &'static str,
        key: String,
    },

    #[error("{stage} model is malformed: {details}")]
    Malformed { stage: Stage, details: String },
}

/// A model the solver adapter can run
pub trait StageModel {
    fn stage(&self) -> Stage;

    fn problem(&self) -> &OptimizationProblem;
}

/// A model together with the optimal solution proven for it.
///
/// Only the solver adapter constructs this, so holding a `Solved<M>` means the
/// variable values are post-solve values.
#[derive(Debug, Clone)]
pub struct Solved<M> {
    model: M,
    solution: Solution,
}

impl<M> Solved<M> {
    pub(crate) fn new(model: M, solution: Solution) -> Self {
        Self { model, solution }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }
}

fn check_well_formed(stage: Stage, problem: &OptimizationProblem) -> Result<(), ModelDefinitionError> {
    problem
        .validate()
        .map_err(|errors| ModelDefinitionError::Malformed {
            stage,
            details: errors.join("; "),
        })
}
