// Tactical model: how many offers of each product every cluster receives

use std::collections::BTreeMap;
use tracing::debug;

use super::{check_well_formed, ModelDefinitionError, Solved, StageModel};
use crate::data::CampaignData;
use crate::domain::models::{
    Constraint, LinearExpr, ObjectiveFunction, OptimizationProblem, VarId, Variable,
};
use crate::domain::records::{
    CampaignTargets, ClusterProduct, Economics, ProductEconomics, TacticalAllocation,
};
use crate::domain::value_objects::ConstraintType;
use crate::error::Stage;

/// Objective penalty per unit of budget overrun
pub const DEFAULT_OVERRUN_PENALTY: f64 = 10_000.0;

pub const CLUSTER_CAPACITY: &str = "cluster_capacity";
pub const BUDGET: &str = "budget";
pub const MIN_OFFERS: &str = "min_offers";
pub const MIN_ROI: &str = "min_roi";

/// Cluster × product allocation problem.
///
/// Variables: `y[k,j] ≥ 0` offers of product `j` to cluster `k`, and `z ≥ 0`
/// budget overrun. Maximises `Σ y·profit − M·z` subject to cluster capacity,
/// the (soft) budget, per-product minimum offers and the minimum ROI.
#[derive(Debug, Clone)]
pub struct TacticalModel {
    problem: OptimizationProblem,
    offers: BTreeMap<ClusterProduct, VarId>,
    overrun: VarId,
    economics: ProductEconomics,
    targets: CampaignTargets,
}

impl TacticalModel {
    pub fn build(data: &CampaignData, overrun_penalty: f64) -> Result<Self, ModelDefinitionError> {
        let targets = data.targets();
        let hurdle_rate = targets.hurdle_rate();
        let mut problem = OptimizationProblem::new(
            "tactical",
            ObjectiveFunction::maximize(LinearExpr::new()),
        );

        // y[k, j] and z
        let mut offers = BTreeMap::new();
        let mut economics = ProductEconomics::new();
        for key in data.cluster_products() {
            let value = data.product_economics().get(&key).copied().ok_or_else(|| {
                ModelDefinitionError::MissingParameter {
                    stage: Stage::Tactical,
                    parameter: "expected cost/profit",
                    key: key.to_string(),
                }
            })?;
            let var = problem.add_variable(Variable::continuous(format!(
                "y[{},{}]",
                key.cluster_id, key.product_type
            )));
            offers.insert(key.clone(), var);
            economics.insert(key, value);
        }
        let overrun = problem.add_variable(Variable::continuous("z"));
        debug!(offers = offers.len(), "defined tactical decision variables");

        let mut objective: LinearExpr = offers
            .iter()
            .map(|(key, &var)| (var, economics[key].expected_profit))
            .collect();
        objective.add_term(overrun, -overrun_penalty);
        problem.set_objective(ObjectiveFunction::maximize(objective));

        for cluster in data.clusters() {
            let expr: LinearExpr = offers
                .iter()
                .filter(|(key, _)| key.cluster_id == cluster.cluster_id)
                .map(|(_, &var)| (var, 1.0))
                .collect();
            problem.add_constraint(
                Constraint::new(
                    CLUSTER_CAPACITY,
                    expr,
                    ConstraintType::LessThanOrEqual,
                    cluster.customer_count,
                )
                .with_name(format!("{CLUSTER_CAPACITY}[{}]", cluster.cluster_id)),
            );
        }

        let spend = weighted(&offers, &economics, |e| e.expected_cost);
        problem.add_constraint(Constraint::new(
            BUDGET,
            spend.with_term(overrun, -1.0),
            ConstraintType::LessThanOrEqual,
            targets.budget,
        ));

        for product in data.products() {
            let expr: LinearExpr = offers
                .iter()
                .filter(|(key, _)| key.product_type == product.product_type)
                .map(|(_, &var)| (var, 1.0))
                .collect();
            problem.add_constraint(
                Constraint::new(
                    MIN_OFFERS,
                    expr,
                    ConstraintType::GreaterThanOrEqual,
                    product.min_offer_count,
                )
                .with_name(format!("{MIN_OFFERS}[{}]", product.product_type)),
            );
        }

        // Σ y·profit − (1 + hurdle)·Σ y·cost ≥ 0
        let margin = weighted(&offers, &economics, |e| {
            e.expected_profit - (1.0 + hurdle_rate) * e.expected_cost
        });
        problem.add_constraint(Constraint::new(
            MIN_ROI,
            margin,
            ConstraintType::GreaterThanOrEqual,
            0.0,
        ));

        check_well_formed(Stage::Tactical, &problem)?;
        debug!(
            variables = problem.num_variables(),
            constraints = problem.constraints.len(),
            "built tactical model"
        );

        Ok(Self {
            problem,
            offers,
            overrun,
            economics,
            targets,
        })
    }

    pub fn offer_var(&self, key: &ClusterProduct) -> Option<VarId> {
        self.offers.get(key).copied()
    }

    pub fn overrun_var(&self) -> VarId {
        self.overrun
    }

    /// Offer variables in `(cluster, product)` order.
    pub fn offers(&self) -> impl Iterator<Item = (&ClusterProduct, VarId)> {
        self.offers.iter().map(|(key, &var)| (key, var))
    }

    pub fn economics(&self, key: &ClusterProduct) -> Option<Economics> {
        self.economics.get(key).copied()
    }

    pub fn targets(&self) -> CampaignTargets {
        self.targets
    }
}

impl StageModel for TacticalModel {
    fn stage(&self) -> Stage {
        Stage::Tactical
    }

    fn problem(&self) -> &OptimizationProblem {
        &self.problem
    }
}

impl Solved<TacticalModel> {
    /// Solved offer quantities and overrun, as plain data for the operational stage.
    pub fn allocation(&self) -> TacticalAllocation {
        let model = self.model();
        let solution = self.solution();
        TacticalAllocation {
            offers: model
                .offers()
                .map(|(key, var)| (key.clone(), solution.value(var)))
                .collect(),
            budget_overrun: solution.value(model.overrun_var()),
        }
    }
}

fn weighted(
    offers: &BTreeMap<ClusterProduct, VarId>,
    economics: &ProductEconomics,
    coefficient: impl Fn(&Economics) -> f64,
) -> LinearExpr {
    offers
        .iter()
        .map(|(key, &var)| (var, coefficient(&economics[key])))
        .collect()
}
