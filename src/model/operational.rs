// Operational model: which individual customer receives which product

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{check_well_formed, ModelDefinitionError, StageModel};
use crate::data::CampaignData;
use crate::domain::models::{
    Constraint, LinearExpr, ObjectiveFunction, OptimizationProblem, VarId, Variable,
};
use crate::domain::records::{
    CampaignTargets, ClusterProduct, CustomerEconomics, CustomerEconomicsMap, CustomerProduct,
    TacticalAllocation,
};
use crate::domain::value_objects::ConstraintType;
use crate::error::Stage;

pub const QUOTA: &str = "quota";
pub const SINGLE_OFFER: &str = "single_offer";

/// Customer × product assignment problem.
///
/// One binary `x[k,c,j]` per observed customer triple. Maximises
/// `Σ x·profit` subject to:
///
/// * every `(k, j)` quota equals the tactical offer count exactly;
/// * every customer receives at most one offer.
///
/// Quotas are taken verbatim from the tactical solution. A fractional quota
/// makes the model infeasible.
#[derive(Debug, Clone)]
pub struct OperationalModel {
    problem: OptimizationProblem,
    assignments: BTreeMap<CustomerProduct, VarId>,
    economics: CustomerEconomicsMap,
    targets: CampaignTargets,
}

impl OperationalModel {
    pub fn build(
        data: &CampaignData,
        allocation: &TacticalAllocation,
    ) -> Result<Self, ModelDefinitionError> {
        let mut problem = OptimizationProblem::new(
            "operational",
            ObjectiveFunction::maximize(LinearExpr::new()),
        );

        let mut assignments = BTreeMap::new();
        for key in data.customer_products() {
            let var = problem.add_variable(Variable::binary(format!(
                "x[{},{},{}]",
                key.cluster_id, key.customer_id, key.product_type
            )));
            assignments.insert(key.clone(), var);
        }
        debug!(
            assignments = assignments.len(),
            "defined operational decision variables"
        );

        let economics = data.customer_economics().clone();
        let objective: LinearExpr = assignments
            .iter()
            .map(|(key, &var)| (var, economics[key].profit))
            .collect();
        problem.set_objective(ObjectiveFunction::maximize(objective));

        // Quotas cover the full cluster × product set, including pairs no
        // customer is eligible for.
        for key in data.cluster_products() {
            let quota = allocation.offers.get(&key).copied().ok_or_else(|| {
                ModelDefinitionError::MissingParameter {
                    stage: Stage::Operational,
                    parameter: "tactical offer count",
                    key: key.to_string(),
                }
            })?;
            if (quota - quota.round()).abs() > 1e-6 {
                warn!(%key, quota, "tactical quota is fractional");
            }
            let expr: LinearExpr = assignments
                .iter()
                .filter(|(triple, _)| in_quota(triple, &key))
                .map(|(_, &var)| (var, 1.0))
                .collect();
            problem.add_constraint(
                Constraint::new(QUOTA, expr, ConstraintType::Equal, quota)
                    .with_name(format!("{QUOTA}[{},{}]", key.cluster_id, key.product_type)),
            );
        }

        for customer in data.cluster_customers() {
            let expr: LinearExpr = assignments
                .iter()
                .filter(|(triple, _)| {
                    triple.cluster_id == customer.cluster_id
                        && triple.customer_id == customer.customer_id
                })
                .map(|(_, &var)| (var, 1.0))
                .collect();
            problem.add_constraint(
                Constraint::new(SINGLE_OFFER, expr, ConstraintType::LessThanOrEqual, 1.0)
                    .with_name(format!(
                        "{SINGLE_OFFER}[{},{}]",
                        customer.cluster_id, customer.customer_id
                    )),
            );
        }

        check_well_formed(Stage::Operational, &problem)?;
        debug!(
            variables = problem.num_variables(),
            constraints = problem.constraints.len(),
            "built operational model"
        );

        Ok(Self {
            problem,
            assignments,
            economics,
            targets: data.targets(),
        })
    }

    pub fn assignment_var(&self, key: &CustomerProduct) -> Option<VarId> {
        self.assignments.get(key).copied()
    }

    /// Assignment variables in `(cluster, customer, product)` order.
    pub fn assignments(&self) -> impl Iterator<Item = (&CustomerProduct, VarId)> {
        self.assignments.iter().map(|(key, &var)| (key, var))
    }

    pub fn economics(&self, key: &CustomerProduct) -> Option<CustomerEconomics> {
        self.economics.get(key).copied()
    }

    pub fn targets(&self) -> CampaignTargets {
        self.targets
    }
}

impl StageModel for OperationalModel {
    fn stage(&self) -> Stage {
        Stage::Operational
    }

    fn problem(&self) -> &OptimizationProblem {
        &self.problem
    }
}

fn in_quota(triple: &CustomerProduct, key: &ClusterProduct) -> bool {
    triple.cluster_id == key.cluster_id && triple.product_type == key.product_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{targets, worked_example};

    fn allocation(data: &CampaignData, quota: f64) -> TacticalAllocation {
        TacticalAllocation {
            offers: data.cluster_products().map(|key| (key, quota)).collect(),
            budget_overrun: 0.0,
        }
    }

    fn constraints<'a>(model: &'a OperationalModel, family: &str) -> Vec<&'a Constraint> {
        model
            .problem()
            .constraints
            .iter()
            .filter(|c| c.family == family)
            .collect()
    }

    #[test]
    fn one_binary_per_observed_triple() {
        let data = CampaignData::prepare(worked_example(), targets()).unwrap();
        let model = OperationalModel::build(&data, &allocation(&data, 1.0)).unwrap();

        assert_eq!(model.problem().num_variables(), 20);
        assert_eq!(model.problem().num_integer_variables(), 20);
        assert_eq!(constraints(&model, QUOTA).len(), 4);
        assert_eq!(constraints(&model, SINGLE_OFFER).len(), 10);
    }

    #[test]
    fn quota_rows_use_tactical_values_verbatim() {
        let data = CampaignData::prepare(worked_example(), targets()).unwrap();
        let mut tactical = allocation(&data, 2.0);
        tactical
            .offers
            .insert(ClusterProduct::new("k2", "p1"), 2.5);

        let model = OperationalModel::build(&data, &tactical).unwrap();
        let row = constraints(&model, QUOTA)
            .into_iter()
            .find(|c| c.name == "quota[k2,p1]")
            .unwrap();

        assert_eq!(row.constraint_type, ConstraintType::Equal);
        assert_eq!(row.bound, 2.5);
        assert_eq!(row.expression.terms.len(), 5);
    }

    #[test]
    fn quota_without_eligible_customers_has_no_terms() {
        let mut input = worked_example();
        input.customers.retain(|c| !(c.cluster == "k1" && c.product == "p2"));
        let data = CampaignData::prepare(input, targets()).unwrap();

        let model = OperationalModel::build(&data, &allocation(&data, 0.0)).unwrap();
        let row = constraints(&model, QUOTA)
            .into_iter()
            .find(|c| c.name == "quota[k1,p2]")
            .unwrap();

        assert!(row.expression.is_constant());
        assert_eq!(model.problem().num_variables(), 15);
    }

    #[test]
    fn missing_tactical_entry_is_a_definition_error() {
        let data = CampaignData::prepare(worked_example(), targets()).unwrap();
        let mut tactical = allocation(&data, 1.0);
        tactical.offers.remove(&ClusterProduct::new("k1", "p2"));

        let err = OperationalModel::build(&data, &tactical).unwrap_err();
        assert!(matches!(
            err,
            ModelDefinitionError::MissingParameter { stage: Stage::Operational, ref key, .. }
                if key == "(k1, p2)"
        ));
    }

    #[test]
    fn objective_uses_customer_profit() {
        let data = CampaignData::prepare(worked_example(), targets()).unwrap();
        let model = OperationalModel::build(&data, &allocation(&data, 1.0)).unwrap();
        let key = CustomerProduct::new("k2", "c7", "p2");
        let var = model.assignment_var(&key).unwrap();

        assert!(model
            .problem()
            .objective
            .expression
            .terms
            .contains(&(var, 2000.0)));
        assert_eq!(model.economics(&key).unwrap().cost, 200.0);
    }
}
