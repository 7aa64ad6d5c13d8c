// Tactical pass: offer counts and campaign-level economics per cluster/product

use serde::Serialize;
use tracing::info;

use super::{format_money, format_roi, roi_percent, round2, SummaryMetrics, OFFER_THRESHOLD};
use crate::domain::records::{ClusterId, ProductType};
use crate::model::{Solved, TacticalModel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TacticalRecord {
    pub cluster: ClusterId,
    pub product: ProductType,
    pub count: f64,
    pub cost: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TacticalSummary {
    pub total_profit: f64,
    pub total_cost: f64,
    pub budget: f64,
    pub budget_overrun: f64,
    pub roi_percent: Option<f64>,
    pub min_roi_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TacticalReport {
    pub allocation: Vec<TacticalRecord>,
    pub summary: TacticalSummary,
}

impl SummaryMetrics for TacticalSummary {
    fn metrics(&self) -> Vec<(String, Option<f64>)> {
        vec![
            ("total_profit".into(), Some(self.total_profit)),
            ("total_cost".into(), Some(self.total_cost)),
            ("budget".into(), Some(self.budget)),
            ("budget_overrun".into(), Some(self.budget_overrun)),
            ("roi_percent".into(), self.roi_percent),
            ("min_roi_percent".into(), Some(self.min_roi_percent)),
        ]
    }
}

/// Read the solved tactical allocation.
pub fn interpret(solved: &Solved<TacticalModel>) -> TacticalReport {
    let model = solved.model();
    let solution = solved.solution();
    let targets = model.targets();

    let mut allocation = Vec::new();
    let (mut total_profit, mut total_cost) = (0.0, 0.0);
    for (key, var) in model.offers() {
        let quantity = solution.value(var);
        let mut record = TacticalRecord {
            cluster: key.cluster_id.clone(),
            product: key.product_type.clone(),
            count: 0.0,
            cost: 0.0,
            profit: 0.0,
        };
        if let Some(economics) = model.economics(key).filter(|_| quantity > OFFER_THRESHOLD) {
            record.count = quantity;
            record.cost = quantity * economics.expected_cost;
            record.profit = quantity * economics.expected_profit;
            total_cost += record.cost;
            total_profit += record.profit;
        }
        allocation.push(record);
    }

    let summary = TacticalSummary {
        total_profit,
        total_cost,
        budget: targets.budget,
        budget_overrun: solution.value(model.overrun_var()).max(0.0),
        roi_percent: roi_percent(total_profit, total_cost),
        min_roi_percent: round2(100.0 * (1.0 + targets.hurdle_rate())),
    };
    log_report(&summary);

    TacticalReport {
        allocation,
        summary,
    }
}

fn log_report(summary: &TacticalSummary) {
    info!(
        "[ProductAllocation] The increase correction in campaign budget is {}",
        format_money(summary.budget_overrun)
    );
    info!(
        "Optimal total expected profit is {}",
        format_money(summary.total_profit)
    );
    info!(
        "Optimal total expected cost is {} with a budget of {} and an extra amount of {}",
        format_money(summary.total_cost),
        format_money(summary.budget),
        format_money(summary.budget_overrun)
    );
    info!(
        "Optimal ROI is {} with a minimum ROI of {}%",
        format_roi(summary.roi_percent),
        summary.min_roi_percent
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{targets, worked_example};
    use crate::data::CampaignData;
    use crate::domain::models::Solution;
    use crate::domain::records::ClusterProduct;
    use crate::model::DEFAULT_OVERRUN_PENALTY;

    fn solved_with(values: &[(&str, &str, f64)], overrun: f64) -> Solved<TacticalModel> {
        let data = CampaignData::prepare(worked_example(), targets()).unwrap();
        let model = TacticalModel::build(&data, DEFAULT_OVERRUN_PENALTY).unwrap();
        let mut variable_values = vec![0.0; 5];
        for &(cluster, product, value) in values {
            let var = model
                .offer_var(&ClusterProduct::new(cluster, product))
                .unwrap();
            variable_values[var.0] = value;
        }
        variable_values[model.overrun_var().0] = overrun;
        Solved::new(model, Solution::optimal(0.0, variable_values))
    }

    fn record<'a>(report: &'a TacticalReport, cluster: &str, product: &str) -> &'a TacticalRecord {
        report
            .allocation
            .iter()
            .find(|r| r.cluster == cluster && r.product == product)
            .unwrap()
    }

    #[test]
    fn accumulates_positive_offers() {
        let solved = solved_with(&[("k1", "p1", 2.0), ("k2", "p2", 3.0)], 0.0);
        let report = interpret(&solved);

        assert_eq!(report.allocation.len(), 4);
        let k2p2 = record(&report, "k2", "p2");
        assert_eq!((k2p2.count, k2p2.cost, k2p2.profit), (3.0, 600.0, 6000.0));
        assert_eq!(report.summary.total_cost, 1000.0);
        assert_eq!(report.summary.total_profit, 10000.0);
        assert_eq!(report.summary.roi_percent, Some(1000.0));
        assert_eq!(report.summary.min_roi_percent, 120.0);
        assert_eq!(report.summary.budget, 2000.0);
    }

    #[test]
    fn threshold_law() {
        let epsilon = 1e-9;
        let solved = solved_with(
            &[
                ("k1", "p1", OFFER_THRESHOLD - epsilon),
                ("k1", "p2", OFFER_THRESHOLD + epsilon),
            ],
            0.0,
        );
        let report = interpret(&solved);

        let below = record(&report, "k1", "p1");
        assert_eq!((below.count, below.cost, below.profit), (0.0, 0.0, 0.0));
        let above = record(&report, "k1", "p2");
        assert_eq!(above.count, OFFER_THRESHOLD + epsilon);
        assert_eq!(above.cost, (OFFER_THRESHOLD + epsilon) * 100.0);
    }

    #[test]
    fn roi_is_undefined_without_offers() {
        let report = interpret(&solved_with(&[], 0.0));
        assert_eq!(report.summary.total_cost, 0.0);
        assert_eq!(report.summary.roi_percent, None);
    }

    #[test]
    fn reports_overrun_and_is_idempotent() {
        let solved = solved_with(&[("k2", "p1", 5.0)], 250.0);
        let first = interpret(&solved);
        let second = interpret(&solved);

        assert_eq!(first.summary.budget_overrun, 250.0);
        assert_eq!(first, second);
    }
}
