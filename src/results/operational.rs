// Operational pass: per-customer assignments and the realised campaign economics

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use super::tactical::TacticalSummary;
use super::{format_money, format_roi, roi_percent, SummaryMetrics, ASSIGNMENT_THRESHOLD};
use crate::domain::records::{ClusterId, CustomerId, ProductType};
use crate::model::{OperationalModel, Solved};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalRecord {
    pub cluster: ClusterId,
    pub customer: CustomerId,
    pub product: ProductType,
    /// 1 when the customer receives the product
    pub selected: u8,
    pub cost: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalSummary {
    pub total_profit: f64,
    pub total_cost: f64,
    pub assignments: usize,
    pub assignments_by_cluster: BTreeMap<ClusterId, usize>,
    pub roi_percent: Option<f64>,
    pub min_roi_percent: f64,
    pub budget: f64,
    pub budget_overrun: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationalReport {
    pub allocation: Vec<OperationalRecord>,
    pub summary: OperationalSummary,
}

impl SummaryMetrics for OperationalSummary {
    fn metrics(&self) -> Vec<(String, Option<f64>)> {
        let mut metrics = vec![
            ("total_profit".to_string(), Some(self.total_profit)),
            ("total_cost".to_string(), Some(self.total_cost)),
            ("assignments".to_string(), Some(self.assignments as f64)),
            ("roi_percent".to_string(), self.roi_percent),
            ("min_roi_percent".to_string(), Some(self.min_roi_percent)),
            ("budget".to_string(), Some(self.budget)),
            ("budget_overrun".to_string(), Some(self.budget_overrun)),
        ];
        metrics.extend(
            self.assignments_by_cluster
                .iter()
                .map(|(cluster, count)| (format!("assignments[{cluster}]"), Some(*count as f64))),
        );
        metrics
    }
}

/// Read the solved customer assignment.
///
/// Budget and overrun are carried over from the tactical summary, since the
/// operational model has no budget row of its own.
pub fn interpret(solved: &Solved<OperationalModel>, tactical: &TacticalSummary) -> OperationalReport {
    let model = solved.model();
    let solution = solved.solution();

    let mut allocation = Vec::new();
    let mut by_cluster: BTreeMap<ClusterId, usize> = BTreeMap::new();
    let (mut total_profit, mut total_cost) = (0.0, 0.0);

    for (key, var) in model.assignments() {
        let assigned = by_cluster.entry(key.cluster_id.clone()).or_insert(0);
        let mut record = OperationalRecord {
            cluster: key.cluster_id.clone(),
            customer: key.customer_id.clone(),
            product: key.product_type.clone(),
            selected: 0,
            cost: 0.0,
            profit: 0.0,
        };

        if solution.value(var) > ASSIGNMENT_THRESHOLD {
            if let Some(economics) = model.economics(key) {
                record.cost = economics.cost;
                record.profit = economics.profit;
            }
            record.selected = 1;
            total_cost += record.cost;
            total_profit += record.profit;
            *assigned += 1;
        }
        allocation.push(record);
    }

    let summary = OperationalSummary {
        total_profit,
        total_cost,
        assignments: by_cluster.values().sum(),
        assignments_by_cluster: by_cluster,
        roi_percent: roi_percent(total_profit, total_cost),
        min_roi_percent: tactical.min_roi_percent,
        budget: tactical.budget,
        budget_overrun: tactical.budget_overrun,
    };
    log_report(&summary);

    OperationalReport {
        allocation,
        summary,
    }
}

fn log_report(summary: &OperationalSummary) {
    info!(
        "[CustomerAllocation] {} customers selected for the campaign",
        summary.assignments
    );
    for (cluster, count) in &summary.assignments_by_cluster {
        info!("  cluster {cluster}: {count} offers");
    }
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
