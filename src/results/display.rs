// Terminal tables for a finished run

use tabled::builder::Builder;
use tabled::settings::{object::Columns, Alignment, Style};

use super::{format_money, format_roi, ResultBundle};

/// Offers, assignments and both financial summaries as rounded tables.
/// Rows with nothing allocated are left out.
pub fn render(bundle: &ResultBundle) -> String {
    let mut offers = Builder::default();
    offers.push_record(["Cluster", "Product", "Offers", "Cost", "Profit"]);
    for record in bundle.tactical_allocation.iter().filter(|r| r.count > 0.0) {
        offers.push_record([
            record.cluster.clone(),
            record.product.clone(),
            format!("{:.2}", record.count),
            format_money(record.cost),
            format_money(record.profit),
        ]);
    }

    let mut assignments = Builder::default();
    assignments.push_record(["Cluster", "Customer", "Product", "Cost", "Profit"]);
    for record in bundle.operational_allocation.iter().filter(|r| r.selected == 1) {
        assignments.push_record([
            record.cluster.clone(),
            record.customer.clone(),
            record.product.clone(),
            format_money(record.cost),
            format_money(record.profit),
        ]);
    }

    let tactical = &bundle.tactical_summary;
    let operational = &bundle.operational_summary;
    let mut summary = Builder::default();
    summary.push_record(["", "Tactical", "Operational"]);
    summary.push_record([
        "Expected profit".to_string(),
        format_money(tactical.total_profit),
        format_money(operational.total_profit),
    ]);
    summary.push_record([
        "Expected cost".to_string(),
        format_money(tactical.total_cost),
        format_money(operational.total_cost),
    ]);
    summary.push_record([
        "Budget".to_string(),
        format_money(tactical.budget),
        format_money(operational.budget),
    ]);
    summary.push_record([
        "Budget increase".to_string(),
        format_money(tactical.budget_overrun),
        format_money(operational.budget_overrun),
    ]);
    summary.push_record([
        "ROI".to_string(),
        format_roi(tactical.roi_percent),
        format_roi(operational.roi_percent),
    ]);
    summary.push_record([
        "Minimum ROI".to_string(),
        format!("{}%", tactical.min_roi_percent),
        format!("{}%", operational.min_roi_percent),
    ]);

    [
        finish(offers, 2),
        finish(assignments, 3),
        finish(summary, 1),
    ]
    .join("\n")
}

fn finish(builder: Builder, first_numeric: usize) -> String {
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(first_numeric..), Alignment::right());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    #[test]
    fn shows_only_allocated_rows() {
        let rendered = render(&fixtures::bundle());

        assert!(rendered.contains("$4,000.00"));
        assert!(rendered.contains("c1"));
        // k1/p2 has no offers and c1/p2 is not selected
        assert_eq!(rendered.matches("p2").count(), 0);
        assert!(rendered.contains("n/a"));
    }
}
