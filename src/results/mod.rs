//! Result interpretation
//!
//! Pure read-only passes over solved stage models. Each pass produces an
//! allocation record set and a financial summary, and logs a readable report.
//! Calling a pass twice on the same solved model yields identical output.

pub mod display;
pub mod operational;
pub mod tactical;

pub use operational::{OperationalRecord, OperationalReport, OperationalSummary};
pub use tactical::{TacticalRecord, TacticalReport, TacticalSummary};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rusty_money::{iso, Money};
use serde::Serialize;

/// Offer quantities at or below this are solver noise
pub const OFFER_THRESHOLD: f64 = 1e-6;

/// Binary values above this count as assigned
pub const ASSIGNMENT_THRESHOLD: f64 = 0.5;

/// The four output collections of a run, keyed by collection name when
/// serialised
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    pub tactical_allocation: Vec<TacticalRecord>,
    pub tactical_summary: TacticalSummary,
    pub operational_allocation: Vec<OperationalRecord>,
    pub operational_summary: OperationalSummary,
}

impl ResultBundle {
    pub fn new(tactical: TacticalReport, operational: OperationalReport) -> Self {
        Self {
            tactical_allocation: tactical.allocation,
            tactical_summary: tactical.summary,
            operational_allocation: operational.allocation,
            operational_summary: operational.summary,
        }
    }
}

/// Named numeric values of a summary, used for tabular export and metrics.
pub trait SummaryMetrics {
    fn metrics(&self) -> Vec<(String, Option<f64>)>;
}

/// `profit / cost × 100` rounded to two decimals; `None` without spend.
pub fn roi_percent(profit: f64, cost: f64) -> Option<f64> {
    if cost.abs() <= f64::EPSILON {
        None
    } else {
        Some(round2(100.0 * profit / cost))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Money amount for reports, e.g. `$1,234.56`.
pub fn format_money(amount: f64) -> String {
    let amount = Decimal::from_f64(amount)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2);
    Money::from_decimal(amount, iso::USD).to_string()
}

fn format_roi(roi: Option<f64>) -> String {
    roi.map_or_else(|| "n/a".to_string(), |roi| format!("{roi}%"))
}
