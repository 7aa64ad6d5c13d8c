// Structured request payload: the same logical tables as the tabular source,
// decoded from a JSON body

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CampaignInput, ClusterRow, CustomerRow, MatrixEntry, ProductRow};

/// Optimisation request body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampaignPayload {
    /// Campaign budget; falls back to the configured budget when absent
    #[serde(default)]
    pub budget: Option<f64>,
    /// Minimum ROI in percent (`120` means a 20% hurdle rate)
    #[serde(default)]
    pub roi: Option<f64>,
    /// Solver override (`cbc`, `glpk`, `microlp`, `highs`)
    #[serde(default)]
    pub solver_type: Option<String>,
    pub cluster: Vec<ClusterPayload>,
    pub product: Vec<ProductPayload>,
    pub cost: Vec<CostPayload>,
    pub profit: Vec<ProfitPayload>,
    pub cust_cost_profit: Vec<CustomerPayload>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterPayload {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "Count")]
    pub count: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductPayload {
    #[serde(rename = "Product_Type")]
    pub product_type: String,
    #[serde(rename = "Count")]
    pub count: f64,
}

/// One product's cost per cluster: `{"Product_Type_Cost": "p1", "k1": 200, ...}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CostPayload {
    #[serde(rename = "Product_Type_Cost")]
    pub product_type: String,
    #[serde(flatten)]
    pub by_cluster: BTreeMap<String, f64>,
}

/// One product's profit per cluster: `{"Product_Type_Profit": "p1", "k1": 2000, ...}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfitPayload {
    #[serde(rename = "Product_Type_Profit")]
    pub product_type: String,
    #[serde(flatten)]
    pub by_cluster: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerPayload {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "Profit")]
    pub profit: f64,
}

impl CampaignPayload {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Logical campaign tables carried by the payload.
    pub fn to_input(&self) -> CampaignInput {
        let transpose = |product: &str, by_cluster: &BTreeMap<String, f64>| {
            by_cluster
                .iter()
                .map(|(cluster, &value)| MatrixEntry {
                    cluster: cluster.clone(),
                    product: product.to_string(),
                    value,
                })
                .collect::<Vec<_>>()
        };

        CampaignInput {
            clusters: self
                .cluster
                .iter()
                .map(|c| ClusterRow {
                    cluster: c.cluster.clone(),
                    count: c.count,
                })
                .collect(),
            products: self
                .product
                .iter()
                .map(|p| ProductRow {
                    product_type: p.product_type.clone(),
                    count: p.count,
                })
                .collect(),
            product_cost: self
                .cost
                .iter()
                .flat_map(|row| transpose(&row.product_type, &row.by_cluster))
                .collect(),
            product_profit: self
                .profit
                .iter()
                .flat_map(|row| transpose(&row.product_type, &row.by_cluster))
                .collect(),
            customers: self
                .cust_cost_profit
                .iter()
                .map(|c| CustomerRow {
                    cluster: c.cluster.clone(),
                    customer: c.customer.clone(),
                    product: c.product.clone(),
                    cost: c.cost,
                    profit: c.profit,
                })
                .collect(),
        }
    }
}
