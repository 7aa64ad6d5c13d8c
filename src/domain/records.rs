//! Campaign domain records
//!
//! Plain value objects produced by data preparation. They carry identity and
//! economics only; all behaviour lives in the model builders.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a customer segment
pub type ClusterId = String;

/// Identifier of an offer type
pub type ProductType = String;

/// Identifier of an individual customer
pub type CustomerId = String;

/// A customer segment and its headcount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub cluster_id: ClusterId,
    pub customer_count: f64,
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cluster {} has {} customers", self.cluster_id, self.customer_count)
    }
}

/// An offer type with its campaign-wide minimum number of offers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub product_type: ProductType,
    pub min_offer_count: f64,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product {} requires at least {} offers",
            self.product_type, self.min_offer_count
        )
    }
}

/// Tactical index: one cluster crossed with one product
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClusterProduct {
    pub cluster_id: ClusterId,
    pub product_type: ProductType,
}

impl ClusterProduct {
    pub fn new(cluster_id: impl Into<ClusterId>, product_type: impl Into<ProductType>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            product_type: product_type.into(),
        }
    }
}

impl fmt::Display for ClusterProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cluster_id, self.product_type)
    }
}

/// Operational index: a product a specific customer of a cluster can receive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CustomerProduct {
    pub cluster_id: ClusterId,
    pub customer_id: CustomerId,
    pub product_type: ProductType,
}

impl CustomerProduct {
    pub fn new(
        cluster_id: impl Into<ClusterId>,
        customer_id: impl Into<CustomerId>,
        product_type: impl Into<ProductType>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            customer_id: customer_id.into(),
            product_type: product_type.into(),
        }
    }

    /// The `(cluster, product)` quota this triple counts towards.
    pub fn cluster_product(&self) -> ClusterProduct {
        ClusterProduct::new(self.cluster_id.clone(), self.product_type.clone())
    }

    /// The `(cluster, customer)` pair limited to a single offer.
    pub fn cluster_customer(&self) -> ClusterCustomer {
        ClusterCustomer {
            cluster_id: self.cluster_id.clone(),
            customer_id: self.customer_id.clone(),
        }
    }
}

impl fmt::Display for CustomerProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.cluster_id, self.customer_id, self.product_type
        )
    }
}

/// A customer within its cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClusterCustomer {
    pub cluster_id: ClusterId,
    pub customer_id: CustomerId,
}

/// One record per observed `(cluster, customer, product)` combination.
///
/// The customer list is intentionally denormalised: a customer eligible for
/// three products appears three times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub name: CustomerId,
    pub cluster_id: ClusterId,
    pub key: CustomerProduct,
}

/// Expected economics of offering a product to a whole cluster (per offer)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Economics {
    pub expected_profit: f64,
    pub expected_cost: f64,
}

/// Economics of offering a product to one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CustomerEconomics {
    pub cost: f64,
    pub profit: f64,
}

/// Tactical-granularity economics keyed by `(cluster, product)`
pub type ProductEconomics = BTreeMap<ClusterProduct, Economics>;

/// Operational-granularity economics keyed by the sparse customer triple
pub type CustomerEconomicsMap = BTreeMap<CustomerProduct, CustomerEconomics>;

/// Sparse operational index set
pub type CustomerProductSet = BTreeSet<CustomerProduct>;

/// Budget and return target of the campaign
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CampaignTargets {
    pub budget: f64,
    /// Minimum acceptable ROI in percent, e.g. `120.0`
    pub min_roi_percent: f64,
}

impl CampaignTargets {
    /// Hurdle rate as a fraction above 1.0 (`120%` → `0.2`).
    pub fn hurdle_rate(&self) -> f64 {
        self.min_roi_percent / 100.0 - 1.0
    }
}

/// Tactical stage output handed to the operational builder as plain data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TacticalAllocation {
    pub offers: BTreeMap<ClusterProduct, f64>,
    pub budget_overrun: f64,
}

impl TacticalAllocation {
    /// Solved offer quantity, zero for unknown pairs.
    pub fn quota(&self, key: &ClusterProduct) -> f64 {
        self.offers.get(key).copied().unwrap_or(0.0)
    }
}
