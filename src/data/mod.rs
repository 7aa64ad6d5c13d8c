//! Data preparation
//!
//! Every ingestion variant (CSV directory, SQLite database, request payload)
//! produces the same [`CampaignInput`]. [`CampaignData::prepare`] validates it
//! and derives the index sets and economics maps the model builders consume.
//! Nothing partial escapes: either every structure is built or a
//! [`DataIntegrityError`] names the first offending key.

pub mod csv_source;
pub mod database;
pub mod error;
pub mod payload;
pub mod tabular;

pub use csv_source::CsvSource;
pub use database::SqliteSource;
pub use error::{DataIntegrityError, SourceError};
pub use payload::CampaignPayload;
pub use tabular::{read_campaign_input, Table, TableNames, TabularSource};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::domain::records::{
    CampaignTargets, Cluster, ClusterCustomer, ClusterProduct, Customer, CustomerEconomics,
    CustomerEconomicsMap, CustomerProduct, CustomerProductSet, Economics, Product,
    ProductEconomics,
};

const CLUSTER_TABLE: &str = "cluster";
const PRODUCT_TABLE: &str = "product";
const COST_TABLE: &str = "product_cost";
const PROFIT_TABLE: &str = "product_profit";
const CUSTOMER_TABLE: &str = "customer_cost_profit";

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRow {
    pub cluster: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub product_type: String,
    pub count: f64,
}

/// One cell of a cluster × product cost or profit matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixEntry {
    pub cluster: String,
    pub product: String,
    pub value: f64,
}

/// One row of the long-format customer table
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub cluster: String,
    pub customer: String,
    pub product: String,
    pub cost: f64,
    pub profit: f64,
}

/// Raw logical campaign tables, independent of where they came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignInput {
    pub clusters: Vec<ClusterRow>,
    pub products: Vec<ProductRow>,
    pub product_cost: Vec<MatrixEntry>,
    pub product_profit: Vec<MatrixEntry>,
    pub customers: Vec<CustomerRow>,
}

/// Validated campaign data shared read-only by both model builders
#[derive(Debug, Clone)]
pub struct CampaignData {
    clusters: Vec<Cluster>,
    products: Vec<Product>,
    customers: Vec<Customer>,
    product_economics: ProductEconomics,
    customer_economics: CustomerEconomicsMap,
    customer_products: CustomerProductSet,
    cluster_customers: BTreeSet<ClusterCustomer>,
    targets: CampaignTargets,
}

impl CampaignData {
    /// Validate `input` and derive every structure the models need.
    pub fn prepare(
        input: CampaignInput,
        targets: CampaignTargets,
    ) -> Result<Self, DataIntegrityError> {
        check_targets(&targets)?;

        let clusters = prepare_clusters(&input.clusters)?;
        let products = prepare_products(&input.products)?;
        let cluster_ids: HashSet<&str> = clusters.iter().map(|c| c.cluster_id.as_str()).collect();
        let product_ids: HashSet<&str> =
            products.iter().map(|p| p.product_type.as_str()).collect();
        let known = Known {
            clusters: &cluster_ids,
            products: &product_ids,
        };

        let cost = collect_matrix(COST_TABLE, &input.product_cost, &known)?;
        let profit = collect_matrix(PROFIT_TABLE, &input.product_profit, &known)?;

        let mut product_economics = ProductEconomics::new();
        for cluster in &clusters {
            for product in &products {
                let key = ClusterProduct::new(&cluster.cluster_id, &product.product_type);
                let lookup = |table: &str, matrix: &BTreeMap<ClusterProduct, f64>| {
                    matrix.get(&key).copied().ok_or_else(|| {
                        DataIntegrityError::MissingEconomics {
                            table: table.to_string(),
                            cluster: key.cluster_id.clone(),
                            product: key.product_type.clone(),
                        }
                    })
                };
                let economics = Economics {
                    expected_cost: lookup(COST_TABLE, &cost)?,
                    expected_profit: lookup(PROFIT_TABLE, &profit)?,
                };
                product_economics.insert(key, economics);
            }
        }

        let customer_side = prepare_customers(&input.customers, &known)?;

        debug!(
            clusters = clusters.len(),
            products = products.len(),
            customer_products = customer_side.customer_products.len(),
            customers = customer_side.cluster_customers.len(),
            "prepared campaign data"
        );

        Ok(Self {
            clusters,
            products,
            customers: customer_side.customers,
            product_economics,
            customer_economics: customer_side.economics,
            customer_products: customer_side.customer_products,
            cluster_customers: customer_side.cluster_customers,
            targets,
        })
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Denormalised customer list, one entry per `(cluster, customer, product)`.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn product_economics(&self) -> &ProductEconomics {
        &self.product_economics
    }

    pub fn customer_economics(&self) -> &CustomerEconomicsMap {
        &self.customer_economics
    }

    /// Sparse operational index set.
    pub fn customer_products(&self) -> &CustomerProductSet {
        &self.customer_products
    }

    /// Distinct customers with their cluster.
    pub fn cluster_customers(&self) -> &BTreeSet<ClusterCustomer> {
        &self.cluster_customers
    }

    pub fn targets(&self) -> CampaignTargets {
        self.targets
    }

    /// Full `Clusters × Products` index set in input order.
    pub fn cluster_products(&self) -> impl Iterator<Item = ClusterProduct> + '_ {
        self.clusters.iter().flat_map(move |cluster| {
            self.products
                .iter()
                .map(move |product| ClusterProduct::new(&cluster.cluster_id, &product.product_type))
        })
    }
}

struct Known<'a> {
    clusters: &'a HashSet<&'a str>,
    products: &'a HashSet<&'a str>,
}

impl Known<'_> {
    fn check(&self, table: &str, cluster: &str, product: &str) -> Result<(), DataIntegrityError> {
        if !self.clusters.contains(cluster) {
            return Err(DataIntegrityError::UnknownCluster {
                table: table.to_string(),
                cluster: cluster.to_string(),
            });
        }
        if !self.products.contains(product) {
            return Err(DataIntegrityError::UnknownProduct {
                table: table.to_string(),
                product: product.to_string(),
            });
        }
        Ok(())
    }
}

fn check_targets(targets: &CampaignTargets) -> Result<(), DataIntegrityError> {
    if !targets.budget.is_finite() || targets.budget < 0.0 {
        return Err(DataIntegrityError::InvalidTarget {
            name: "budget",
            value: targets.budget,
        });
    }
    if !targets.min_roi_percent.is_finite() || targets.min_roi_percent < 0.0 {
        return Err(DataIntegrityError::InvalidTarget {
            name: "min_roi_percent",
            value: targets.min_roi_percent,
        });
    }
    Ok(())
}

fn check_count(table: &str, key: &str, value: f64) -> Result<(), DataIntegrityError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DataIntegrityError::InvalidValue {
            table: table.to_string(),
            key: key.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_unique<'a>(
    table: &str,
    seen: &mut HashSet<&'a str>,
    key: &'a str,
) -> Result<(), DataIntegrityError> {
    if seen.insert(key) {
        Ok(())
    } else {
        Err(DataIntegrityError::DuplicateKey {
            table: table.to_string(),
            key: key.to_string(),
        })
    }
}

fn prepare_clusters(rows: &[ClusterRow]) -> Result<Vec<Cluster>, DataIntegrityError> {
    if rows.is_empty() {
        return Err(DataIntegrityError::EmptyTable {
            table: CLUSTER_TABLE.to_string(),
        });
    }
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| {
            check_unique(CLUSTER_TABLE, &mut seen, &row.cluster)?;
            check_count(CLUSTER_TABLE, &row.cluster, row.count)?;
            Ok(Cluster {
                cluster_id: row.cluster.clone(),
                customer_count: row.count,
            })
        })
        .collect()
}

fn prepare_products(rows: &[ProductRow]) -> Result<Vec<Product>, DataIntegrityError> {
    if rows.is_empty() {
        return Err(DataIntegrityError::EmptyTable {
            table: PRODUCT_TABLE.to_string(),
        });
    }
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| {
            check_unique(PRODUCT_TABLE, &mut seen, &row.product_type)?;
            check_count(PRODUCT_TABLE, &row.product_type, row.count)?;
            Ok(Product {
                product_type: row.product_type.clone(),
                min_offer_count: row.count,
            })
        })
        .collect()
}

fn collect_matrix(
    table: &str,
    entries: &[MatrixEntry],
    known: &Known<'_>,
) -> Result<BTreeMap<ClusterProduct, f64>, DataIntegrityError> {
    let mut matrix = BTreeMap::new();
    for entry in entries {
        known.check(table, &entry.cluster, &entry.product)?;
        let key = ClusterProduct::new(&entry.cluster, &entry.product);
        if matrix.contains_key(&key) {
            return Err(DataIntegrityError::DuplicateKey {
                table: table.to_string(),
                key: key.to_string(),
            });
        }
        matrix.insert(key, entry.value);
    }
    Ok(matrix)
}

struct CustomerSide {
    customers: Vec<Customer>,
    economics: CustomerEconomicsMap,
    customer_products: CustomerProductSet,
    cluster_customers: BTreeSet<ClusterCustomer>,
}

/// Index the long-format customer table by its observed triples.
fn prepare_customers(
    rows: &[CustomerRow],
    known: &Known<'_>,
) -> Result<CustomerSide, DataIntegrityError> {
    let mut home_cluster: BTreeMap<&str, &str> = BTreeMap::new();
    let mut side = CustomerSide {
        customers: Vec::with_capacity(rows.len()),
        economics: CustomerEconomicsMap::new(),
        customer_products: CustomerProductSet::new(),
        cluster_customers: BTreeSet::new(),
    };

    for row in rows {
        known.check(CUSTOMER_TABLE, &row.cluster, &row.product)?;

        let first = *home_cluster.entry(&row.customer).or_insert(&row.cluster);
        if first != row.cluster {
            return Err(DataIntegrityError::CustomerInMultipleClusters {
                customer: row.customer.clone(),
                first: first.to_string(),
                second: row.cluster.clone(),
            });
        }

        let key = CustomerProduct::new(&row.cluster, &row.customer, &row.product);
        if !side.customer_products.insert(key.clone()) {
            return Err(DataIntegrityError::DuplicateKey {
                table: CUSTOMER_TABLE.to_string(),
                key: key.to_string(),
            });
        }

        side.economics.insert(
            key.clone(),
            CustomerEconomics {
                cost: row.cost,
                profit: row.profit,
            },
        );
        side.cluster_customers.insert(key.cluster_customer());
        side.customers.push(Customer {
            name: row.customer.clone(),
            cluster_id: row.cluster.clone(),
            key,
        });
    }

    Ok(side)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Two clusters of five customers, two products, every customer eligible
    /// for both products.
    pub fn worked_example() -> CampaignInput {
        let clusters = ["k1", "k2"];
        let products = ["p1", "p2"];
        let cost = [[200.0, 100.0], [300.0, 200.0]];
        let profit = [[2000.0, 1000.0], [3000.0, 2000.0]];

        let mut input = CampaignInput {
            clusters: clusters
                .iter()
                .map(|c| ClusterRow {
                    cluster: c.to_string(),
                    count: 5.0,
                })
                .collect(),
            products: products
                .iter()
                .map(|p| ProductRow {
                    product_type: p.to_string(),
                    count: 2.0,
                })
                .collect(),
            ..CampaignInput::default()
        };

        for (k, cluster) in clusters.iter().enumerate() {
            for (j, product) in products.iter().enumerate() {
                input.product_cost.push(MatrixEntry {
                    cluster: cluster.to_string(),
                    product: product.to_string(),
                    value: cost[k][j],
                });
                input.product_profit.push(MatrixEntry {
                    cluster: cluster.to_string(),
                    product: product.to_string(),
                    value: profit[k][j],
                });
            }
            for i in 1..=5 {
                let customer = format!("c{}", k * 5 + i);
                for (j, product) in products.iter().enumerate() {
                    input.customers.push(CustomerRow {
                        cluster: cluster.to_string(),
                        customer: customer.clone(),
                        product: product.to_string(),
                        cost: cost[k][j],
                        profit: profit[k][j],
                    });
                }
            }
        }
        input
    }

    pub fn targets() -> CampaignTargets {
        CampaignTargets {
            budget: 2000.0,
            min_roi_percent: 120.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{targets, worked_example};
    use super::*;

    #[test]
    fn prepares_index_sets() {
        let data = CampaignData::prepare(worked_example(), targets()).unwrap();

        assert_eq!(data.clusters().len(), 2);
        assert_eq!(data.products().len(), 2);
        assert_eq!(data.cluster_products().count(), 4);
        // denormalised: one customer record per triple
        assert_eq!(data.customers().len(), 20);
        assert_eq!(data.cluster_customers().len(), 10);
        assert_eq!(
            data.product_economics()[&ClusterProduct::new("k2", "p1")],
            Economics {
                expected_profit: 3000.0,
                expected_cost: 300.0
            }
        );
    }

    #[test]
    fn customer_index_is_sparse() {
        let mut input = worked_example();
        input
            .customers
            .retain(|c| !(c.customer == "c3" && c.product == "p2"));

        let data = CampaignData::prepare(input, targets()).unwrap();

        assert_eq!(data.customer_products().len(), 19);
        assert!(!data
            .customer_products()
            .contains(&CustomerProduct::new("k1", "c3", "p2")));
        assert!(data
            .cluster_customers()
            .iter()
            .any(|cc| cc.customer_id == "c3"));
    }

    #[test]
    fn missing_matrix_cell_fails() {
        let mut input = worked_example();
        input
            .product_profit
            .retain(|e| !(e.cluster == "k2" && e.product == "p2"));

        let err = CampaignData::prepare(input, targets()).unwrap_err();
        assert_eq!(
            err,
            DataIntegrityError::MissingEconomics {
                table: PROFIT_TABLE.into(),
                cluster: "k2".into(),
                product: "p2".into(),
            }
        );
    }

    #[test]
    fn unknown_references_fail() {
        let mut input = worked_example();
        input.product_cost.push(MatrixEntry {
            cluster: "k9".into(),
            product: "p1".into(),
            value: 1.0,
        });
        assert!(matches!(
            CampaignData::prepare(input, targets()),
            Err(DataIntegrityError::UnknownCluster { ref cluster, .. }) if cluster == "k9"
        ));

        let mut input = worked_example();
        input.customers[0].product = "p7".into();
        assert!(matches!(
            CampaignData::prepare(input, targets()),
            Err(DataIntegrityError::UnknownProduct { ref product, .. }) if product == "p7"
        ));
    }

    #[test]
    fn duplicates_fail() {
        let mut input = worked_example();
        input.clusters.push(input.clusters[0].clone());
        assert!(matches!(
            CampaignData::prepare(input, targets()),
            Err(DataIntegrityError::DuplicateKey { .. })
        ));

        let mut input = worked_example();
        input.customers.push(input.customers[0].clone());
        assert!(matches!(
            CampaignData::prepare(input, targets()),
            Err(DataIntegrityError::DuplicateKey { ref table, .. }) if table == CUSTOMER_TABLE
        ));
    }

    #[test]
    fn customer_cannot_span_clusters() {
        let mut input = worked_example();
        // c1 belongs to k1; list it under k2 as well
        input.customers.push(CustomerRow {
            cluster: "k2".into(),
            customer: "c1".into(),
            product: "p1".into(),
            cost: 1.0,
            profit: 1.0,
        });
        assert!(matches!(
            CampaignData::prepare(input, targets()),
            Err(DataIntegrityError::CustomerInMultipleClusters { .. })
        ));
    }

    #[test]
    fn negative_counts_and_targets_fail() {
        let mut input = worked_example();
        input.products[1].count = -1.0;
        assert!(matches!(
            CampaignData::prepare(input, targets()),
            Err(DataIntegrityError::InvalidValue { .. })
        ));

        for count in [f64::NAN, f64::INFINITY] {
            let mut input = worked_example();
            input.clusters[0].count = count;
            assert!(matches!(
                CampaignData::prepare(input, targets()),
                Err(DataIntegrityError::InvalidValue { ref table, .. }) if table == CLUSTER_TABLE
            ));
        }

        let bad = CampaignTargets {
            budget: -5.0,
            min_roi_percent: 120.0,
        };
        assert!(matches!(
            CampaignData::prepare(worked_example(), bad),
            Err(DataIntegrityError::InvalidTarget { name: "budget", .. })
        ));
    }
}
