// Tabular ingestion: turns the five raw tables (from CSV files or a SQLite
// database) into a `CampaignInput`

use serde::{Deserialize, Serialize};

use super::error::{DataIntegrityError, SourceError};
use super::{CampaignInput, ClusterRow, CustomerRow, MatrixEntry, ProductRow};

/// A raw table of trimmed string cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Position of a required column.
    pub fn column(&self, column: &str) -> Result<usize, DataIntegrityError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| DataIntegrityError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    fn non_empty(&self) -> Result<&Self, DataIntegrityError> {
        if self.rows.is_empty() {
            Err(DataIntegrityError::EmptyTable {
                table: self.name.clone(),
            })
        } else {
            Ok(self)
        }
    }

    fn text(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn number(&self, row: usize, column: usize) -> Result<f64, DataIntegrityError> {
        let value = self.text(row, column);
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DataIntegrityError::InvalidNumber {
                table: self.name.clone(),
                // 1-based data row, header excluded
                row: row + 1,
                column: self.headers.get(column).cloned().unwrap_or_default(),
                value: value.to_string(),
            })
    }
}

/// Anything that can hand out the raw campaign tables by name
pub trait TabularSource {
    fn load_table(&self, name: &str) -> Result<Table, SourceError>;
}

/// Names of the five input tables (file stems for CSV, table names for SQLite)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub cluster: String,
    pub product: String,
    pub product_cost: String,
    pub product_profit: String,
    pub customer: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            cluster: "cluster_data".to_string(),
            product: "product_data".to_string(),
            product_cost: "product_cost".to_string(),
            product_profit: "product_profit".to_string(),
            customer: "customer_data".to_string(),
        }
    }
}

/// Read every table from `source` and assemble the logical campaign input.
pub fn read_campaign_input(
    source: &impl TabularSource,
    names: &TableNames,
) -> Result<CampaignInput, SourceError> {
    let clusters = clusters_from(&source.load_table(&names.cluster)?)?;
    let products = products_from(&source.load_table(&names.product)?)?;
    let product_cost = matrix_from(&source.load_table(&names.product_cost)?)?;
    let product_profit = matrix_from(&source.load_table(&names.product_profit)?)?;
    let customers = customers_from(&source.load_table(&names.customer)?)?;

    Ok(CampaignInput {
        clusters,
        products,
        product_cost,
        product_profit,
        customers,
    })
}

fn clusters_from(table: &Table) -> Result<Vec<ClusterRow>, DataIntegrityError> {
    let table = table.non_empty()?;
    let id = table.column("Cluster")?;
    let count = table.column("Count")?;

    (0..table.rows.len())
        .map(|row| {
            Ok(ClusterRow {
                cluster: table.text(row, id).to_string(),
                count: table.number(row, count)?,
            })
        })
        .collect()
}

fn products_from(table: &Table) -> Result<Vec<ProductRow>, DataIntegrityError> {
    let table = table.non_empty()?;
    let id = table.column("Product_Type")?;
    let count = table.column("Count")?;

    (0..table.rows.len())
        .map(|row| {
            Ok(ProductRow {
                product_type: table.text(row, id).to_string(),
                count: table.number(row, count)?,
            })
        })
        .collect()
}

/// Wide cost/profit matrix: the first column labels the cluster (its header is
/// often blank), every other column is a product type.
fn matrix_from(table: &Table) -> Result<Vec<MatrixEntry>, DataIntegrityError> {
    let table = table.non_empty()?;
    if table.headers.len() < 2 {
        return Err(DataIntegrityError::MissingColumn {
            table: table.name.clone(),
            column: "<product type>".to_string(),
        });
    }

    let mut entries = Vec::with_capacity(table.rows.len() * (table.headers.len() - 1));
    for row in 0..table.rows.len() {
        let cluster = table.text(row, 0);
        for (column, product) in table.headers.iter().enumerate().skip(1) {
            entries.push(MatrixEntry {
                cluster: cluster.to_string(),
                product: product.clone(),
                value: table.number(row, column)?,
            });
        }
    }
    Ok(entries)
}

fn customers_from(table: &Table) -> Result<Vec<CustomerRow>, DataIntegrityError> {
    let table = table.non_empty()?;
    let cluster = table.column("Cluster")?;
    let customer = table.column("Customer")?;
    let product = table.column("Product")?;
    let cost = table.column("Cost")?;
    let profit = table.column("Profit")?;

    (0..table.rows.len())
        .map(|row| {
            Ok(CustomerRow {
                cluster: table.text(row, cluster).to_string(),
                customer: table.text(row, customer).to_string(),
                product: table.text(row, product).to_string(),
                cost: table.number(row, cost)?,
                profit: table.number(row, profit)?,
            })
        })
        .collect()
}
