use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::debug;

use super::{ExportError, ResultTable};
use crate::data::database::quote_ident;

/// Write each table as `<name>_<solver>` into the SQLite file at `path`,
/// replacing tables left by earlier runs.
pub fn write_sqlite(path: &Path, tables: &[ResultTable], solver: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut conn = Connection::open(path)?;
    write_tables(&mut conn, tables, solver)
}

pub(crate) fn write_tables(
    conn: &mut Connection,
    tables: &[ResultTable],
    solver: &str,
) -> Result<(), ExportError> {
    let tx = conn.transaction()?;
    for table in tables {
        let name = quote_ident(&table.qualified_name(solver));
        let columns: Vec<String> = table.headers.iter().map(|h| quote_ident(h)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {name}; CREATE TABLE {name} ({});",
            columns.join(", ")
        ))?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {name} ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            ))?;
            for row in &table.rows {
                insert.execute(params_from_iter(row.iter()))?;
            }
        }
        debug!(table = %name, rows = table.rows.len(), "wrote result table");
    }
    tx.commit()?;
    Ok(())
}
