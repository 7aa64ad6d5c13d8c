// SQLite source: the input tables live in a single database file

use rusqlite::{types::ValueRef, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::error::{DataIntegrityError, SourceError};
use super::tabular::{Table, TabularSource};

/// Reads input tables from a SQLite database
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn table_exists(&self, name: &str) -> Result<bool, SourceError> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl TabularSource for SqliteSource {
    fn load_table(&self, name: &str) -> Result<Table, SourceError> {
        if !self.table_exists(name)? {
            return Err(DataIntegrityError::MissingTable {
                table: name.to_string(),
            }
            .into());
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
        let headers: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let width = headers.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(cell_text))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(table = name, rows = rows.len(), "loaded database table");
        Ok(Table::new(name, headers, rows))
    }
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).trim().to_string()
        }
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
