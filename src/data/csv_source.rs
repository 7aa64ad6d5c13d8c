// CSV source: one `<table>.csv` file per input table in a directory

use csv::{ReaderBuilder, Trim};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{DataIntegrityError, SourceError};
use super::tabular::{Table, TabularSource};

/// Reads input tables from a directory of CSV files
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn read(path: &Path, name: &str) -> Result<Table, SourceError> {
        let csv_error = |source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            // skip fully blank lines
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(table = name, path = %path.display(), rows = rows.len(), "loaded CSV table");
        Ok(Table::new(name, headers, rows))
    }
}

impl TabularSource for CsvSource {
    fn load_table(&self, name: &str) -> Result<Table, SourceError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(DataIntegrityError::MissingTable {
                table: path.display().to_string(),
            }
            .into());
        }
        Self::read(&path, name)
    }
}
