use rusqlite::types::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ExportError, ResultTable};

/// Write each table to `<dir>/<name>_<solver>.csv`, creating `dir` if needed.
pub fn write_csv_dir(
    dir: &Path,
    tables: &[ResultTable],
    solver: &str,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.qualified_name(solver)));
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row.iter().map(cell_text))?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{fixtures, tables};
    use testresult::TestResult;

    #[test]
    fn writes_one_file_per_collection() -> TestResult {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("model_output");

        let written = write_csv_dir(&out, &tables(&fixtures::bundle()), "cbc")?;

        assert_eq!(written.len(), 4);
        for name in [
            "tactical_allocation_cbc.csv",
            "tactical_summary_cbc.csv",
            "operational_allocation_cbc.csv",
            "operational_summary_cbc.csv",
        ] {
            assert!(out.join(name).is_file(), "{name} missing");
        }

        let allocation = fs::read_to_string(out.join("tactical_allocation_cbc.csv"))?;
        let lines: Vec<_> = allocation.lines().collect();
        assert_eq!(lines[0], "cluster,product,count,cost,profit");
        assert_eq!(lines[1], "k1,p1,2,400,4000");
        Ok(())
    }

    #[test]
    fn undefined_roi_is_an_empty_cell() -> TestResult {
        let dir = tempfile::tempdir()?;
        write_csv_dir(dir.path(), &tables(&fixtures::bundle()), "glpk")?;

        let mut reader = csv::Reader::from_path(dir.path().join("operational_summary_glpk.csv"))?;
        let headers = reader.headers()?.clone();
        let roi = headers.iter().position(|h| h == "roi_percent").unwrap();
        let row = reader.records().next().unwrap()?;
        assert_eq!(&row[roi], "");
        Ok(())
    }
}
