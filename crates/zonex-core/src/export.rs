use crate::error::ZonexError;
use crate::pipeline::BatchResult;
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

pub const FILE_COLUMN: &str = "file";
pub const TABLE_COLUMN: &str = "table";

/// A rectangular record set: a header row and same-width data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Where [`export_batch`] wrote the two sheets.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub fields: PathBuf,
    pub tables: PathBuf,
}

/// One row per document: the file name, then every field name seen in the
/// batch in first-seen order. Missing values are empty and repeating values
/// are joined with `"; "`.
pub fn fields_sheet(batch: &BatchResult) -> Sheet {
    let names: IndexSet<&str> = batch
        .field_records
        .iter()
        .flat_map(|r| r.values.keys().map(String::as_str))
        .collect();

    let headers = std::iter::once(FILE_COLUMN)
        .chain(names.iter().copied())
        .map(str::to_string)
        .collect();

    let rows = batch
        .field_records
        .iter()
        .map(|record| {
            std::iter::once(record.file.clone())
                .chain(names.iter().map(|name| {
                    record
                        .values
                        .get(*name)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                }))
                .collect()
        })
        .collect();

    Sheet { headers, rows }
}

/// One row per table row: file name, table name, then the union of all
/// column names in first-seen order.
pub fn tables_sheet(batch: &BatchResult) -> Sheet {
    let columns: IndexSet<&str> = batch
        .table_rows
        .iter()
        .flat_map(|r| r.cells.keys().map(String::as_str))
        .collect();

    let headers = [FILE_COLUMN, TABLE_COLUMN]
        .into_iter()
        .chain(columns.iter().copied())
        .map(str::to_string)
        .collect();

    let rows = batch
        .table_rows
        .iter()
        .map(|record| {
            [record.file.clone(), record.table.clone()]
                .into_iter()
                .chain(
                    columns
                        .iter()
                        .map(|col| record.cells.get(*col).cloned().unwrap_or_default()),
                )
                .collect()
        })
        .collect();

    Sheet { headers, rows }
}

/// Write `sheet` as CSV to `path`, replacing any existing file.
pub fn write_csv(path: &Path, sheet: &Sheet) -> Result<(), ZonexError> {
    let export_error = |reason: String| ZonexError::Export {
        path: path.to_path_buf(),
        reason,
    };

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| export_error(e.to_string()))?;
    writer
        .write_record(&sheet.headers)
        .map_err(|e| export_error(e.to_string()))?;
    for row in &sheet.rows {
        writer
            .write_record(row)
            .map_err(|e| export_error(e.to_string()))?;
    }
    writer.flush().map_err(|e| export_error(e.to_string()))?;
    Ok(())
}

/// Render `sheet` as a CSV string.
pub fn csv_string(sheet: &Sheet) -> Result<String, ZonexError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ZonexError::Io(error.into_error()))?;
    csv_text(bytes)
}

fn csv_text(bytes: Vec<u8>) -> Result<String, ZonexError> {
    String::from_utf8(bytes).map_err(|e| ZonexError::Export {
        path: PathBuf::from("-"),
        reason: format!("invalid utf-8 csv output: {e}"),
    })
}

/// Write `<base>_fields.csv` and `<base>_tables.csv` into `dir`, creating
/// the directory if needed.
pub fn export_batch(batch: &BatchResult, dir: &Path, base: &str) -> Result<ExportPaths, ZonexError> {
    std::fs::create_dir_all(dir).map_err(|e| ZonexError::Export {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let paths = ExportPaths {
        fields: dir.join(format!("{base}_fields.csv")),
        tables: dir.join(format!("{base}_tables.csv")),
    };
    write_csv(&paths.fields, &fields_sheet(batch))?;
    write_csv(&paths.tables, &tables_sheet(batch))?;

    log::info!(
        "exported {} field records and {} table rows to {}",
        batch.field_records.len(),
        batch.table_rows.len(),
        dir.display()
    );
    Ok(paths)
}

/// `Processed_<YYYYmmdd_HHMMSS>` for the current local time.
pub fn default_base_name() -> String {
    base_name_at(Local::now())
}

pub fn base_name_at(time: DateTime<Local>) -> String {
    format!("Processed_{}", time.format("%Y%m%d_%H%M%S"))
}

/// Keep a batch on disk so it can be exported again without re-extracting.
pub fn save_batch_json(path: &Path, batch: &BatchResult) -> Result<(), ZonexError> {
    let json = serde_json::to_string_pretty(batch)?;
    std::fs::write(path, json).map_err(|e| ZonexError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn load_batch_json(path: &Path) -> Result<BatchResult, ZonexError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::pipeline::{FieldRecord, TableRowRecord};
    use crate::table::Row;
    use chrono::TimeZone;
    use indexmap::IndexMap;

    fn batch() -> BatchResult {
        let mut a = IndexMap::new();
        a.insert("invoice".to_string(), FieldValue::Single("A-1".into()));
        a.insert(
            "lines".to_string(),
            FieldValue::Multiple(vec!["x".into(), "y".into()]),
        );
        let mut b = IndexMap::new();
        b.insert("total".to_string(), FieldValue::Single("9.50".into()));

        let row = |pairs: &[(&str, &str)]| -> Row {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };

        BatchResult {
            field_records: vec![
                FieldRecord {
                    file: "a.pdf".into(),
                    values: a,
                },
                FieldRecord {
                    file: "b.pdf".into(),
                    values: b,
                },
            ],
            table_rows: vec![
                TableRowRecord {
                    file: "a.pdf".into(),
                    table: "items".into(),
                    cells: row(&[("Item", "Widget"), ("Qty", "2")]),
                },
                TableRowRecord {
                    file: "b.pdf".into(),
                    table: "taxes".into(),
                    cells: row(&[("Rate", "21%")]),
                },
            ],
            warnings: vec![],
        }
    }

    #[test]
    fn test_fields_sheet_union() {
        let sheet = fields_sheet(&batch());
        assert_eq!(sheet.headers, vec!["file", "invoice", "lines", "total"]);
        assert_eq!(sheet.rows[0], vec!["a.pdf", "A-1", "x; y", ""]);
        assert_eq!(sheet.rows[1], vec!["b.pdf", "", "", "9.50"]);
    }

    #[test]
    fn test_tables_sheet_union() {
        let sheet = tables_sheet(&batch());
        assert_eq!(sheet.headers, vec!["file", "table", "Item", "Qty", "Rate"]);
        assert_eq!(sheet.rows[0], vec!["a.pdf", "items", "Widget", "2", ""]);
        assert_eq!(sheet.rows[1], vec!["b.pdf", "taxes", "", "", "21%"]);
    }

    #[test]
    fn test_csv_text_rejects_invalid_utf8() {
        let err = csv_text(vec![b'a', 0xff]).unwrap_err();
        assert!(matches!(err, ZonexError::Export { .. }));
        assert!(err.to_string().starts_with("failed to export to -: invalid utf-8"));
    }

    #[test]
    fn test_csv_string_quotes() {
        let sheet = Sheet {
            headers: vec!["file".into(), "name".into()],
            rows: vec![vec!["a.pdf".into(), "Smith, J".into()]],
        };
        assert_eq!(csv_string(&sheet).unwrap(), "file,name\na.pdf,\"Smith, J\"\n");
    }

    #[test]
    fn test_export_batch_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let paths = export_batch(&batch(), &out, "run").unwrap();
        assert_eq!(paths.fields, out.join("run_fields.csv"));
        let fields = std::fs::read_to_string(&paths.fields).unwrap();
        assert!(fields.starts_with("file,invoice,lines,total\n"));
        let tables = std::fs::read_to_string(&paths.tables).unwrap();
        assert_eq!(tables.lines().count(), 3);
    }

    #[test]
    fn test_export_to_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let err = export_batch(&batch(), &blocker, "run").unwrap_err();
        assert!(matches!(err, ZonexError::Export { .. }));
    }

    #[test]
    fn test_batch_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        save_batch_json(&path, &batch()).unwrap();
        assert_eq!(load_batch_json(&path).unwrap(), batch());
    }

    #[test]
    fn test_base_name_format() {
        let time = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(base_name_at(time), "Processed_20240305_140709");
        assert!(default_base_name().starts_with("Processed_"));
    }
}
