use std::path::Path;
use zonex_core::error::ZonexError;
use zonex_core::export::{default_base_name, export_batch, load_batch_json};

pub fn run(batch_file: &Path, output_dir: &Path, name: Option<String>) -> Result<(), ZonexError> {
    let batch = load_batch_json(batch_file)?;
    let base = name.unwrap_or_else(default_base_name);
    let paths = export_batch(&batch, output_dir, &base)?;

    eprintln!(
        "Exported {} field record(s) and {} table row(s)",
        batch.field_records.len(),
        batch.table_rows.len()
    );
    eprintln!("Fields written to {}", paths.fields.display());
    eprintln!("Tables written to {}", paths.tables.display());
    Ok(())
}
