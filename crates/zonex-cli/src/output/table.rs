use std::fmt::Write;
use zonex_core::geometry::{Coord, Coordinates};
use zonex_core::pipeline::BatchResult;
use zonex_core::template::schema::{FieldDefinition, SegmentMode, Template, ValueType};

pub fn print_batch_summary(batch: &BatchResult, total_documents: usize) {
    println!(
        "Processed {} of {} document(s): {} field record(s), {} table row(s)",
        batch.documents_processed(),
        total_documents,
        batch.field_records.len(),
        batch.table_rows.len()
    );

    if batch.warnings.is_empty() {
        return;
    }

    println!("\nWarnings:");
    for warning in &batch.warnings {
        println!("  {warning}");
    }

    let failed = batch.failed_files();
    if !failed.is_empty() {
        println!("\nSkipped: {}", failed.join(", "));
    }
}

pub fn format_template(template: &Template) -> String {
    let mut out = String::new();

    if !template.fields.is_empty() {
        let width = template
            .fields
            .iter()
            .map(|f| f.name.len())
            .max()
            .unwrap_or(10)
            .max("Field".len());

        let _ = writeln!(out, "Fields:\n");
        let _ = writeln!(
            out,
            "  {:<width$}  {:<4}  {:<8}  Region",
            "Field", "Page", "Type"
        );
        let _ = writeln!(out, "  {}", "-".repeat(width + 40));
        for field in &template.fields {
            let _ = writeln!(
                out,
                "  {:<width$}  {:<4}  {:<8}  {}{}",
                field.name,
                field.page,
                type_label(field.value_type),
                region_label(&field.coordinates),
                repeat_label(field)
            );
        }
        out.push('\n');
    }

    if !template.tables.is_empty() {
        let _ = writeln!(out, "Tables:\n");
        for table in &template.tables {
            let mode = match table.mode() {
                SegmentMode::WidthSplit => "width split",
                SegmentMode::Pattern => "pattern",
                SegmentMode::Spatial => "spatial",
            };
            let _ = writeln!(
                out,
                "  {} (page {}, {}, {})",
                table.name,
                table.page,
                region_label(&table.coordinates),
                mode
            );
            for column in &table.columns {
                let detail = match (column.bounds(), column.pattern.as_deref()) {
                    (Ok(Some((x0, x1))), _) => format!("x {x0}..{x1}"),
                    (Err(_), _) => "x (invalid)".into(),
                    (Ok(None), Some(pattern)) => format!("/{pattern}/"),
                    (Ok(None), None) => String::new(),
                };
                let _ = writeln!(out, "    {:<20} {}", column.name, detail);
            }
            out.push('\n');
        }
    }

    out
}

fn type_label(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Generic => "text",
        ValueType::Currency => "currency",
        ValueType::Date => "date",
    }
}

fn region_label(coordinates: &Coordinates) -> String {
    match coordinates.resolve() {
        Ok(region) => region.to_string(),
        Err(_) => "(invalid)".into(),
    }
}

fn repeat_label(field: &FieldDefinition) -> String {
    if !field.multiple {
        return String::new();
    }
    let show = |v: Option<&Coord>| v.map(|v| v.to_string()).unwrap_or_else(|| "?".into());
    format!(
        "  rows {}..{} every {}",
        field.start_y.as_ref().map_or_else(|| "0".into(), |v| v.to_string()),
        show(field.end_y.as_ref()),
        show(field.row_spacing.as_ref().or(field.row_height.as_ref()))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonex_core::geometry::Region;
    use zonex_core::template::schema::{ColumnDefinition, TableDefinition};

    #[test]
    fn test_format_template() {
        let template = Template {
            fields: vec![
                FieldDefinition::new("total", 0, Region::new(10.0, 20.0, 30.0, 40.0))
                    .with_type(ValueType::Currency),
                FieldDefinition::new("lines", 1, Region::new(0.0, 0.0, 50.0, 0.0))
                    .repeating(100.0, 160.0, 20.0, 20.0),
            ],
            tables: vec![TableDefinition {
                name: "items".into(),
                page: 0.into(),
                coordinates: Region::new(0.0, 0.0, 100.0, 100.0).into(),
                columns: vec![ColumnDefinition::spatial("Item", 0.0, 50.0)],
            }],
        };

        let out = format_template(&template);
        assert!(out.contains("total  0     currency  (10, 20, 30, 40)"));
        assert!(out.contains("rows 100..160 every 20"));
        assert!(out.contains("items (page 0, (0, 0, 100, 100), spatial)"));
        assert!(out.contains("Item                 x 0..50"));
    }
}
