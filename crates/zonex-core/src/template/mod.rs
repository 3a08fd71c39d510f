pub mod builder;
pub mod schema;

use crate::error::ZonexError;
use schema::Template;
use std::path::Path;

/// Load a template from a JSON file.
///
/// Only the JSON shape is checked here. Regions and repeat parameters are
/// validated when the field or table that uses them is extracted.
pub fn load_template(path: &Path) -> Result<Template, ZonexError> {
    let content = std::fs::read_to_string(path).map_err(|e| ZonexError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_template(&content, path)
}

/// Parse a template from a JSON string.
pub fn parse_template(json: &str, source: &Path) -> Result<Template, ZonexError> {
    serde_json::from_str(json).map_err(|e| ZonexError::TemplateLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Serialize a template to pretty-printed JSON.
pub fn to_json(template: &Template) -> Result<String, ZonexError> {
    Ok(serde_json::to_string_pretty(template)?)
}

/// Write a template to a JSON file.
pub fn save_template(template: &Template, path: &Path) -> Result<(), ZonexError> {
    let json = to_json(template)?;
    std::fs::write(path, json).map_err(|e| ZonexError::TemplateSave {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A problem found while checking one template entry.
#[derive(Debug, Clone)]
pub struct TemplateIssue {
    pub kind: &'static str,
    pub name: String,
    pub message: String,
}

/// Run the extraction-time checks for every field and table up front.
///
/// Extraction never calls this; it is for reporting problems before a
/// batch run.
pub fn check_template(template: &Template) -> Vec<TemplateIssue> {
    let mut issues = Vec::new();

    for field in &template.fields {
        let result = field.page_index().and_then(|_| field.coordinates.resolve()).and_then(|region| {
            if field.multiple {
                crate::field::row_regions(field, &region).map(|_| ())
            } else {
                Ok(())
            }
        });
        if let Err(e) = result {
            issues.push(TemplateIssue {
                kind: "field",
                name: field.name.clone(),
                message: e.to_string(),
            });
        }
    }

    for table in &template.tables {
        if let Err(e) = table.page_index().and_then(|_| table.coordinates.resolve()) {
            issues.push(TemplateIssue {
                kind: "table",
                name: table.name.clone(),
                message: e.to_string(),
            });
        }
        if table.columns.is_empty() {
            issues.push(TemplateIssue {
                kind: "table",
                name: table.name.clone(),
                message: "no columns defined".into(),
            });
        }
        for column in &table.columns {
            if let Err(e) = column.bounds() {
                issues.push(TemplateIssue {
                    kind: "table",
                    name: table.name.clone(),
                    message: e.to_string(),
                });
            }
            if let Some(ref pattern) = column.pattern {
                if let Err(e) = regex::Regex::new(pattern) {
                    issues.push(TemplateIssue {
                        kind: "table",
                        name: table.name.clone(),
                        message: format!("column '{}': {}", column.name, e),
                    });
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Coordinates, Region};
    use schema::{ColumnDefinition, FieldDefinition, TableDefinition, ValueType};
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
        "fields": [
            {"name": "invoice_no", "page": 0, "coordinates": [400.5, 60, 560, 80.125]},
            {"name": "total", "page": 0, "coordinates": [400, 700, 560, 720], "type": "currency"},
            {"name": "lines", "page": 1, "coordinates": [40, 0, 300, 0], "multiple": true,
             "start_y": 100, "end_y": 160, "row_height": 20, "row_spacing": 20}
        ],
        "tables": [
            {"name": "items", "page": 0,
             "coordinates": {"x0": 40, "y0": 200, "x1": 560, "y1": 600},
             "columns": [{"name": "Item", "x0": 40, "x1": 200}, {"name": "Qty", "x0": 200, "x1": 300}]}
        ]
    }"#;

    fn sample() -> Template {
        parse_template(SAMPLE, &PathBuf::from("sample.json")).unwrap()
    }

    #[test]
    fn test_parse_template() {
        let t = sample();
        assert_eq!(t.fields.len(), 3);
        assert_eq!(t.tables.len(), 1);
        assert_eq!(t.field("total").unwrap().value_type, ValueType::Currency);
        assert!(t.field("lines").unwrap().multiple);
        assert_eq!(
            t.table("items").unwrap().coordinates.resolve().unwrap(),
            Region::new(40.0, 200.0, 560.0, 600.0)
        );
    }

    #[test]
    fn test_save_load_save_is_stable() {
        let first = to_json(&sample()).unwrap();
        let reloaded = parse_template(&first, &PathBuf::from("first.json")).unwrap();
        let second = to_json(&reloaded).unwrap();
        assert_eq!(first, second);
        assert_eq!(reloaded, sample());
    }

    #[test]
    fn test_coordinates_round_trip_exactly() {
        let awkward = Region::new(0.1 + 0.2, 1.0 / 3.0, 612.000_000_000_1, 791.987_654_321);
        let t = Template {
            fields: vec![FieldDefinition::new("f", 0, awkward)],
            tables: vec![],
        };
        let reloaded = parse_template(&to_json(&t).unwrap(), &PathBuf::from("t.json")).unwrap();
        assert_eq!(reloaded.fields[0].coordinates.resolve().unwrap(), awkward);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.json");
        save_template(&sample(), &path).unwrap();
        assert_eq!(load_template(&path).unwrap(), sample());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_template(&PathBuf::from("/nonexistent/template.json")).unwrap_err();
        assert!(matches!(err, ZonexError::TemplateLoad { .. }));
    }

    #[test]
    fn test_load_is_lazy_about_bad_entries() {
        let json = r#"{"fields": [
            {"name": "bad", "coordinates": ["a", "b", "c", "d"]},
            {"name": "rows", "coordinates": [0, 0, 10, 10], "multiple": true},
            {"name": "good", "coordinates": [0, 0, 10, 10]}
        ]}"#;
        let t = parse_template(json, &PathBuf::from("t.json")).unwrap();
        assert_eq!(t.fields.len(), 3);

        let issues = check_template(&t);
        let names: Vec<&str> = issues.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["bad", "rows"]);
    }

    #[test]
    fn test_check_reports_table_problems() {
        let t = Template {
            fields: vec![],
            tables: vec![TableDefinition {
                name: "items".into(),
                page: 0.into(),
                coordinates: Coordinates::Corners(vec![]),
                columns: vec![ColumnDefinition::pattern("qty", "([0-9")],
            }],
        };
        let issues = check_template(&t);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == "table"));
    }

    #[test]
    fn test_loose_values_load_and_are_checked() {
        let json = r#"{
            "fields": [
                {"name": "good", "coordinates": [0, 0, 10, 10]},
                {"name": "rows", "coordinates": [0, 0, 10, 0], "multiple": true,
                 "end_y": 100, "row_height": "20"},
                {"name": "negative", "page": -1, "coordinates": [0, 0, 10, 10]},
                {"name": "nowhere"}
            ],
            "tables": [
                {"name": "items", "coordinates": [0, 0, 100, 100],
                 "columns": [{"name": "Qty", "x0": "left", "x1": 50}]}
            ]
        }"#;
        let t = parse_template(json, &PathBuf::from("loose.json")).unwrap();
        assert_eq!(t.fields.len(), 4);

        let issues = check_template(&t);
        let names: Vec<&str> = issues.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["negative", "nowhere", "items"]);
        assert!(issues[2].message.contains("'x0' must be a number"));
    }
}
