use crate::error::ZonexError;
use crate::geometry::{Coord, Coordinates};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An extraction template: named fields and named tables, each bound to a
/// page and a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl Template {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tables.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// A named rectangular region holding a single value, or a column of
/// repeating values when `multiple` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Zero-based page index.
    #[serde(default)]
    pub page: PageIndex,
    #[serde(default = "Coordinates::missing")]
    pub coordinates: Coordinates,
    #[serde(rename = "type", default, skip_serializing_if = "ValueType::is_generic")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_y: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_height: Option<Coord>,
    /// Distance between row tops. Defaults to `row_height`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_spacing: Option<Coord>,
}

impl FieldDefinition {
    /// A simple single-value field of generic type.
    pub fn new(name: impl Into<String>, page: usize, coordinates: impl Into<Coordinates>) -> Self {
        FieldDefinition {
            name: name.into(),
            page: page.into(),
            coordinates: coordinates.into(),
            value_type: ValueType::Generic,
            multiple: false,
            start_y: None,
            end_y: None,
            row_height: None,
            row_spacing: None,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Turn this into a repeating field scanning rows from `start_y` to
    /// `end_y`.
    pub fn repeating(mut self, start_y: f64, end_y: f64, row_height: f64, row_spacing: f64) -> Self {
        self.multiple = true;
        self.start_y = Some(start_y.into());
        self.end_y = Some(end_y.into());
        self.row_height = Some(row_height.into());
        self.row_spacing = Some(row_spacing.into());
        self
    }

    /// The page this field reads from.
    pub fn page_index(&self) -> Result<usize, ZonexError> {
        self.page.resolve(&self.name)
    }

    /// A repeat parameter as a number, or `None` when it is not set.
    pub fn setting(&self, key: &str, value: Option<&Coord>) -> Result<Option<f64>, ZonexError> {
        let Some(coord) = value else {
            return Ok(None);
        };
        coord.value().map(Some).ok_or_else(|| ZonexError::Configuration {
            field: self.name.clone(),
            reason: format!("'{key}' must be a number, got {coord}"),
        })
    }
}

/// A zero-based page index as written in a template.
///
/// Quoted indices are accepted. Anything else is kept and reported when the
/// owning field or table is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageIndex {
    Index(usize),
    Other(serde_json::Value),
}

impl PageIndex {
    /// The page index, or a configuration error naming `owner`.
    pub fn resolve(&self, owner: &str) -> Result<usize, ZonexError> {
        let parsed = match self {
            PageIndex::Index(page) => Some(*page),
            PageIndex::Other(serde_json::Value::String(s)) => s.trim().parse().ok(),
            PageIndex::Other(_) => None,
        };
        parsed.ok_or_else(|| ZonexError::Configuration {
            field: owner.to_string(),
            reason: format!("page {self} is not a page index"),
        })
    }
}

impl Default for PageIndex {
    fn default() -> Self {
        PageIndex::Index(0)
    }
}

impl From<usize> for PageIndex {
    fn from(page: usize) -> Self {
        PageIndex::Index(page)
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageIndex::Index(page) => fmt::Display::fmt(page, f),
            PageIndex::Other(value) => f.pad(&value.to_string()),
        }
    }
}

/// How an extracted field value is cleaned up.
///
/// Parsed case-insensitively; unknown type names and non-string values fall
/// back to `Generic`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "serde_json::Value")]
pub enum ValueType {
    #[default]
    Generic,
    Currency,
    Date,
}

impl ValueType {
    pub fn is_generic(&self) -> bool {
        *self == ValueType::Generic
    }
}

impl From<serde_json::Value> for ValueType {
    fn from(value: serde_json::Value) -> Self {
        let serde_json::Value::String(s) = value else {
            return ValueType::Generic;
        };
        match s.trim().to_lowercase().as_str() {
            "currency" | "amount" | "monto" => ValueType::Currency,
            "date" | "fecha" => ValueType::Date,
            _ => ValueType::Generic,
        }
    }
}

/// A rectangular table zone with ordered column definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    /// Zero-based page index.
    #[serde(default)]
    pub page: PageIndex,
    #[serde(default = "Coordinates::missing")]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn mode(&self) -> SegmentMode {
        SegmentMode::for_columns(&self.columns)
    }

    /// The page this table reads from.
    pub fn page_index(&self) -> Result<usize, ZonexError> {
        self.page.resolve(&self.name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentMode {
    WidthSplit,
    Pattern,
    Spatial,
}

impl SegmentMode {
    /// Pick the segmentation strategy from the column metadata.
    ///
    /// Any column with both x-bounds selects spatial mode; otherwise any
    /// column with a pattern selects pattern mode; otherwise lines are split
    /// on runs of whitespace.
    pub fn for_columns(columns: &[ColumnDefinition]) -> SegmentMode {
        if columns.iter().any(ColumnDefinition::has_bounds) {
            SegmentMode::Spatial
        } else if columns.iter().any(|c| c.pattern.is_some()) {
            SegmentMode::Pattern
        } else {
            SegmentMode::WidthSplit
        }
    }
}

/// One table column. `x0`/`x1` select spatial assignment, `pattern` selects
/// regex assignment, neither means positional assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x0: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ColumnDefinition {
    pub fn named(name: impl Into<String>) -> Self {
        ColumnDefinition {
            name: name.into(),
            x0: None,
            x1: None,
            pattern: None,
        }
    }

    pub fn spatial(name: impl Into<String>, x0: f64, x1: f64) -> Self {
        ColumnDefinition {
            x0: Some(x0.into()),
            x1: Some(x1.into()),
            ..ColumnDefinition::named(name)
        }
    }

    pub fn pattern(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        ColumnDefinition {
            pattern: Some(pattern.into()),
            ..ColumnDefinition::named(name)
        }
    }

    pub fn has_bounds(&self) -> bool {
        self.x0.is_some() && self.x1.is_some()
    }

    /// The column band `(x0, x1)`, or `None` unless both edges are set.
    pub fn bounds(&self) -> Result<Option<(f64, f64)>, ZonexError> {
        let (Some(x0), Some(x1)) = (&self.x0, &self.x1) else {
            return Ok(None);
        };
        let edge = |key: &str, coord: &Coord| {
            coord.value().ok_or_else(|| ZonexError::Configuration {
                field: self.name.clone(),
                reason: format!("column '{key}' must be a number, got {coord}"),
            })
        };
        Ok(Some((edge("x0", x0)?, edge("x1", x1)?)))
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_aliases() {
        let parse = |s: &str| -> ValueType { serde_json::from_str(&format!("\"{s}\"")).unwrap() };
        assert_eq!(parse("currency"), ValueType::Currency);
        assert_eq!(parse("Monto"), ValueType::Currency);
        assert_eq!(parse("DATE"), ValueType::Date);
        assert_eq!(parse("fecha"), ValueType::Date);
        assert_eq!(parse("text"), ValueType::Generic);
        let number: ValueType = serde_json::from_str("5").unwrap();
        assert_eq!(number, ValueType::Generic);
        assert_eq!(serde_json::to_string(&ValueType::Currency).unwrap(), "\"currency\"");
    }

    #[test]
    fn test_field_defaults() {
        let f: FieldDefinition =
            serde_json::from_str(r#"{"name": "total", "coordinates": [1, 2, 3, 4]}"#).unwrap();
        assert_eq!(f.page_index().unwrap(), 0);
        assert_eq!(f.value_type, ValueType::Generic);
        assert!(!f.multiple);
        assert_eq!(f.row_spacing, None);
    }

    #[test]
    fn test_generic_field_serializes_minimal() {
        let f = FieldDefinition::new("total", 1, crate::geometry::Region::new(1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "total", "page": 1, "coordinates": [1.0, 2.0, 3.0, 4.0]})
        );
    }

    #[test]
    fn test_segment_mode_selection() {
        let coords = crate::geometry::Region::new(0.0, 0.0, 10.0, 10.0).into();
        let mut table = TableDefinition {
            name: "items".into(),
            page: 0.into(),
            coordinates: coords,
            columns: vec![ColumnDefinition::named("a"), ColumnDefinition::named("b")],
        };
        assert_eq!(table.mode(), SegmentMode::WidthSplit);

        table.columns[1].pattern = Some(r"\d+".into());
        assert_eq!(table.mode(), SegmentMode::Pattern);

        table.columns[0] = ColumnDefinition::spatial("a", 0.0, 50.0);
        assert_eq!(table.mode(), SegmentMode::Spatial);
    }

    #[test]
    fn test_bad_settings_load_and_fail_on_use() {
        let f: FieldDefinition = serde_json::from_str(
            r#"{"name": "lines", "page": -1, "type": 3, "multiple": true,
                "start_y": "100", "end_y": 160, "row_height": "tall"}"#,
        )
        .unwrap();
        assert_eq!(f.coordinates, Coordinates::missing());
        assert_eq!(f.value_type, ValueType::Generic);
        assert!(matches!(f.page_index(), Err(ZonexError::Configuration { .. })));
        assert_eq!(f.setting("start_y", f.start_y.as_ref()).unwrap(), Some(100.0));
        assert_eq!(f.setting("row_spacing", f.row_spacing.as_ref()).unwrap(), None);
        let err = f.setting("row_height", f.row_height.as_ref()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration for 'lines': 'row_height' must be a number, got \"tall\""
        );
    }

    #[test]
    fn test_quoted_page_index() {
        let t: TableDefinition =
            serde_json::from_str(r#"{"name": "items", "page": " 2", "coordinates": [0, 0, 1, 1]}"#).unwrap();
        assert_eq!(t.page_index().unwrap(), 2);
        assert_eq!(format!("{:<4}|", PageIndex::Index(1)), "1   |");
    }

    #[test]
    fn test_column_bounds() {
        let c: ColumnDefinition = serde_json::from_str(r#"{"name": "Qty", "x0": "200", "x1": 300}"#).unwrap();
        assert!(c.has_bounds());
        assert_eq!(c.bounds().unwrap(), Some((200.0, 300.0)));

        let c: ColumnDefinition = serde_json::from_str(r#"{"name": "Qty", "x0": "left", "x1": 300}"#).unwrap();
        assert!(matches!(c.bounds(), Err(ZonexError::Configuration { .. })));

        assert_eq!(ColumnDefinition::named("Note").bounds().unwrap(), None);
    }
}
