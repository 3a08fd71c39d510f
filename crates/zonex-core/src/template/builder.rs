use crate::error::ZonexError;
use crate::geometry::Region;
use crate::template::schema::{ColumnDefinition, FieldDefinition, TableDefinition, Template};
use std::collections::HashSet;

pub const DEFAULT_TABLE_NAME: &str = "Unnamed_table";

/// Accumulates fields and tables while a template is being defined, and
/// hands out the finished read-only [`Template`] on [`finalize`].
///
/// [`finalize`]: TemplateBuilder::finalize
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    fields: Vec<FieldDefinition>,
    tables: Vec<TableDefinition>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing template, e.g. one loaded for editing.
    pub fn from_template(template: Template) -> Self {
        TemplateBuilder {
            fields: template.fields,
            tables: template.tables,
        }
    }

    pub fn add_field(&mut self, field: FieldDefinition) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Remove a field so it can be redefined. Returns `None` if no field has
    /// that name.
    pub fn edit_field(&mut self, name: &str) -> Option<FieldDefinition> {
        let idx = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(idx))
    }

    /// Add a table. A blank name becomes [`DEFAULT_TABLE_NAME`].
    pub fn add_table(
        &mut self,
        name: Option<&str>,
        page: usize,
        region: Region,
        columns: Vec<ColumnDefinition>,
    ) -> &mut Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_TABLE_NAME);
        self.tables.push(TableDefinition {
            name: name.to_string(),
            page: page.into(),
            coordinates: region.into(),
            columns,
        });
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Check names and produce the template.
    pub fn finalize(self) -> Result<Template, ZonexError> {
        let template = Template {
            fields: self.fields,
            tables: self.tables,
        };
        if template.is_empty() {
            return Err(ZonexError::TemplateInvalid(
                "no fields or tables defined".into(),
            ));
        }

        check_names("field", template.fields.iter().map(|f| f.name.as_str()))?;
        check_names("table", template.tables.iter().map(|t| t.name.as_str()))?;

        Ok(template)
    }
}

/// Column definitions from manually entered names; blanks become
/// `Column_<n>`.
pub fn named_columns<S: AsRef<str>>(names: &[S]) -> Vec<ColumnDefinition> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.as_ref().trim();
            if name.is_empty() {
                ColumnDefinition::named(format!("Column_{}", i + 1))
            } else {
                ColumnDefinition::named(name)
            }
        })
        .collect()
}

fn check_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ZonexError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ZonexError::TemplateInvalid(format!("{kind} name must not be empty")));
        }
        if !seen.insert(name) {
            return Err(ZonexError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
