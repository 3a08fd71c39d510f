use crate::config::ExtractOptions;
use crate::error::ZonexError;
use crate::extraction::{OcrEngine, PdfDocument, PdfProvider};
use crate::field::{extract_field, FieldValue};
use crate::table::{extract_table, Row};
use crate::template::schema::{FieldDefinition, TableDefinition, Template};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Field values by field name, in template order.
    pub fields: IndexMap<String, FieldValue>,
    /// Table rows by table name, in template order.
    pub tables: IndexMap<String, Vec<Row>>,
    /// Field or table failures that did not stop the document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

/// What a warning applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum WarningScope {
    Document,
    Field(String),
    Table(String),
}

impl fmt::Display for WarningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningScope::Document => write!(f, "document"),
            WarningScope::Field(name) => write!(f, "field '{name}'"),
            WarningScope::Table(name) => write!(f, "table '{name}'"),
        }
    }
}

/// An isolated field or table failure inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub scope: WarningScope,
    pub message: String,
}

/// One document's field values, tagged with its file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub file: String,
    pub values: IndexMap<String, FieldValue>,
}

/// One row of one table of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRowRecord {
    pub file: String,
    pub table: String,
    pub cells: Row,
}

/// A problem reported against a file during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWarning {
    pub file: String,
    pub scope: WarningScope,
    pub message: String,
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            WarningScope::Document => write!(f, "{}: {}", self.file, self.message),
            _ => write!(f, "{} ({}): {}", self.file, self.scope, self.message),
        }
    }
}

/// Accumulated output of a batch, ready for export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// One record per successfully processed document.
    pub field_records: Vec<FieldRecord>,
    /// Every table row of every successfully processed document.
    pub table_rows: Vec<TableRowRecord>,
    /// Skipped documents and isolated field/table failures, in order.
    pub warnings: Vec<BatchWarning>,
}

impl BatchResult {
    /// True when no document produced any record.
    pub fn is_empty(&self) -> bool {
        self.field_records.is_empty() && self.table_rows.is_empty()
    }

    /// Number of documents that were processed to completion.
    pub fn documents_processed(&self) -> usize {
        self.field_records.len()
    }

    /// Files skipped because of a document-level failure.
    pub fn failed_files(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter(|w| w.scope == WarningScope::Document)
            .map(|w| w.file.as_str())
            .collect()
    }

    /// Append one document's result.
    pub fn push_document(&mut self, file: &str, result: ExtractionResult) {
        for issue in result.issues {
            self.warnings.push(BatchWarning {
                file: file.to_string(),
                scope: issue.scope,
                message: issue.message,
            });
        }
        for (table, rows) in result.tables {
            for cells in rows {
                self.table_rows.push(TableRowRecord {
                    file: file.to_string(),
                    table: table.clone(),
                    cells,
                });
            }
        }
        self.field_records.push(FieldRecord {
            file: file.to_string(),
            values: result.fields,
        });
    }

    /// Record a document that could not be processed.
    pub fn push_failure(&mut self, file: &str, error: &ZonexError) {
        self.warnings.push(BatchWarning {
            file: file.to_string(),
            scope: WarningScope::Document,
            message: error.to_string(),
        });
    }
}

/// Runs one template over PDF documents.
///
/// The template is shared read-only across documents. OCR is only attempted
/// when an engine is supplied and `options.ocr_fallback` is set.
pub struct Extractor<'a> {
    template: &'a Template,
    provider: &'a dyn PdfProvider,
    ocr: Option<&'a dyn OcrEngine>,
    options: ExtractOptions,
}

impl<'a> Extractor<'a> {
    pub fn new(template: &'a Template, provider: &'a dyn PdfProvider) -> Self {
        Extractor {
            template,
            provider,
            ocr: None,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_ocr(mut self, ocr: Option<&'a dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    fn ocr(&self) -> Option<&'a dyn OcrEngine> {
        self.ocr.filter(|_| self.options.ocr_fallback)
    }

    /// Extract every field and table of the template from one document.
    ///
    /// A field or table that fails is recorded as an issue and given an
    /// empty value. Errors that invalidate the whole document (see
    /// [`ZonexError::is_document_fatal`]) are returned instead. The document
    /// handle is released before this returns.
    pub fn extract_document(&self, path: &Path) -> Result<ExtractionResult, ZonexError> {
        let doc = self.provider.open(path)?;
        log::debug!(
            "opened {} ({} pages) with {}",
            path.display(),
            doc.page_count(),
            self.provider.backend_name()
        );

        let mut result = ExtractionResult::default();

        for field in &self.template.fields {
            let value = match self.field_value(&*doc, field) {
                Ok(value) => value,
                Err(e) if e.is_document_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("{}: field '{}': {e}", path.display(), field.name);
                    result.issues.push(Issue {
                        scope: WarningScope::Field(field.name.clone()),
                        message: e.to_string(),
                    });
                    if field.multiple {
                        FieldValue::Multiple(Vec::new())
                    } else {
                        FieldValue::default()
                    }
                }
            };
            result.fields.insert(field.name.clone(), value);
        }

        for table in &self.template.tables {
            let rows = match self.table_rows(&*doc, table) {
                Ok(rows) => rows,
                Err(e) if e.is_document_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("{}: table '{}': {e}", path.display(), table.name);
                    result.issues.push(Issue {
                        scope: WarningScope::Table(table.name.clone()),
                        message: e.to_string(),
                    });
                    Vec::new()
                }
            };
            result.tables.insert(table.name.clone(), rows);
        }

        Ok(result)
    }

    fn field_value(
        &self,
        doc: &dyn PdfDocument,
        field: &FieldDefinition,
    ) -> Result<FieldValue, ZonexError> {
        let page = doc.page(field.page_index()?)?;
        extract_field(&page, field, self.ocr())
    }

    fn table_rows(&self, doc: &dyn PdfDocument, table: &TableDefinition) -> Result<Vec<Row>, ZonexError> {
        let page = doc.page(table.page_index()?)?;
        extract_table(&page, table, self.ocr(), &self.options)
    }

    /// Process `paths` in order. A document that fails is reported as a
    /// warning tagged with its file name and the batch moves on.
    pub fn run_batch<P: AsRef<Path>>(&self, paths: &[P]) -> BatchResult {
        let mut batch = BatchResult::default();

        for path in paths {
            let path = path.as_ref();
            let file = file_label(path);
            match self.extract_document(path) {
                Ok(result) => {
                    log::info!(
                        "{file}: {} fields, {} tables, {} issues",
                        result.fields.len(),
                        result.tables.len(),
                        result.issues.len()
                    );
                    batch.push_document(&file, result);
                }
                Err(e) => {
                    log::warn!("skipping {file}: {e}");
                    batch.push_failure(&file, &e);
                }
            }
        }

        log::info!(
            "batch finished: {} of {} documents, {} table rows, {} warnings",
            batch.documents_processed(),
            paths.len(),
            batch.table_rows.len(),
            batch.warnings.len()
        );
        batch
    }
}

/// The name a document is reported under: its file name, or the whole
/// path when it has none.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
