//! File text extraction for various formats.
//!
//! Every readable file yields an [`ExtractedDocument`]. A file whose content
//! does not parse as its format is logged and decoded as lossy plain text, so
//! the only hard failure is not being able to read the bytes at all.

mod json;
mod pdf;
mod raster;
mod spreadsheet;
mod tabular;
mod xml;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use docgraph_core::Result;
use docgraph_store::PropertyValue;

/// Rows, items or elements shown in a condensed rendering.
pub const PREVIEW_LIMIT: usize = 10;

/// Scalar metadata collected during extraction.
pub type Metadata = BTreeMap<String, PropertyValue>;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Image,
    Csv,
    Tsv,
    Json,
    Xml,
    Spreadsheet,
    Markdown,
    PlainText,
}

impl FileFormat {
    /// Detect file format from extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => Some(Self::Image),
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Spreadsheet),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" | "text" | "log" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Detect file format from a MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            m if m.starts_with("image/") => Some(Self::Image),
            "text/csv" => Some(Self::Csv),
            "text/tab-separated-values" => Some(Self::Tsv),
            "application/json" | "text/json" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.oasis.opendocument.spreadsheet" => Some(Self::Spreadsheet),
            "text/markdown" => Some(Self::Markdown),
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Pick the format for a file: the declared type (MIME type or
    /// extension) when it is recognized, else the path's extension, else
    /// plain text.
    pub fn detect(path: &Path, declared_type: Option<&str>) -> Self {
        let declared = declared_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .and_then(|t| {
                if t.contains('/') {
                    Self::from_mime(t)
                } else {
                    Self::from_extension(t)
                }
            });
        declared
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(Self::from_extension)
            })
            .unwrap_or(Self::PlainText)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Spreadsheet => "spreadsheet",
            Self::Markdown => "markdown",
            Self::PlainText => "plaintext",
        }
    }
}

/// Shape of a structured file, used to build its structural subgraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureSummary {
    Tabular {
        columns: Vec<String>,
        row_count: usize,
        delimiter: char,
    },
    JsonObject {
        keys: Vec<String>,
    },
    JsonArray {
        count: usize,
        sample_keys: Vec<String>,
    },
    JsonScalar,
    Xml {
        root_tag: String,
        element_count: usize,
        attribute_count: usize,
        child_count: usize,
    },
    Spreadsheet {
        sheets: Vec<String>,
    },
}

/// Text of one PDF page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    pub page_num: u32,
    pub text: String,
}

/// Result of extracting a file.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: Metadata,
    /// Format the content was actually read as; `PlainText` after a fallback.
    pub format: FileFormat,
    pub structure: Option<StructureSummary>,
    /// Condensed rendering of structured content.
    pub summary: Option<String>,
    pub pages: Vec<PageText>,
}

/// Format-specific part of an extraction, before filesystem metadata is merged.
#[derive(Debug, Default)]
struct ExtractedContent {
    text: String,
    metadata: Metadata,
    structure: Option<StructureSummary>,
    summary: Option<String>,
    pages: Vec<PageText>,
}

impl ExtractedContent {
    fn text(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }
}

/// Extract text, metadata and structure from a file.
pub fn extract(path: &Path, declared_type: Option<&str>) -> Result<ExtractedDocument> {
    let bytes = std::fs::read(path)?;
    let format = FileFormat::detect(path, declared_type);
    debug!("Extracting {} as {}", path.display(), format.as_str());

    let parsed = match format {
        FileFormat::Pdf => pdf::extract(&bytes),
        FileFormat::Image => raster::extract(path, &bytes),
        FileFormat::Csv => tabular::extract(&bytes, b','),
        FileFormat::Tsv => tabular::extract(&bytes, b'\t'),
        FileFormat::Json => json::extract(&bytes),
        FileFormat::Xml => xml::extract(&bytes),
        FileFormat::Spreadsheet => spreadsheet::extract(&bytes),
        FileFormat::Markdown | FileFormat::PlainText => Ok(ExtractedContent::text(lossy(&bytes))),
    };

    let mut metadata = filesystem_metadata(path, bytes.len());
    let (content, format) = match parsed {
        Ok(content) => (content, format),
        Err(e) => {
            warn!(
                "Could not read {} as {} ({}), falling back to plain text",
                path.display(),
                format.as_str(),
                e
            );
            metadata.insert("extraction_error".into(), PropertyValue::Text(e.to_string()));
            (ExtractedContent::text(lossy(&bytes)), FileFormat::PlainText)
        }
    };
    metadata.extend(content.metadata);

    Ok(ExtractedDocument {
        text: content.text,
        metadata,
        format,
        structure: content.structure,
        summary: content.summary,
        pages: content.pages,
    })
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn filesystem_metadata(path: &Path, size: usize) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        metadata.insert("filename".into(), name.into());
    }
    metadata.insert("size".into(), size.into());
    if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
        let modified: chrono::DateTime<chrono::Utc> = modified.into();
        metadata.insert("modified".into(), modified.to_rfc3339().into());
    }
    metadata
}

/// `...N more {what}` when `total` exceeds what was shown.
fn more_suffix(total: usize, shown: usize, what: &str) -> Option<String> {
    (total > shown).then(|| format!("...{} more {}", total - shown, what))
}
