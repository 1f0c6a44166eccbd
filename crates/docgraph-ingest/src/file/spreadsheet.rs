//! Workbooks (xlsx, xls, ods) rendered as tab-separated text per sheet.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use tracing::warn;

use docgraph_core::{Error, Result};

use super::{more_suffix, ExtractedContent, Metadata, StructureSummary, PREVIEW_LIMIT};

pub(super) fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::Extraction(format!("unreadable workbook: {}", e)))?;
    let sheets = workbook.sheet_names();

    let mut text = Vec::new();
    let mut summary = Vec::new();
    for name in &sheets {
        let rows: Vec<Vec<String>> = match workbook.worksheet_range(name) {
            Ok(range) => range
                .rows()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
            Err(e) => {
                warn!("Skipping unreadable sheet '{}': {}", name, e);
                Vec::new()
            }
        };
        let (sheet_text, sheet_summary) = render_sheet(name, &rows);
        text.push(sheet_text);
        summary.push(sheet_summary);
    }

    let mut metadata = Metadata::new();
    metadata.insert("sheet_count".into(), sheets.len().into());

    Ok(ExtractedContent {
        text: text.join("\n\n"),
        metadata,
        structure: Some(StructureSummary::Spreadsheet { sheets }),
        summary: Some(summary.join("\n\n")),
        pages: Vec::new(),
    })
}

/// Full tab-separated grid and a condensed preview of one sheet.
fn render_sheet(name: &str, rows: &[Vec<String>]) -> (String, String) {
    let header = format!("# {}", name);
    let lines: Vec<String> = rows.iter().map(|row| row.join("\t")).collect();

    let mut text = vec![header.clone()];
    text.extend(lines.iter().cloned());

    let mut preview = vec![header];
    preview.extend(lines.iter().take(PREVIEW_LIMIT).cloned());
    preview.extend(more_suffix(lines.len(), PREVIEW_LIMIT.min(lines.len()), "rows"));

    (text.join("\n"), preview.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sheet_caps_preview() {
        let rows: Vec<Vec<String>> = (0..12)
            .map(|i| vec![format!("r{}", i), (i * 10).to_string()])
            .collect();
        let (text, preview) = render_sheet("Sales", &rows);
        assert!(text.starts_with("# Sales\nr0\t0\nr1\t10"));
        assert_eq!(text.lines().count(), 13);
        assert_eq!(preview.lines().count(), 12);
        assert!(preview.ends_with("...2 more rows"));
    }

    #[test]
    fn test_empty_sheet() {
        let (text, preview) = render_sheet("Empty", &[]);
        assert_eq!(text, "# Empty");
        assert_eq!(preview, "# Empty");
    }

    #[test]
    fn test_garbage_workbook_is_rejected() {
        assert!(matches!(extract(b"not a workbook"), Err(Error::Extraction(_))));
    }
}
