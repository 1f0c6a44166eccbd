//! Delimited tables (CSV and TSV).

use docgraph_core::{Error, Result};

use super::{more_suffix, ExtractedContent, Metadata, StructureSummary, PREVIEW_LIMIT};

pub(super) fn extract(bytes: &[u8], delimiter: u8) -> Result<ExtractedContent> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut preview = Vec::new();
    let mut row_count = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if preview.len() < PREVIEW_LIMIT {
            preview.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        row_count += 1;
    }

    let mut summary = vec![columns.join(" | ")];
    summary.extend(preview.iter().map(|row| row.join(" | ")));
    summary.extend(more_suffix(row_count, preview.len(), "rows"));

    let mut metadata = Metadata::new();
    metadata.insert("column_count".into(), columns.len().into());
    metadata.insert("row_count".into(), row_count.into());

    Ok(ExtractedContent {
        text: String::from_utf8_lossy(bytes).into_owned(),
        metadata,
        structure: Some(StructureSummary::Tabular {
            columns,
            row_count,
            delimiter: char::from(delimiter),
        }),
        summary: Some(summary.join("\n")),
        pages: Vec::new(),
    })
}

fn csv_error(e: csv::Error) -> Error {
    Error::Extraction(format!("invalid table: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_structure_and_summary() {
        let mut data = String::from("name,age\n");
        for i in 0..12 {
            data.push_str(&format!("person{},{}\n", i, 20 + i));
        }
        let content = extract(data.as_bytes(), b',').unwrap();

        assert_eq!(
            content.structure,
            Some(StructureSummary::Tabular {
                columns: vec!["name".into(), "age".into()],
                row_count: 12,
                delimiter: ',',
            })
        );
        let summary = content.summary.unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "name | age");
        assert_eq!(lines[1], "person0 | 20");
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[11], "...2 more rows");
        assert_eq!(content.text, data);
    }

    #[test]
    fn test_tsv_without_truncation() {
        let content = extract(b"city\tcountry\nBerlin\tGermany\n", b'\t').unwrap();
        let summary = content.summary.unwrap();
        assert_eq!(summary, "city | country\nBerlin | Germany");
        assert!(matches!(
            content.structure,
            Some(StructureSummary::Tabular { delimiter: '\t', row_count: 1, .. })
        ));
    }

    #[test]
    fn test_non_utf8_table_is_rejected() {
        let err = extract(b"name\n\xff\xfe\n", b',').unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
