//! JSON documents: top-level shape and a condensed listing.

use serde_json::Value;

use docgraph_core::{Error, Result};

use super::{more_suffix, ExtractedContent, Metadata, StructureSummary, PREVIEW_LIMIT};

/// Longest rendered value in the condensed listing.
const VALUE_PREVIEW_CHARS: usize = 80;

pub(super) fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::Extraction(format!("invalid JSON: {}", e)))?;

    let mut metadata = Metadata::new();
    let (structure, summary) = match &value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            metadata.insert("structure".into(), "object".into());
            metadata.insert("key_count".into(), keys.len().into());

            let mut lines: Vec<String> = map
                .iter()
                .take(PREVIEW_LIMIT)
                .map(|(k, v)| format!("{}: {}", k, preview(v)))
                .collect();
            lines.extend(more_suffix(map.len(), PREVIEW_LIMIT.min(map.len()), "items"));
            (StructureSummary::JsonObject { keys }, lines.join("\n"))
        }
        Value::Array(items) => {
            let sample_keys: Vec<String> = items
                .first()
                .and_then(Value::as_object)
                .map(|first| first.keys().cloned().collect())
                .unwrap_or_default();
            metadata.insert("structure".into(), "array".into());
            metadata.insert("item_count".into(), items.len().into());

            let mut lines: Vec<String> = items
                .iter()
                .take(PREVIEW_LIMIT)
                .enumerate()
                .map(|(i, v)| format!("[{}] {}", i, preview(v)))
                .collect();
            lines.extend(more_suffix(items.len(), PREVIEW_LIMIT.min(items.len()), "items"));
            (
                StructureSummary::JsonArray {
                    count: items.len(),
                    sample_keys,
                },
                lines.join("\n"),
            )
        }
        scalar => {
            metadata.insert("structure".into(), "scalar".into());
            (StructureSummary::JsonScalar, preview(scalar))
        }
    };

    Ok(ExtractedContent {
        text: String::from_utf8_lossy(bytes).into_owned(),
        metadata,
        structure: Some(structure),
        summary: Some(summary),
        pages: Vec::new(),
    })
}

fn preview(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.chars().count() > VALUE_PREVIEW_CHARS {
        let cut: String = rendered.chars().take(VALUE_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys() {
        let content = extract(br#"{"name": "Acme Corp.", "founded": 1999}"#).unwrap();
        assert_eq!(
            content.structure,
            Some(StructureSummary::JsonObject {
                keys: vec!["founded".into(), "name".into()]
            })
        );
        assert_eq!(content.summary.as_deref(), Some("founded: 1999\nname: Acme Corp."));
    }

    #[test]
    fn test_array_sample_keys_and_truncation() {
        let items: Vec<String> = (0..15).map(|i| format!(r#"{{"id": {}, "tag": "t{}"}}"#, i, i)).collect();
        let raw = format!("[{}]", items.join(","));
        let content = extract(raw.as_bytes()).unwrap();

        assert_eq!(
            content.structure,
            Some(StructureSummary::JsonArray {
                count: 15,
                sample_keys: vec!["id".into(), "tag".into()],
            })
        );
        let summary = content.summary.unwrap();
        assert!(summary.starts_with("[0] {\"id\":0,\"tag\":\"t0\"}"));
        assert!(summary.ends_with("...5 more items"));
        assert_eq!(summary.lines().count(), 11);
    }

    #[test]
    fn test_scalar() {
        let content = extract(b"42").unwrap();
        assert_eq!(content.structure, Some(StructureSummary::JsonScalar));
        assert_eq!(content.summary.as_deref(), Some("42"));
    }
}
