//! XML documents: element and attribute counts plus the top-level elements.

use docgraph_core::{Error, Result};

use super::{more_suffix, ExtractedContent, Metadata, StructureSummary, PREVIEW_LIMIT};

const TEXT_PREVIEW_CHARS: usize = 60;

pub(super) fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
    let raw = std::str::from_utf8(bytes)
        .map_err(|e| Error::Extraction(format!("XML is not UTF-8: {}", e)))?;
    let doc = roxmltree::Document::parse(raw)
        .map_err(|e| Error::Extraction(format!("invalid XML: {}", e)))?;

    let root = doc.root_element();
    let root_tag = root.tag_name().name().to_string();
    let elements: Vec<_> = doc.descendants().filter(|n| n.is_element()).collect();
    let element_count = elements.len();
    let attribute_count: usize = elements.iter().map(|n| n.attributes().count()).sum();
    let children: Vec<_> = root.children().filter(|n| n.is_element()).collect();
    let child_count = children.len();

    let mut lines = vec![format!("<{}>", root_tag)];
    for child in children.iter().take(PREVIEW_LIMIT) {
        let text: String = child
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let text: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        if text.is_empty() {
            lines.push(format!("  <{}>", child.tag_name().name()));
        } else {
            lines.push(format!("  <{}> {}", child.tag_name().name(), text));
        }
    }
    lines.extend(more_suffix(child_count, PREVIEW_LIMIT.min(child_count), "elements"));

    let mut metadata = Metadata::new();
    metadata.insert("root_tag".into(), root_tag.as_str().into());
    metadata.insert("element_count".into(), element_count.into());
    metadata.insert("attribute_count".into(), attribute_count.into());
    metadata.insert("child_count".into(), child_count.into());

    Ok(ExtractedContent {
        text: raw.to_string(),
        metadata,
        structure: Some(StructureSummary::Xml {
            root_tag,
            element_count,
            attribute_count,
            child_count,
        }),
        summary: Some(lines.join("\n")),
        pages: Vec::new(),
    })
}
