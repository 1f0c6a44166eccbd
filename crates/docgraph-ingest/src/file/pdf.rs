//! PDF text and Info dictionary extraction.

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use docgraph_core::{Error, Result};

use super::{ExtractedContent, Metadata, PageText};

const INFO_KEYS: [(&[u8], &str); 5] = [
    (b"Title", "title"),
    (b"Author", "author"),
    (b"Subject", "subject"),
    (b"Creator", "creator"),
    (b"Producer", "producer"),
];

pub(super) fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::Extraction(format!("PDF parse failed: {}", e)))?;
    let page_ids = doc.get_pages();

    let mut pages = Vec::new();
    for &page_num in page_ids.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PageText {
                page_num,
                text: text.trim_end().to_string(),
            }),
            Ok(_) => {}
            Err(e) => debug!("No text on PDF page {}: {}", page_num, e),
        }
    }

    let text = pages
        .iter()
        .map(|p| format!("--- Page {} ---\n\n{}", p.page_num, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut metadata = Metadata::new();
    metadata.insert("page_count".into(), page_ids.len().into());
    if let Some(info) = info_dictionary(&doc) {
        for (key, name) in INFO_KEYS {
            if let Ok(Object::String(raw, _)) = info.get(key) {
                let value = decode_text_string(raw);
                if !value.trim().is_empty() {
                    metadata.insert(name.into(), value.trim().into());
                }
            }
        }
    }

    Ok(ExtractedContent {
        text,
        metadata,
        pages,
        ..ExtractedContent::default()
    })
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE with a byte order mark, or PDFDocEncoding
/// which agrees with Latin-1 for printable text.
fn decode_text_string(raw: &[u8]) -> String {
    match raw {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => raw.iter().map(|&b| b as char).collect(),
    }
}
