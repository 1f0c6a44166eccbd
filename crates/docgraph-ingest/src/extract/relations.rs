//! Relationships from short phrases between two mentions.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::entities::FoundEntities;
use super::{EntityKind, ExtractedRelationship, RelationType};

/// Longest gap between two mentions, in characters.
pub const MAX_GAP_CHARS: usize = 60;
/// Longest evidence snippet, in characters.
pub const MAX_SENTENCE_CHARS: usize = 100;

static WORKS_FOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bwork(?:s|ing|ed)?\s+(?:for|at|with|in)\b").expect("valid works-for regex")
});

static FOUNDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:found(?:ed)?|created|established|started)\b").expect("valid founded regex")
});

static RELATED_TO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*,?\s*(?:and|with)\s*$").expect("valid related-to regex"));

fn crosses_sentence(gap: &str) -> bool {
    gap.contains(['.', '!', '?', '\n'])
}

/// Relationships between mentions of `found`, in text order. Only the first
/// relationship per `(source, type, target)` is kept.
pub fn find_relationships(text: &str, found: &FoundEntities) -> Vec<ExtractedRelationship> {
    let mut relationships = Vec::new();
    let mut seen = HashSet::new();

    for (i, source) in found.mentions.iter().enumerate() {
        let source_entity = found.entity(source);
        if source_entity.kind != EntityKind::Person {
            continue;
        }

        for target in &found.mentions[i + 1..] {
            if target.start < source.end {
                continue;
            }
            let gap = &text[source.end..target.start];
            if crosses_sentence(gap) || gap.chars().count() > MAX_GAP_CHARS {
                break;
            }

            let target_entity = found.entity(target);
            let types: &[RelationType] = match target_entity.kind {
                EntityKind::Organization => &[RelationType::Founded, RelationType::WorksFor],
                EntityKind::Person => &[RelationType::RelatedTo],
                _ => &[],
            };

            for &rel_type in types {
                let pattern = match rel_type {
                    RelationType::WorksFor => &*WORKS_FOR,
                    RelationType::Founded => &*FOUNDED,
                    RelationType::RelatedTo => &*RELATED_TO,
                };
                if !pattern.is_match(gap) {
                    continue;
                }
                let key = (source.entity, rel_type, target.entity);
                if !seen.insert(key) {
                    continue;
                }
                relationships.push(ExtractedRelationship {
                    source: source_entity.name.clone(),
                    source_kind: source_entity.kind,
                    target: target_entity.name.clone(),
                    target_kind: target_entity.kind,
                    rel_type,
                    sentence: text[source.start..target.end]
                        .chars()
                        .take(MAX_SENTENCE_CHARS)
                        .collect(),
                });
            }
        }
    }
    relationships
}

#[cfg(test)]
mod tests {
    use super::super::entities::find_entities;
    use super::*;

    fn relations(text: &str) -> Vec<(String, &'static str, String)> {
        find_relationships(text, &find_entities(text))
            .into_iter()
            .map(|r| (r.source, r.rel_type.as_str(), r.target))
            .collect()
    }

    #[test]
    fn test_works_for_variants() {
        for verb in ["works for", "worked at", "working with", "work in"] {
            let text = format!("Alice Smith {} Initech Inc.", verb);
            assert_eq!(
                relations(&text),
                vec![("Alice Smith".to_string(), "WORKS_FOR", "Initech Inc.".to_string())],
                "verb {:?}",
                verb
            );
        }
    }

    #[test]
    fn test_founded_and_related() {
        let text = "Bob Jones and Carol White established Globex Corporation.";
        let found = relations(text);
        assert!(found.contains(&("Bob Jones".into(), "RELATED_TO", "Carol White".into())));
        assert!(found.contains(&("Carol White".into(), "FOUNDED", "Globex Corporation".into())));
        assert!(found.contains(&("Bob Jones".into(), "FOUNDED", "Globex Corporation".into())));
    }

    #[test]
    fn test_no_relationship_across_sentences() {
        assert!(relations("Alice Smith left. She works for Initech Inc.").is_empty());
        assert!(relations("Alice Smith\nworks for Initech Inc.").is_empty());
    }

    #[test]
    fn test_gap_limit() {
        let filler = "x".repeat(MAX_GAP_CHARS);
        let text = format!("Alice Smith works for {} Initech Inc.", filler);
        assert!(relations(&text).is_empty());
    }

    #[test]
    fn test_duplicates_keep_first_evidence() {
        let text = "Alice Smith works for Initech Inc. Alice Smith also worked at Initech Inc. again.";
        let found = find_relationships(text, &find_entities(text));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sentence, "Alice Smith works for Initech Inc.");
    }

    #[test]
    fn test_evidence_is_capped() {
        let text = format!("Alice Smith, {}, works for Initech Inc.", "y".repeat(40));
        let found = find_relationships(&text, &find_entities(&text));
        assert_eq!(found.len(), 1);
        assert!(found[0].sentence.chars().count() <= MAX_SENTENCE_CHARS);
    }
}
