//! Heuristic entity and relationship extraction.
//!
//! Capitalization patterns and suffix lists stand in for a trained NER model;
//! relationships come from short verb phrases between two mentions inside
//! the same sentence. Everything here is pure and deterministic.

pub mod entities;
pub mod relations;

use serde::Serialize;

/// Entity category assigned by the rule that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Concept,
}

impl EntityKind {
    /// Node label used for entities of this kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
            Self::Location => "Location",
            Self::Concept => "Concept",
        }
    }
}

/// An entity found in a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Exact text as it appears, case preserved.
    pub name: String,
    pub kind: EntityKind,
    /// Literal occurrences of `name` in the text.
    pub mentions: usize,
}

/// Relationship types the extractor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationType {
    WorksFor,
    Founded,
    RelatedTo,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorksFor => "WORKS_FOR",
            Self::Founded => "FOUNDED",
            Self::RelatedTo => "RELATED_TO",
        }
    }
}

/// A directed relationship between two extracted entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRelationship {
    pub source: String,
    pub source_kind: EntityKind,
    pub target: String,
    pub target_kind: EntityKind,
    pub rel_type: RelationType,
    /// Text from the start of the source mention to the end of the target.
    pub sentence: String,
}

/// Entities and relationships of one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<ExtractedRelationship>,
}

/// Run entity and relationship extraction on a text.
pub fn extract_graph(text: &str) -> ExtractedGraph {
    let found = entities::find_entities(text);
    let relationships = relations::find_relationships(text, &found);
    ExtractedGraph {
        entities: found.entities,
        relationships,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_founder_scenario() {
        let text = "Alice Smith founded Acme Corp. Alice Smith works for Acme Corp.";
        let graph = extract_graph(text);

        assert_eq!(
            graph.entities,
            vec![
                Entity {
                    name: "Alice Smith".into(),
                    kind: EntityKind::Person,
                    mentions: 2,
                },
                Entity {
                    name: "Acme Corp.".into(),
                    kind: EntityKind::Organization,
                    mentions: 2,
                },
            ]
        );

        let types: Vec<&str> = graph.relationships.iter().map(|r| r.rel_type.as_str()).collect();
        assert_eq!(types, vec!["FOUNDED", "WORKS_FOR"]);
        assert!(graph
            .relationships
            .iter()
            .all(|r| r.source == "Alice Smith" && r.target == "Acme Corp."));
        assert_eq!(graph.relationships[0].sentence, "Alice Smith founded Acme Corp.");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Bob Jones and Carol White met at Stanford University near Salt Lake City. \
                    Bob Jones works at Initech Inc. on Kubernetes.";
        assert_eq!(extract_graph(text), extract_graph(text));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(extract_graph(""), ExtractedGraph::default());
    }
}
