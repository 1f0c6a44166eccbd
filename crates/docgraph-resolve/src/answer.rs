//! Answer generation seam.

use std::fmt::Write;

use docgraph_store::Subgraph;

use crate::resolver::query_terms;

/// Nodes listed by name in a summary answer.
const LISTED_NODES: usize = 5;

/// Renders a resolved subgraph as a textual answer to a query.
pub trait AnswerGenerator: Send + Sync {
    fn answer(&self, query: &str, subgraph: &Subgraph) -> String;
}

/// Deterministic answer listing counts and the first few nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryAnswerer;

impl AnswerGenerator for SummaryAnswerer {
    fn answer(&self, query: &str, subgraph: &Subgraph) -> String {
        let nodes = subgraph.nodes.len();
        let links = subgraph.relationships.len();
        let terms = query_terms(query);
        let searched = !terms.is_empty();
        let mut text = match terms.first() {
            Some(term) => format!(
                "I found {} entities related to '{}' in your knowledge graph.",
                nodes, term
            ),
            None => format!(
                "I found {} nodes and {} relationships in your knowledge graph.",
                nodes, links
            ),
        };

        if nodes > 0 {
            text.push_str(if searched {
                "\n\nHere are some related items:\n"
            } else {
                "\n\nHere are some items from your knowledge graph:\n"
            });
            for node in subgraph.nodes.iter().take(LISTED_NODES) {
                let _ = writeln!(text, "- {} ({})", node.name(), node.label);
            }
        }
        if searched && links > 0 {
            let _ = write!(
                text,
                "\nThese entities have {} relationships between them.",
                links
            );
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_store::{Node, NodeId, OwnerId, Properties};

    fn subgraph(names: &[&str]) -> Subgraph {
        let mut sub = Subgraph::new();
        for (i, name) in names.iter().enumerate() {
            sub.add_node(Node {
                id: NodeId::from(i.to_string()),
                label: "Concept".into(),
                properties: Properties::named(*name),
                owner: OwnerId(1),
                created_at: 0,
            });
        }
        sub
    }

    #[test]
    fn test_search_answer() {
        let answer = SummaryAnswerer.answer("Tell me about Rust", &subgraph(&["Rust"]));
        assert_eq!(
            answer,
            "I found 1 entities related to 'tell' in your knowledge graph.\n\n\
             Here are some related items:\n- Rust (Concept)\n"
        );
    }

    #[test]
    fn test_sample_answer_lists_at_most_five() {
        let sub = subgraph(&["a", "b", "c", "d", "e", "f"]);
        let answer = SummaryAnswerer.answer("xyz", &sub);
        assert!(answer.starts_with("I found 6 nodes and 0 relationships in your knowledge graph."));
        assert!(answer.contains("Here are some items from your knowledge graph:"));
        assert_eq!(answer.matches("\n- ").count(), 5);
    }

    #[test]
    fn test_empty_answer() {
        assert_eq!(
            SummaryAnswerer.answer("xyz", &Subgraph::new()),
            "I found 0 nodes and 0 relationships in your knowledge graph."
        );
    }
}
