//! Resolver types.

use serde::Serialize;

use docgraph_store::{GraphData, Subgraph};

/// What a query resolved to before answering.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Search terms taken from the query; empty when the whole-graph sample
    /// was used instead.
    pub terms: Vec<String>,
    pub subgraph: Subgraph,
}

/// Answer to a query, with the subgraph it was based on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query: String,
    pub response: String,
    pub graph_data: GraphData,
}

impl QueryResult {
    /// Result reported in place of a failed query.
    pub fn error(query: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            query: query.into(),
            response: format!("Error processing your query: {}", error),
            graph_data: GraphData::default(),
        }
    }
}
