//! Graph resolver: capitalized query terms to a one-hop subgraph.

use std::sync::Arc;

use tracing::debug;

use docgraph_core::Result;
use docgraph_store::{GraphStore, OwnerId, SubgraphQuery};

use crate::types::Resolution;

/// Row limit of both resolver queries.
pub const QUERY_LIMIT: usize = 20;

/// Shortest term, in characters, that is searched for.
const MIN_TERM_CHARS: usize = 4;

const TRIM_CHARS: &[char] = &[',', '.', '!', '?', '(', ')', '[', ']', '{', '}', ';', '"', '\''];

/// Search terms of a query: whitespace tokens starting with an uppercase
/// letter and longer than three characters, stripped of punctuation,
/// lowercased, first occurrence kept.
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        if !word.chars().next().is_some_and(char::is_uppercase)
            || word.chars().count() < MIN_TERM_CHARS
        {
            continue;
        }
        let term = word.trim_matches(TRIM_CHARS).to_lowercase();
        if term.chars().count() >= MIN_TERM_CHARS && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Resolves queries against one store.
pub struct GraphResolver {
    store: Arc<dyn GraphStore>,
}

impl GraphResolver {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Typed store query for the given terms.
    pub fn subgraph_query(terms: &[String], owner: OwnerId) -> SubgraphQuery {
        if terms.is_empty() {
            SubgraphQuery::OwnerSample {
                owner,
                limit: QUERY_LIMIT,
            }
        } else {
            SubgraphQuery::NameContains {
                owner,
                terms: terms.to_vec(),
                limit: QUERY_LIMIT,
            }
        }
    }

    /// Look up the subgraph relevant to `text` for `owner`.
    pub fn resolve(&self, text: &str, owner: OwnerId) -> Result<Resolution> {
        let terms = query_terms(text);
        debug!("Resolving query for owner {} with terms {:?}", owner, terms);
        let subgraph = self
            .store
            .query_subgraph(&Self::subgraph_query(&terms, owner))?;
        Ok(Resolution { terms, subgraph })
    }
}
