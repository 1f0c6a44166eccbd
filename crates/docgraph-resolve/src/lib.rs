//! Resolvers: turn a free-text question into a subgraph and an answer.
//!
//! The resolver picks a typed store query from the capitalized terms of the
//! question; the answer generator renders the subgraph as text.

pub mod answer;
pub mod resolver;
pub mod types;

pub use answer::{AnswerGenerator, SummaryAnswerer};
pub use resolver::{query_terms, GraphResolver, QUERY_LIMIT};
pub use types::*;
