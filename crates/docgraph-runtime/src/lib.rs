//! Runtime facade: one object wiring store, graph builder, resolver and
//! answer generator, built once at startup and shared by callers.

pub mod orchestrator;

pub use orchestrator::DocGraph;
