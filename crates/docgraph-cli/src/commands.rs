//! Subcommand parsing and dispatch.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde_json::Value;

use docgraph_runtime::DocGraph;
use docgraph_store::{NodeId, OwnerId};

pub const USAGE: &str = "\
docgraph: document-to-graph pipeline

Usage: docgraph <command> [args]

Commands:
  ingest <owner> <file> [--type T]   Build a graph from a file
  query <owner> <text...>            Ask a question of the owner's graph
  overview <owner>                   Sample and counts of the owner's graph
  document <owner> <id>              Neighborhood of one document
  health                             Store connectivity and backend
  help                               Show this help message

Environment:
  DOCGRAPH_DATA_DIR       data root (default: data/)
  DOCGRAPH_BACKEND        embedded | external (default: embedded)
  DOCGRAPH_GRAPH_DB       graph database file for the external backend
  DOCGRAPH_CHUNK_SIZE     chunk size in characters
  DOCGRAPH_CHUNK_OVERLAP  chunk overlap in characters
  RUST_LOG                log filter (default: info)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ingest {
        owner: OwnerId,
        file: PathBuf,
        declared_type: Option<String>,
    },
    Query {
        owner: OwnerId,
        text: String,
    },
    Overview {
        owner: OwnerId,
    },
    Document {
        owner: OwnerId,
        document: NodeId,
    },
    Health,
    Help,
}

impl Command {
    /// Parse arguments, without the program name.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };
        match name.as_str() {
            "ingest" => {
                let mut positional = Vec::new();
                let mut declared_type = None;
                let mut iter = rest.iter();
                while let Some(arg) = iter.next() {
                    if arg == "--type" {
                        let value = iter.next().ok_or_else(|| anyhow!("--type needs a value"))?;
                        declared_type = Some(value.clone());
                    } else {
                        positional.push(arg);
                    }
                }
                let [owner, file] = positional.as_slice() else {
                    bail!("usage: docgraph ingest <owner> <file> [--type T]");
                };
                Ok(Self::Ingest {
                    owner: parse_owner(owner)?,
                    file: PathBuf::from(file.as_str()),
                    declared_type,
                })
            }
            "query" => match rest.split_first() {
                Some((owner, words)) if !words.is_empty() => Ok(Self::Query {
                    owner: parse_owner(owner)?,
                    text: words.join(" "),
                }),
                _ => bail!("usage: docgraph query <owner> <text...>"),
            },
            "overview" => match rest {
                [owner] => Ok(Self::Overview {
                    owner: parse_owner(owner)?,
                }),
                _ => bail!("usage: docgraph overview <owner>"),
            },
            "document" => match rest {
                [owner, id] => Ok(Self::Document {
                    owner: parse_owner(owner)?,
                    document: NodeId::from(id.as_str()),
                }),
                _ => bail!("usage: docgraph document <owner> <id>"),
            },
            "health" => Ok(Self::Health),
            "help" | "--help" | "-h" => Ok(Self::Help),
            other => bail!("unknown command: {}. Use 'docgraph help' for usage.", other),
        }
    }
}

fn parse_owner(raw: &str) -> anyhow::Result<OwnerId> {
    raw.parse::<i64>()
        .map(OwnerId)
        .with_context(|| format!("owner must be an integer, got {:?}", raw))
}

/// Run a command and return its JSON output.
pub fn execute(command: &Command, docgraph: &DocGraph) -> anyhow::Result<Value> {
    let value = match command {
        Command::Ingest {
            owner,
            file,
            declared_type,
        } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("not a file path: {}", file.display()))?;
            let report = docgraph.ingest(file, *owner, file_name, declared_type.as_deref())?;
            serde_json::to_value(report)?
        }
        Command::Query { owner, text } => serde_json::to_value(docgraph.query(text, *owner))?,
        Command::Overview { owner } => serde_json::to_value(docgraph.overview(*owner)?)?,
        Command::Document { owner, document } => {
            serde_json::to_value(docgraph.document_graph(document, *owner)?)?
        }
        Command::Health => serde_json::to_value(docgraph.healthcheck())?,
        Command::Help => Value::String(USAGE.to_string()),
    };
    Ok(value)
}
