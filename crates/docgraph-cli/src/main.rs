//! docgraph: build and query per-owner knowledge graphs from documents.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Command;
use docgraph_runtime::DocGraph;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCGRAPH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn run(command: Command) -> anyhow::Result<serde_json::Value> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = docgraph_core::DocGraphConfig::from_env(&data_dir)?;
    let docgraph = DocGraph::from_config(&config);
    commands::execute(&command, &docgraph)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = Command::parse(&args).and_then(|command| match command {
        Command::Help => {
            println!("{}", commands::USAGE);
            Ok(None)
        }
        command => run(command).map(Some),
    });

    match outcome {
        Ok(Some(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(&e.to_string()),
        },
        Ok(None) => {}
        Err(e) => fail(&format!("{:#}", e)),
    }
}

fn fail(message: &str) -> ! {
    println!("{}", serde_json::json!({ "error": message }));
    std::process::exit(1);
}
