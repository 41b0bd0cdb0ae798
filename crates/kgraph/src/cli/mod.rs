pub mod build;
pub mod check;
pub mod demo;
pub mod query;
pub mod render;
pub mod stats;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kgraph_core::{ExportFormat, ExtractionStrategy, Graph};

#[derive(Parser)]
#[command(
    name = "kgraph",
    about = "Build provenance-tracked knowledge graphs from document chunks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and build a graph from a JSON array of chunks
    Build(BuildArgs),
    /// Render a graph file as a diagram
    Render {
        /// Graph JSON produced by `kgraph build`
        graph: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Mermaid)]
        format: Format,
    },
    /// List chunk ids relevant to a text query
    Query {
        /// Graph JSON produced by `kgraph build`
        graph: PathBuf,
        /// Case-insensitive text to look for in labels, attributes and relations
        text: String,
    },
    /// Verify the structural guarantees of a graph file
    Check {
        graph: PathBuf,
    },
    /// Show node and edge counts
    Stats {
        graph: PathBuf,
    },
    /// Run the built-in sample prospectus through the rule-based extractor
    Demo {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Args)]
pub struct BuildArgs {
    /// JSON array of {chunk_id, page, text} objects
    pub chunks: PathBuf,
    /// Extraction strategy: rule-based or llm (overrides KGRAPH_EXTRACTOR)
    #[arg(long)]
    pub extractor: Option<ExtractionStrategy>,
    /// Document name recorded on Source nodes (overrides KGRAPH_DOCUMENT)
    #[arg(long)]
    pub document: Option<String>,
    /// Abort on the first extraction failure
    #[arg(long)]
    pub strict: bool,
    /// Write graph JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Also write a Mermaid diagram
    #[arg(long)]
    pub mermaid: Option<PathBuf>,
    /// Also write a Graphviz DOT file
    #[arg(long)]
    pub dot: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Mermaid,
    Dot,
}

impl Format {
    pub fn render(self, graph: &Graph) -> Result<String> {
        match self {
            Self::Json => Ok(graph.to_json_pretty()?),
            Self::Mermaid => Ok(ExportFormat::Mermaid.render(graph)),
            Self::Dot => Ok(ExportFormat::Dot.render(graph)),
        }
    }
}

pub fn load_graph(path: &Path) -> Result<Graph> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Graph::from_json(&json).with_context(|| format!("{} is not a graph file", path.display()))
}

/// Writes to `path`, or stdout when there is none.
pub fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, ensure_newline(content))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", ensure_newline(content));
            Ok(())
        }
    }
}

fn ensure_newline(content: &str) -> String {
    if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}
