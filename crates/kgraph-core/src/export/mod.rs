//! Diagram renderings of a finished graph.

mod dot;
mod mermaid;

pub use dot::{render_dot, to_petgraph};
pub use mermaid::render_mermaid;

use crate::graph::Graph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Mermaid,
    Dot,
}

impl ExportFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Dot => "dot",
        }
    }

    #[must_use]
    pub fn render(&self, graph: &Graph) -> String {
        match self {
            Self::Mermaid => render_mermaid(graph),
            Self::Dot => render_dot(graph),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(crate::Error::UnknownFormat(other.to_string())),
        }
    }
}
