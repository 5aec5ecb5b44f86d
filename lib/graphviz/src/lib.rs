#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

use sparql_kernel::render::{GraphNode, NodeKind};
use sparql_kernel::{DiagramError, DiagramRenderer, GraphDescription, ImageFormat};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Renders diagrams by running a Graphviz executable.
#[derive(Clone, Debug)]
pub struct GraphvizRenderer {
    program: PathBuf,
}

impl GraphvizRenderer {
    /// Uses `program` (e.g., `dot` or `/usr/bin/neato`) to lay out diagrams.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new("dot")
    }
}

impl DiagramRenderer for GraphvizRenderer {
    fn render(
        &self,
        graph: &GraphDescription,
        format: ImageFormat,
    ) -> Result<Vec<u8>, DiagramError> {
        let dot = to_dot(graph);
        debug!(
            "Running {} for {} nodes and {} edges",
            self.program.display(),
            graph.nodes.len(),
            graph.edges.len()
        );

        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format.name()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DiagramError(format!("cannot run '{}': {e}", self.program.display()))
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .map_err(|e| DiagramError(format!("cannot send the graph to Graphviz: {e}")))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| DiagramError(format!("Graphviz did not finish: {e}")))?;

        if !output.status.success() {
            return Err(DiagramError(format!(
                "'{}' failed with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Writes `graph` in the DOT language.
///
/// IRI nodes are drawn as rounded boxes linking to their IRI, blank nodes as ellipses and
/// literals as plain boxes.
pub fn to_dot(graph: &GraphDescription) -> String {
    let mut lines = vec![
        "digraph {".to_owned(),
        "  rankdir=LR;".to_owned(),
        "  node [fontname=\"Helvetica\", fontsize=10];".to_owned(),
        "  edge [fontname=\"Helvetica\", fontsize=9];".to_owned(),
    ];
    lines.extend(
        graph
            .nodes
            .iter()
            .map(|node| format!("  {} [{}];", node.id, node_attributes(node))),
    );
    lines.extend(graph.edges.iter().map(|edge| {
        format!(
            "  {} -> {} [label=\"{}\"];",
            edge.from,
            edge.to,
            escape(&edge.label)
        )
    }));
    lines.push("}\n".to_owned());
    lines.join("\n")
}

fn node_attributes(node: &GraphNode) -> String {
    let shape = match node.kind {
        NodeKind::Iri => "shape=box, style=rounded",
        NodeKind::BlankNode => "shape=ellipse",
        NodeKind::Literal => "shape=box, color=gray",
    };
    let label = escape(&node.label);
    match &node.link {
        Some(link) => format!("label=\"{label}\", {shape}, href=\"{}\"", escape(link)),
        None => format!("label=\"{label}\", {shape}"),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}
