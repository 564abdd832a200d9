use anyhow::{Context, Result};
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use std::path::PathBuf;

use crate::model::GraphModel;

/// A drawing surface for graph models.
///
/// `create` is called once for the first model shown; every later model
/// goes through `replace`. Keeping the view (zoom, camera) across a
/// replace is up to the sink.
pub trait RenderSink: Send {
    fn create(&mut self, model: &GraphModel) -> Result<()>;
    fn replace(&mut self, model: &GraphModel) -> Result<()>;
}

/// Drops every update.
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn create(&mut self, _model: &GraphModel) -> Result<()> {
        Ok(())
    }

    fn replace(&mut self, _model: &GraphModel) -> Result<()> {
        Ok(())
    }
}

/// Writes the current model as a Graphviz DOT file.
pub struct DotSink {
    path: PathBuf,
}

impl DotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn write(&self, model: &GraphModel) -> Result<()> {
        std::fs::write(&self.path, to_dot(model))
            .context(format!("Failed to write graph to {:?}", self.path))?;
        tracing::debug!(
            path = %self.path.display(),
            nodes = model.node_count(),
            edges = model.edge_count(),
            "Wrote DOT graph"
        );
        Ok(())
    }
}

impl RenderSink for DotSink {
    fn create(&mut self, model: &GraphModel) -> Result<()> {
        self.write(model)
    }

    fn replace(&mut self, model: &GraphModel) -> Result<()> {
        self.write(model)
    }
}

pub fn to_dot(model: &GraphModel) -> String {
    let mut graph: DiGraph<&str, &str> = DiGraph::new();
    let indices: Vec<_> = model
        .nodes()
        .iter()
        .map(|label| graph.add_node(label.as_str()))
        .collect();

    for edge in model.edges() {
        // endpoints are always nodes of the model
        if let (Some(from), Some(to)) = (model.node_index(&edge.from), model.node_index(&edge.to)) {
            graph.add_edge(indices[from], indices[to], edge.label.as_str());
        }
    }

    format!("{}", Dot::new(&graph))
}
