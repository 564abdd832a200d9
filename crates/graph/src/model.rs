use extract::Triplet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Labelled nodes plus directed edges between them.
///
/// Nodes are keyed by their exact label text and keep first-seen order.
/// Every edge endpoint is a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphModel {
    nodes: Vec<String>,
    edges: Vec<Edge>,
    #[serde(skip)]
    node_to_idx: HashMap<String, usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, label: &str) -> usize {
        if let Some(&idx) = self.node_to_idx.get(label) {
            return idx;
        }

        let idx = self.nodes.len();
        self.nodes.push(label.to_string());
        self.node_to_idx.insert(label.to_string(), idx);
        idx
    }

    /// Adds both endpoints if needed. Parallel edges are kept.
    pub fn add_edge(&mut self, from: &str, to: &str, label: &str) {
        self.add_node(from);
        self.add_node(to);
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            label: label.to_string(),
        });
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_index(&self, label: &str) -> Option<usize> {
        self.node_to_idx.get(label).copied()
    }

    pub fn contains_node(&self, label: &str) -> bool {
        self.node_to_idx.contains_key(label)
    }

    pub fn node_set(&self) -> HashSet<&str> {
        self.nodes.iter().map(String::as_str).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One edge per triplet, in input order; heads and tails become nodes.
pub fn build_graph(triplets: &[Triplet]) -> GraphModel {
    let mut graph = GraphModel::new();
    for triplet in triplets {
        graph.add_edge(&triplet.head, &triplet.tail, &triplet.relation);
    }
    graph
}
