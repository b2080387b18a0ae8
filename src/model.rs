//! Graph data types.

use crate::ant::AntAgent;
use crate::config::PheromoneParams;
use crate::error::InvalidGraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// State of the user journey (e.g. a page).
///
/// The position is owned by whoever lays the graph out; the simulation never reads it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            x: None,
            y: None,
        }
    }
}

/// Directed transition between two nodes.
///
/// Exchanged as `{source, target, pheromoneStrength, label?}`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub pheromone_strength: f64,
    pub label: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, pheromone_strength: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            pheromone_strength,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Unvalidated nodes and edges, as supplied by a loader or handed to a renderer.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Validated journey graph.
///
/// Every edge endpoint is a node of the graph and every strength lies in
/// `[min, max]`. Strengths only change through the update rules in
/// [`crate::pheromone`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    params: PheromoneParams,
}

impl Graph {
    /// Validate `data` and take ownership of its nodes and edges.
    ///
    /// # Errors
    /// Fails if two nodes share an id or an edge references a missing node.
    pub fn build(data: GraphData, params: &PheromoneParams) -> Result<Self, InvalidGraphError> {
        let GraphData { nodes, edges } = data;

        let mut ids = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(InvalidGraphError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &edges {
            for end in [&edge.source, &edge.target] {
                if !ids.contains(end.as_str()) {
                    return Err(InvalidGraphError::UnknownNode {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        missing: end.clone(),
                    });
                }
            }
        }

        let mut graph = Self {
            nodes,
            edges: Vec::with_capacity(edges.len()),
            params: params.clone(),
        };
        for edge in edges {
            let strength = edge.pheromone_strength;
            graph.edges.push(edge);
            let i_edge = graph.edges.len() - 1;
            graph.set_pheromone(i_edge, strength);
            let clamped = graph.edges[i_edge].pheromone_strength;
            if clamped != strength {
                log::warn!(
                    "clamped initial strength of {} -> {} from {strength} to {clamped}",
                    graph.edges[i_edge].source,
                    graph.edges[i_edge].target
                );
            }
        }

        Ok(graph)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn params(&self) -> &PheromoneParams {
        &self.params
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    /// Edges leaving `id`, in insertion order. Empty for unknown or dead-end nodes.
    pub fn outgoing_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    /// First edge from `source` to `target`, if any.
    pub fn find_edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
    }

    /// Store `value` as the strength of edge `i_edge`, clamped into `[min, max]`.
    ///
    /// Callers iterate `0..self.edges.len()`, so `i_edge` is always in bounds.
    pub(crate) fn set_pheromone(&mut self, i_edge: usize, value: f64) {
        self.edges[i_edge].pheromone_strength = self.params.clamp(value);
    }

    /// Edges sorted by decreasing strength, optionally only those leaving `from`.
    ///
    /// Ties keep insertion order.
    pub fn ranked_edges(&self, from: Option<&str>) -> Vec<&Edge> {
        let mut ranked: Vec<_> = self
            .edges
            .iter()
            .filter(|edge| from.is_none_or(|from| edge.source == from))
            .collect();
        ranked.sort_by(|a, b| b.pheromone_strength.total_cmp(&a.pheromone_strength));
        ranked
    }

    /// Copy of the current nodes and edges.
    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

/// State of the simulation after a given tick.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of ticks performed so far.
    pub step: usize,

    pub graph: GraphData,

    pub ants: Vec<AntAgent>,
}
