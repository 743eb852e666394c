//! Structural checks run before layout.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::graph::{GraphEdge, GraphNode};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ValidationError {
    #[error("No nodes provided for layout")]
    EmptyGraph,
    #[error("Duplicate node IDs found: {}", .0.join(", "))]
    DuplicateIds(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ValidationWarning {
    #[error("{0} edges reference non-existent nodes")]
    DanglingEdges(usize),
    #[error("{0} self-loop edges found")]
    SelfLoops(usize),
    #[error("{} cycles detected in graph: {}", .0.len(), CycleList(.0))]
    Cycles(Vec<Vec<String>>),
    #[error("{} disconnected nodes found", .0.len())]
    Disconnected(Vec<String>),
}

struct CycleList<'a>(&'a [Vec<String>]);

impl fmt::Display for CycleList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, cycle) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&cycle.join(" -> "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

pub fn validate_graph(nodes: &[GraphNode], edges: &[GraphEdge]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if nodes.is_empty() {
        errors.push(ValidationError::EmptyGraph);
        return ValidationReport {
            is_valid: false,
            errors,
            warnings,
        };
    }

    let mut ids: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut duplicates: Vec<String> = Vec::new();
    for node in nodes {
        if !ids.insert(node.id.as_str()) && !duplicates.contains(&node.id) {
            duplicates.push(node.id.clone());
        }
    }
    if !duplicates.is_empty() {
        errors.push(ValidationError::DuplicateIds(duplicates));
    }

    let dangling = edges
        .iter()
        .filter(|edge| !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()))
        .count();
    if dangling > 0 {
        warnings.push(ValidationWarning::DanglingEdges(dangling));
    }

    let self_loops = edges.iter().filter(|edge| edge.is_self_loop()).count();
    if self_loops > 0 {
        warnings.push(ValidationWarning::SelfLoops(self_loops));
    }

    let cycles = detect_cycles(nodes, edges);
    if !cycles.is_empty() {
        warnings.push(ValidationWarning::Cycles(cycles));
    }

    let disconnected: Vec<String> = disconnected_nodes(nodes, edges)
        .into_iter()
        .map(|node| node.id.clone())
        .collect();
    if !disconnected.is_empty() {
        warnings.push(ValidationWarning::Disconnected(disconnected));
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Adjacency in node order, restricted to edges between known nodes.
fn adjacency<'a>(nodes: &'a [GraphNode], edges: &'a [GraphEdge]) -> (Vec<&'a str>, HashMap<&'a str, Vec<&'a str>>) {
    let mut order: Vec<&str> = Vec::with_capacity(nodes.len());
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if !graph.contains_key(node.id.as_str()) {
            order.push(node.id.as_str());
            graph.insert(node.id.as_str(), Vec::new());
        }
    }
    for edge in edges {
        if !graph.contains_key(edge.target.as_str()) {
            continue;
        }
        if let Some(out) = graph.get_mut(edge.source.as_str()) {
            out.push(edge.target.as_str());
        }
    }
    (order, graph)
}

/// Finds cycles with an iterative depth-first search.
///
/// Every unvisited node starts a walk. Reaching a node that is still on the
/// current path closes a cycle, reported as the path from that node back to
/// itself (`[a, b, a]`). Finished nodes are never re-entered.
pub fn detect_cycles(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<Vec<String>> {
    let (order, graph) = adjacency(nodes, edges);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for &root in &order {
        if visited.contains(root) {
            continue;
        }
        let mut path: Vec<&str> = vec![root];
        let mut cursor: Vec<usize> = vec![0];
        visited.insert(root);
        on_path.insert(root);

        while let Some(&current) = path.last() {
            let depth = path.len() - 1;
            let neighbors = &graph[current];
            let Some(&next) = neighbors.get(cursor[depth]) else {
                on_path.remove(current);
                path.pop();
                cursor.pop();
                continue;
            };
            cursor[depth] += 1;

            if on_path.contains(next) {
                if let Some(start) = path.iter().position(|id| *id == next) {
                    let mut cycle: Vec<String> = path[start..].iter().map(|id| id.to_string()).collect();
                    cycle.push(next.to_string());
                    cycles.push(cycle);
                }
                continue;
            }
            if visited.insert(next) {
                on_path.insert(next);
                path.push(next);
                cursor.push(0);
            }
        }
    }
    cycles
}

/// Nodes without incoming edges from known nodes.
pub fn source_nodes<'a>(nodes: &'a [GraphNode], edges: &[GraphEdge]) -> Vec<&'a GraphNode> {
    let ids: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let targets: HashSet<&str> = edges
        .iter()
        .filter(|edge| ids.contains(edge.source.as_str()))
        .map(|edge| edge.target.as_str())
        .collect();
    nodes
        .iter()
        .filter(|node| !targets.contains(node.id.as_str()))
        .collect()
}

/// Nodes that no edge touches.
pub fn disconnected_nodes<'a>(nodes: &'a [GraphNode], edges: &[GraphEdge]) -> Vec<&'a GraphNode> {
    let ids: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let mut connected: HashSet<&str> = HashSet::new();
    for edge in edges {
        if ids.contains(edge.source.as_str()) {
            connected.insert(edge.source.as_str());
        }
        if ids.contains(edge.target.as_str()) {
            connected.insert(edge.target.as_str());
        }
    }
    nodes
        .iter()
        .filter(|node| !connected.contains(node.id.as_str()))
        .collect()
}

/// Generation index per node (Kahn's algorithm). Nodes stuck in cycles land on 0.
pub fn node_layers(nodes: &[GraphNode], edges: &[GraphEdge]) -> HashMap<String, usize> {
    let (order, graph) = adjacency(nodes, edges);
    let mut in_degree: HashMap<&str, usize> = order.iter().map(|id| (*id, 0)).collect();
    for targets in graph.values() {
        for target in targets {
            if let Some(count) = in_degree.get_mut(target) {
                *count += 1;
            }
        }
    }

    let mut layers: HashMap<String, usize> = HashMap::with_capacity(order.len());
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    for &id in &order {
        if in_degree[id] == 0 {
            queue.push_back((id, 0));
            layers.insert(id.to_string(), 0);
        }
    }
    while let Some((id, layer)) = queue.pop_front() {
        for &next in &graph[id] {
            let Some(count) = in_degree.get_mut(next) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count == 0 {
                layers.insert(next.to_string(), layer + 1);
                queue.push_back((next, layer + 1));
            }
        }
    }
    for id in order {
        layers.entry(id.to_string()).or_insert(0);
    }
    layers
}
