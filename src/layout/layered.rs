use std::collections::HashSet;
use std::time::Instant;

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use super::{LayoutError, LayoutResult, run_guarded};
use crate::config::LayoutOptions;
use crate::geometry::POSITION_LIMIT;
use crate::graph::{GraphEdge, GraphNode};
use crate::ir::Direction;
use crate::validate::{node_layers, validate_graph};

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopDown => "tb",
        Direction::BottomTop => "bt",
        Direction::LeftRight => "lr",
        Direction::RightLeft => "rl",
    }
}

/// Rank-based layout through dagre.
///
/// Dagre reports node centers; the result carries top-left corners shifted
/// by the configured margins.
pub fn layout_layered(nodes: &[GraphNode], edges: &[GraphEdge], options: &LayoutOptions) -> LayoutResult {
    let started = Instant::now();
    run_guarded("layered", nodes, started, || {
        let validation = validate_graph(nodes, edges);
        if !validation.is_valid {
            return Err((LayoutError::Validation(validation.errors), validation.warnings));
        }
        if ranks_exceed_position_limit(nodes, edges, options) {
            return Err((LayoutError::InvalidPositions, validation.warnings));
        }
        let placed = assign_positions_dagre(nodes, edges, options)
            .ok_or((LayoutError::NoNodes, Vec::new()))?;
        Ok((placed, validation.warnings))
    })
}

/// True when the longest parent chain is certain to push nodes past
/// [`POSITION_LIMIT`].
///
/// Every rank advances by at least the smallest node extent plus the layer
/// gap, so this only rejects graphs whose layout would fail the final bounds
/// check anyway. Dagre walks ranks recursively and such chains can exhaust
/// the stack before that check is reached.
fn ranks_exceed_position_limit(nodes: &[GraphNode], edges: &[GraphEdge], options: &LayoutOptions) -> bool {
    let Some(longest) = node_layers(nodes, edges).into_values().max() else {
        return false;
    };
    let table = options.node_dimensions();
    let horizontal = options.direction.is_horizontal();
    let min_extent = nodes
        .iter()
        .map(|node| {
            let size = table.of(&node.kind);
            if horizontal { size.width } else { size.height }
        })
        .fold(f32::INFINITY, f32::min)
        .max(0.0);
    let margin = if horizontal { options.margin_x } else { options.margin_y };
    let reach = margin + longest as f32 * (min_extent + options.layer_spacing.max(0.0));
    reach > POSITION_LIMIT
}

fn assign_positions_dagre(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    options: &LayoutOptions,
) -> Option<Vec<GraphNode>> {
    if nodes.is_empty() {
        return None;
    }
    let table = options.node_dimensions();

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(options.direction).to_string());
    graph_config.nodesep = Some(options.node_spacing);
    graph_config.ranksep = Some(options.layer_spacing);
    graph_config.marginx = Some(options.margin_x);
    graph_config.marginy = Some(options.margin_y);
    dagre_graph.set_graph(graph_config);

    let mut node_set: HashSet<String> = HashSet::with_capacity(nodes.len());
    for graph_node in nodes {
        let size = table.of(&graph_node.kind);
        let mut node = DagreNode::default();
        node.width = size.width;
        node.height = size.height;
        dagre_graph.set_node(graph_node.id.clone(), Some(node));
        node_set.insert(graph_node.id.clone());
    }

    // Self loops and dangling edges were reported by validation; dagre gets neither.
    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for edge in edges {
        if edge.is_self_loop() || !node_set.contains(&edge.source) || !node_set.contains(&edge.target) {
            continue;
        }
        let from = edge.source.clone();
        let to = edge.target.clone();
        if !edge_set.insert((from.clone(), to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&from, &to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let placed = nodes
        .iter()
        .map(|graph_node| {
            let mut placed = graph_node.clone();
            if let Some(dagre_node) = dagre_graph.node(&graph_node.id) {
                let size = table.of(&graph_node.kind);
                placed.position.x = dagre_node.x - size.width / 2.0 + options.margin_x;
                placed.position.y = dagre_node.y - size.height / 2.0 + options.margin_y;
            }
            placed
        })
        .collect();
    Some(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CollapseSet, build_graph};
    use crate::ir::{FamilyDataset, Person};
    use crate::validate::ValidationWarning;

    fn three_generations() -> FamilyDataset {
        FamilyDataset::new(
            vec![
                Person::new("gp", "Grandpa").with_spouse("gm"),
                Person::new("gm", "Grandma").with_spouse("gp"),
                Person::new("dad", "Dad").with_parents(["gp", "gm"]),
                Person::new("aunt", "Aunt").with_parents(["gp", "gm"]),
                Person::new("kid", "Kid").with_parents(["dad"]),
            ],
            Direction::TopDown,
        )
    }

    #[test]
    fn generations_flow_along_direction() {
        let graph = build_graph(&three_generations(), &CollapseSet::new());
        let options = LayoutOptions::default().with_direction(Direction::TopDown);
        let result = layout_layered(&graph.nodes, &graph.edges, &options);
        assert!(result.success, "{:?}", result.error);
        let couple = result.node("couple-gp-gm").unwrap();
        let dad = result.node("dad").unwrap();
        let kid = result.node("kid").unwrap();
        assert!(dad.position.y > couple.position.y);
        assert!(kid.position.y > dad.position.y);

        let options = options.with_direction(Direction::LeftRight);
        let result = layout_layered(&graph.nodes, &graph.edges, &options);
        assert!(result.success);
        assert!(result.node("kid").unwrap().position.x > result.node("dad").unwrap().position.x);
    }

    #[test]
    fn same_input_same_coordinates() {
        let graph = build_graph(&three_generations(), &CollapseSet::new());
        let options = LayoutOptions::default();
        let first = layout_layered(&graph.nodes, &graph.edges, &options);
        let second = layout_layered(&graph.nodes, &graph.edges, &options);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn empty_input_fails_with_validation_error() {
        let result = layout_layered(&[], &[], &LayoutOptions::default());
        assert!(!result.success);
        assert!(result.nodes.is_empty());
        assert!(matches!(result.error, Some(LayoutError::Validation(_))));
    }

    #[test]
    fn duplicate_ids_return_unplaced_nodes() {
        let nodes = vec![
            GraphNode::single(Person::new("a", "A")).with_position(1.0, 2.0),
            GraphNode::single(Person::new("a", "A again")),
        ];
        let edges = vec![GraphEdge::parent("a", "a"), GraphEdge::parent("a", "ghost")];
        let result = layout_layered(&nodes, &edges, &LayoutOptions::default());
        assert!(!result.success);
        assert_eq!(result.nodes, nodes);
        assert!(result
            .error
            .unwrap()
            .to_string()
            .starts_with("Layout validation failed: Duplicate node IDs found"));
        assert!(result.warnings.contains(&ValidationWarning::SelfLoops(1)));
        assert!(result.warnings.contains(&ValidationWarning::DanglingEdges(1)));
    }

    #[test]
    fn long_lines_of_descent_fail_before_reaching_dagre() {
        let count = 1_500;
        let nodes: Vec<GraphNode> = (0..count)
            .map(|i| GraphNode::single(Person::new(format!("n{i}"), format!("N{i}"))))
            .collect();
        let mut edges: Vec<GraphEdge> = (1..count)
            .map(|i| GraphEdge::parent(format!("n{}", i - 1), format!("n{i}")))
            .collect();
        edges.push(GraphEdge::parent("n0", "missing"));

        for direction in [Direction::TopDown, Direction::LeftRight] {
            let options = LayoutOptions::default().with_direction(direction);
            let result = layout_layered(&nodes, &edges, &options);
            assert!(!result.success);
            assert_eq!(result.error, Some(LayoutError::InvalidPositions));
            assert_eq!(result.nodes, nodes);
            assert!(result.warnings.contains(&ValidationWarning::DanglingEdges(1)));
        }
    }

    #[test]
    fn depth_guard_only_rejects_unreachable_layouts() {
        let options = LayoutOptions::default().with_direction(Direction::TopDown);
        let graph = build_graph(&three_generations(), &CollapseSet::new());
        assert!(!ranks_exceed_position_limit(&graph.nodes, &graph.edges, &options));
        assert!(!ranks_exceed_position_limit(&[], &[], &options));
    }

    #[test]
    fn cycles_warn_but_never_throw() {
        let nodes = vec![
            GraphNode::single(Person::new("X", "X")),
            GraphNode::single(Person::new("Y", "Y")),
        ];
        let edges = vec![GraphEdge::parent("X", "Y"), GraphEdge::parent("Y", "X")];
        let result = layout_layered(&nodes, &edges, &LayoutOptions::default());
        assert!(result
            .warnings
            .iter()
            .any(|warning| matches!(warning, ValidationWarning::Cycles(_))));
        assert_eq!(result.nodes.len(), 2);
    }

    #[test]
    fn couples_use_direction_specific_boxes() {
        let graph = build_graph(&three_generations(), &CollapseSet::new());
        let options = LayoutOptions::default().with_direction(Direction::TopDown);
        let result = layout_layered(&graph.nodes, &graph.edges, &options);
        let couple = result.node("couple-gp-gm").unwrap();
        let dad = result.node("dad").unwrap();
        let aunt = result.node("aunt").unwrap();
        // siblings share a rank and may not overlap horizontally
        assert!((dad.position.y - aunt.position.y).abs() < 0.5);
        let (left, right) = if dad.position.x < aunt.position.x { (dad, aunt) } else { (aunt, dad) };
        assert!(right.position.x - left.position.x >= 164.0);
        assert!(couple.position.x.is_finite());
    }
}
