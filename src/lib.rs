#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod validate;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutOptions, load_config};
pub use graph::{CollapseSet, FamilyGraph, GraphEdge, GraphNode, NodeKey, build_graph};
pub use ir::{Direction, FamilyDataset, Person};
pub use layout::{LayoutError, LayoutResult, LayoutStrategy, compute_layout};
pub use validate::{ValidationReport, validate_graph};

/// Builds the visible graph for `dataset` and lays it out in one pass.
pub fn layout_dataset(
    dataset: &FamilyDataset,
    collapsed: &CollapseSet,
    options: &LayoutOptions,
    strategy: LayoutStrategy,
) -> (FamilyGraph, LayoutResult) {
    let graph = build_graph(dataset, collapsed);
    let result = compute_layout(&graph.nodes, &graph.edges, options, strategy);
    (graph, result)
}
