//! Coordinate assignment for a built family graph.
//!
//! Both strategies take nodes and edges by reference and return a fresh
//! [`LayoutResult`]. Errors never escape: validation failures, missing roots,
//! out-of-range coordinates and panics inside the placement code all come back
//! as a failed result carrying the original, unplaced nodes.

mod error;
mod layered;
mod tree;
pub(crate) mod types;

pub use error::LayoutError;
pub use layered::layout_layered;
pub use tree::layout_tree;
pub use types::*;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::LayoutOptions;
use crate::geometry::positions_in_bounds;
use crate::graph::{GraphEdge, GraphNode};
use crate::validate::ValidationWarning;
use error::panic_message;

pub fn compute_layout(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    options: &LayoutOptions,
    strategy: LayoutStrategy,
) -> LayoutResult {
    match strategy {
        LayoutStrategy::Layered => layout_layered(nodes, edges, options),
        LayoutStrategy::Tree => layout_tree(nodes, edges, options),
    }
}

/// Shared tail of both strategies: timing, panic capture and the final
/// coordinate check.
fn run_guarded<F>(
    name: &str,
    nodes: &[GraphNode],
    started: Instant,
    place: F,
) -> LayoutResult
where
    F: FnOnce() -> Result<(Vec<GraphNode>, Vec<ValidationWarning>), (LayoutError, Vec<ValidationWarning>)>,
{
    let outcome = catch_unwind(AssertUnwindSafe(place));
    let result = match outcome {
        Ok(Ok((placed, warnings))) => {
            if positions_in_bounds(&placed) {
                LayoutResult::laid_out(placed, warnings, started.elapsed())
            } else {
                LayoutResult::failed(nodes, LayoutError::InvalidPositions, warnings, started.elapsed())
            }
        }
        Ok(Err((error, warnings))) => LayoutResult::failed(nodes, error, warnings, started.elapsed()),
        Err(payload) => LayoutResult::failed(
            nodes,
            LayoutError::Algorithm(panic_message(payload.as_ref())),
            Vec::new(),
            started.elapsed(),
        ),
    };

    match &result.error {
        Some(error) => warn!(strategy = name, %error, "layout failed"),
        None => debug!(
            strategy = name,
            nodes = result.nodes.len(),
            elapsed_ms = result.execution_ms(),
            "layout finished"
        ),
    }
    for warning in &result.warnings {
        debug!(strategy = name, %warning, "layout warning");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;
    use crate::ir::Person;

    #[test]
    fn guard_turns_panics_into_failures() {
        let nodes = vec![GraphNode::single(Person::new("a", "A")).with_position(3.0, 4.0)];
        let result = run_guarded("test", &nodes, Instant::now(), || panic!("algorithm exploded"));
        assert!(!result.success);
        assert_eq!(
            result.error,
            Some(LayoutError::Algorithm("algorithm exploded".into()))
        );
        assert_eq!(result.nodes, nodes);
    }

    #[test]
    fn guard_rejects_runaway_coordinates() {
        let nodes = vec![GraphNode::single(Person::new("a", "A"))];
        let result = run_guarded("test", &nodes, Instant::now(), || {
            Ok((vec![GraphNode::single(Person::new("a", "A")).with_position(f32::NAN, 0.0)], Vec::new()))
        });
        assert_eq!(result.error, Some(LayoutError::InvalidPositions));
        assert_eq!(result.nodes[0].position.x, 0.0);
    }

    #[test]
    fn strategies_parse_from_tokens() {
        assert_eq!(LayoutStrategy::from_token("Tree"), Some(LayoutStrategy::Tree));
        assert_eq!(LayoutStrategy::from_token("dagre"), Some(LayoutStrategy::Layered));
        assert_eq!(LayoutStrategy::from_token("radial"), None);
    }
}
