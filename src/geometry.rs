//! Stateless helpers over positioned nodes.

use serde::Serialize;

use crate::config::KindDimensions;
use crate::graph::GraphNode;

/// Coordinates past this magnitude are treated as a broken layout.
pub const POSITION_LIMIT: f32 = 10_000.0;

/// Nodes closer than this on y share a row in [`apply_minimum_spacing`].
const SAME_ROW_THRESHOLD: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn bounding_box(nodes: &[GraphNode], table: &KindDimensions) -> BoundingBox {
    if nodes.is_empty() {
        return BoundingBox::default();
    }
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for node in nodes {
        let size = table.of(&node.kind);
        min_x = min_x.min(node.position.x);
        min_y = min_y.min(node.position.y);
        max_x = max_x.max(node.position.x + size.width);
        max_y = max_y.max(node.position.y + size.height);
    }
    BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Translates every node by the same delta so the set is centered in the area.
pub fn center_in_area(
    nodes: &[GraphNode],
    table: &KindDimensions,
    area_width: f32,
    area_height: f32,
    offset: (f32, f32),
) -> Vec<GraphNode> {
    let bounds = bounding_box(nodes, table);
    let target_x = (area_width - bounds.width) / 2.0 + offset.0;
    let target_y = (area_height - bounds.height) / 2.0 + offset.1;
    let dx = target_x - bounds.min_x;
    let dy = target_y - bounds.min_y;
    nodes
        .iter()
        .map(|node| {
            let mut moved = node.clone();
            moved.position.x += dx;
            moved.position.y += dy;
            moved
        })
        .collect()
}

/// Pushes nodes right when they crowd their row predecessor.
///
/// Nodes are visited row by row, left to right, and only the previous node in
/// that order is checked, so rows of mixed heights can still overlap
/// vertically. Output keeps the input order.
pub fn apply_minimum_spacing(
    nodes: &[GraphNode],
    table: &KindDimensions,
    min_spacing_x: f32,
    min_spacing_y: f32,
) -> Vec<GraphNode> {
    let order = row_major_order(nodes);

    let mut adjusted: Vec<GraphNode> = nodes.to_vec();
    for pair in order.windows(2) {
        let (prev_idx, idx) = (pair[0], pair[1]);
        let prev = adjusted[prev_idx].position;
        let prev_size = table.of(&adjusted[prev_idx].kind);
        let current = adjusted[idx].position;
        let current_size = table.of(&adjusted[idx].kind);

        let horizontal_overlap = prev.x + prev_size.width + min_spacing_x > current.x;
        let vertical_overlap =
            (current.y - prev.y).abs() < current_size.height.max(prev_size.height) + min_spacing_y;
        if horizontal_overlap && vertical_overlap {
            adjusted[idx].position.x = prev.x + prev_size.width + min_spacing_x;
        }
    }
    adjusted
}

/// Sorts by y, groups nodes within [`SAME_ROW_THRESHOLD`] of a row's first
/// node, then sorts each row by x.
fn row_major_order(nodes: &[GraphNode]) -> Vec<usize> {
    let by_coord = |a: f32, b: f32| a.total_cmp(&b);
    let mut by_y: Vec<usize> = (0..nodes.len()).collect();
    by_y.sort_by(|&a, &b| by_coord(nodes[a].position.y, nodes[b].position.y));

    let mut order = Vec::with_capacity(nodes.len());
    let mut row: Vec<usize> = Vec::new();
    let mut row_y = 0.0_f32;
    for idx in by_y {
        let y = nodes[idx].position.y;
        if !row.is_empty() && (y - row_y).abs() >= SAME_ROW_THRESHOLD {
            row.sort_by(|&a, &b| by_coord(nodes[a].position.x, nodes[b].position.x));
            order.append(&mut row);
        }
        if row.is_empty() {
            row_y = y;
        }
        row.push(idx);
    }
    row.sort_by(|&a, &b| by_coord(nodes[a].position.x, nodes[b].position.x));
    order.append(&mut row);
    order
}

/// Every coordinate is finite and within [`POSITION_LIMIT`].
pub fn positions_in_bounds(nodes: &[GraphNode]) -> bool {
    nodes.iter().all(|node| {
        let (x, y) = (node.position.x, node.position.y);
        x.is_finite() && y.is_finite() && x.abs() <= POSITION_LIMIT && y.abs() <= POSITION_LIMIT
    })
}
