use std::collections::HashMap;
use std::time::Instant;

use super::{LayoutError, LayoutResult, run_guarded};
use crate::config::{KindDimensions, LayoutOptions, NodeDimensions};
use crate::graph::{EdgeKind, GraphEdge, GraphNode};
use crate::ir::Direction;
use crate::validate::validate_graph;

/// Family tree layout with partners placed beside each other.
///
/// Only two orientations are computed natively. Bottom-to-top and
/// right-to-left reuse the top-to-bottom and left-to-right placement and
/// mirror it about the largest extent on the flipped axis.
pub fn layout_tree(nodes: &[GraphNode], edges: &[GraphEdge], options: &LayoutOptions) -> LayoutResult {
    let started = Instant::now();
    run_guarded("tree", nodes, started, || {
        if nodes.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let validation = validate_graph(nodes, edges);
        if !validation.is_valid {
            return Err((LayoutError::Validation(validation.errors), validation.warnings));
        }

        let tree = FlatTree::new(nodes, edges, options.node_dimensions());
        let roots = tree.root_candidates();
        if roots.is_empty() {
            return Err((LayoutError::NoRoot, validation.warnings));
        }

        let spacing = TreeSpacing::from_options(options);
        let positions = tree.place(&roots, &spacing);
        let mut placed: Vec<GraphNode> = nodes
            .iter()
            .zip(positions)
            .map(|(node, (x, y))| node.clone().with_position(x, y))
            .collect();
        mirror_for_direction(&mut placed, &tree.sizes, options.direction);
        Ok((placed, validation.warnings))
    })
}

struct TreeSpacing {
    vertical: bool,
    /// Between siblings that have no children of their own.
    first_degree: f32,
    /// Between subtrees.
    second_degree: f32,
    /// Between a node and its partner.
    next_after: f32,
    /// Between generations.
    layer: f32,
    margin_cross: f32,
    margin_depth: f32,
}

impl TreeSpacing {
    fn from_options(options: &LayoutOptions) -> Self {
        let vertical = !options.direction.is_horizontal();
        let (margin_cross, margin_depth) = if vertical {
            (options.margin_x, options.margin_y)
        } else {
            (options.margin_y, options.margin_x)
        };
        Self {
            vertical,
            first_degree: options.node_spacing,
            second_degree: options.node_spacing * 1.5,
            next_after: options.node_spacing / 2.0,
            layer: options.layer_spacing,
            margin_cross,
            margin_depth,
        }
    }

    fn breadth(&self, size: NodeDimensions) -> f32 {
        if self.vertical { size.width } else { size.height }
    }

    fn depth(&self, size: NodeDimensions) -> f32 {
        if self.vertical { size.height } else { size.width }
    }
}

/// Node indices with explicit children and partner lists.
struct FlatTree {
    sizes: Vec<NodeDimensions>,
    children: Vec<Vec<usize>>,
    partners: Vec<Vec<usize>>,
    has_parent: Vec<bool>,
    is_partner: Vec<bool>,
}

/// Work item of [`FlatTree::claim_tree`].
struct ClaimFrame {
    unit: usize,
    kids: Vec<usize>,
    next: usize,
}

/// A node plus the partners drawn next to it.
struct Unit {
    members: Vec<usize>,
    children: Vec<usize>,
    generation: usize,
    breadth: f32,
    depth: f32,
    span: f32,
}

impl FlatTree {
    fn new(nodes: &[GraphNode], edges: &[GraphEdge], table: &KindDimensions) -> Self {
        let count = nodes.len();
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect();
        let mut tree = Self {
            sizes: nodes.iter().map(|node| table.of(&node.kind)).collect(),
            children: vec![Vec::new(); count],
            partners: vec![Vec::new(); count],
            has_parent: vec![false; count],
            is_partner: vec![false; count],
        };
        for edge in edges {
            let (Some(&from), Some(&to)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            else {
                continue;
            };
            if from == to {
                continue;
            }
            match edge.kind {
                EdgeKind::Parent => {
                    if !tree.children[from].contains(&to) {
                        tree.children[from].push(to);
                    }
                    tree.has_parent[to] = true;
                }
                EdgeKind::Spouse => {
                    if !tree.partners[from].contains(&to) {
                        tree.partners[from].push(to);
                    }
                    tree.is_partner[to] = true;
                }
            }
        }
        tree
    }

    /// Nodes without parents that are not someone's partner, in input order.
    fn root_candidates(&self) -> Vec<usize> {
        (0..self.sizes.len())
            .filter(|&idx| !self.has_parent[idx] && !self.is_partner[idx])
            .collect()
    }

    /// Opens a unit for `root` and its unclaimed partners.
    fn open_unit(
        &self,
        root: usize,
        generation: usize,
        claimed: &mut [bool],
        spacing: &TreeSpacing,
    ) -> Unit {
        claimed[root] = true;
        let mut members = vec![root];
        for &partner in &self.partners[root] {
            if !claimed[partner] {
                claimed[partner] = true;
                members.push(partner);
            }
        }
        let breadth = members
            .iter()
            .map(|&idx| spacing.breadth(self.sizes[idx]))
            .sum::<f32>()
            + spacing.next_after * (members.len() as f32 - 1.0);
        let depth = members
            .iter()
            .map(|&idx| spacing.depth(self.sizes[idx]))
            .fold(0.0_f32, f32::max);
        Unit {
            members,
            children: Vec::new(),
            generation,
            breadth,
            depth,
            span: breadth,
        }
    }

    fn unit_kids(&self, unit: &Unit) -> Vec<usize> {
        unit.members
            .iter()
            .flat_map(|&idx| self.children[idx].iter().copied())
            .collect()
    }

    /// Claims the tree below `root` depth first, in preorder.
    ///
    /// Walks with an explicit stack so a long line of descent cannot exhaust
    /// the thread stack.
    fn claim_tree(
        &self,
        root: usize,
        claimed: &mut [bool],
        units: &mut Vec<Unit>,
        spacing: &TreeSpacing,
    ) -> usize {
        let root_unit = units.len();
        units.push(self.open_unit(root, 0, claimed, spacing));
        let mut stack = vec![ClaimFrame {
            unit: root_unit,
            kids: self.unit_kids(&units[root_unit]),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let parent = frame.unit;
            let kid = frame.kids.get(frame.next).copied();
            frame.next += 1;
            let Some(kid) = kid else {
                stack.pop();
                continue;
            };
            if claimed[kid] {
                continue;
            }
            let generation = units[parent].generation + 1;
            let child = units.len();
            units.push(self.open_unit(kid, generation, claimed, spacing));
            units[parent].children.push(child);
            stack.push(ClaimFrame {
                unit: child,
                kids: self.unit_kids(&units[child]),
                next: 0,
            });
        }
        root_unit
    }

    /// Returns `(x, y)` per node index for the unmirrored orientation.
    fn place(&self, roots: &[usize], spacing: &TreeSpacing) -> Vec<(f32, f32)> {
        let count = self.sizes.len();
        let mut claimed = vec![false; count];
        let mut units: Vec<Unit> = Vec::new();
        let mut top: Vec<usize> = Vec::new();

        // Candidates first, then anything only reachable through a cycle.
        for root in roots.iter().copied().chain(0..count) {
            if !claimed[root] {
                top.push(self.claim_tree(root, &mut claimed, &mut units, spacing));
            }
        }

        // Children are always pushed after their parent, so a reverse sweep
        // sees every subtree before the unit that owns it.
        for idx in (0..units.len()).rev() {
            let total = children_span(&units, &units[idx].children, spacing);
            units[idx].span = units[idx].breadth.max(total);
        }

        let generations = units.iter().map(|unit| unit.generation + 1).max().unwrap_or(0);
        let mut level_depth = vec![0.0_f32; generations];
        for unit in &units {
            level_depth[unit.generation] = level_depth[unit.generation].max(unit.depth);
        }
        let mut level_offset = Vec::with_capacity(generations);
        let mut cursor = spacing.margin_depth;
        for depth in &level_depth {
            level_offset.push(cursor);
            cursor += depth + spacing.layer;
        }

        let mut cross = vec![0.0_f32; count];
        let mut along = vec![0.0_f32; count];
        let mut start = spacing.margin_cross;
        for (pos, &unit) in top.iter().enumerate() {
            self.place_unit(unit, start, &units, &level_offset, spacing, &mut cross, &mut along);
            start += units[unit].span;
            if let Some(&next) = top.get(pos + 1) {
                start += sibling_gap(&units, unit, next, spacing);
            }
        }

        cross
            .into_iter()
            .zip(along)
            .map(|(c, d)| if spacing.vertical { (c, d) } else { (d, c) })
            .collect()
    }

    /// Places `unit_idx` and everything below it, starting at `start` on the
    /// cross axis.
    #[allow(clippy::too_many_arguments)]
    fn place_unit(
        &self,
        unit_idx: usize,
        start: f32,
        units: &[Unit],
        level_offset: &[f32],
        spacing: &TreeSpacing,
        cross: &mut [f32],
        along: &mut [f32],
    ) {
        let mut pending = vec![(unit_idx, start)];
        while let Some((unit_idx, start)) = pending.pop() {
            let unit = &units[unit_idx];
            let center = start + unit.span / 2.0;
            let depth = level_offset[unit.generation];

            let mut cursor = center - unit.breadth / 2.0;
            for &member in &unit.members {
                cross[member] = cursor;
                along[member] = depth;
                cursor += spacing.breadth(self.sizes[member]) + spacing.next_after;
            }

            let mut child_start = center - children_span(units, &unit.children, spacing) / 2.0;
            for (pos, &child) in unit.children.iter().enumerate() {
                pending.push((child, child_start));
                child_start += units[child].span;
                if let Some(&next) = unit.children.get(pos + 1) {
                    child_start += sibling_gap(units, child, next, spacing);
                }
            }
        }
    }
}

fn sibling_gap(units: &[Unit], left: usize, right: usize, spacing: &TreeSpacing) -> f32 {
    if units[left].children.is_empty() && units[right].children.is_empty() {
        spacing.first_degree
    } else {
        spacing.second_degree
    }
}

fn children_span(units: &[Unit], children: &[usize], spacing: &TreeSpacing) -> f32 {
    let mut total = 0.0;
    for (pos, &child) in children.iter().enumerate() {
        total += units[child].span;
        if let Some(&next) = children.get(pos + 1) {
            total += sibling_gap(units, child, next, spacing);
        }
    }
    total
}

fn mirror_for_direction(nodes: &mut [GraphNode], sizes: &[NodeDimensions], direction: Direction) {
    match direction {
        Direction::BottomTop => {
            let max_bottom = nodes
                .iter()
                .zip(sizes)
                .map(|(node, size)| node.position.y + size.height)
                .fold(f32::MIN, f32::max);
            for node in nodes.iter_mut() {
                node.position.y = max_bottom - node.position.y;
            }
        }
        Direction::RightLeft => {
            let max_right = nodes
                .iter()
                .zip(sizes)
                .map(|(node, size)| node.position.x + size.width)
                .fold(f32::MIN, f32::max);
            for node in nodes.iter_mut() {
                node.position.x = max_right - node.position.x;
            }
        }
        Direction::TopDown | Direction::LeftRight => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CollapseSet, build_graph};
    use crate::ir::{FamilyDataset, Person};

    fn family() -> FamilyDataset {
        FamilyDataset::new(
            vec![
                Person::new("gp", "Grandpa").with_spouse("gm"),
                Person::new("gm", "Grandma").with_spouse("gp"),
                Person::new("dad", "Dad").with_parents(["gp"]).with_spouse("mom"),
                Person::new("mom", "Mom").with_spouse("dad"),
                Person::new("aunt", "Aunt").with_parents(["gm"]),
                Person::new("kid1", "Kid 1").with_parents(["dad", "mom"]),
                Person::new("kid2", "Kid 2").with_parents(["mom", "dad"]),
            ],
            Direction::TopDown,
        )
    }

    fn options(direction: Direction) -> LayoutOptions {
        LayoutOptions::default().with_direction(direction)
    }

    #[test]
    fn parents_are_centered_over_children() {
        let graph = build_graph(&family(), &CollapseSet::new());
        let result = layout_tree(&graph.nodes, &graph.edges, &options(Direction::TopDown));
        assert!(result.success, "{:?}", result.error);

        let root = result.node("couple-gp-gm").unwrap();
        let parents = result.node("couple-dad-mom").unwrap();
        let aunt = result.node("aunt").unwrap();
        let kid1 = result.node("kid1").unwrap();
        let kid2 = result.node("kid2").unwrap();

        assert_eq!(root.position.y, 20.0);
        assert_eq!(parents.position.y, aunt.position.y);
        assert_eq!(parents.position.y, 20.0 + 56.0 + 80.0);
        assert_eq!(kid1.position.y, kid2.position.y);
        assert!(kid1.position.y > parents.position.y);

        // kids: 164 + 50 + 164 = 378 wide, couple 312 centered above them
        let kids_center = (kid1.position.x + kid2.position.x + 164.0) / 2.0;
        let couple_center = parents.position.x + 156.0;
        assert!((kids_center - couple_center).abs() < 1e-3);
        assert!(aunt.position.x >= parents.position.x + 312.0);
    }

    #[test]
    fn partner_edges_place_nodes_side_by_side() {
        let nodes = vec![
            GraphNode::single(Person::new("a", "A")),
            GraphNode::single(Person::new("b", "B")),
            GraphNode::single(Person::new("c", "C")),
        ];
        let edges = vec![GraphEdge::spouse("a", "b"), GraphEdge::parent("a", "c")];
        let result = layout_tree(&nodes, &edges, &options(Direction::TopDown));
        assert!(result.success, "{:?}", result.error);
        let a = result.node("a").unwrap();
        let b = result.node("b").unwrap();
        assert_eq!(a.position.y, b.position.y);
        assert_eq!(b.position.x - a.position.x, 164.0 + 25.0);
    }

    #[test]
    fn bottom_top_mirrors_top_down() {
        let graph = build_graph(&family(), &CollapseSet::new());
        let down = layout_tree(&graph.nodes, &graph.edges, &options(Direction::TopDown));
        let up = layout_tree(&graph.nodes, &graph.edges, &options(Direction::BottomTop));
        let table = options(Direction::TopDown).dimensions.vertical;
        let max_y = down
            .nodes
            .iter()
            .map(|node| node.position.y + table.of(&node.kind).height)
            .fold(f32::MIN, f32::max);
        for node in &down.nodes {
            let mirrored = up.node(&node.id).unwrap();
            assert!((mirrored.position.y - (max_y - node.position.y)).abs() < 1e-3);
            assert_eq!(mirrored.position.x, node.position.x);
        }
    }

    #[test]
    fn right_left_mirrors_left_right() {
        let graph = build_graph(&family(), &CollapseSet::new());
        let ltr = layout_tree(&graph.nodes, &graph.edges, &options(Direction::LeftRight));
        let rtl = layout_tree(&graph.nodes, &graph.edges, &options(Direction::RightLeft));
        let table = options(Direction::LeftRight).dimensions.horizontal;
        let max_x = ltr
            .nodes
            .iter()
            .map(|node| node.position.x + table.of(&node.kind).width)
            .fold(f32::MIN, f32::max);
        for node in &ltr.nodes {
            let mirrored = rtl.node(&node.id).unwrap();
            assert!((mirrored.position.x - (max_x - node.position.x)).abs() < 1e-3);
            assert_eq!(mirrored.position.y, node.position.y);
        }
        let kid = ltr.node("kid1").unwrap();
        let parents = ltr.node("couple-dad-mom").unwrap();
        assert!(kid.position.x > parents.position.x);
    }

    #[test]
    fn pure_cycle_has_no_root() {
        let nodes = vec![
            GraphNode::single(Person::new("X", "X")),
            GraphNode::single(Person::new("Y", "Y")),
        ];
        let edges = vec![GraphEdge::parent("X", "Y"), GraphEdge::parent("Y", "X")];
        let result = layout_tree(&nodes, &edges, &options(Direction::TopDown));
        assert!(!result.success);
        assert_eq!(result.error, Some(LayoutError::NoRoot));
        assert_eq!(result.nodes, nodes);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn forests_are_laid_out_side_by_side() {
        let nodes = vec![
            GraphNode::single(Person::new("a", "A")),
            GraphNode::single(Person::new("a1", "A1")),
            GraphNode::single(Person::new("b", "B")),
            GraphNode::single(Person::new("loop1", "L1")),
            GraphNode::single(Person::new("loop2", "L2")),
        ];
        let edges = vec![
            GraphEdge::parent("a", "a1"),
            GraphEdge::parent("loop1", "loop2"),
            GraphEdge::parent("loop2", "loop1"),
        ];
        let result = layout_tree(&nodes, &edges, &options(Direction::TopDown));
        assert!(result.success, "{:?}", result.error);
        let a = result.node("a").unwrap();
        let b = result.node("b").unwrap();
        let loop1 = result.node("loop1").unwrap();
        assert_eq!(a.position.y, b.position.y);
        assert!(b.position.x > a.position.x);
        assert!(loop1.position.x > b.position.x);
        assert!(result.node("loop2").unwrap().position.y > loop1.position.y);
    }

    #[test]
    fn empty_input_is_trivially_laid_out() {
        let result = layout_tree(&[], &[], &options(Direction::TopDown));
        assert!(result.success);
        assert!(result.nodes.is_empty());
    }

    fn chain(count: usize) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let nodes: Vec<GraphNode> = (0..count)
            .map(|i| GraphNode::single(Person::new(format!("n{i}"), format!("N{i}"))))
            .collect();
        let edges = (1..count)
            .map(|i| GraphEdge::parent(format!("n{}", i - 1), format!("n{i}")))
            .collect();
        (nodes, edges)
    }

    #[test]
    fn long_lines_of_descent_fail_without_overflowing() {
        let (nodes, edges) = chain(5_000);
        let result = layout_tree(&nodes, &edges, &options(Direction::TopDown));
        assert!(!result.success);
        assert_eq!(result.error, Some(LayoutError::InvalidPositions));
        assert_eq!(result.nodes, nodes);
    }

    #[test]
    fn short_chains_stack_one_generation_per_node() {
        let (nodes, edges) = chain(10);
        let result = layout_tree(&nodes, &edges, &options(Direction::TopDown));
        assert!(result.success, "{:?}", result.error);
        for i in 1..10 {
            let above = result.node(&format!("n{}", i - 1)).unwrap();
            let below = result.node(&format!("n{i}")).unwrap();
            assert_eq!(below.position.y - above.position.y, 56.0 + 80.0);
            assert_eq!(below.position.x, above.position.x);
        }
    }
}
