use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{CollapseSet, FamilyGraph, GraphEdge, GraphNode, Handle, NodeKey, hidden_people};
use crate::ir::{FamilyDataset, Person};

/// Turns `dataset` into visual nodes and parent edges.
///
/// Partners become one couple node on a first-seen basis in member order.
/// People below a collapsed node are left out. Each child gets one edge from
/// the node holding its first listed parent; the target connector is scoped to
/// the child when the child sits inside a couple.
pub fn build_graph(dataset: &FamilyDataset, collapsed: &CollapseSet) -> FamilyGraph {
    let members = &dataset.members;
    let hidden = hidden_people(members, &collapsed.root_person_ids());

    let by_id: HashMap<&str, &Person> = members
        .iter()
        .map(|person| (person.id.as_str(), person))
        .collect();

    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut node_of: HashMap<&str, usize> = HashMap::new();

    for person in members {
        let id = person.id.as_str();
        if hidden.contains(id) || node_of.contains_key(id) {
            continue;
        }
        let spouse = person
            .spouse_id
            .as_deref()
            .filter(|spouse_id| *spouse_id != id)
            .and_then(|spouse_id| by_id.get(spouse_id).copied())
            .filter(|spouse| {
                !hidden.contains(spouse.id.as_str()) && !node_of.contains_key(spouse.id.as_str())
            });

        let index = nodes.len();
        match spouse {
            Some(spouse) => {
                node_of.insert(id, index);
                node_of.insert(spouse.id.as_str(), index);
                nodes.push(GraphNode::couple(person.clone(), spouse.clone()));
            }
            None => {
                node_of.insert(id, index);
                nodes.push(GraphNode::single(person.clone()));
            }
        }
    }

    // Couples are flagged when collapsed as a pair or through either member.
    for node in &mut nodes {
        node.collapsed = collapsed.contains(&node.key())
            || node
                .kind
                .members()
                .iter()
                .any(|person| collapsed.contains(&NodeKey::person(person.id.clone())));
    }

    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut seen: HashSet<(usize, &str)> = HashSet::new();
    for person in members {
        let id = person.id.as_str();
        if hidden.contains(id) {
            continue;
        }
        let Some(parent_id) = person.first_parent() else {
            continue;
        };
        if let Some(co_parent) = person.parent_ids.get(1)
            && node_of.get(co_parent.as_str()) != node_of.get(parent_id)
        {
            debug!(
                child = id,
                parent = parent_id,
                co_parent = co_parent.as_str(),
                "co-parent is not a partner of the first parent, no edge drawn from them"
            );
        }
        let (Some(&source), Some(&target)) = (node_of.get(parent_id), node_of.get(id)) else {
            continue;
        };
        if !seen.insert((source, id)) {
            continue;
        }

        let target_handle = if nodes[target].kind.is_couple() {
            Handle::ParentsOf(id.to_string())
        } else {
            Handle::Parents
        };

        nodes[source].connectors.has_children = true;
        nodes[target].connectors.has_parents = true;
        if let Handle::ParentsOf(member) = &target_handle {
            nodes[target].connectors.parents_of.insert(member.clone());
        }

        let source_id = nodes[source].id.clone();
        let target_id = nodes[target].id.clone();
        edges.push(GraphEdge {
            id: format!("edge-{source_id}-{id}"),
            source: source_id,
            target: target_id,
            source_handle: Handle::Children,
            target_handle,
            kind: Default::default(),
        });
    }

    debug!(
        members = members.len(),
        hidden = hidden.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        "built family graph"
    );
    FamilyGraph { nodes, edges }
}
