//! Visual graph produced from a family dataset.
//!
//! A [`GraphNode`] wraps either one person or a married pair. Couples are
//! identified by an explicit [`CoupleKey`]; the string node id is derived from
//! it for display and never parsed back.

mod builder;
mod collapse;

pub use builder::*;
pub use collapse::*;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ir::Person;

const COUPLE_PREFIX: &str = "couple-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoupleKey {
    pub first: String,
    pub second: String,
}

impl CoupleKey {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn node_id(&self) -> String {
        format!("{COUPLE_PREFIX}{}-{}", self.first, self.second)
    }

    pub fn contains(&self, person_id: &str) -> bool {
        self.first == person_id || self.second == person_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKey {
    Person { id: String },
    Couple(CoupleKey),
}

impl NodeKey {
    pub fn person(id: impl Into<String>) -> Self {
        Self::Person { id: id.into() }
    }

    pub fn couple(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::Couple(CoupleKey::new(first, second))
    }

    pub fn node_id(&self) -> String {
        match self {
            Self::Person { id } => id.clone(),
            Self::Couple(key) => key.node_id(),
        }
    }

    pub fn person_ids(&self) -> Vec<&str> {
        match self {
            Self::Person { id } => vec![id.as_str()],
            Self::Couple(key) => vec![key.first.as_str(), key.second.as_str()],
        }
    }

    /// Maps a display node id back to a key.
    ///
    /// Person ids may contain `-`, so a couple id is split at every dash and
    /// checked against `members`. A split whose halves name each other as
    /// spouses wins over one where both merely exist.
    pub fn resolve(node_id: &str, members: &[Person]) -> Option<Self> {
        let exists = |id: &str| members.iter().any(|person| person.id == id);
        if exists(node_id) {
            return Some(Self::person(node_id));
        }
        let rest = node_id.strip_prefix(COUPLE_PREFIX)?;

        let mut fallback = None;
        for (idx, _) in rest.match_indices('-') {
            let (first, second) = (&rest[..idx], &rest[idx + 1..]);
            if first.is_empty() || second.is_empty() {
                continue;
            }
            let Some(person) = members.iter().find(|person| person.id == first) else {
                continue;
            };
            if !exists(second) {
                continue;
            }
            if person.spouse_id.as_deref() == Some(second) {
                return Some(Self::couple(first, second));
            }
            if fallback.is_none() {
                fallback = Some(Self::couple(first, second));
            }
        }
        fallback
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Person { person: Person },
    Couple { first: Person, second: Person },
}

impl NodeKind {
    pub fn is_couple(&self) -> bool {
        matches!(self, Self::Couple { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Person { .. } => "person",
            Self::Couple { .. } => "couple",
        }
    }

    pub fn members(&self) -> Vec<&Person> {
        match self {
            Self::Person { person } => vec![person],
            Self::Couple { first, second } => vec![first, second],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which connectors of a node are actually used by some edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectors {
    pub has_children: bool,
    pub has_parents: bool,
    /// Couple members that receive their own parents edge.
    pub parents_of: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Point,
    pub collapsed: bool,
    pub connectors: Connectors,
}

impl GraphNode {
    pub fn single(person: Person) -> Self {
        Self {
            id: person.id.clone(),
            kind: NodeKind::Person { person },
            position: Point::default(),
            collapsed: false,
            connectors: Connectors::default(),
        }
    }

    pub fn couple(first: Person, second: Person) -> Self {
        let id = CoupleKey::new(first.id.clone(), second.id.clone()).node_id();
        Self {
            id,
            kind: NodeKind::Couple { first, second },
            position: Point::default(),
            collapsed: false,
            connectors: Connectors::default(),
        }
    }

    pub fn key(&self) -> NodeKey {
        match &self.kind {
            NodeKind::Person { person } => NodeKey::person(person.id.clone()),
            NodeKind::Couple { first, second } => NodeKey::couple(first.id.clone(), second.id.clone()),
        }
    }

    pub fn contains_person(&self, person_id: &str) -> bool {
        self.kind.members().iter().any(|person| person.id == person_id)
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handle {
    /// Outgoing connector towards children.
    Children,
    /// Incoming connector from parents.
    Parents,
    /// Incoming connector scoped to one member of a couple.
    ParentsOf(String),
    /// Side connector joining partners.
    Spouse,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Children => f.write_str("children"),
            Self::Parents => f.write_str("parents"),
            Self::ParentsOf(id) => write!(f, "parents-{id}"),
            Self::Spouse => f.write_str("spouse"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Parent,
    Spouse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: Handle,
    pub target_handle: Handle,
    pub kind: EdgeKind,
}

impl GraphEdge {
    /// Plain parent-to-child edge with generic connectors.
    pub fn parent(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("edge-{source}-{target}"),
            source,
            target,
            source_handle: Handle::Children,
            target_handle: Handle::Parents,
            kind: EdgeKind::Parent,
        }
    }

    /// Partner edge for callers that keep spouses as separate nodes.
    pub fn spouse(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("spouse-{source}-{target}"),
            source,
            target,
            source_handle: Handle::Spouse,
            target_handle: Handle::Spouse,
            kind: EdgeKind::Spouse,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Output of [`build_graph`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl FamilyGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_of_person(&self, person_id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.contains_person(person_id))
    }

    pub fn couple_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.kind.is_couple()).count()
    }
}
