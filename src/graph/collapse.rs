use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::NodeKey;
use crate::ir::Person;

/// Nodes whose descendants are hidden from the visible graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseSet {
    keys: BTreeSet<NodeKey>,
}

impl CollapseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: NodeKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &NodeKey) -> bool {
        self.keys.remove(key)
    }

    /// Flips the collapsed state of `key` and returns the new state.
    pub fn toggle(&mut self, key: NodeKey) -> bool {
        if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeKey> {
        self.keys.iter()
    }

    /// Person ids the descendant walk starts from.
    pub fn root_person_ids(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = Vec::new();
        for key in &self.keys {
            for id in key.person_ids() {
                if !roots.contains(&id) {
                    roots.push(id);
                }
            }
        }
        roots
    }
}

impl FromIterator<NodeKey> for CollapseSet {
    fn from_iter<T: IntoIterator<Item = NodeKey>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Collects every person hidden below `roots`.
///
/// Walks parent to child breadth first. Each discovered descendant pulls in
/// their spouse, and the spouse is walked too so children from an earlier
/// relationship disappear with the couple. Roots themselves stay visible.
pub fn hidden_people(members: &[Person], roots: &[&str]) -> HashSet<String> {
    let mut hidden: HashSet<String> = HashSet::new();
    if roots.is_empty() {
        return hidden;
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for person in members {
        for parent in &person.parent_ids {
            children
                .entry(parent.as_str())
                .or_default()
                .push(person.id.as_str());
        }
    }
    let spouses: HashMap<&str, &str> = members
        .iter()
        .filter_map(|person| {
            let spouse = person.spouse_id.as_deref()?;
            members
                .iter()
                .any(|candidate| candidate.id == spouse)
                .then_some((person.id.as_str(), spouse))
        })
        .collect();
    let root_set: HashSet<&str> = roots.iter().copied().collect();

    let mut queue: VecDeque<&str> = roots.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        let Some(kids) = children.get(current) else {
            continue;
        };
        for &child in kids {
            if root_set.contains(child) || hidden.contains(child) {
                continue;
            }
            hidden.insert(child.to_string());
            queue.push_back(child);

            if let Some(&spouse) = spouses.get(child)
                && !root_set.contains(spouse)
                && !hidden.contains(spouse)
            {
                hidden.insert(spouse.to_string());
                queue.push_back(spouse);
            }
        }
    }
    hidden
}
