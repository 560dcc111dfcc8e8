//! Parent/child hierarchy assembly for tasks and reporting lines.
//!
//! Turns a flat list of records that each carry an optional parent reference
//! into a forest of owned [`HierarchyNode`]s, and walks that forest depth-first.
//!
//! Upstream data is not guaranteed to be a tree. The assembler degrades
//! silently instead of failing:
//! - a parent reference that matches no record makes the record a root
//! - every record lying on a parent cycle becomes a root
//! - duplicate ids keep their first occurrence
//!
//! [`validate`] reports the same anomalies explicitly for callers that want to
//! surface data-integrity problems.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A record that may reference a parent record.
pub trait HierarchyItem {
    /// Unique identifier.
    fn id(&self) -> &str;

    /// Identifier of the parent record, if any.
    fn parent_id(&self) -> Option<&str>;
}

/// A record together with the records nested directly under it.
///
/// Children are owned exclusively by their parent and kept in input order.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyNode<T> {
    pub item: T,
    pub children: Vec<HierarchyNode<T>>,
}

impl<T: HierarchyItem> HierarchyNode<T> {
    /// Create a node with no children.
    pub fn new(item: T) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.item.id()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes below this one (not counting itself).
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&HierarchyNode<T>> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Keep the first record for each id.
///
/// Returns the surviving records and the ids that were dropped.
fn dedup_by_id<T: HierarchyItem>(items: impl IntoIterator<Item = T>) -> (Vec<T>, Vec<String>) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for item in items {
        if seen.insert(item.id().to_string()) {
            kept.push(item);
        } else {
            dropped.push(item.id().to_string());
        }
    }
    (kept, dropped)
}

/// Resolve every parent reference to an index into `items`.
fn resolve_parents<T: HierarchyItem>(items: &[T]) -> Vec<Option<usize>> {
    let index: HashMap<&str, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id(), i))
        .collect();
    items
        .iter()
        .map(|item| item.parent_id().and_then(|p| index.get(p).copied()))
        .collect()
}

/// Find every cycle in the parent graph.
///
/// Each record has at most one parent, so the graph is functional and each
/// walk either ends at a root or runs into exactly one cycle. Cycles are
/// returned in discovery order, members listed from the first one reached.
fn find_cycles(parents: &[Option<usize>]) -> Vec<Vec<usize>> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parents.len()];
    let mut cycles = Vec::new();

    for start in 0..parents.len() {
        if state[start] != UNSEEN {
            continue;
        }

        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match state[i] {
                UNSEEN => {
                    state[i] = ON_PATH;
                    path.push(i);
                    current = parents[i];
                }
                ON_PATH => {
                    // The walk closed on itself: everything from `i` onward is a cycle
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        cycles.push(path[pos..].to_vec());
                    }
                    break;
                }
                _ => break,
            }
        }

        for i in path {
            state[i] = DONE;
        }
    }

    cycles
}

/// Assemble a forest from a flat list of records.
///
/// A record is nested under its parent when the parent reference resolves to
/// another record in the input and the record is not part of a parent cycle.
/// Everything else becomes a root. Roots and siblings keep input order.
pub fn build_forest<T: HierarchyItem>(items: impl IntoIterator<Item = T>) -> Vec<HierarchyNode<T>> {
    let (items, dropped) = dedup_by_id(items);
    if !dropped.is_empty() {
        tracing::debug!(?dropped, "dropped records with duplicate ids");
    }

    let mut parents = resolve_parents(&items);
    for cycle in find_cycles(&parents) {
        tracing::debug!(len = cycle.len(), "detaching parent cycle");
        for i in cycle {
            parents[i] = None;
        }
    }

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    // Pre-order over the index tree; building in reverse guarantees every
    // child is finished before its parent claims it.
    let mut order = Vec::with_capacity(items.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev().copied());
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut built: Vec<Option<HierarchyNode<T>>> = (0..slots.len()).map(|_| None).collect();
    for &i in order.iter().rev() {
        let Some(item) = slots[i].take() else {
            continue;
        };
        let kids = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(HierarchyNode {
            item,
            children: kids,
        });
    }

    roots.iter().filter_map(|&r| built[r].take()).collect()
}

/// Lazy depth-first, pre-order traversal over a forest.
///
/// Yields `(node, depth)` with roots at depth 0. A node whose id was already
/// visited during this traversal is skipped together with its subtree, so the
/// walk terminates and never repeats an id even over hand-built forests that
/// share or duplicate nodes.
pub struct Traverse<'a, T> {
    stack: Vec<(&'a HierarchyNode<T>, usize)>,
    visited: HashSet<&'a str>,
}

impl<'a, T: HierarchyItem> Iterator for Traverse<'a, T> {
    type Item = (&'a HierarchyNode<T>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, depth) = self.stack.pop()?;
            if !self.visited.insert(node.id()) {
                continue;
            }
            self.stack
                .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
            return Some((node, depth));
        }
    }
}

/// Start a traversal. Each call owns a fresh visited set, so traversals are
/// restartable and independent of each other.
pub fn traverse<T: HierarchyItem>(forest: &[HierarchyNode<T>]) -> Traverse<'_, T> {
    Traverse {
        stack: forest.iter().rev().map(|root| (root, 0)).collect(),
        visited: HashSet::new(),
    }
}

/// Invoke `render` once per visited node, in traversal order.
pub fn walk<T, F>(forest: &[HierarchyNode<T>], mut render: F)
where
    T: HierarchyItem,
    F: FnMut(&HierarchyNode<T>, usize),
{
    for (node, depth) in traverse(forest) {
        render(node, depth);
    }
}

/// A data-integrity problem in a parent-referencing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyAnomaly {
    /// The id appeared more than once; only the first record is used.
    DuplicateId { id: String },
    /// The record names itself as its parent.
    SelfParent { id: String },
    /// The parent reference matches no record.
    OrphanedParent { id: String, parent_id: String },
    /// The records reference each other in a loop.
    Cycle { ids: Vec<String> },
}

impl fmt::Display for HierarchyAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyAnomaly::DuplicateId { id } => write!(f, "duplicate id {}", id),
            HierarchyAnomaly::SelfParent { id } => write!(f, "{} is its own parent", id),
            HierarchyAnomaly::OrphanedParent { id, parent_id } => {
                write!(f, "{} references missing parent {}", id, parent_id)
            }
            HierarchyAnomaly::Cycle { ids } => write!(f, "parent cycle {}", ids.join(" -> ")),
        }
    }
}

/// Report every anomaly [`build_forest`] would silently absorb.
///
/// Anomalies are listed in the order: duplicates, then per-record problems in
/// input order, then cycles.
pub fn validate<T: HierarchyItem>(items: &[T]) -> Vec<HierarchyAnomaly> {
    let mut anomalies = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique: Vec<&T> = Vec::new();
    for item in items {
        if seen.insert(item.id()) {
            unique.push(item);
        } else {
            anomalies.push(HierarchyAnomaly::DuplicateId {
                id: item.id().to_string(),
            });
        }
    }

    for item in &unique {
        match item.parent_id() {
            Some(parent) if parent == item.id() => anomalies.push(HierarchyAnomaly::SelfParent {
                id: item.id().to_string(),
            }),
            Some(parent) if !seen.contains(parent) => {
                anomalies.push(HierarchyAnomaly::OrphanedParent {
                    id: item.id().to_string(),
                    parent_id: parent.to_string(),
                })
            }
            _ => {}
        }
    }

    let parents = resolve_parents(&unique);
    for cycle in find_cycles(&parents) {
        // Self-parents are already reported above
        if cycle.len() > 1 {
            anomalies.push(HierarchyAnomaly::Cycle {
                ids: cycle.iter().map(|&i| unique[i].id().to_string()).collect(),
            });
        }
    }

    anomalies
}

impl<T: HierarchyItem> HierarchyItem for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn parent_id(&self) -> Option<&str> {
        (**self).parent_id()
    }
}
