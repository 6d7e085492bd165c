//! Per-step context tracking.
//!
//! While a path expression is evaluated step by step, every selected node
//! remembers which node of the previous step it was reached from. Each
//! remembered pairing is a [`ContextItem`]: the id of the step that recorded
//! it plus a snapshot of the context node. The snapshots are shared through
//! `Arc`, so copying a chain never deep-copies nodes and a chain can never
//! refer back to its owner.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::model::NodeHandle;
use crate::node_ref::NodeRef;

/// Id of the evaluation step that records context entries.
///
/// Non-negative values are step ids. [`ContextId::IGNORE`] leaves chains
/// alone; every other negative value behaves like [`ContextId::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub i32);

impl ContextId {
    /// No tracking requested: selected nodes inherit the upstream chain as is.
    pub const NONE: Self = Self(-1);
    /// Leave contexts untouched.
    pub const IGNORE: Self = Self(-2);

    /// True for a real step id.
    pub fn is_tracked(self) -> bool {
        self.0 >= 0
    }

    pub fn is_ignored(self) -> bool {
        self == Self::IGNORE
    }
}

#[derive(Debug, Clone)]
pub struct ContextItem {
    context_id: ContextId,
    node: Arc<NodeRef>,
}

impl ContextItem {
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn shared_node(&self) -> &Arc<NodeRef> {
        &self.node
    }
}

/// Ordered context entries of one node, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ContextChain {
    items: SmallVec<[ContextItem; 1]>,
}

impl ContextChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextItem> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&ContextItem> {
        self.items.first()
    }

    /// True if an entry for the same step and node is already present.
    pub fn contains(&self, context_id: ContextId, node: &NodeRef) -> bool {
        self.items.iter().any(|item| item.context_id == context_id && item.node.is_same_node(node))
    }

    /// Appends an entry unless an equal one exists. Returns whether it was added.
    pub fn push(&mut self, context_id: ContextId, node: Arc<NodeRef>) -> bool {
        if self.contains(context_id, &node) {
            return false;
        }
        self.items.push(ContextItem { context_id, node });
        true
    }

    /// Appends every entry of `other` that is not already present.
    pub fn extend_from(&mut self, other: &ContextChain) {
        for item in &other.items {
            self.push(item.context_id, Arc::clone(&item.node));
        }
    }

    /// Drops the entries recorded by `context_id`; [`ContextId::IGNORE`]
    /// drops everything.
    pub fn clear_step(&mut self, context_id: ContextId) {
        if context_id.is_ignored() {
            self.items.clear();
        } else {
            self.items.retain(|item| item.context_id != context_id);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Context nodes recorded by `context_id`.
    pub fn nodes_for(&self, context_id: ContextId) -> impl Iterator<Item = &Arc<NodeRef>> {
        self.items.iter().filter(move |item| item.context_id == context_id).map(|item| &item.node)
    }
}

impl<'a> IntoIterator for &'a ContextChain {
    type Item = &'a ContextItem;
    type IntoIter = core::slice::Iter<'a, ContextItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
