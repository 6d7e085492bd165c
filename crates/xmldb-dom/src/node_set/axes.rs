//! Structural joins between node sets.
//!
//! All joins sort `self` first. With a materialized context set they run on
//! identifiers alone: for each context node the sorted document range of
//! `self` is binary-searched for the contiguous block holding the node's
//! subtree, which is then walked with [`NodeId::compute_relation`]. Virtual
//! context sets go through the per-candidate path in [`super::lookup`].
//! Every result is merged before it is returned.

use std::collections::HashMap;
use std::sync::Arc;

use super::lookup::{self, NodeLookup, inherit_context, record_context};
use super::NodeSet;
use crate::context::ContextId;
use crate::node_ref::NodeRef;
use crate::numbering::{NodeId, Relation};

/// Which side of a structural join ends up in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Members of `self` related to a context node (the lower side).
    Descendant,
    /// Context nodes related to a member of `self` (the upper side).
    Ancestor,
}

/// Snapshots of context nodes handed to context chains.
///
/// When shared, every match recorded against the same context node points at
/// one `Arc`; otherwise each match gets its own copy.
struct Snapshots {
    shared: bool,
    cache: HashMap<usize, Arc<NodeRef>>,
}

impl Snapshots {
    fn new(copy_matches: bool) -> Self {
        Self { shared: !copy_matches, cache: HashMap::new() }
    }

    fn get(&mut self, key: usize, node: &NodeRef) -> Arc<NodeRef> {
        if self.shared {
            Arc::clone(self.cache.entry(key).or_insert_with(|| Arc::new(node.clone())))
        } else {
            Arc::new(node.clone())
        }
    }
}

impl NodeSet {
    /// Parent/child join. In [`SelectMode::Descendant`] the result holds the
    /// members of `self` whose parent is in `context`; in
    /// [`SelectMode::Ancestor`] it holds the context nodes that are the
    /// parent of a member of `self`.
    pub fn select_parent_child(
        &mut self,
        context: &mut dyn NodeLookup,
        mode: SelectMode,
        context_id: ContextId,
    ) -> NodeSet {
        if NodeSet::is_empty(self) || context.is_empty() {
            return NodeSet::sized_for(0);
        }
        if context.is_virtual() {
            return lookup::select_parent_child(self, context, mode, context_id);
        }
        self.descendants_in_set(context.materialize(), true, false, mode, context_id, true)
    }

    /// Ancestor/descendant join; `include_self` lets a node pair with itself.
    /// `copy_matches` gives every recorded context entry its own snapshot of
    /// the context node instead of one shared snapshot per context node.
    pub fn select_ancestor_descendant(
        &mut self,
        context: &mut dyn NodeLookup,
        mode: SelectMode,
        include_self: bool,
        context_id: ContextId,
        copy_matches: bool,
    ) -> NodeSet {
        if NodeSet::is_empty(self) || context.is_empty() {
            return NodeSet::sized_for(0);
        }
        if context.is_virtual() {
            return lookup::select_ancestor_descendant(self, context, mode, include_self, context_id);
        }
        self.descendants_in_set(context.materialize(), false, include_self, mode, context_id, copy_matches)
    }

    /// For every member of `self`, walks up its identifier one level at a
    /// time and selects the nearest ancestor found in `context`. The selected
    /// ancestor records the member as context node.
    pub fn select_ancestors(&mut self, context: &mut dyn NodeLookup, include_self: bool, context_id: ContextId) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        if NodeSet::is_empty(self) || context.is_empty() {
            return result;
        }
        self.sort();
        for node in &self.nodes {
            if let Some(mut ancestor) = context.ancestor_of(node.doc(), node.node_id(), false, include_self) {
                inherit_context(&mut ancestor, node.clone(), context_id);
                result.add(ancestor);
            }
        }
        result.merge_duplicates();
        result
    }

    pub(crate) fn descendants_in_set(
        &mut self,
        context: &mut NodeSet,
        child_only: bool,
        include_self: bool,
        mode: SelectMode,
        context_id: ContextId,
        copy_matches: bool,
    ) -> NodeSet {
        self.sort();
        context.sort();
        let mut result = NodeSet::sized_for(0);
        let mut snapshots = Snapshots::new(copy_matches);
        for (parent_index, parent) in context.nodes.iter().enumerate() {
            let Some(range) = self.find_doc(parent.doc()) else {
                continue;
            };
            let Some(first) = self.first_in_subtree(range, parent.node_id()) else {
                continue;
            };
            for (offset, node) in self.nodes[first..range.end()].iter().enumerate() {
                let Some(relation) = node.node_id().compute_relation(parent.node_id()) else {
                    break;
                };
                let selected = match relation {
                    Relation::Child => true,
                    Relation::Descendant => !child_only,
                    Relation::Self_ => !child_only && include_self,
                };
                if !selected {
                    continue;
                }
                match mode {
                    SelectMode::Descendant => {
                        let mut found = node.clone();
                        inherit_context(&mut found, snapshots.get(parent_index, parent), context_id);
                        result.add_with_hint(found, Some(range.len));
                    }
                    SelectMode::Ancestor => {
                        let mut found = parent.clone();
                        inherit_context(&mut found, snapshots.get(first + offset, node), context_id);
                        result.add_with_hint(found, Some(1));
                    }
                }
            }
        }
        result.merge_duplicates();
        result
    }

    /// Members of `self` that are preceding siblings of a node in `context`.
    pub fn select_preceding_siblings(&mut self, context: &mut dyn NodeLookup, context_id: ContextId) -> NodeSet {
        self.select_siblings(context, context_id, |candidate, reference| candidate < reference)
    }

    /// Members of `self` that are following siblings of a node in `context`.
    pub fn select_following_siblings(&mut self, context: &mut dyn NodeLookup, context_id: ContextId) -> NodeSet {
        self.select_siblings(context, context_id, |candidate, reference| candidate > reference)
    }

    fn select_siblings(
        &mut self,
        context: &mut dyn NodeLookup,
        context_id: ContextId,
        wanted: impl Fn(&NodeId, &NodeId) -> bool,
    ) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        if NodeSet::is_empty(self) || context.is_empty() {
            return result;
        }
        self.sort();
        for reference in &context.materialize().nodes {
            let Some(parent_id) = reference.node_id().parent() else {
                continue;
            };
            let Some(range) = self.find_doc(reference.doc()) else {
                continue;
            };
            let Some(first) = self.first_in_subtree(range, &parent_id) else {
                continue;
            };
            for node in &self.nodes[first..range.end()] {
                let id = node.node_id();
                if !id.is_descendant_or_self_of(&parent_id) {
                    break;
                }
                if id.is_child_of(&parent_id) && id != reference.node_id() && wanted(id, reference.node_id()) {
                    let mut found = node.clone();
                    record_context(&mut found, reference.clone(), context_id);
                    result.add(found);
                }
            }
        }
        result.merge_duplicates();
        result
    }

    /// Members of `self` on the following axis of a node in `context`. With
    /// `position`, only the n-th following member (1-based) per context node.
    pub fn select_following(
        &mut self,
        context: &mut dyn NodeLookup,
        position: Option<usize>,
        context_id: ContextId,
    ) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        if NodeSet::is_empty(self) || context.is_empty() {
            return result;
        }
        self.sort();
        for reference in &context.materialize().nodes {
            let Some(range) = self.find_doc(reference.doc()) else {
                continue;
            };
            let following = self.nodes[range.range()].iter().filter(|n| n.node_id().after(reference.node_id(), true));
            collect_positional(&mut result, following, reference, position, context_id);
        }
        result.merge_duplicates();
        result
    }

    /// Members of `self` on the preceding axis of a node in `context`,
    /// counted backwards from the context node when `position` is given.
    pub fn select_preceding(
        &mut self,
        context: &mut dyn NodeLookup,
        position: Option<usize>,
        context_id: ContextId,
    ) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        if NodeSet::is_empty(self) || context.is_empty() {
            return result;
        }
        self.sort();
        for reference in &context.materialize().nodes {
            let Some(range) = self.find_doc(reference.doc()) else {
                continue;
            };
            let preceding =
                self.nodes[range.range()].iter().rev().filter(|n| n.node_id().before(reference.node_id(), true));
            collect_positional(&mut result, preceding, reference, position, context_id);
        }
        result.merge_duplicates();
        result
    }
}

fn collect_positional<'a>(
    result: &mut NodeSet,
    candidates: impl Iterator<Item = &'a NodeRef>,
    reference: &NodeRef,
    position: Option<usize>,
    context_id: ContextId,
) {
    let (skip, take) = match position {
        Some(n) => (n.saturating_sub(1), usize::from(n > 0)),
        None => (0, usize::MAX),
    };
    let snapshot = Arc::new(reference.clone());
    for node in candidates.skip(skip).take(take) {
        let mut found = node.clone();
        record_context(&mut found, Arc::clone(&snapshot), context_id);
        result.add(found);
    }
}
