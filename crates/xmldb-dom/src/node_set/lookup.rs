//! Membership lookups and the generic structural-join path.
//!
//! The identifier fast path in [`super::axes`] needs a materialized, sorted
//! context set. Anything else that can answer membership questions (a
//! virtual set in particular) implements [`NodeLookup`] and is handled here
//! one candidate at a time.

use std::sync::Arc;

use tracing::debug;

use super::{NodeSet, SelectMode};
use crate::context::ContextId;
use crate::model::DocId;
use crate::node_ref::NodeRef;
use crate::numbering::NodeId;

/// Membership interface of a context set.
pub trait NodeLookup {
    fn is_empty(&self) -> bool;

    /// True when membership is computed lazily instead of stored.
    fn is_virtual(&self) -> bool {
        false
    }

    /// The member `(doc, node_id)`, if present.
    fn lookup(&mut self, doc: DocId, node_id: &NodeId) -> Option<NodeRef>;

    /// Nearest member that is the parent (or any ancestor, without
    /// `direct_parent`) of `node_id`; with `include_self` the node itself counts.
    fn ancestor_of(&mut self, doc: DocId, node_id: &NodeId, direct_parent: bool, include_self: bool) -> Option<NodeRef>;

    fn size_hint_for(&mut self, _doc: DocId) -> Option<usize> {
        None
    }

    /// All members as a concrete sorted set, enumerating them if necessary.
    fn materialize(&mut self) -> &mut NodeSet;
}

impl NodeLookup for NodeSet {
    fn is_empty(&self) -> bool {
        NodeSet::is_empty(self)
    }

    fn lookup(&mut self, doc: DocId, node_id: &NodeId) -> Option<NodeRef> {
        self.get_node(doc, node_id).cloned()
    }

    fn ancestor_of(&mut self, doc: DocId, node_id: &NodeId, direct_parent: bool, include_self: bool) -> Option<NodeRef> {
        self.parent_with_child(doc, node_id, direct_parent, include_self).cloned()
    }

    fn size_hint_for(&mut self, doc: DocId) -> Option<usize> {
        self.size_hint(doc)
    }

    fn materialize(&mut self) -> &mut NodeSet {
        self.sort();
        self
    }
}

/// Gives `target` the context of `source`: the whole chain when no step id
/// is tracked, otherwise `source`'s chain (if `target` has none) plus an
/// entry pointing at `source`.
pub(crate) fn inherit_context(target: &mut NodeRef, source: impl Into<Arc<NodeRef>>, context_id: ContextId) {
    if context_id.is_ignored() {
        return;
    }
    let source = source.into();
    if context_id.is_tracked() {
        target.deep_copy_context(source, context_id);
    } else {
        target.copy_context(&source);
    }
}

/// Records `source` as context node of `target` without inheriting its chain.
pub(crate) fn record_context(target: &mut NodeRef, source: impl Into<Arc<NodeRef>>, context_id: ContextId) {
    if context_id.is_ignored() {
        return;
    }
    let source = source.into();
    if context_id.is_tracked() {
        target.add_context_node(context_id, source);
    } else {
        target.copy_context(&source);
    }
}

/// Parent/child join asking `context` about every candidate's parent.
pub(crate) fn select_parent_child(
    candidates: &mut NodeSet,
    context: &mut dyn NodeLookup,
    mode: SelectMode,
    context_id: ContextId,
) -> NodeSet {
    debug!(?mode, candidates = candidates.nodes.len(), "parent/child join on lazy context set");
    let mut result = NodeSet::sized_for(0);
    candidates.sort();
    let mut last_doc = None;
    for child in &candidates.nodes {
        let hint = first_of_doc(&mut last_doc, child.doc()).then(|| match mode {
            SelectMode::Descendant => candidates.find_doc(child.doc()).map(|range| range.len),
            SelectMode::Ancestor => context.size_hint_for(child.doc()),
        });
        let Some(parent) = context.ancestor_of(child.doc(), child.node_id(), true, false) else {
            continue;
        };
        match mode {
            SelectMode::Descendant => {
                let mut found = child.clone();
                inherit_context(&mut found, parent, context_id);
                result.add_with_hint(found, hint.flatten());
            }
            SelectMode::Ancestor => {
                let mut found = parent;
                inherit_context(&mut found, child.clone(), context_id);
                result.add_with_hint(found, hint.flatten());
            }
        }
    }
    result.merge_duplicates();
    result
}

/// Ancestor/descendant join asking `context` for every ancestor of every
/// candidate, nearest first.
pub(crate) fn select_ancestor_descendant(
    candidates: &mut NodeSet,
    context: &mut dyn NodeLookup,
    mode: SelectMode,
    include_self: bool,
    context_id: ContextId,
) -> NodeSet {
    debug!(?mode, include_self, candidates = candidates.nodes.len(), "ancestor/descendant join on lazy context set");
    let mut result = NodeSet::sized_for(0);
    candidates.sort();
    let mut last_doc = None;
    for descendant in &candidates.nodes {
        let hint = first_of_doc(&mut last_doc, descendant.doc()).then(|| match mode {
            SelectMode::Descendant => candidates.find_doc(descendant.doc()).map(|range| range.len),
            SelectMode::Ancestor => context.size_hint_for(descendant.doc()),
        });
        let ancestors = ancestors_in(context, descendant, include_self);
        match mode {
            SelectMode::Descendant => {
                for ancestor in ancestors {
                    let mut found = descendant.clone();
                    inherit_context(&mut found, ancestor, context_id);
                    result.add_with_hint(found, hint.flatten());
                }
            }
            SelectMode::Ancestor => {
                let source = Arc::new(descendant.clone());
                for mut found in ancestors {
                    inherit_context(&mut found, Arc::clone(&source), context_id);
                    result.add_with_hint(found, hint.flatten());
                }
            }
        }
    }
    result.merge_duplicates();
    result
}

/// Members of `context` that are ancestors of `node` (or `node` itself with
/// `include_self`), in document order.
fn ancestors_in(context: &mut dyn NodeLookup, node: &NodeRef, include_self: bool) -> Vec<NodeRef> {
    let mut found = Vec::new();
    let mut current = context.ancestor_of(node.doc(), node.node_id(), false, include_self);
    while let Some(ancestor) = current {
        current = context.ancestor_of(node.doc(), ancestor.node_id(), false, false);
        found.push(ancestor);
    }
    found.reverse();
    found
}

fn first_of_doc(last_doc: &mut Option<DocId>, doc: DocId) -> bool {
    let first = *last_doc != Some(doc);
    *last_doc = Some(doc);
    first
}
