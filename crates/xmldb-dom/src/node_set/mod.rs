//! Document-ordered node sets.
//!
//! A [`NodeSet`] is filled by appending references in any order. It is
//! finalized lazily: the first length query, indexed access, iteration or
//! structural match sorts the backing vector into document order and removes
//! duplicates. While sorted, a per-document range index allows binary
//! searches restricted to one document.

mod axes;
mod iter;
mod lookup;
pub mod order;
mod set_ops;

use core::ops::Range;

use itertools::Itertools;
use tracing::trace;

pub use axes::SelectMode;
pub use iter::NodeSetIter;
pub use lookup::NodeLookup;

use crate::context::ContextId;
use crate::model::{DocId, ItemType, NodeKind};
use crate::node_ref::NodeRef;
use crate::numbering::{NodeId, Relation};
use crate::settings::DomSettings;

/// Slice of the sorted backing vector holding the nodes of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DocumentRange {
    doc: DocId,
    start: usize,
    len: usize,
}

impl DocumentRange {
    fn end(&self) -> usize {
        self.start + self.len
    }

    fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

#[derive(Debug, Clone)]
pub struct NodeSet {
    nodes: Vec<NodeRef>,
    documents: Vec<DocumentRange>,
    is_sorted: bool,
    has_one: bool,
    item_type: ItemType,
    state: u32,
    max_size_hint: usize,
}

impl Default for NodeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeSet {
    pub fn new() -> Self {
        Self::with_settings(&DomSettings::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_settings(&DomSettings::default().with_initial_capacity(capacity))
    }

    /// Result set of a join or set operation: starts at `hint` slots, capped
    /// by the default maximum size hint, and grows from there.
    pub(crate) fn sized_for(hint: usize) -> Self {
        let settings = DomSettings::default();
        Self::with_settings(&settings.with_initial_capacity(hint.min(settings.max_size_hint)))
    }

    pub fn with_settings(settings: &DomSettings) -> Self {
        Self {
            nodes: Vec::with_capacity(settings.initial_capacity),
            documents: Vec::new(),
            is_sorted: false,
            has_one: false,
            item_type: ItemType::Any,
            state: 0,
            max_size_hint: settings.max_size_hint,
        }
    }

    /// Appends a reference without a size hint.
    pub fn add(&mut self, node: NodeRef) {
        self.add_with_hint(node, None);
    }

    /// Appends a reference. `size_hint` is advisory: it sizes the next growth
    /// of the backing vector and is capped by the configured maximum.
    pub fn add_with_hint(&mut self, node: NodeRef, size_hint: Option<usize>) {
        self.has_one = self.has_one_after(&node);
        self.item_type = self.item_type.unify(node.item_type());
        if let Some(hint) = size_hint
            && self.nodes.len() == self.nodes.capacity()
        {
            self.nodes.reserve(hint.clamp(1, self.max_size_hint.max(1)));
        }
        self.nodes.push(node);
        self.is_sorted = false;
        self.state = self.state.wrapping_add(1);
    }

    /// Single update site of the `has_one` flag.
    ///
    /// While sorted the answer is exact. While unsorted only the previous
    /// insertion is compared, which is exact for runs of equal references and
    /// an approximation otherwise.
    fn has_one_after(&self, incoming: &NodeRef) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        if !self.has_one {
            return false;
        }
        if self.is_sorted {
            self.position(incoming.doc(), incoming.node_id()).is_some()
        } else {
            self.nodes.last().is_some_and(|last| last == incoming)
        }
    }

    /// Adds every member of `other`.
    pub fn add_all(&mut self, other: &mut NodeSet) {
        if other.is_empty() {
            return;
        }
        if other.has_one() {
            if let Some(first) = other.item_at(0) {
                self.add(first);
            }
            return;
        }
        let hint = other.nodes.len();
        for node in other.iter() {
            self.add_with_hint(node.clone(), Some(hint));
        }
    }

    /// Sorts into document order and drops duplicates, discarding the
    /// context chains of dropped entries.
    pub fn sort(&mut self) {
        self.sort_with(false);
    }

    /// Sorts into document order and drops duplicates, appending the context
    /// chain of every dropped entry to the surviving one.
    pub fn merge_duplicates(&mut self) {
        self.sort_with(true);
    }

    pub fn sort_with(&mut self, merge_contexts: bool) {
        if self.is_sorted {
            return;
        }
        let before = self.nodes.len();
        if !self.has_one {
            order::sort_in_document_order(&mut self.nodes);
        }
        let removed = order::dedup_in_document_order(&mut self.nodes, |kept, duplicate| {
            if merge_contexts {
                kept.add_context(duplicate);
            }
        });
        self.update_documents();
        self.is_sorted = true;
        trace!(before, removed, documents = self.documents.len(), merge_contexts, "node set finalized");
    }

    fn update_documents(&mut self) {
        self.documents.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            match self.documents.last_mut() {
                Some(range) if range.doc == node.doc() => range.len += 1,
                _ => self.documents.push(DocumentRange { doc: node.doc(), start: i, len: 1 }),
            }
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_one(&self) -> bool {
        self.has_one
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Number of distinct nodes; finalizes the set first.
    pub fn len(&mut self) -> usize {
        self.sort();
        self.nodes.len()
    }

    pub fn item(&mut self, index: usize) -> Option<&NodeRef> {
        self.sort();
        self.nodes.get(index)
    }

    /// Owned copy of the node at `index`.
    pub fn item_at(&mut self, index: usize) -> Option<NodeRef> {
        self.item(index).cloned()
    }

    /// Sorted members as a slice.
    pub fn as_slice(&mut self) -> &[NodeRef] {
        self.sort();
        &self.nodes
    }

    pub fn into_vec(mut self) -> Vec<NodeRef> {
        self.sort();
        self.nodes
    }

    /// Forward iterator over the sorted members.
    pub fn iter(&mut self) -> NodeSetIter<'_> {
        self.sort();
        NodeSetIter::new(&self.nodes)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn has_changed(&self, previous_state: u32) -> bool {
        self.state != previous_state
    }

    /// Empties the set for reuse, keeping the allocation.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.documents.clear();
        self.is_sorted = false;
        self.has_one = false;
        self.item_type = ItemType::Any;
        self.state = 0;
    }

    fn find_doc(&self, doc: DocId) -> Option<DocumentRange> {
        self.documents.binary_search_by_key(&doc, |range| range.doc).ok().map(|i| self.documents[i])
    }

    /// Index of `(doc, node_id)`; only meaningful while sorted.
    fn position(&self, doc: DocId, node_id: &NodeId) -> Option<usize> {
        let range = self.find_doc(doc)?;
        self.nodes[range.range()]
            .binary_search_by(|node| node.node_id().cmp(node_id))
            .ok()
            .map(|i| range.start + i)
    }

    /// First node of the sorted `range` that is `ancestor` or lies in its subtree.
    fn first_in_subtree(&self, range: DocumentRange, ancestor: &NodeId) -> Option<usize> {
        let (mut low, mut high) = (range.start, range.end());
        let mut hit = None;
        while low < high {
            let mid = low + (high - low) / 2;
            let id = self.nodes[mid].node_id();
            if id.is_descendant_or_self_of(ancestor) {
                hit = Some(mid);
                break;
            }
            if id > ancestor {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        let mut first = hit?;
        while first > range.start && self.nodes[first - 1].node_id() >= ancestor {
            first -= 1;
        }
        Some(first)
    }

    pub fn get_node(&mut self, doc: DocId, node_id: &NodeId) -> Option<&NodeRef> {
        self.sort();
        self.position(doc, node_id).map(|i| &self.nodes[i])
    }

    pub fn contains(&mut self, node: &NodeRef) -> bool {
        self.get_node(node.doc(), node.node_id()).is_some()
    }

    /// Number of nodes stored for `doc`.
    pub fn size_hint(&mut self, doc: DocId) -> Option<usize> {
        self.sort();
        self.find_doc(doc).map(|range| range.len)
    }

    /// Nearest member that is the parent (or, without `direct_parent`, any
    /// ancestor) of `node_id`. With `include_self` the node itself counts.
    pub fn parent_with_child(
        &mut self,
        doc: DocId,
        node_id: &NodeId,
        direct_parent: bool,
        include_self: bool,
    ) -> Option<&NodeRef> {
        self.sort();
        if include_self && let Some(i) = self.position(doc, node_id) {
            return Some(&self.nodes[i]);
        }
        let mut current = node_id.parent();
        while let Some(id) = current {
            if let Some(i) = self.position(doc, &id) {
                return Some(&self.nodes[i]);
            }
            if direct_parent {
                return None;
            }
            current = id.parent();
        }
        None
    }

    /// Builds an element reference for `ancestor_id` when this set holds at
    /// least one of its descendants (or the node itself with
    /// `include_self`). The reference carries a context entry for every such
    /// member.
    pub fn has_descendants_in_set(
        &mut self,
        doc: DocId,
        ancestor_id: &NodeId,
        include_self: bool,
        context_id: ContextId,
    ) -> Option<NodeRef> {
        self.sort();
        let range = self.find_doc(doc)?;
        let first = self.first_in_subtree(range, ancestor_id)?;
        let mut ancestor = NodeRef::new(doc, ancestor_id.clone()).with_kind(NodeKind::Element);
        let mut found = false;
        for node in &self.nodes[first..range.end()] {
            match node.node_id().compute_relation(ancestor_id) {
                None => break,
                Some(Relation::Self_) if !include_self => {}
                Some(_) => {
                    lookup::inherit_context(&mut ancestor, node.clone(), context_id);
                    found = true;
                }
            }
        }
        found.then_some(ancestor)
    }

    /// Distinct document ids in ascending order, read from the range index
    /// while sorted.
    pub(crate) fn distinct_documents(&self) -> Vec<DocId> {
        if self.is_sorted {
            return self.documents.iter().map(|range| range.doc).collect();
        }
        self.nodes.iter().map(NodeRef::doc).sorted_unstable().dedup().collect()
    }

    /// Document nodes of every document represented in the set.
    pub fn documents_to_node_set(&self) -> NodeSet {
        let docs = self.distinct_documents();
        let mut result = NodeSet::with_capacity(docs.len().max(1));
        for doc in docs {
            result.add(NodeRef::document(doc));
        }
        result
    }
}

impl FromIterator<NodeRef> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeRef>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = NodeSet::sized_for(iter.size_hint().0);
        set.extend(iter);
        set
    }
}

impl Extend<NodeRef> for NodeSet {
    fn extend<I: IntoIterator<Item = NodeRef>>(&mut self, iter: I) {
        for node in iter {
            self.add(node);
        }
    }
}
