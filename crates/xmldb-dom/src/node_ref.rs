use core::cmp::Ordering;
use std::sync::Arc;

use crate::context::{ContextChain, ContextId};
use crate::model::{DocId, ItemType, NodeHandle, NodeKind, StorageAddress};
use crate::numbering::NodeId;

/// Lightweight reference to a stored node.
///
/// Identity is `(doc, node_id)`: equality and ordering ignore the kind, the
/// storage address and the context chain.
#[derive(Debug, Clone)]
pub struct NodeRef {
    doc: DocId,
    node_id: NodeId,
    kind: Option<NodeKind>,
    address: Option<StorageAddress>,
    context: ContextChain,
}

impl NodeRef {
    pub fn new(doc: DocId, node_id: NodeId) -> Self {
        Self { doc, node_id, kind: None, address: None, context: ContextChain::new() }
    }

    /// Reference to the document node of `doc`.
    pub fn document(doc: DocId) -> Self {
        Self::new(doc, NodeId::document()).with_kind(NodeKind::Document)
    }

    #[must_use]
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: StorageAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn doc(&self) -> DocId {
        self.doc
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.kind
    }

    /// `Kind(k)` when the kind is known, plain `Node` otherwise.
    pub fn item_type(&self) -> ItemType {
        self.kind.map_or(ItemType::Node, ItemType::Kind)
    }

    pub fn address(&self) -> Option<StorageAddress> {
        self.address
    }

    pub fn set_address(&mut self, address: StorageAddress) {
        self.address = Some(address);
    }

    pub fn is_document(&self) -> bool {
        self.node_id.is_document()
    }

    /// Reference to the parent node, typed as element (or document at the top).
    pub fn parent(&self) -> Option<NodeRef> {
        let parent_id = self.node_id.parent()?;
        let kind = if parent_id.is_document() { NodeKind::Document } else { NodeKind::Element };
        Some(NodeRef::new(self.doc, parent_id).with_kind(kind))
    }

    pub fn context(&self) -> &ContextChain {
        &self.context
    }

    pub fn add_context_node(&mut self, context_id: ContextId, node: impl Into<Arc<NodeRef>>) {
        self.context.push(context_id, node.into());
    }

    /// Appends every context entry of `other`.
    pub fn add_context(&mut self, other: &NodeRef) {
        self.context.extend_from(&other.context);
    }

    /// Replaces the chain with a copy of `other`'s.
    pub fn copy_context(&mut self, other: &NodeRef) {
        self.context = other.context.clone();
    }

    /// Takes over `other`'s chain if this node has none yet, then records
    /// `other` itself as context node for `context_id`.
    pub fn deep_copy_context(&mut self, other: impl Into<Arc<NodeRef>>, context_id: ContextId) {
        let other = other.into();
        if self.context.is_empty() {
            self.context = other.context.clone();
        }
        self.context.push(context_id, other);
    }

    pub fn clear_context(&mut self, context_id: ContextId) {
        self.context.clear_step(context_id);
    }

    /// Records this node as its own context node.
    pub fn set_self_as_context(&mut self, context_id: ContextId) {
        let snapshot = Arc::new(self.clone());
        self.context.push(context_id, snapshot);
    }
}

impl NodeHandle for NodeRef {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_node(other)
    }
}

impl Eq for NodeRef {}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_document_order(other)
    }
}
