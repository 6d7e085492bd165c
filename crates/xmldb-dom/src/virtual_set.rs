//! Lazily evaluated node sets.
//!
//! A [`VirtualNodeSet`] stands for `axis::test` applied to a materialized
//! context set, e.g. "all element descendants of these nodes", without
//! enumerating it. Membership questions are answered from identifiers and
//! context lookups alone. Only operations that must iterate the set realize
//! it, by walking the stored tree through a [`DocumentTree`].

use core::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::ContextId;
use crate::model::{DocId, NodeKind};
use crate::node_ref::NodeRef;
use crate::node_set::{NodeLookup, NodeSet};
use crate::numbering::NodeId;

/// Access to the stored tree, used only to realize virtual sets.
pub trait DocumentTree: Send + Sync {
    /// Children of `parent` in document order.
    fn children(&self, doc: DocId, parent: &NodeId) -> Vec<NodeRef>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Self_,
    Child,
    Descendant,
    DescendantOrSelf,
}

/// Predicate a member of a virtual set must satisfy.
#[derive(Clone)]
pub enum NodeTest {
    AnyNode,
    /// Matches nodes of the given kind. References whose kind is unknown
    /// are accepted.
    Kind(NodeKind),
    Matches(Arc<dyn Fn(&NodeRef) -> bool + Send + Sync>),
}

impl NodeTest {
    pub fn matches(&self, node: &NodeRef) -> bool {
        match self {
            Self::AnyNode => true,
            Self::Kind(kind) => node.kind().is_none_or(|k| k == *kind),
            Self::Matches(test) => test(node),
        }
    }
}

impl fmt::Debug for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyNode => f.write_str("node()"),
            Self::Kind(kind) => write!(f, "{}()", kind.as_str()),
            Self::Matches(_) => f.write_str("<custom test>"),
        }
    }
}

pub struct VirtualNodeSet {
    axis: Axis,
    test: NodeTest,
    context: NodeSet,
    context_id: ContextId,
    in_predicate: bool,
    use_self_as_context: bool,
    tree: Arc<dyn DocumentTree>,
    real_set: NodeSet,
    realized: bool,
}

impl fmt::Debug for VirtualNodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualNodeSet")
            .field("axis", &self.axis)
            .field("test", &self.test)
            .field("context_id", &self.context_id)
            .field("realized", &self.realized)
            .finish_non_exhaustive()
    }
}

impl VirtualNodeSet {
    pub fn new(axis: Axis, test: NodeTest, context_id: ContextId, context: NodeSet, tree: Arc<dyn DocumentTree>) -> Self {
        Self {
            axis,
            test,
            context,
            context_id,
            in_predicate: false,
            use_self_as_context: false,
            tree,
            real_set: NodeSet::sized_for(0),
            realized: false,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Inside a predicate every selected node records a context entry.
    pub fn set_in_predicate(&mut self, in_predicate: bool) {
        self.in_predicate = in_predicate;
    }

    /// Inside a predicate, record selected nodes as their own context.
    pub fn set_self_is_context(&mut self) {
        self.use_self_as_context = true;
        self.in_predicate = true;
    }

    pub fn set_context_id(&mut self, context_id: ContextId) {
        self.context_id = context_id;
    }

    pub fn contains(&mut self, node: &NodeRef) -> bool {
        self.lookup_ref(node.clone()).is_some()
    }

    fn annotate(&self, found: &mut NodeRef, context_node: &NodeRef) {
        found.copy_context(context_node);
        if self.in_predicate && self.context_id.is_tracked() {
            if self.use_self_as_context {
                found.set_self_as_context(self.context_id);
            } else {
                found.add_context_node(self.context_id, context_node.clone());
            }
        }
    }

    /// Membership test for one node, computed from the context set.
    fn lookup_ref(&mut self, node: NodeRef) -> Option<NodeRef> {
        if self.realized {
            return self.real_set.get_node(node.doc(), node.node_id()).cloned();
        }
        if !self.test.matches(&node) {
            return None;
        }
        let (doc, id) = (node.doc(), node.node_id().clone());
        let context_node = match self.axis {
            Axis::Self_ => self.context.get_node(doc, &id),
            Axis::Child => {
                let parent = id.parent()?;
                self.context.get_node(doc, &parent)
            }
            Axis::Descendant => self.context.parent_with_child(doc, &id, false, false),
            Axis::DescendantOrSelf => self.context.parent_with_child(doc, &id, false, true),
        }?
        .clone();
        let mut found = node;
        self.annotate(&mut found, &context_node);
        Some(found)
    }

    /// Enumerates the set through the document tree. Later calls are free.
    pub fn realize(&mut self) -> &mut NodeSet {
        if self.realized {
            return &mut self.real_set;
        }
        let tree = Arc::clone(&self.tree);
        let mut result = NodeSet::sized_for(0);
        let context_nodes: Vec<NodeRef> = self.context.iter().cloned().collect();
        for context_node in &context_nodes {
            if matches!(self.axis, Axis::Self_ | Axis::DescendantOrSelf) && self.test.matches(context_node) {
                let mut found = context_node.clone();
                if self.in_predicate && self.use_self_as_context && self.context_id.is_tracked() {
                    found.set_self_as_context(self.context_id);
                }
                result.add(found);
            }
            if self.axis == Axis::Self_ {
                continue;
            }
            let mut pending = tree.children(context_node.doc(), context_node.node_id());
            pending.reverse();
            while let Some(child) = pending.pop() {
                if self.axis != Axis::Child {
                    let mut grandchildren = tree.children(child.doc(), child.node_id());
                    grandchildren.reverse();
                    pending.extend(grandchildren);
                }
                if self.test.matches(&child) {
                    let mut found = child;
                    self.annotate(&mut found, context_node);
                    result.add(found);
                }
            }
        }
        result.merge_duplicates();
        debug!(axis = ?self.axis, test = ?self.test, context = context_nodes.len(), members = result.len(), "virtual node set realized");
        self.real_set = result;
        self.realized = true;
        &mut self.real_set
    }
}

impl NodeLookup for VirtualNodeSet {
    fn is_empty(&self) -> bool {
        self.context.is_empty() || (self.realized && self.real_set.is_empty())
    }

    fn is_virtual(&self) -> bool {
        !self.realized
    }

    fn lookup(&mut self, doc: DocId, node_id: &NodeId) -> Option<NodeRef> {
        self.lookup_ref(NodeRef::new(doc, node_id.clone()))
    }

    fn ancestor_of(&mut self, doc: DocId, node_id: &NodeId, direct_parent: bool, include_self: bool) -> Option<NodeRef> {
        if self.realized {
            return self.real_set.parent_with_child(doc, node_id, direct_parent, include_self).cloned();
        }
        if include_self && let Some(found) = self.lookup(doc, node_id) {
            return Some(found);
        }
        let mut current = node_id.parent();
        while let Some(id) = current {
            let kind = if id.is_document() { NodeKind::Document } else { NodeKind::Element };
            let next = id.parent();
            if let Some(found) = self.lookup_ref(NodeRef::new(doc, id).with_kind(kind)) {
                return Some(found);
            }
            if direct_parent {
                return None;
            }
            current = next;
        }
        None
    }

    fn size_hint_for(&mut self, doc: DocId) -> Option<usize> {
        if self.realized { self.real_set.size_hint(doc) } else { None }
    }

    fn materialize(&mut self) -> &mut NodeSet {
        self.realize()
    }
}
