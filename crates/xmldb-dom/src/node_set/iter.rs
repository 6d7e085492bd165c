use crate::node_ref::NodeRef;

/// Forward iterator over a sorted node set.
///
/// Besides plain iteration it supports looking at the next node without
/// consuming it and jumping to a given node, which is what merge-style
/// algorithms over two sets need. A jump to a node that is not a member
/// exhausts the iterator; start over with [`NodeSet::iter`](super::NodeSet::iter).
#[derive(Debug, Clone)]
pub struct NodeSetIter<'a> {
    nodes: &'a [NodeRef],
    pos: Option<usize>,
}

impl<'a> NodeSetIter<'a> {
    pub(super) fn new(nodes: &'a [NodeRef]) -> Self {
        Self { nodes, pos: Some(0) }
    }

    pub fn peek(&self) -> Option<&'a NodeRef> {
        self.pos.and_then(|pos| self.nodes.get(pos))
    }

    /// Moves the cursor so that the next call to `next` yields `node`.
    pub fn set_position(&mut self, node: &NodeRef) {
        self.pos = self.nodes.binary_search(node).ok();
    }
}

impl<'a> Iterator for NodeSetIter<'a> {
    type Item = &'a NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.pos?;
        let node = self.nodes.get(pos)?;
        self.pos = Some(pos + 1);
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pos.map_or(0, |pos| self.nodes.len().saturating_sub(pos));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for NodeSetIter<'_> {}
