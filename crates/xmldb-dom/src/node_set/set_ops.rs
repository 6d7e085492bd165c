//! Set algebra and context-chain helpers.

use itertools::{EitherOrBoth, Itertools};

use super::NodeSet;
use super::lookup::record_context;
use crate::context::ContextId;
use crate::model::NodeHandle;

impl NodeSet {
    /// Members of either set. Nodes present in both carry the context
    /// entries of both.
    pub fn union(&mut self, other: &mut NodeSet) -> NodeSet {
        if NodeSet::is_empty(self) {
            return other.clone();
        }
        if NodeSet::is_empty(other) {
            return self.clone();
        }
        let mut result = NodeSet::with_capacity(self.len() + other.len());
        for pair in self.nodes.iter().merge_join_by(other.nodes.iter(), |a, b| a.compare_document_order(b)) {
            match pair {
                EitherOrBoth::Both(mine, theirs) => {
                    let mut merged = mine.clone();
                    merged.add_context(theirs);
                    result.add(merged);
                }
                EitherOrBoth::Left(node) | EitherOrBoth::Right(node) => result.add(node.clone()),
            }
        }
        result.sort();
        result
    }

    /// Members of `self` that are also in `other`, with `self`'s contexts.
    pub fn intersection(&mut self, other: &mut NodeSet) -> NodeSet {
        self.sort();
        other.sort();
        let mut result = NodeSet::sized_for(self.nodes.len().min(other.nodes.len()));
        for pair in self.nodes.iter().merge_join_by(other.nodes.iter(), |a, b| a.compare_document_order(b)) {
            if let EitherOrBoth::Both(mine, _) = pair {
                result.add(mine.clone());
            }
        }
        result.sort();
        result
    }

    /// Members of `self` that are not in `other`.
    pub fn except(&mut self, other: &mut NodeSet) -> NodeSet {
        self.sort();
        other.sort();
        let mut result = NodeSet::sized_for(self.nodes.len());
        for pair in self.nodes.iter().merge_join_by(other.nodes.iter(), |a, b| a.compare_document_order(b)) {
            if let EitherOrBoth::Left(mine) = pair {
                result.add(mine.clone());
            }
        }
        result.sort();
        result
    }

    /// Records every member as its own context node for `context_id`.
    pub fn set_self_as_context(&mut self, context_id: ContextId) {
        for node in &mut self.nodes {
            node.set_self_as_context(context_id);
        }
    }

    /// Removes the context entries of `context_id` from every member;
    /// [`ContextId::IGNORE`] clears all chains.
    pub fn clear_context(&mut self, context_id: ContextId) {
        for node in &mut self.nodes {
            node.clear_context(context_id);
        }
    }

    /// Context nodes recorded under `context_id` by any member. Each one is
    /// recorded as its own context so a later step can continue from it.
    pub fn context_nodes(&mut self, context_id: ContextId) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        for node in &self.nodes {
            for context_node in node.context().nodes_for(context_id) {
                let mut found = (**context_node).clone();
                if context_id.is_tracked() {
                    found.set_self_as_context(context_id);
                }
                result.add(found);
            }
        }
        result.merge_duplicates();
        result
    }

    /// Parents of all members, each recording its children as context.
    pub fn parents(&mut self, context_id: ContextId) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        for node in self.iter() {
            if let Some(mut parent) = node.parent() {
                record_context(&mut parent, node.clone(), context_id);
                result.add(parent);
            }
        }
        result.merge_duplicates();
        result
    }

    /// Element ancestors of all members (the document node excluded), each
    /// recording the members below it as context. With `include_self` the
    /// members themselves are part of the result.
    pub fn ancestors(&mut self, context_id: ContextId, include_self: bool) -> NodeSet {
        let mut result = NodeSet::sized_for(0);
        for node in self.iter() {
            if include_self {
                let mut own = node.clone();
                if context_id.is_tracked() {
                    own.set_self_as_context(context_id);
                }
                result.add(own);
            }
            let mut current = node.parent();
            while let Some(mut ancestor) = current {
                if ancestor.is_document() {
                    break;
                }
                let next = ancestor.parent();
                record_context(&mut ancestor, node.clone(), context_id);
                result.add(ancestor);
                current = next;
            }
        }
        result.merge_duplicates();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocId;
    use crate::node_ref::NodeRef;
    use rstest::rstest;

    fn set(ids: &[&str]) -> NodeSet {
        ids.iter().map(|id| NodeRef::new(DocId(1), id.parse().unwrap())).collect()
    }

    fn ids(set: &mut NodeSet) -> Vec<String> {
        set.iter().map(|n| n.node_id().to_string()).collect()
    }

    #[rstest]
    fn union_intersection_except() {
        let mut a = set(&["1.3", "1.1", "1.2"]);
        let mut b = set(&["1.4", "1.2"]);
        assert_eq!(ids(&mut a.union(&mut b)), ["1.1", "1.2", "1.3", "1.4"]);
        assert_eq!(ids(&mut a.intersection(&mut b)), ["1.2"]);
        assert_eq!(ids(&mut a.except(&mut b)), ["1.1", "1.3"]);
        assert_eq!(ids(&mut set(&[]).union(&mut b)), ["1.2", "1.4"]);
    }

    #[rstest]
    fn ancestors_exclude_document_node() {
        let mut s = set(&["1.2.3"]);
        assert_eq!(ids(&mut s.ancestors(ContextId(1), false)), ["1", "1.2"]);
        assert_eq!(ids(&mut s.ancestors(ContextId(1), true)), ["1", "1.2", "1.2.3"]);
    }

    #[rstest]
    fn parents_are_merged_with_all_children_as_context() {
        let mut s = set(&["1.2.1", "1.2.2", "1.3"]);
        let mut parents = s.parents(ContextId(4));
        assert_eq!(ids(&mut parents), ["1", "1.2"]);
        let p12 = parents.item(1).unwrap();
        let children: Vec<String> = p12.context().nodes_for(ContextId(4)).map(|n| n.node_id().to_string()).collect();
        assert_eq!(children, ["1.2.1", "1.2.2"]);
    }
}
