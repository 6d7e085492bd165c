use std::sync::Arc;

use rstest::{fixture, rstest};
use xmldb_dom::{ContextId, DocId, DocumentSet, ItemType, NodeId, NodeKind, NodeRef, NodeSet};

fn id(levels: &[u32]) -> NodeId {
    NodeId::from_levels(levels)
}

fn node(doc: u32, levels: &[u32]) -> NodeRef {
    NodeRef::new(DocId(doc), id(levels))
}

fn with_context(mut target: NodeRef, step: i32, context: NodeRef) -> NodeRef {
    target.add_context_node(ContextId(step), context);
    target
}

fn ids(set: &mut NodeSet) -> Vec<String> {
    set.iter().map(|n| n.node_id().to_string()).collect()
}

#[fixture]
fn scenario() -> NodeSet {
    let mut set = NodeSet::with_capacity(64);
    set.add(with_context(node(1, &[1]), 1, node(1, &[1, 5])));
    set.add(node(1, &[1, 1]));
    set.add(node(1, &[1, 2]));
    set.add(with_context(node(1, &[1]), 1, node(1, &[1, 7])));
    set
}

#[rstest]
fn merge_duplicates_keeps_one_reference_with_both_contexts(mut scenario: NodeSet) {
    scenario.merge_duplicates();
    assert_eq!(scenario.len(), 3);
    assert_eq!(ids(&mut scenario), ["1", "1.1", "1.2"]);
    let root = scenario.item(0).unwrap();
    let contexts: Vec<String> = root.context().iter().map(|item| item.node().node_id().to_string()).collect();
    assert_eq!(contexts, ["1.5", "1.7"]);
}

#[rstest]
fn plain_sort_drops_duplicate_contexts(mut scenario: NodeSet) {
    scenario.sort();
    assert_eq!(scenario.len(), 3);
    assert_eq!(scenario.item(0).unwrap().context().len(), 1);
}

#[rstest]
fn sort_is_idempotent(mut scenario: NodeSet) {
    scenario.sort();
    let once = ids(&mut scenario);
    let len = scenario.len();
    scenario.sort();
    assert_eq!(ids(&mut scenario), once);
    assert_eq!(scenario.len(), len);
}

#[rstest]
#[case(5)]
#[case(1)]
fn same_node_added_n_times_keeps_n_context_entries(#[case] n: u32) {
    let mut set = NodeSet::new();
    for i in 0..n {
        set.add(with_context(node(1, &[1, 3]), 2, node(1, &[1, 3, i + 1])));
    }
    assert!(set.has_one());
    set.merge_duplicates();
    assert_eq!(set.len(), 1);
    assert_eq!(set.item(0).unwrap().context().len(), n as usize);
}

#[rstest]
fn shared_context_entry_counts_once() {
    let context = Arc::new(node(1, &[1, 9]));
    let mut set = NodeSet::new();
    for _ in 0..3 {
        let mut n = node(1, &[1, 3]);
        n.add_context_node(ContextId(2), Arc::clone(&context));
        set.add(n);
    }
    set.merge_duplicates();
    assert_eq!(set.item(0).unwrap().context().len(), 1);
}

#[rstest]
#[case(&[&[1][..], &[1]], true)]
#[case(&[&[1][..], &[1, 1]], false)]
#[case(&[&[1, 2][..], &[1, 1], &[1, 2]], false)]
#[case(&[&[1, 2][..]], true)]
fn has_one_matches_length_after_merge(#[case] nodes: &[&[u32]], #[case] expected: bool) {
    let mut set: NodeSet = nodes.iter().map(|levels| node(1, levels)).collect();
    assert_eq!(set.has_one(), expected);
    set.merge_duplicates();
    assert_eq!(set.len() == 1, expected);
    assert_eq!(set.has_one(), expected);
}

#[rstest]
fn documents_sort_before_identifiers() {
    let mut set: NodeSet = [node(2, &[1]), node(1, &[1, 4]), node(1, &[1])].into_iter().collect();
    let order: Vec<(DocId, String)> = set.iter().map(|n| (n.doc(), n.node_id().to_string())).collect();
    assert_eq!(order, [(DocId(1), "1".into()), (DocId(1), "1.4".into()), (DocId(2), "1".into())]);
    assert_eq!(set.document_ids(), [DocId(1), DocId(2)]);
    assert_eq!(ids(&mut set.documents_to_node_set()), ["/", "/"]);
}

#[rstest]
fn state_counts_additions_and_reset_clears() {
    let mut set = NodeSet::new();
    let before = set.state();
    set.add(node(1, &[1]));
    set.add(node(1, &[1, 1]));
    assert!(set.has_changed(before));
    assert_eq!(set.state(), before + 2);
    let sorted = set.state();
    set.sort();
    assert!(!set.has_changed(sorted));
    set.reset();
    assert!(set.is_empty());
    assert_eq!(set.state(), 0);
    assert!(!set.has_one());
    assert_eq!(set.item_type(), ItemType::Any);
}

#[rstest]
fn item_type_follows_members() {
    let mut set = NodeSet::new();
    set.add(node(1, &[1, 1]).with_kind(NodeKind::Text));
    assert_eq!(set.item_type(), ItemType::Kind(NodeKind::Text));
    set.add(node(1, &[1, 2]).with_kind(NodeKind::Text));
    assert_eq!(set.item_type(), ItemType::Kind(NodeKind::Text));
    set.add(node(1, &[1, 3]).with_kind(NodeKind::Comment));
    assert_eq!(set.item_type(), ItemType::Node);
}

#[rstest]
fn iterator_peeks_and_repositions() {
    let mut set: NodeSet = [&[1][..], &[1, 1], &[1, 2], &[1, 3]].iter().map(|levels| node(1, levels)).collect();
    let mut iter = set.iter();
    assert_eq!(iter.len(), 4);
    assert_eq!(iter.peek().map(|n| n.node_id().to_string()), Some("1".into()));
    assert_eq!(iter.next().map(|n| n.node_id().to_string()), Some("1".into()));
    iter.set_position(&node(1, &[1, 2]));
    assert_eq!(iter.next().map(|n| n.node_id().to_string()), Some("1.2".into()));
    assert_eq!(iter.len(), 1);
    iter.set_position(&node(1, &[1, 9]));
    assert!(iter.peek().is_none());
    assert!(iter.next().is_none());
    assert_eq!(set.iter().count(), 4);
}

#[rstest]
fn add_all_copies_every_member() {
    let mut target: NodeSet = [node(1, &[1, 1])].into_iter().collect();
    let mut source: NodeSet = [node(1, &[1, 3]), node(1, &[1, 2]), node(1, &[1, 1])].into_iter().collect();
    target.add_all(&mut source);
    assert_eq!(ids(&mut target), ["1.1", "1.2", "1.3"]);

    let mut single: NodeSet = [node(1, &[1, 7]), node(1, &[1, 7])].into_iter().collect();
    target.add_all(&mut single);
    assert_eq!(ids(&mut target), ["1.1", "1.2", "1.3", "1.7"]);
}

#[rstest]
fn lookups_on_sorted_set() {
    let mut set: NodeSet = [node(1, &[1, 2, 3]), node(1, &[1]), node(3, &[1, 1])].into_iter().collect();
    assert!(set.contains(&node(1, &[1, 2, 3])));
    assert!(!set.contains(&node(2, &[1, 2, 3])));
    assert_eq!(set.size_hint(DocId(1)), Some(2));

    let ancestor = set.has_descendants_in_set(DocId(1), &id(&[1, 2]), false, ContextId(3)).unwrap();
    assert_eq!(ancestor.kind(), Some(NodeKind::Element));
    let recorded: Vec<String> = ancestor.context().nodes_for(ContextId(3)).map(|n| n.node_id().to_string()).collect();
    assert_eq!(recorded, ["1.2.3"]);
    assert!(set.has_descendants_in_set(DocId(1), &id(&[1, 2, 3]), false, ContextId(3)).is_none());
    assert!(set.has_descendants_in_set(DocId(1), &id(&[1, 2, 3]), true, ContextId(3)).is_some());
}

#[rstest]
fn union_merges_contexts_of_shared_members() {
    let mut a: NodeSet = [with_context(node(1, &[1, 2]), 1, node(1, &[1]))].into_iter().collect();
    let mut b: NodeSet = [with_context(node(1, &[1, 2]), 1, node(1, &[1, 9])), node(1, &[1, 3])].into_iter().collect();
    let mut both = a.union(&mut b);
    assert_eq!(ids(&mut both), ["1.2", "1.3"]);
    assert_eq!(both.item(0).unwrap().context().len(), 2);
}
