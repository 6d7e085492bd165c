//! Document-order utilities over anything implementing [`NodeHandle`].

use crate::model::NodeHandle;

/// Stable sort into document order. Equal nodes keep their insertion order,
/// so merged context entries come out in the order they were recorded.
pub fn sort_in_document_order<T: NodeHandle>(items: &mut [T]) {
    items.sort_by(NodeHandle::compare_document_order);
}

/// Removes adjacent duplicates from a slice already in document order.
///
/// `on_duplicate(kept, removed)` runs for every dropped entry before it is
/// discarded. Returns the number of removed entries.
pub fn dedup_in_document_order<T: NodeHandle>(items: &mut Vec<T>, mut on_duplicate: impl FnMut(&mut T, &mut T)) -> usize {
    let before = items.len();
    items.dedup_by(|removed, kept| {
        let same = removed.is_same_node(kept);
        if same {
            on_duplicate(kept, removed);
        }
        same
    });
    before - items.len()
}

pub fn is_in_document_order<T: NodeHandle>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0].compare_document_order(&w[1]).is_lt())
}
