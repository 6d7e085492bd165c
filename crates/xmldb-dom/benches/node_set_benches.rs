use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use xmldb_dom::{CharacterNode, ContextId, DlnFactory, DocId, NodeId, NodeRef, NodeSet, SelectMode, StoredContent, StoredNode};

/// Every node of a document with `sections` sections of 20 paragraphs,
/// each paragraph holding two children. Added in reverse document order.
fn document_nodes(sections: u32) -> Vec<NodeRef> {
    let mut nodes = vec![NodeRef::new(DocId(1), NodeId::root())];
    for s in 1..=sections {
        let section = NodeId::from_levels(&[1, s]);
        for p in 1..=20 {
            let paragraph = section.child(p);
            nodes.push(NodeRef::new(DocId(1), paragraph.child(1)));
            nodes.push(NodeRef::new(DocId(1), paragraph.child(2)));
            nodes.push(NodeRef::new(DocId(1), paragraph));
        }
        nodes.push(NodeRef::new(DocId(1), section));
    }
    nodes.reverse();
    nodes
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_set_sort");
    for sections in [10, 100] {
        let nodes = document_nodes(sections);
        group.bench_with_input(BenchmarkId::new("merge_duplicates", nodes.len()), &nodes, |b, nodes| {
            b.iter(|| {
                let mut set: NodeSet = nodes.iter().cloned().chain(nodes.iter().take(50).cloned()).collect();
                set.merge_duplicates();
                black_box(set.len())
            });
        });
    }
    group.finish();
}

fn bench_structural(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_join");
    let nodes = document_nodes(100);
    let sections: NodeSet = (1..=100).map(|s| NodeRef::new(DocId(1), NodeId::from_levels(&[1, s]))).collect();
    group.bench_function("parent_child", |b| {
        b.iter(|| {
            let mut candidates: NodeSet = nodes.iter().cloned().collect();
            let mut context = sections.clone();
            black_box(candidates.select_parent_child(&mut context, SelectMode::Descendant, ContextId(1)).len())
        });
    });
    group.bench_function("ancestor_descendant", |b| {
        b.iter(|| {
            let mut candidates: NodeSet = nodes.iter().cloned().collect();
            let mut context = sections.clone();
            let mut result =
                candidates.select_ancestor_descendant(&mut context, SelectMode::Descendant, false, ContextId(1), false);
            black_box(result.len())
        });
    });
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let node = CharacterNode::text(NodeId::from_levels(&[1, 42, 7, 3]), "Content paragraph in section 42");
    let record = node.serialize().unwrap_or_default();
    c.bench_function("decode_text_record", |b| {
        b.iter(|| StoredNode::decode(black_box(&record), 0, record.len(), &DlnFactory));
    });
}

criterion_group!(benches, bench_sort, bench_structural, bench_codec);
criterion_main!(benches);
