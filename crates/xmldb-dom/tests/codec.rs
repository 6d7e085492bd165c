use rstest::rstest;
use xmldb_dom::{
    CharacterKind, CharacterNode, DlnFactory, DomError, NodeId, NodeKind, NodePool, ProcessingInstructionNode,
    StoredContent, StoredNode,
};

fn decode(record: &[u8]) -> Result<StoredNode, DomError> {
    StoredNode::decode(record, 0, record.len(), &DlnFactory)
}

#[rstest]
fn comment_record_with_two_byte_identifier() {
    let id = NodeId::from_levels(&[100]);
    assert_eq!(id.size(), 2);
    let comment = CharacterNode::comment(id.clone(), "hi");
    let record = comment.serialize().unwrap();
    assert_eq!(record.len(), 1 + 2 + 2 + 2);
    assert_eq!(record[0], 0x60);
    assert_eq!(u16::from_be_bytes([record[1], record[2]]), 12);

    let decoded = decode(&record).unwrap();
    let decoded = decoded.as_character().unwrap();
    assert_eq!(decoded.data(), "hi");
    assert_eq!(decoded.kind(), CharacterKind::Comment);
    assert_eq!(decoded.node_id(), &id);
}

#[rstest]
#[case::text(CharacterNode::text("1.2.3".parse().unwrap(), "some text"))]
#[case::cdata(CharacterNode::cdata("1.2/1".parse().unwrap(), "<not markup>"))]
#[case::comment(CharacterNode::comment("1".parse().unwrap(), ""))]
#[case::unicode(CharacterNode::text("1.80.600".parse().unwrap(), "grüße, 世界"))]
fn character_records_decode_to_the_same_node(#[case] node: CharacterNode) {
    let record = node.serialize().unwrap();
    assert_eq!(record.len(), node.serialized_len());
    let decoded = decode(&record).unwrap();
    assert_eq!(decoded.node_kind(), node.node_kind());
    assert_eq!(decoded, StoredNode::Character(node));
}

#[rstest]
fn processing_instruction_record() {
    let pi = ProcessingInstructionNode::new("1.3".parse().unwrap(), "xml-stylesheet", "type=\"text/xsl\" href=\"a.xsl\"");
    let record = pi.serialize().unwrap();
    assert_eq!(record.len(), 1 + 2 + pi.node_id().size() + 4 + 14 + 28);
    let decoded = decode(&record).unwrap();
    assert_eq!(decoded.node_kind(), NodeKind::ProcessingInstruction);
    let decoded = decoded.as_processing_instruction().unwrap();
    assert_eq!(decoded.target(), "xml-stylesheet");
    assert_eq!(decoded.data(), "type=\"text/xsl\" href=\"a.xsl\"");
}

#[rstest]
fn records_packed_in_one_page() {
    let nodes: Vec<StoredNode> = vec![
        CharacterNode::text("1.1".parse().unwrap(), "first").into(),
        ProcessingInstructionNode::new("1.2".parse().unwrap(), "pi", "").into(),
        CharacterNode::comment("1.3".parse().unwrap(), "third").into(),
    ];
    let mut page = Vec::new();
    let mut bounds = Vec::new();
    for node in &nodes {
        let record = node.serialize().unwrap();
        bounds.push((page.len(), record.len()));
        page.extend(record);
    }
    for (node, (start, len)) in nodes.iter().zip(bounds) {
        assert_eq!(&StoredNode::decode(&page, start, len, &DlnFactory).unwrap(), node);
    }
}

#[rstest]
fn declared_units_beyond_record_length_fail() {
    let mut record = CharacterNode::text("1.2".parse().unwrap(), "x").serialize().unwrap();
    record[1] = 0x01;
    assert!(matches!(decode(&record), Err(DomError::Format { .. })));
}

#[rstest]
fn corrupt_identifier_bits_fail() {
    let record = [0x00, 0x00, 0x08, 0xFF, b'x'];
    assert!(matches!(decode(&record), Err(DomError::Format { context: "node id", .. })));
}

#[rstest]
fn pooled_decode_is_transparent() {
    let records: Vec<Vec<u8>> = vec![
        CharacterNode::text("1.1".parse().unwrap(), "a fairly long text node").serialize().unwrap(),
        CharacterNode::comment("1.2".parse().unwrap(), "c").serialize().unwrap(),
        ProcessingInstructionNode::new("1.3".parse().unwrap(), "t", "d").serialize().unwrap(),
        ProcessingInstructionNode::new("1.4".parse().unwrap(), "target", "data").serialize().unwrap(),
    ];
    let mut pool = NodePool::new(4);
    for record in &records {
        let plain = decode(record).unwrap();
        let pooled = StoredNode::decode_pooled(record, 0, record.len(), &DlnFactory, &mut pool).unwrap();
        assert_eq!(pooled, plain);
        pool.release(pooled).unwrap();
    }
    assert_eq!(pool.reused(), 2);
}

#[rstest]
fn pooled_decode_reports_errors() {
    let mut pool = NodePool::default();
    let record = [0x20, 0x00, 0x04, 0x10];
    let err = StoredNode::decode_pooled(&record, 0, record.len(), &DlnFactory, &mut pool).unwrap_err();
    assert_eq!(err, DomError::UnsupportedSignature(0x20));
}

#[rstest]
fn identifier_factory_round_trip() {
    for text in ["/", "1", "1.7", "1.8", "1.2/1.3", "1.71.72.583.584", "1.4294967295"] {
        let id: NodeId = text.parse().unwrap();
        let mut bytes = Vec::new();
        id.write_to(&mut bytes);
        let units = u16::try_from(id.units()).unwrap();
        assert_eq!(NodeId::from_data(units, &bytes).unwrap(), id, "{text}");
        assert_eq!(id.to_string(), text);
    }
}
