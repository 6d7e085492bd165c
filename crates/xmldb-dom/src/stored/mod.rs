//! Binary records of leaf nodes.
//!
//! Every record starts with the same header:
//!
//! ```text
//! [signature: u8][units: u16 BE][node id: ceil(units / 8) bytes][payload]
//! ```
//!
//! The node kind sits in the top three bits of the signature byte; the low
//! five bits are reserved and written as zero. Text, CDATA and comment
//! payloads are the UTF-8 content running to the end of the record.
//! Processing instructions store `[u32 BE target length][target][data]`.
//! Record boundaries are tracked by the caller, so decoding takes the
//! start offset and the total length of the record.

mod character_data;
mod pool;
mod processing_instruction;

pub use character_data::{CharacterKind, CharacterNode};
pub use pool::NodePool;
pub use processing_instruction::ProcessingInstructionNode;

use crate::error::{DomError, Result};
use crate::model::NodeKind;
use crate::numbering::{NodeId, NodeIdFactory};

const KIND_SHIFT: u8 = 5;
const HEADER_LEN: usize = 3;

/// Node kind tag of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Signature {
    Text = 0,
    Element = 1,
    ProcessingInstruction = 2,
    Comment = 3,
    Attribute = 4,
    CData = 5,
}

impl Signature {
    /// Reads the kind from the top bits of a signature byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte >> KIND_SHIFT {
            0 => Self::Text,
            1 => Self::Element,
            2 => Self::ProcessingInstruction,
            3 => Self::Comment,
            4 => Self::Attribute,
            5 => Self::CData,
            other => return Err(DomError::format("node record", format!("unknown node kind {other} in signature 0x{byte:02x}"))),
        })
    }

    pub fn to_byte(self) -> u8 {
        (self as u8) << KIND_SHIFT
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            Self::Text => NodeKind::Text,
            Self::Element => NodeKind::Element,
            Self::ProcessingInstruction => NodeKind::ProcessingInstruction,
            Self::Comment => NodeKind::Comment,
            Self::Attribute => NodeKind::Attribute,
            Self::CData => NodeKind::CData,
        }
    }
}

/// Shared capabilities of every stored leaf node.
pub trait StoredContent {
    fn node_id(&self) -> &NodeId;

    fn node_kind(&self) -> NodeKind;

    /// Payload size in bytes.
    fn content_len(&self) -> usize;

    /// Full record: header plus payload.
    fn serialize(&self) -> Result<Vec<u8>>;

    fn serialized_len(&self) -> usize {
        HEADER_LEN + self.node_id().size() + self.content_len()
    }
}

/// Writes the record header, reserving room for `payload_len` more bytes.
pub(crate) fn encode_header(signature: Signature, node_id: &NodeId, payload_len: usize) -> Result<Vec<u8>> {
    let units = u16::try_from(node_id.units()).map_err(|_| {
        DomError::format("node id", format!("{} units do not fit the 16-bit header field", node_id.units()))
    })?;
    let mut out = Vec::with_capacity(HEADER_LEN + node_id.size() + payload_len);
    out.push(signature.to_byte());
    out.extend_from_slice(&units.to_be_bytes());
    node_id.write_to(&mut out);
    Ok(out)
}

/// Decoded header of a record and the payload that follows it.
#[derive(Debug)]
pub(crate) struct RawRecord<'a> {
    pub(crate) signature: Signature,
    pub(crate) node_id: NodeId,
    pub(crate) payload: &'a [u8],
}

impl<'a> RawRecord<'a> {
    pub(crate) fn read(data: &'a [u8], start: usize, len: usize, factory: &dyn NodeIdFactory) -> Result<Self> {
        let record = start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                DomError::format("node record", format!("{len} bytes at offset {start} exceed buffer of {}", data.len()))
            })?;
        let &[signature, hi, lo, ..] = record else {
            return Err(DomError::format("node record", format!("{len} bytes cannot hold the {HEADER_LEN} byte header")));
        };
        let signature = Signature::from_byte(signature)?;
        let units = u16::from_be_bytes([hi, lo]);
        let id_end = HEADER_LEN + factory.length_in_bytes(units);
        if id_end > record.len() {
            return Err(DomError::format(
                "node record",
                format!("{units} id units read past the record length {len}"),
            ));
        }
        let node_id = factory.create_from_data(units, &record[..id_end], HEADER_LEN)?;
        Ok(Self { signature, node_id, payload: &record[id_end..] })
    }
}

pub(crate) fn utf8<'a>(bytes: &'a [u8], context: &'static str) -> Result<&'a str> {
    core::str::from_utf8(bytes).map_err(|err| DomError::format(context, err.to_string()))
}

/// A decoded leaf record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredNode {
    Character(CharacterNode),
    ProcessingInstruction(ProcessingInstructionNode),
}

impl StoredNode {
    /// Decodes the record of `len` bytes starting at `start`.
    ///
    /// Element and attribute records are rejected with
    /// [`DomError::UnsupportedSignature`].
    pub fn decode(data: &[u8], start: usize, len: usize, factory: &dyn NodeIdFactory) -> Result<Self> {
        let record = RawRecord::read(data, start, len, factory)?;
        match record.signature {
            Signature::ProcessingInstruction => {
                ProcessingInstructionNode::from_record(record.node_id, record.payload).map(Self::ProcessingInstruction)
            }
            signature => {
                let kind = CharacterKind::from_signature(signature)?;
                let content = utf8(record.payload, kind.record_context())?;
                Ok(Self::Character(CharacterNode::new(kind, record.node_id, content)))
            }
        }
    }

    /// Same as [`StoredNode::decode`], but reuses a released node from
    /// `pool` when one is available.
    pub fn decode_pooled(
        data: &[u8],
        start: usize,
        len: usize,
        factory: &dyn NodeIdFactory,
        pool: &mut NodePool,
    ) -> Result<Self> {
        let record = RawRecord::read(data, start, len, factory)?;
        match record.signature {
            Signature::ProcessingInstruction => {
                let (target, content) = ProcessingInstructionNode::split_payload(record.payload)?;
                Ok(Self::ProcessingInstruction(pool.processing_instruction(record.node_id, target, content)))
            }
            signature => {
                let kind = CharacterKind::from_signature(signature)?;
                let content = utf8(record.payload, kind.record_context())?;
                Ok(Self::Character(pool.character(kind, record.node_id, content)))
            }
        }
    }

    pub fn as_character(&self) -> Option<&CharacterNode> {
        match self {
            Self::Character(node) => Some(node),
            Self::ProcessingInstruction(_) => None,
        }
    }

    pub fn as_processing_instruction(&self) -> Option<&ProcessingInstructionNode> {
        match self {
            Self::ProcessingInstruction(node) => Some(node),
            Self::Character(_) => None,
        }
    }
}

impl StoredContent for StoredNode {
    fn node_id(&self) -> &NodeId {
        match self {
            Self::Character(node) => node.node_id(),
            Self::ProcessingInstruction(node) => node.node_id(),
        }
    }

    fn node_kind(&self) -> NodeKind {
        match self {
            Self::Character(node) => node.node_kind(),
            Self::ProcessingInstruction(node) => node.node_kind(),
        }
    }

    fn content_len(&self) -> usize {
        match self {
            Self::Character(node) => node.content_len(),
            Self::ProcessingInstruction(node) => node.content_len(),
        }
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        match self {
            Self::Character(node) => node.serialize(),
            Self::ProcessingInstruction(node) => node.serialize(),
        }
    }
}

impl From<CharacterNode> for StoredNode {
    fn from(node: CharacterNode) -> Self {
        Self::Character(node)
    }
}

impl From<ProcessingInstructionNode> for StoredNode {
    fn from(node: ProcessingInstructionNode) -> Self {
        Self::ProcessingInstruction(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::DlnFactory;
    use rstest::rstest;

    #[rstest]
    #[case(Signature::Text, 0x00)]
    #[case(Signature::Element, 0x20)]
    #[case(Signature::ProcessingInstruction, 0x40)]
    #[case(Signature::Comment, 0x60)]
    #[case(Signature::Attribute, 0x80)]
    #[case(Signature::CData, 0xA0)]
    fn signature_bytes(#[case] signature: Signature, #[case] byte: u8) {
        assert_eq!(signature.to_byte(), byte);
        assert_eq!(Signature::from_byte(byte | 0x1F).unwrap(), signature);
    }

    #[rstest]
    #[case(0xC0)]
    #[case(0xE0)]
    fn unknown_signature_is_a_format_error(#[case] byte: u8) {
        assert!(matches!(Signature::from_byte(byte), Err(DomError::Format { .. })));
    }

    #[rstest]
    fn element_records_are_not_leaf_records() {
        let record = encode_header(Signature::Element, &NodeId::root(), 0).unwrap();
        let err = StoredNode::decode(&record, 0, record.len(), &DlnFactory).unwrap_err();
        assert_eq!(err, DomError::UnsupportedSignature(0x20));
    }

    #[rstest]
    fn record_is_read_at_an_offset() {
        let node = CharacterNode::text("1.2".parse().unwrap(), "abc");
        let mut page = vec![0xFF; 5];
        page.extend(node.serialize().unwrap());
        page.extend([0xFF; 3]);
        let decoded = StoredNode::decode(&page, 5, node.serialized_len(), &DlnFactory).unwrap();
        assert_eq!(decoded, StoredNode::Character(node));
    }

    #[rstest]
    #[case::shorter_than_header(2)]
    #[case::past_buffer(64)]
    fn truncated_records_are_rejected(#[case] len: usize) {
        let record = CharacterNode::comment(NodeId::root(), "x").serialize().unwrap();
        assert!(matches!(StoredNode::decode(&record, 0, len, &DlnFactory), Err(DomError::Format { .. })));
    }

    #[rstest]
    fn declared_units_past_record_end() {
        let record = [Signature::Text.to_byte(), 0x00, 0x40, 0x10];
        let err = StoredNode::decode(&record, 0, record.len(), &DlnFactory).unwrap_err();
        assert!(matches!(err, DomError::Format { context: "node record", .. }));
    }

    #[rstest]
    fn invalid_utf8_payload() {
        let mut record = encode_header(Signature::Text, &NodeId::root(), 2).unwrap();
        record.extend([0xC3, 0x28]);
        let err = StoredNode::decode(&record, 0, record.len(), &DlnFactory).unwrap_err();
        assert!(matches!(err, DomError::Format { context: "text record", .. }));
    }
}
