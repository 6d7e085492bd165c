use compact_str::CompactString;

use super::{Signature, StoredContent, encode_header, utf8};
use crate::error::{DomError, Result};
use crate::model::NodeKind;
use crate::numbering::NodeId;

const CONTEXT: &str = "processing instruction record";
const TARGET_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstructionNode {
    node_id: NodeId,
    target: CompactString,
    data: String,
}

impl ProcessingInstructionNode {
    pub fn new(node_id: NodeId, target: impl Into<CompactString>, data: impl Into<String>) -> Self {
        Self { node_id, target: target.into(), data: data.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: &str) {
        self.data.clear();
        self.data.push_str(data);
    }

    pub(crate) fn reuse(&mut self, node_id: NodeId, target: &str, data: &str) {
        self.node_id = node_id;
        self.target = CompactString::from(target);
        self.set_data(data);
    }

    /// Splits a payload into target and data.
    pub(crate) fn split_payload(payload: &[u8]) -> Result<(&str, &str)> {
        let Some((prefix, rest)) = payload.split_first_chunk::<TARGET_LEN>() else {
            return Err(DomError::format(CONTEXT, format!("{} payload bytes cannot hold the target length", payload.len())));
        };
        let target_len = usize::try_from(u32::from_be_bytes(*prefix))
            .map_err(|_| DomError::format(CONTEXT, "target length does not fit in memory"))?;
        if target_len > rest.len() {
            return Err(DomError::format(
                CONTEXT,
                format!("target length {target_len} exceeds the {} remaining bytes", rest.len()),
            ));
        }
        let (target, data) = rest.split_at(target_len);
        Ok((utf8(target, CONTEXT)?, utf8(data, CONTEXT)?))
    }

    pub(crate) fn from_record(node_id: NodeId, payload: &[u8]) -> Result<Self> {
        let (target, data) = Self::split_payload(payload)?;
        Ok(Self::new(node_id, target, data))
    }
}

impl StoredContent for ProcessingInstructionNode {
    fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ProcessingInstruction
    }

    fn content_len(&self) -> usize {
        TARGET_LEN + self.target.len() + self.data.len()
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let target_len = u32::try_from(self.target.len())
            .map_err(|_| DomError::format(CONTEXT, format!("target of {} bytes is too long", self.target.len())))?;
        let mut out = encode_header(Signature::ProcessingInstruction, &self.node_id, self.content_len())?;
        out.extend_from_slice(&target_len.to_be_bytes());
        out.extend_from_slice(self.target.as_bytes());
        out.extend_from_slice(self.data.as_bytes());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn payload_layout() {
        let node = ProcessingInstructionNode::new(NodeId::root(), "xml-stylesheet", "href=\"a.xsl\"");
        let record = node.serialize().unwrap();
        assert_eq!(record.len(), node.serialized_len());
        assert_eq!(record[0], 0x40);
        assert_eq!(&record[4..8], &14u32.to_be_bytes());
        assert_eq!(&record[8..22], b"xml-stylesheet");
        assert_eq!(&record[22..], b"href=\"a.xsl\"");
    }

    #[rstest]
    #[case::no_length(&[0, 0, 1])]
    #[case::target_past_end(&[0, 0, 0, 9, b'a', b'b'])]
    fn malformed_payloads(#[case] payload: &[u8]) {
        let err = ProcessingInstructionNode::split_payload(payload).unwrap_err();
        assert!(matches!(err, DomError::Format { context: CONTEXT, .. }));
    }

    #[rstest]
    fn empty_target_and_data() {
        assert_eq!(ProcessingInstructionNode::split_payload(&[0, 0, 0, 0]).unwrap(), ("", ""));
    }
}
