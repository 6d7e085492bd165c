use core::ops::Range;

use super::{Signature, StoredContent, encode_header};
use crate::error::{DomError, Result};
use crate::model::NodeKind;
use crate::numbering::NodeId;

/// Leaf kinds whose payload is plain character content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterKind {
    Text,
    CData,
    Comment,
}

impl CharacterKind {
    pub(crate) fn from_signature(signature: Signature) -> Result<Self> {
        match signature {
            Signature::Text => Ok(Self::Text),
            Signature::CData => Ok(Self::CData),
            Signature::Comment => Ok(Self::Comment),
            other => Err(DomError::UnsupportedSignature(other.to_byte())),
        }
    }

    pub fn signature(self) -> Signature {
        match self {
            Self::Text => Signature::Text,
            Self::CData => Signature::CData,
            Self::Comment => Signature::Comment,
        }
    }

    pub(crate) fn record_context(self) -> &'static str {
        match self {
            Self::Text => "text record",
            Self::CData => "cdata record",
            Self::Comment => "comment record",
        }
    }
}

/// A text, CDATA or comment node.
///
/// Offsets and counts of the character-data operations are measured in
/// characters. Negative values are rejected with [`DomError::Bounds`], as is
/// an offset past the end; a count reaching past the end is clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterNode {
    kind: CharacterKind,
    node_id: NodeId,
    data: String,
}

impl CharacterNode {
    pub fn new(kind: CharacterKind, node_id: NodeId, data: impl Into<String>) -> Self {
        Self { kind, node_id, data: data.into() }
    }

    pub fn text(node_id: NodeId, data: impl Into<String>) -> Self {
        Self::new(CharacterKind::Text, node_id, data)
    }

    pub fn cdata(node_id: NodeId, data: impl Into<String>) -> Self {
        Self::new(CharacterKind::CData, node_id, data)
    }

    pub fn comment(node_id: NodeId, data: impl Into<String>) -> Self {
        Self::new(CharacterKind::Comment, node_id, data)
    }

    pub fn kind(&self) -> CharacterKind {
        self.kind
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: &str) {
        self.data.clear();
        self.data.push_str(data);
    }

    pub fn set_node_id(&mut self, node_id: NodeId) {
        self.node_id = node_id;
    }

    /// Refills a recycled node, keeping the content buffer.
    pub(crate) fn reuse(&mut self, kind: CharacterKind, node_id: NodeId, data: &str) {
        self.kind = kind;
        self.node_id = node_id;
        self.set_data(data);
    }

    /// Length in characters.
    pub fn length(&self) -> usize {
        self.data.chars().count()
    }

    pub fn append_data(&mut self, arg: &str) {
        self.data.push_str(arg);
    }

    pub fn insert_data(&mut self, offset: i32, arg: &str) -> Result<()> {
        let at = self.byte_range(offset, 0)?.start;
        self.data.insert_str(at, arg);
        Ok(())
    }

    pub fn delete_data(&mut self, offset: i32, count: i32) -> Result<()> {
        let range = self.byte_range(offset, count)?;
        self.data.replace_range(range, "");
        Ok(())
    }

    pub fn replace_data(&mut self, offset: i32, count: i32, arg: &str) -> Result<()> {
        let range = self.byte_range(offset, count)?;
        self.data.replace_range(range, arg);
        Ok(())
    }

    pub fn substring_data(&self, offset: i32, count: i32) -> Result<String> {
        Ok(self.data[self.byte_range(offset, count)?].to_owned())
    }

    /// Byte range of `count` characters starting at character `offset`.
    fn byte_range(&self, offset: i32, count: i32) -> Result<Range<usize>> {
        let length = self.length();
        let (Ok(start), Ok(wanted)) = (usize::try_from(offset), usize::try_from(count)) else {
            return Err(DomError::bounds(offset, count, length));
        };
        if start > length {
            return Err(DomError::bounds(offset, count, length));
        }
        let end = start.saturating_add(wanted).min(length);
        Ok(self.byte_offset(start)..self.byte_offset(end))
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.data.char_indices().nth(chars).map_or(self.data.len(), |(at, _)| at)
    }
}

impl StoredContent for CharacterNode {
    fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    fn node_kind(&self) -> NodeKind {
        self.kind.signature().node_kind()
    }

    fn content_len(&self) -> usize {
        self.data.len()
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = encode_header(self.kind.signature(), &self.node_id, self.data.len())?;
        out.extend_from_slice(self.data.as_bytes());
        Ok(out)
    }
}
