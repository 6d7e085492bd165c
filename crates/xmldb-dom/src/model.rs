use core::cmp::Ordering;
use core::fmt;

use crate::numbering::NodeId;

/// Numeric id of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub u32);

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DocId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::Text => "text",
            Self::CData => "cdata",
            Self::Comment => "comment",
            Self::ProcessingInstruction => "processing-instruction",
        }
    }
}

/// Aggregate type tag carried by a node set.
///
/// An empty set is `Any`. It narrows to `Kind(k)` with the first insertion,
/// stays there while every insertion agrees and degrades to `Node` for good
/// once two kinds have been mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemType {
    #[default]
    Any,
    Node,
    Kind(NodeKind),
}

impl ItemType {
    /// Type tag after adding an item of type `incoming`.
    #[must_use]
    pub fn unify(self, incoming: ItemType) -> ItemType {
        match self {
            Self::Node => Self::Node,
            current if current == incoming => current,
            Self::Any => incoming,
            _ => Self::Node,
        }
    }
}

/// Physical location of a node record: page number in the high 32 bits,
/// tuple id in the low 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageAddress(u64);

impl StorageAddress {
    pub fn new(page: u32, tid: u16) -> Self {
        Self((u64::from(page) << 32) | u64::from(tid))
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn page(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn tid(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

/// Anything addressable by document and node identifier.
///
/// Document-order sorting and duplicate removal in [`crate::node_set::order`]
/// are written against this trait, so they work for node references and for
/// any other type a caller keys the same way.
pub trait NodeHandle {
    fn doc_id(&self) -> DocId;
    fn node_id(&self) -> &NodeId;

    /// Total document order: document id first, then identifier order.
    fn compare_document_order(&self, other: &Self) -> Ordering {
        self.doc_id().cmp(&other.doc_id()).then_with(|| self.node_id().cmp(other.node_id()))
    }

    fn is_same_node(&self, other: &Self) -> bool {
        self.doc_id() == other.doc_id() && self.node_id() == other.node_id()
    }
}
