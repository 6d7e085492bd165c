//! Node numbering.
//!
//! Every stored node is addressed by a [`NodeId`]: a dynamic level number
//! (DLN) whose bit encoding compares in document order, so ordering and
//! ancestor tests never have to touch the stored tree.

mod dln;

pub use dln::NodeId;

use crate::error::{DomError, Result};

/// Structural relation of a node to a candidate ancestor, as computed by
/// [`NodeId::compute_relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Self_,
    Child,
    Descendant,
}

/// Creates identifiers from their stored form.
pub trait NodeIdFactory: Send + Sync {
    /// Reads an identifier of `units` significant bits starting at `offset`.
    fn create_from_data(&self, units: u16, data: &[u8], offset: usize) -> Result<NodeId>;

    /// Number of bytes an identifier of `units` bits occupies on disk.
    fn length_in_bytes(&self, units: u16) -> usize {
        usize::from(units).div_ceil(8)
    }

    fn document_node(&self) -> NodeId {
        NodeId::document()
    }

    fn root_node(&self) -> NodeId {
        NodeId::root()
    }
}

/// Factory for DLN identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DlnFactory;

impl NodeIdFactory for DlnFactory {
    fn create_from_data(&self, units: u16, data: &[u8], offset: usize) -> Result<NodeId> {
        let end = offset.saturating_add(self.length_in_bytes(units));
        let bytes = data.get(offset..end).ok_or_else(|| {
            DomError::format("node id", format!("{units} units at offset {offset} exceed {} byte buffer", data.len()))
        })?;
        NodeId::from_data(units, bytes)
    }
}
