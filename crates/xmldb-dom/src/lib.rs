//! Persistent node layer of a native XML database.
//!
//! Nodes of stored documents are addressed by hierarchical identifiers
//! ([`NodeId`]) whose bit encoding sorts in document order. Query steps work
//! on [`NodeSet`]s of lightweight [`NodeRef`]s and relate them with
//! identifier-only structural joins. Leaf nodes are read from and written to
//! their binary records through [`stored`].

pub mod context;
pub mod document_set;
pub mod error;
pub mod model;
pub mod node_ref;
pub mod node_set;
pub mod numbering;
pub mod settings;
pub mod stored;
pub mod virtual_set;

pub use context::{ContextChain, ContextId, ContextItem};
pub use document_set::{DefaultDocumentSet, DocumentHandle, DocumentSet, LockManager, LockMode, ManagedLocks};
pub use error::{DomError, LockError, Result};
pub use model::{DocId, ItemType, NodeHandle, NodeKind, StorageAddress};
pub use node_ref::NodeRef;
pub use node_set::{NodeLookup, NodeSet, NodeSetIter, SelectMode};
pub use numbering::{DlnFactory, NodeId, NodeIdFactory, Relation};
pub use settings::DomSettings;
pub use stored::{CharacterKind, CharacterNode, NodePool, ProcessingInstructionNode, Signature, StoredContent, StoredNode};
pub use virtual_set::{Axis, DocumentTree, NodeTest, VirtualNodeSet};
