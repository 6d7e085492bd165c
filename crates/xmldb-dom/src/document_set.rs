//! Sets of documents and scoped document locks.
//!
//! The storage engine owns documents and their locks. This module only
//! describes what the node layer needs from it: which documents a set
//! touches, and an all-or-nothing way to lease locks on all of them.

use std::collections::BTreeMap;

use compact_str::CompactString;
use tracing::trace;

use crate::error::LockError;
use crate::model::DocId;
use crate::node_set::NodeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Read,
    Write,
}

impl LockMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Document lock collaborator supplied by the storage engine.
pub trait LockManager {
    fn acquire(&self, doc: DocId, mode: LockMode) -> Result<(), LockError>;
    fn release(&self, doc: DocId, mode: LockMode);
}

/// Locks held on a set of documents, released when dropped.
///
/// Acquisition is all-or-nothing: if one lock fails, every lock taken so
/// far is released before the error is returned.
pub struct ManagedLocks<'a> {
    manager: &'a dyn LockManager,
    mode: LockMode,
    held: Vec<DocId>,
}

impl<'a> ManagedLocks<'a> {
    pub fn acquire(
        manager: &'a dyn LockManager,
        docs: impl IntoIterator<Item = DocId>,
        mode: LockMode,
    ) -> Result<Self, LockError> {
        let mut locks = Self { manager, mode, held: Vec::new() };
        for doc in docs {
            trace!(%doc, mode = mode.as_str(), "acquiring document lock");
            manager.acquire(doc, mode)?;
            locks.held.push(doc);
        }
        Ok(locks)
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn documents(&self) -> &[DocId] {
        &self.held
    }
}

impl core::fmt::Debug for ManagedLocks<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManagedLocks").field("mode", &self.mode).field("held", &self.held).finish_non_exhaustive()
    }
}

impl Drop for ManagedLocks<'_> {
    fn drop(&mut self) {
        for doc in self.held.drain(..).rev() {
            trace!(%doc, mode = self.mode.as_str(), "releasing document lock");
            self.manager.release(doc, self.mode);
        }
    }
}

/// What the node layer needs to know about a set of documents.
pub trait DocumentSet {
    /// Distinct document ids in ascending order.
    fn document_ids(&self) -> Vec<DocId>;

    fn document_count(&self) -> usize {
        self.document_ids().len()
    }

    fn contains_document(&self, doc: DocId) -> bool {
        self.document_ids().binary_search(&doc).is_ok()
    }

    /// Resolves a document by id. Sets that only know ids return `None`.
    fn document(&self, _doc: DocId) -> Option<&DocumentHandle> {
        None
    }

    fn contains_all(&self, other: &dyn DocumentSet) -> bool {
        let mine = self.document_ids();
        other.document_ids().iter().all(|doc| mine.binary_search(doc).is_ok())
    }

    /// Ids present in both sets.
    fn intersection(&self, other: &dyn DocumentSet) -> Vec<DocId> {
        let theirs = other.document_ids();
        self.document_ids().into_iter().filter(|doc| theirs.binary_search(doc).is_ok()).collect()
    }

    /// Locks every document of the set in ascending id order.
    fn lock<'m>(&self, manager: &'m dyn LockManager, exclusive: bool) -> Result<ManagedLocks<'m>, LockError> {
        let mode = if exclusive { LockMode::Write } else { LockMode::Read };
        ManagedLocks::acquire(manager, self.document_ids(), mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    id: DocId,
    uri: CompactString,
}

impl DocumentHandle {
    pub fn new(id: DocId, uri: impl Into<CompactString>) -> Self {
        Self { id, uri: uri.into() }
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Document set keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultDocumentSet {
    docs: BTreeMap<DocId, DocumentHandle>,
}

impl DefaultDocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle`, returning the handle it replaces.
    pub fn add(&mut self, handle: DocumentHandle) -> Option<DocumentHandle> {
        self.docs.insert(handle.id, handle)
    }

    pub fn remove(&mut self, doc: DocId) -> Option<DocumentHandle> {
        self.docs.remove(&doc)
    }

    /// Resolves a document by id.
    pub fn get(&self, doc: DocId) -> Option<&DocumentHandle> {
        self.docs.get(&doc)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentHandle> {
        self.docs.values()
    }

    /// Handles of this set whose documents are also in `other`.
    pub fn intersect_with(&self, other: &dyn DocumentSet) -> DefaultDocumentSet {
        self.iter().filter(|handle| other.contains_document(handle.id)).cloned().collect()
    }
}

impl FromIterator<DocumentHandle> for DefaultDocumentSet {
    fn from_iter<I: IntoIterator<Item = DocumentHandle>>(iter: I) -> Self {
        Self { docs: iter.into_iter().map(|handle| (handle.id, handle)).collect() }
    }
}

impl DocumentSet for DefaultDocumentSet {
    fn document_ids(&self) -> Vec<DocId> {
        self.docs.keys().copied().collect()
    }

    fn document_count(&self) -> usize {
        self.docs.len()
    }

    fn contains_document(&self, doc: DocId) -> bool {
        self.docs.contains_key(&doc)
    }

    fn document(&self, doc: DocId) -> Option<&DocumentHandle> {
        self.get(doc)
    }
}

impl DocumentSet for NodeSet {
    fn document_ids(&self) -> Vec<DocId> {
        self.distinct_documents()
    }
}
