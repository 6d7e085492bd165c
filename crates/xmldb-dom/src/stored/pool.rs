use tracing::warn;

use super::{CharacterKind, CharacterNode, ProcessingInstructionNode, StoredNode};
use crate::error::{DomError, Result};
use crate::numbering::NodeId;
use crate::settings::DomSettings;

/// Bounded pool of released leaf nodes, owned by the caller.
///
/// Decoding through a pool refills a released node instead of allocating a
/// new one. The result is indistinguishable from a freshly decoded node.
#[derive(Debug)]
pub struct NodePool {
    capacity: usize,
    characters: Vec<CharacterNode>,
    instructions: Vec<ProcessingInstructionNode>,
    reused: u64,
}

impl Default for NodePool {
    fn default() -> Self {
        Self::with_settings(&DomSettings::default())
    }
}

impl NodePool {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, characters: Vec::new(), instructions: Vec::new(), reused: 0 }
    }

    pub fn with_settings(settings: &DomSettings) -> Self {
        Self::new(settings.pool_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of nodes waiting to be reused.
    pub fn len(&self) -> usize {
        self.characters.len() + self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many decodes were served from released nodes.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    pub fn clear(&mut self) {
        self.characters.clear();
        self.instructions.clear();
    }

    /// Hands `node` back for reuse. A full pool is cleared and the release
    /// retried once.
    pub fn release(&mut self, node: StoredNode) -> Result<()> {
        if self.len() >= self.capacity {
            warn!(capacity = self.capacity, "node pool full, clearing");
            self.clear();
            if self.len() >= self.capacity {
                return Err(DomError::CapacityOverflow { capacity: self.capacity });
            }
        }
        match node {
            StoredNode::Character(node) => self.characters.push(node),
            StoredNode::ProcessingInstruction(node) => self.instructions.push(node),
        }
        Ok(())
    }

    pub(crate) fn character(&mut self, kind: CharacterKind, node_id: NodeId, data: &str) -> CharacterNode {
        match self.characters.pop() {
            Some(mut node) => {
                self.reused += 1;
                node.reuse(kind, node_id, data);
                node
            }
            None => CharacterNode::new(kind, node_id, data),
        }
    }

    pub(crate) fn processing_instruction(&mut self, node_id: NodeId, target: &str, data: &str) -> ProcessingInstructionNode {
        match self.instructions.pop() {
            Some(mut node) => {
                self.reused += 1;
                node.reuse(node_id, target, data);
                node
            }
            None => ProcessingInstructionNode::new(node_id, target, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn comment(data: &str) -> StoredNode {
        CharacterNode::comment(NodeId::root(), data).into()
    }

    #[rstest]
    fn full_pool_is_cleared_once() {
        let mut pool = NodePool::new(2);
        pool.release(comment("a")).unwrap();
        pool.release(comment("b")).unwrap();
        pool.release(comment("c")).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[rstest]
    fn zero_capacity_overflows() {
        let mut pool = NodePool::new(0);
        assert_eq!(pool.release(comment("a")), Err(DomError::CapacityOverflow { capacity: 0 }));
    }

    #[rstest]
    fn reuse_refills_every_field() {
        let mut pool = NodePool::default();
        pool.release(comment("old content")).unwrap();
        let id: NodeId = "1.4".parse().unwrap();
        let node = pool.character(CharacterKind::Text, id.clone(), "new");
        assert_eq!(node, CharacterNode::text(id, "new"));
        assert_eq!(pool.reused(), 1);
        assert!(pool.is_empty());
    }
}
