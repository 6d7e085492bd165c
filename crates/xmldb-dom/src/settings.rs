/// Tuning knobs for node sets and node pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomSettings {
    /// Initial capacity of a node set's backing storage.
    pub initial_capacity: usize,
    /// Upper bound honoured for advisory size hints passed to `add_with_hint`.
    pub max_size_hint: usize,
    /// Number of recycled records a [`NodePool`](crate::stored::NodePool) keeps.
    pub pool_capacity: usize,
}

impl Default for DomSettings {
    fn default() -> Self {
        Self { initial_capacity: 64, max_size_hint: 65_536, pool_capacity: 128 }
    }
}

impl DomSettings {
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_max_size_hint(mut self, hint: usize) -> Self {
        self.max_size_hint = hint;
        self
    }

    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}
