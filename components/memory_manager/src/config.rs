//! Capacity configuration for the heaps and the protection stack.

use serde::{Deserialize, Serialize};

/// Default depth of the pointer protection stack.
pub const DEFAULT_PP_STACK_SIZE: usize = 10_000;
/// Default number of cells in the node heap.
pub const DEFAULT_NODE_COUNT: usize = 200_000;
/// Default size of the vector heap in bytes.
pub const DEFAULT_VECTOR_BYTES: usize = 2_097_152;

/// Capacity parameters fixed at startup.
///
/// The three sizes are the documented defaults; any of them can be
/// overridden. Growth ceilings default to the initial sizes, which keeps the
/// heaps fixed for the process lifetime.
///
/// # Examples
///
/// ```
/// use memory_manager::MemoryConfig;
///
/// let config = MemoryConfig::default()
///     .with_node_count(1_000)
///     .with_max_node_count(4_000)
///     .with_torture(true);
///
/// assert_eq!(config.node_count, 1_000);
/// assert_eq!(config.node_ceiling(), 4_000);
/// assert!(config.torture);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum depth of the protection stack
    pub pp_stack_size: usize,
    /// Initial number of node cells
    pub node_count: usize,
    /// Initial vector heap size in bytes
    pub vector_bytes: usize,
    /// Node heap growth ceiling (defaults to `node_count`)
    pub max_node_count: Option<usize>,
    /// Vector heap growth ceiling in bytes (defaults to `vector_bytes`)
    pub max_vector_bytes: Option<usize>,
    /// Collect on every allocation
    pub torture: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            pp_stack_size: DEFAULT_PP_STACK_SIZE,
            node_count: DEFAULT_NODE_COUNT,
            vector_bytes: DEFAULT_VECTOR_BYTES,
            max_node_count: None,
            max_vector_bytes: None,
            torture: false,
        }
    }
}

impl MemoryConfig {
    /// Sets the protection stack depth.
    pub fn with_pp_stack_size(mut self, size: usize) -> Self {
        self.pp_stack_size = size;
        self
    }

    /// Sets the initial node count.
    pub fn with_node_count(mut self, count: usize) -> Self {
        self.node_count = count;
        self
    }

    /// Sets the initial vector heap size in bytes.
    pub fn with_vector_bytes(mut self, bytes: usize) -> Self {
        self.vector_bytes = bytes;
        self
    }

    /// Allows the node heap to grow up to `count` cells.
    pub fn with_max_node_count(mut self, count: usize) -> Self {
        self.max_node_count = Some(count);
        self
    }

    /// Allows the vector heap to grow up to `bytes`.
    pub fn with_max_vector_bytes(mut self, bytes: usize) -> Self {
        self.max_vector_bytes = Some(bytes);
        self
    }

    /// Enables or disables collection on every allocation.
    pub fn with_torture(mut self, torture: bool) -> Self {
        self.torture = torture;
        self
    }

    /// Effective node heap ceiling.
    pub fn node_ceiling(&self) -> usize {
        self.max_node_count
            .unwrap_or(self.node_count)
            .max(self.node_count)
    }

    /// Effective vector heap ceiling in bytes.
    pub fn vector_ceiling(&self) -> usize {
        self.max_vector_bytes
            .unwrap_or(self.vector_bytes)
            .max(self.vector_bytes)
    }
}
