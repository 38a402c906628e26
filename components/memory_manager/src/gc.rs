//! Stop-the-world mark-sweep collector.
//!
//! The mark phase traces from the protection stack, the symbol table and
//! the distinguished objects with an explicit worklist, so deep or cyclic
//! structures neither overflow the native stack nor loop. The sweep phase
//! first compacts the vector heap against the marks, then returns unmarked
//! nodes to the free list and clears the marks.

use crate::heap::Heap;
use core_types::Sexp;
use tracing::debug;

/// Collector counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Number of collections run
    pub collections: usize,
    /// Nodes freed by the last collection
    pub nodes_freed: usize,
    /// Vector bytes reclaimed by the last collection
    pub vector_bytes_freed: usize,
    /// Nodes freed over the heap lifetime
    pub total_nodes_freed: usize,
    /// Node heap capacity
    pub node_capacity: usize,
    /// Nodes in use
    pub nodes_in_use: usize,
    /// Vector heap capacity in bytes
    pub vector_capacity: usize,
    /// Vector bytes in use
    pub vector_in_use: usize,
}

impl Heap {
    /// Runs a full collection and returns the updated counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use memory_manager::{Heap, MemoryConfig};
    ///
    /// let mut heap = Heap::new(MemoryConfig::default()).unwrap();
    /// let kept = heap.scalar_real(1.0).unwrap();
    /// let _guard = heap.protect(kept).unwrap();
    /// let dropped = heap.scalar_real(2.0).unwrap();
    ///
    /// let stats = heap.collect();
    /// assert!(stats.nodes_freed >= 1);
    /// assert!(heap.is_allocated(kept));
    /// assert!(!heap.is_allocated(dropped));
    /// ```
    pub fn collect(&mut self) -> GcStats {
        self.collect_with(&[]);
        self.stats.clone()
    }

    /// Collects with `extras` treated as additional roots.
    pub(crate) fn collect_with(&mut self, extras: &[Sexp]) {
        let mut roots: Vec<Sexp> = extras.to_vec();
        roots.extend(self.permanent_roots());
        roots.extend(self.symbols.iter());
        self.protect.extend_roots(&mut roots);
        self.mark(roots);

        let nodes = &self.nodes;
        let units_freed = self
            .vectors
            .compact(|owner| nodes.get(owner).map_or(false, |cell| cell.info.mark));
        self.renumber_blocks();
        let nodes = &self.nodes;
        self.attributes
            .retain(|x, _| nodes.get(*x).map_or(false, |cell| cell.info.mark));
        let nodes_freed = self.nodes.sweep(Sexp::RESERVED);

        self.stats.collections += 1;
        self.stats.nodes_freed = nodes_freed;
        self.stats.vector_bytes_freed = units_freed * crate::vector_heap::VECREC_BYTES;
        self.stats.total_nodes_freed += nodes_freed;
        self.refresh_stats();
        debug!(
            collection = self.stats.collections,
            nodes_freed,
            nodes_in_use = self.stats.nodes_in_use,
            vector_bytes_freed = self.stats.vector_bytes_freed,
            vector_in_use = self.stats.vector_in_use,
            "garbage collection"
        );
    }

    fn mark(&mut self, mut work: Vec<Sexp>) {
        while let Some(x) = work.pop() {
            let Some(cell) = self.nodes.get_mut(x) else {
                continue;
            };
            if cell.info.mark {
                continue;
            }
            cell.info.mark = true;
            let rec = cell.rec;
            rec.push_children(&mut work);
            if let Some(data) = rec.vec_header().and_then(|h| self.vectors.get(h.block)) {
                work.extend_from_slice(data.refs());
            }
            if let Some(attrs) = self.attributes.get(&x) {
                work.push(*attrs);
            }
        }
    }

    fn renumber_blocks(&mut self) {
        let owners: Vec<Sexp> = self.vectors.owners().collect();
        for (block, owner) in owners.into_iter().enumerate() {
            if let Some(h) = self
                .nodes
                .get_mut(owner)
                .and_then(|cell| cell.rec.vec_header_mut())
            {
                h.block = block;
            }
        }
    }

    pub(crate) fn refresh_stats(&mut self) {
        self.stats.node_capacity = self.nodes.capacity();
        self.stats.nodes_in_use = self.nodes.live_count();
        self.stats.vector_capacity = self.vectors.capacity_bytes();
        self.stats.vector_in_use = self.vectors.used_bytes();
    }

    /// Collector counters as of the last collection. The usage fields are
    /// a snapshot; [`Heap::nodes_in_use`] and [`Heap::vector_in_use`] give
    /// current values.
    pub fn gc_stats(&self) -> &GcStats {
        &self.stats
    }

    /// Nodes currently allocated.
    pub fn nodes_in_use(&self) -> usize {
        self.nodes.live_count()
    }

    /// Vector heap bytes currently allocated.
    pub fn vector_in_use(&self) -> usize {
        self.vectors.used_bytes()
    }

    /// True when `x` refers to a live object.
    ///
    /// A handle to an object reclaimed by a collection reports false until
    /// its slot is reused.
    pub fn is_allocated(&self, x: Sexp) -> bool {
        self.nodes.is_live(x)
    }
}
