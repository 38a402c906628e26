//! Fixed-size node heap.
//!
//! Cells are pre-linked into a free list at initialization. Allocation pops
//! the head of the free list; the sweep phase pushes unmarked cells back.

use crate::object::{Cell, SexpRec};
use core_types::Sexp;

/// One slot of the node heap.
#[derive(Debug, Clone)]
enum Slot {
    /// On the free list, linking to the next free slot
    Free(Option<u32>),
    /// Holding a live (or not yet swept) object
    Live(Cell),
}

/// Arena of fixed-size object cells with an intrusive free list.
#[derive(Debug)]
pub struct NodeHeap {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    free_count: usize,
}

impl NodeHeap {
    /// Creates a heap whose first slots hold `reserved` records and whose
    /// remaining `capacity - reserved.len()` slots are free.
    pub fn new(capacity: usize, reserved: &[SexpRec]) -> Self {
        let mut heap = NodeHeap {
            slots: reserved.iter().map(|rec| Slot::Live(Cell::new(*rec))).collect(),
            free_head: None,
            free_count: 0,
        };
        heap.grow_to(capacity.max(reserved.len()));
        heap
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots on the free list.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Number of slots holding objects.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_count
    }

    /// Appends free slots until the heap holds `capacity` slots.
    pub fn grow_to(&mut self, capacity: usize) {
        let start = self.slots.len();
        if capacity <= start {
            return;
        }
        self.slots.reserve(capacity - start);
        // ascending links so allocation fills low slots first
        for index in start..capacity {
            let next = if index + 1 < capacity {
                Some((index + 1) as u32)
            } else {
                self.free_head
            };
            self.slots.push(Slot::Free(next));
        }
        self.free_head = Some(start as u32);
        self.free_count += capacity - start;
    }

    /// Pops the free list head and stores `rec` there.
    pub fn take(&mut self, rec: SexpRec) -> Option<Sexp> {
        let index = self.free_head?;
        let next = match self.slots[index as usize] {
            Slot::Free(next) => next,
            Slot::Live(_) => return None,
        };
        self.free_head = next;
        self.free_count -= 1;
        self.slots[index as usize] = Slot::Live(Cell::new(rec));
        Some(Sexp::from_index(index as usize))
    }

    /// Returns the cell behind a handle, if it is live.
    pub fn get(&self, x: Sexp) -> Option<&Cell> {
        match self.slots.get(x.index()) {
            Some(Slot::Live(cell)) => Some(cell),
            _ => None,
        }
    }

    /// Mutable access to a live cell.
    pub fn get_mut(&mut self, x: Sexp) -> Option<&mut Cell> {
        match self.slots.get_mut(x.index()) {
            Some(Slot::Live(cell)) => Some(cell),
            _ => None,
        }
    }

    /// True when `x` refers to a live cell.
    pub fn is_live(&self, x: Sexp) -> bool {
        self.get(x).is_some()
    }

    /// Returns every unmarked live cell to the free list and clears the mark
    /// bit of the survivors. Slots below `keep` are never freed.
    ///
    /// Returns the number of cells freed.
    pub fn sweep(&mut self, keep: usize) -> usize {
        let keep = keep.min(self.slots.len());
        let mut freed = 0;
        for index in (keep..self.slots.len()).rev() {
            match &mut self.slots[index] {
                Slot::Live(cell) if cell.info.mark => {
                    cell.info.mark = false;
                    continue;
                }
                Slot::Live(_) => {}
                Slot::Free(_) => continue,
            }
            self.slots[index] = Slot::Free(self.free_head);
            self.free_head = Some(index as u32);
            self.free_count += 1;
            freed += 1;
        }
        for slot in &mut self.slots[..keep] {
            if let Slot::Live(cell) = slot {
                cell.info.mark = false;
            }
        }
        freed
    }
}
