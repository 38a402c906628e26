//! Variable-size vector heap.
//!
//! Payloads are stored as blocks, each carrying a back-reference to the node
//! that owns it. Space is accounted in 8-byte units: every block costs the
//! units its elements need plus one unit for the back-reference. Freed
//! payloads are never reclaimed individually; the collector compacts the heap
//! after marking, sliding live blocks down and renumbering their owners.

use core_types::{Complex, Sexp, SexpType};

/// Size of one allocation unit in bytes.
pub const VECREC_BYTES: usize = 8;

/// Number of units needed to hold `bytes` bytes.
pub fn byte2vec(bytes: usize) -> usize {
    if bytes == 0 {
        0
    } else {
        (bytes - 1) / VECREC_BYTES + 1
    }
}

/// Units occupied by a payload of `length` elements of type `ty`, including
/// the back-reference unit. `None` when the size overflows.
///
/// # Examples
///
/// ```
/// use core_types::SexpType;
/// use memory_manager::vector_units;
///
/// // "abc" plus terminator fits in one unit
/// assert_eq!(vector_units(SexpType::Char, 3), Some(2));
/// assert_eq!(vector_units(SexpType::Real, 4), Some(5));
/// assert_eq!(vector_units(SexpType::Integer, 3), Some(3));
/// assert_eq!(vector_units(SexpType::Real, usize::MAX / 2), None);
/// ```
pub fn vector_units(ty: SexpType, length: usize) -> Option<usize> {
    let bytes = match ty {
        SexpType::Char => length.checked_add(1)?,
        SexpType::Logical | SexpType::Integer => length.checked_mul(std::mem::size_of::<i32>())?,
        SexpType::Real => length.checked_mul(std::mem::size_of::<f64>())?,
        SexpType::Complex => length.checked_mul(std::mem::size_of::<Complex>())?,
        _ => length.checked_mul(VECREC_BYTES)?,
    };
    byte2vec(bytes).checked_add(1)
}

/// Element storage of one vector.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    /// Bytes of a scalar string cell
    Bytes(Vec<u8>),
    /// Logical elements (`NA_LOGICAL` for missing)
    Logical(Vec<i32>),
    /// Integer elements (`NA_INTEGER` for missing)
    Integer(Vec<i32>),
    /// Real elements
    Real(Vec<f64>),
    /// Complex elements
    Complex(Vec<Complex>),
    /// Object references: string cells, list elements or expressions
    Refs(Vec<Sexp>),
}

impl VectorData {
    /// Creates zeroed storage for `length` elements of type `ty`.
    ///
    /// Reference vectors are filled with `fill`. Returns `None` for
    /// non-vector types.
    pub fn new(ty: SexpType, length: usize, fill: Sexp) -> Option<Self> {
        Some(match ty {
            SexpType::Char => VectorData::Bytes(vec![0; length]),
            SexpType::Logical => VectorData::Logical(vec![0; length]),
            SexpType::Integer => VectorData::Integer(vec![0; length]),
            SexpType::Real => VectorData::Real(vec![0.0; length]),
            SexpType::Complex => VectorData::Complex(vec![Complex::default(); length]),
            SexpType::Str | SexpType::Generic | SexpType::Expression => {
                VectorData::Refs(vec![fill; length])
            }
            _ => return None,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            VectorData::Bytes(v) => v.len(),
            VectorData::Logical(v) | VectorData::Integer(v) => v.len(),
            VectorData::Real(v) => v.len(),
            VectorData::Complex(v) => v.len(),
            VectorData::Refs(v) => v.len(),
        }
    }

    /// True when there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the first `n` elements.
    pub fn prefix(&self, n: usize) -> Self {
        match self {
            VectorData::Bytes(v) => VectorData::Bytes(v[..n.min(v.len())].to_vec()),
            VectorData::Logical(v) => VectorData::Logical(v[..n.min(v.len())].to_vec()),
            VectorData::Integer(v) => VectorData::Integer(v[..n.min(v.len())].to_vec()),
            VectorData::Real(v) => VectorData::Real(v[..n.min(v.len())].to_vec()),
            VectorData::Complex(v) => VectorData::Complex(v[..n.min(v.len())].to_vec()),
            VectorData::Refs(v) => VectorData::Refs(v[..n.min(v.len())].to_vec()),
        }
    }

    /// Object references held by this payload, if any.
    pub fn refs(&self) -> &[Sexp] {
        match self {
            VectorData::Refs(v) => v,
            _ => &[],
        }
    }
}

#[derive(Debug)]
struct Block {
    owner: Sexp,
    units: usize,
    data: VectorData,
}

/// Compacting arena for vector payloads.
#[derive(Debug)]
pub struct VectorHeap {
    blocks: Vec<Block>,
    used_units: usize,
    capacity_units: usize,
}

impl VectorHeap {
    /// Creates an empty heap of `bytes` bytes.
    pub fn new(bytes: usize) -> Self {
        VectorHeap {
            blocks: Vec::new(),
            used_units: 0,
            capacity_units: bytes / VECREC_BYTES,
        }
    }

    /// Capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_units * VECREC_BYTES
    }

    /// Bytes currently occupied by payloads.
    pub fn used_bytes(&self) -> usize {
        self.used_units * VECREC_BYTES
    }

    /// Units still available below the high-water mark.
    pub fn free_units(&self) -> usize {
        self.capacity_units - self.used_units
    }

    /// True when a payload of `units` units fits without collection.
    pub fn fits(&self, units: usize) -> bool {
        units <= self.free_units()
    }

    /// Number of blocks; also the index the next block will receive.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Raises the capacity to `bytes`.
    pub fn grow_to(&mut self, bytes: usize) {
        self.capacity_units = self.capacity_units.max(bytes / VECREC_BYTES);
    }

    /// Appends a payload owned by `owner` and returns its block index.
    ///
    /// The caller checks [`VectorHeap::fits`] first.
    pub fn push(&mut self, owner: Sexp, units: usize, data: VectorData) -> usize {
        self.used_units += units;
        self.blocks.push(Block { owner, units, data });
        self.blocks.len() - 1
    }

    /// Payload of a block.
    pub fn get(&self, block: usize) -> Option<&VectorData> {
        self.blocks.get(block).map(|b| &b.data)
    }

    /// Mutable payload of a block.
    pub fn get_mut(&mut self, block: usize) -> Option<&mut VectorData> {
        self.blocks.get_mut(block).map(|b| &mut b.data)
    }

    /// Drops every block whose owner fails `live` and slides the survivors
    /// down. Returns the number of units freed.
    ///
    /// Block indices change; use [`VectorHeap::owners`] afterwards to
    /// renumber the owning headers.
    pub fn compact(&mut self, mut live: impl FnMut(Sexp) -> bool) -> usize {
        let before = self.used_units;
        self.blocks.retain(|b| live(b.owner));
        self.used_units = self.blocks.iter().map(|b| b.units).sum();
        before - self.used_units
    }

    /// Owners in block order.
    pub fn owners(&self) -> impl Iterator<Item = Sexp> + '_ {
        self.blocks.iter().map(|b| b.owner)
    }
}
