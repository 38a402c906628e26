//! Symbol interning table.

use core_types::{RError, Sexp};

/// Number of hash buckets.
pub const HSIZE: usize = 211;
/// Longest accepted symbol name in bytes.
pub const MAXIDSIZE: usize = 256;

/// PJW hash of a symbol name.
pub fn hashpjw(name: &[u8]) -> usize {
    let mut h: u32 = 0;
    for &byte in name {
        h = (h << 4).wrapping_add(u32::from(byte));
        let g = h & 0xf000_0000;
        if g != 0 {
            h ^= g >> 24;
            h ^= g;
        }
    }
    h as usize
}

/// Checks that `name` may be interned.
pub fn validate_name(name: &str) -> Result<(), RError> {
    if name.is_empty() {
        return Err(RError::invalid("attempt to use zero-length variable name"));
    }
    if name.len() > MAXIDSIZE {
        return Err(RError::invalid(format!(
            "symbol name longer than {} bytes",
            MAXIDSIZE
        )));
    }
    Ok(())
}

/// Chained hash table of interned symbols.
///
/// The table stores handles only; the heap compares names through each
/// symbol's print name.
#[derive(Debug)]
pub struct SymbolTable {
    buckets: Vec<Vec<Sexp>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        SymbolTable {
            buckets: vec![Vec::new(); HSIZE],
        }
    }

    /// Symbols in the bucket for `name`.
    pub fn bucket(&self, name: &str) -> &[Sexp] {
        &self.buckets[hashpjw(name.as_bytes()) % HSIZE]
    }

    /// Adds a freshly created symbol.
    pub fn insert(&mut self, name: &str, sym: Sexp) {
        self.buckets[hashpjw(name.as_bytes()) % HSIZE].push(sym);
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// True when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every interned symbol.
    pub fn iter(&self) -> impl Iterator<Item = Sexp> + '_ {
        self.buckets.iter().flatten().copied()
    }
}
