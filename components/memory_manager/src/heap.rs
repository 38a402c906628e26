//! The object heap: node arena, vector arena, roots and constructors.
//!
//! Allocation never hands out an object the collector cannot account for.
//! Before a collection triggered by an allocation, the children of the record
//! being built are added to the root set, so constructors such as
//! [`Heap::cons`] keep their arguments alive without the caller protecting
//! them. Everything else held in native locals across an allocation must be
//! protected through [`Heap::protect`].

use crate::config::MemoryConfig;
use crate::gc::GcStats;
use crate::node_heap::NodeHeap;
use crate::object::{ClosureCell, EnvCell, ListCell, PromiseCell, SexpRec, SymbolCell, VecHeader};
use crate::protect::{Protected, ProtectionStack};
use crate::symbols::{self, SymbolTable};
use crate::vector_heap::{vector_units, VectorData, VectorHeap, VECREC_BYTES};
use core_types::{Complex, HeapKind, RError, Sexp, SexpType};
use std::collections::HashMap;
use tracing::warn;

/// Smallest node heap accepted, enough for the distinguished objects.
const MIN_NODE_COUNT: usize = 64;
/// Smallest vector heap accepted, in bytes.
const MIN_VECTOR_BYTES: usize = 1024;
/// A collection that leaves less than 1/MIN_FREE_DIVISOR of a heap free
/// grows that heap, if its ceiling allows.
const MIN_FREE_DIVISOR: usize = 5;

/// Symbol-shaped marker whose value slot refers to itself.
fn marker(this: Sexp) -> SexpRec {
    SexpRec::Symbol(SymbolCell {
        pname: Sexp::NIL,
        value: this,
        internal: Sexp::NIL,
    })
}

/// Owner of every language object.
///
/// # Examples
///
/// ```
/// use memory_manager::{Heap, MemoryConfig};
///
/// let mut heap = Heap::new(MemoryConfig::default()).unwrap();
/// let x = heap.install("x").unwrap();
/// assert_eq!(heap.install("x").unwrap(), x);
///
/// let v = heap.scalar_real(1.5).unwrap();
/// let cell = heap.cons(v, core_types::Sexp::NIL).unwrap();
/// assert_eq!(heap.car(cell).unwrap(), v);
/// ```
#[derive(Debug)]
pub struct Heap {
    pub(crate) config: MemoryConfig,
    pub(crate) nodes: NodeHeap,
    pub(crate) vectors: VectorHeap,
    pub(crate) protect: ProtectionStack,
    pub(crate) symbols: SymbolTable,
    pub(crate) attributes: HashMap<Sexp, Sexp>,
    pub(crate) stats: GcStats,
    blank_string: Sexp,
    na_string: Sexp,
    global_env: Sexp,
    pub(crate) class_symbol: Sexp,
}

impl Heap {
    /// Creates a heap sized by `config` and allocates the distinguished
    /// objects.
    ///
    /// # Errors
    ///
    /// Fails only when the configured heaps cannot hold the distinguished
    /// objects.
    pub fn new(config: MemoryConfig) -> Result<Self, RError> {
        let reserved = [
            SexpRec::Nil,
            marker(Sexp::UNBOUND),
            marker(Sexp::MISSING_ARG),
        ];
        let nodes = NodeHeap::new(config.node_count.max(MIN_NODE_COUNT), &reserved);
        let vectors = VectorHeap::new(config.vector_bytes.max(MIN_VECTOR_BYTES));
        let mut heap = Heap {
            protect: ProtectionStack::new(config.pp_stack_size),
            nodes,
            vectors,
            symbols: SymbolTable::new(),
            attributes: HashMap::new(),
            stats: GcStats::default(),
            blank_string: Sexp::NIL,
            na_string: Sexp::NIL,
            global_env: Sexp::NIL,
            class_symbol: Sexp::NIL,
            config,
        };
        heap.blank_string = heap.mk_char("")?;
        heap.na_string = heap.mk_char("NA")?;
        let blank = heap.blank_string;
        if let Some(SexpRec::Symbol(sym)) = heap.nodes.get_mut(Sexp::MISSING_ARG).map(|c| &mut c.rec) {
            sym.pname = blank;
        }
        heap.global_env = heap.new_env(Sexp::NIL, Sexp::NIL)?;
        heap.class_symbol = heap.install("class")?;
        heap.refresh_stats();
        Ok(heap)
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// The zero-length string cell.
    pub fn blank_string(&self) -> Sexp {
        self.blank_string
    }

    /// The `"NA"` string cell used as the missing string.
    pub fn na_string(&self) -> Sexp {
        self.na_string
    }

    /// The global environment.
    pub fn global_env(&self) -> Sexp {
        self.global_env
    }

    /// Enables or disables collection on every allocation.
    pub fn set_torture(&mut self, torture: bool) {
        self.config.torture = torture;
    }

    /// Distinguished objects that are always roots.
    pub(crate) fn permanent_roots(&self) -> [Sexp; 6] {
        [
            Sexp::NIL,
            Sexp::UNBOUND,
            Sexp::MISSING_ARG,
            self.blank_string,
            self.na_string,
            self.global_env,
        ]
    }

    // ---- roots ------------------------------------------------------------

    /// Protects `x` until the guard is dropped.
    pub fn protect(&self, x: Sexp) -> Result<Protected, RError> {
        self.protect.protect(x)
    }

    /// The protection stack shared by all guards of this heap.
    pub fn protection_stack(&self) -> &ProtectionStack {
        &self.protect
    }

    // ---- allocation -------------------------------------------------------

    fn grow_nodes(&mut self) {
        let capacity = self.nodes.capacity();
        let ceiling = self.config.node_ceiling();
        if capacity >= ceiling {
            return;
        }
        let target = capacity.saturating_mul(2).min(ceiling);
        warn!(from = capacity, to = target, "growing node heap");
        self.nodes.grow_to(target);
    }

    fn grow_vectors(&mut self, units: usize) {
        let capacity = self.vectors.capacity_bytes();
        let ceiling = self.config.vector_ceiling();
        let needed = self.vectors.used_bytes() + units * VECREC_BYTES;
        let target = capacity.saturating_mul(2).max(needed).min(ceiling);
        if target <= capacity {
            return;
        }
        warn!(from = capacity, to = target, "growing vector heap");
        self.vectors.grow_to(target);
    }

    /// Makes sure a node is free, collecting and growing as needed.
    fn ensure_free_node(&mut self, extras: &[Sexp]) -> Result<(), RError> {
        if self.config.torture || self.nodes.free_count() == 0 {
            self.collect_with(extras);
            if self.nodes.free_count() < self.nodes.capacity() / MIN_FREE_DIVISOR {
                self.grow_nodes();
            }
        }
        if self.nodes.free_count() == 0 {
            return Err(RError::HeapExhausted(HeapKind::Node));
        }
        Ok(())
    }

    /// Makes sure `units` vector units fit, collecting and growing as needed.
    fn ensure_vector_space(&mut self, units: usize, extras: &[Sexp]) -> Result<(), RError> {
        if self.vectors.fits(units) {
            return Ok(());
        }
        self.collect_with(extras);
        let low = self.vectors.free_units() * VECREC_BYTES
            < self.vectors.capacity_bytes() / MIN_FREE_DIVISOR;
        if !self.vectors.fits(units) || low {
            self.grow_vectors(units);
        }
        if !self.vectors.fits(units) {
            return Err(RError::HeapExhausted(HeapKind::Vector));
        }
        Ok(())
    }

    /// Allocates a node holding `rec`. The record's children are roots for
    /// any collection this triggers.
    pub(crate) fn alloc_node(&mut self, rec: SexpRec) -> Result<Sexp, RError> {
        let mut extras = Vec::new();
        rec.push_children(&mut extras);
        self.ensure_free_node(&extras)?;
        self.nodes
            .take(rec)
            .ok_or(RError::HeapExhausted(HeapKind::Node))
    }

    /// Allocates a vector of `length` elements.
    ///
    /// Numeric elements start at zero, string elements at the blank string
    /// and list elements at nil. `List` and `Lang` produce pair lists of the
    /// given length.
    pub fn alloc_vector(&mut self, ty: SexpType, length: usize) -> Result<Sexp, RError> {
        match ty {
            SexpType::List => return self.alloc_list(length),
            SexpType::Lang => {
                let list = self.alloc_list(length)?;
                if length > 0 {
                    self.set_type(list, SexpType::Lang)?;
                }
                return Ok(list);
            }
            _ => {}
        }
        let fill = if ty == SexpType::Str {
            self.blank_string
        } else {
            Sexp::NIL
        };
        let invalid = || {
            RError::invalid(format!(
                "invalid type/length ({}/{}) in vector allocation",
                ty, length
            ))
        };
        let units = vector_units(ty, length)
            .filter(|u| {
                u.checked_mul(VECREC_BYTES)
                    .map_or(false, |bytes| bytes <= self.config.vector_ceiling())
            })
            .ok_or(RError::HeapExhausted(HeapKind::Vector))?;
        let data = VectorData::new(ty, length, fill).ok_or_else(invalid)?;
        self.ensure_vector_space(units, &[])?;
        self.ensure_free_node(&[])?;
        let header = VecHeader {
            length,
            truelength: length,
            block: self.vectors.block_count(),
        };
        let rec = SexpRec::vector(ty, header).ok_or_else(invalid)?;
        let x = self
            .nodes
            .take(rec)
            .ok_or(RError::HeapExhausted(HeapKind::Node))?;
        self.vectors.push(x, units, data);
        Ok(x)
    }

    // ---- pair lists ---------------------------------------------------------

    /// Allocates a data list node.
    pub fn cons(&mut self, car: Sexp, cdr: Sexp) -> Result<Sexp, RError> {
        self.alloc_node(SexpRec::List(ListCell {
            car,
            cdr,
            tag: Sexp::NIL,
        }))
    }

    /// Allocates a call node.
    pub fn lcons(&mut self, car: Sexp, cdr: Sexp) -> Result<Sexp, RError> {
        self.alloc_node(SexpRec::Lang(ListCell {
            car,
            cdr,
            tag: Sexp::NIL,
        }))
    }

    /// A list of `n` nil elements.
    pub fn alloc_list(&mut self, n: usize) -> Result<Sexp, RError> {
        let mut list = Sexp::NIL;
        for _ in 0..n {
            list = self.cons(Sexp::NIL, list)?;
        }
        Ok(list)
    }

    /// One-element list.
    pub fn list1(&mut self, a: Sexp) -> Result<Sexp, RError> {
        self.cons(a, Sexp::NIL)
    }

    /// Two-element list.
    pub fn list2(&mut self, a: Sexp, b: Sexp) -> Result<Sexp, RError> {
        let _a = self.protect(a)?;
        let rest = self.list1(b)?;
        self.cons(a, rest)
    }

    /// Three-element list.
    pub fn list3(&mut self, a: Sexp, b: Sexp, c: Sexp) -> Result<Sexp, RError> {
        let _a = self.protect(a)?;
        let rest = self.list2(b, c)?;
        self.cons(a, rest)
    }

    /// Four-element list.
    pub fn list4(&mut self, a: Sexp, b: Sexp, c: Sexp, d: Sexp) -> Result<Sexp, RError> {
        let _a = self.protect(a)?;
        let rest = self.list3(b, c, d)?;
        self.cons(a, rest)
    }

    /// Call with no arguments.
    pub fn lang1(&mut self, f: Sexp) -> Result<Sexp, RError> {
        self.lcons(f, Sexp::NIL)
    }

    /// Call with one argument.
    pub fn lang2(&mut self, f: Sexp, a: Sexp) -> Result<Sexp, RError> {
        let _f = self.protect(f)?;
        let args = self.list1(a)?;
        self.lcons(f, args)
    }

    /// Call with two arguments.
    pub fn lang3(&mut self, f: Sexp, a: Sexp, b: Sexp) -> Result<Sexp, RError> {
        let _f = self.protect(f)?;
        let args = self.list2(a, b)?;
        self.lcons(f, args)
    }

    /// Call with three arguments.
    pub fn lang4(&mut self, f: Sexp, a: Sexp, b: Sexp, c: Sexp) -> Result<Sexp, RError> {
        let _f = self.protect(f)?;
        let args = self.list3(a, b, c)?;
        self.lcons(f, args)
    }

    // ---- scalars and strings ------------------------------------------------

    /// Length-one logical vector; `NA_LOGICAL` is the missing value.
    pub fn scalar_logical(&mut self, v: i32) -> Result<Sexp, RError> {
        let x = self.alloc_vector(SexpType::Logical, 1)?;
        self.logical_mut(x)?[0] = v;
        Ok(x)
    }

    /// Length-one integer vector.
    pub fn scalar_integer(&mut self, v: i32) -> Result<Sexp, RError> {
        let x = self.alloc_vector(SexpType::Integer, 1)?;
        self.integer_mut(x)?[0] = v;
        Ok(x)
    }

    /// Length-one real vector.
    pub fn scalar_real(&mut self, v: f64) -> Result<Sexp, RError> {
        let x = self.alloc_vector(SexpType::Real, 1)?;
        self.real_mut(x)?[0] = v;
        Ok(x)
    }

    /// Length-one complex vector.
    pub fn scalar_complex(&mut self, v: Complex) -> Result<Sexp, RError> {
        let x = self.alloc_vector(SexpType::Complex, 1)?;
        self.complex_mut(x)?[0] = v;
        Ok(x)
    }

    /// Scalar string cell holding `s`.
    pub fn mk_char(&mut self, s: &str) -> Result<Sexp, RError> {
        let x = self.alloc_vector(SexpType::Char, s.len())?;
        self.char_bytes_mut(x)?.copy_from_slice(s.as_bytes());
        Ok(x)
    }

    /// Length-one string vector holding `s`.
    pub fn mk_string(&mut self, s: &str) -> Result<Sexp, RError> {
        let c = self.mk_char(s)?;
        let _c = self.protect(c)?;
        let x = self.alloc_vector(SexpType::Str, 1)?;
        self.set_string_elt(x, 0, c)?;
        Ok(x)
    }

    /// Same as [`Heap::mk_string`].
    pub fn scalar_string(&mut self, s: &str) -> Result<Sexp, RError> {
        self.mk_string(s)
    }

    // ---- functions, environments, promises ----------------------------------

    /// Allocates a closure.
    pub fn mk_closure(&mut self, formals: Sexp, body: Sexp, env: Sexp) -> Result<Sexp, RError> {
        self.alloc_node(SexpRec::Closure(ClosureCell { formals, body, env }))
    }

    /// Allocates an environment with the given bindings and parent.
    pub fn new_env(&mut self, frame: Sexp, enclos: Sexp) -> Result<Sexp, RError> {
        self.alloc_node(SexpRec::Env(EnvCell { frame, enclos }))
    }

    /// Allocates an unforced promise over `expr` in `env`.
    pub fn mk_promise(&mut self, expr: Sexp, env: Sexp) -> Result<Sexp, RError> {
        self.alloc_node(SexpRec::Promise(PromiseCell {
            value: Sexp::UNBOUND,
            expr,
            env,
        }))
    }

    /// Allocates a primitive referring to `offset` in the function table.
    pub fn mk_primitive(&mut self, ty: SexpType, offset: usize) -> Result<Sexp, RError> {
        let rec = match ty {
            SexpType::Special => SexpRec::Special(offset),
            SexpType::Builtin => SexpRec::Builtin(offset),
            other => {
                return Err(RError::TypeMismatch {
                    expected: "special or builtin",
                    found: other,
                })
            }
        };
        self.alloc_node(rec)
    }

    /// The call `quote(x)`.
    pub fn mk_quote(&mut self, x: Sexp) -> Result<Sexp, RError> {
        let _x = self.protect(x)?;
        let quote = self.install("quote")?;
        self.lang2(quote, x)
    }

    // ---- symbols ------------------------------------------------------------

    /// Finds an interned symbol without creating it.
    pub fn find_symbol(&self, name: &str) -> Option<Sexp> {
        self.symbols
            .bucket(name)
            .iter()
            .copied()
            .find(|&sym| self.symbol_name(sym).map_or(false, |s| s == name))
    }

    /// Returns the unique symbol named `name`, creating it on first use.
    ///
    /// # Errors
    ///
    /// [`RError::InvalidArgument`] for empty names and names longer than
    /// [`symbols::MAXIDSIZE`] bytes.
    pub fn install(&mut self, name: &str) -> Result<Sexp, RError> {
        symbols::validate_name(name)?;
        if let Some(sym) = self.find_symbol(name) {
            return Ok(sym);
        }
        let pname = self.mk_char(name)?;
        let sym = self.alloc_node(SexpRec::Symbol(SymbolCell {
            pname,
            value: Sexp::UNBOUND,
            internal: Sexp::NIL,
        }))?;
        self.symbols.insert(name, sym);
        Ok(sym)
    }

    /// Number of interned symbols.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}
