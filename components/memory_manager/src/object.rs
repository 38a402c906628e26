//! Heap object records.
//!
//! One variant per type tag, carrying only the fields that tag uses. Vector
//! variants hold a [`VecHeader`] whose payload lives on the vector heap.

use core_types::{Sexp, SexpType, SxpInfo};

/// Pair-list node: value, next and optional name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCell {
    /// Element value
    pub car: Sexp,
    /// Next node or nil
    pub cdr: Sexp,
    /// Element name or nil
    pub tag: Sexp,
}

/// Interned symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolCell {
    /// Print name (a scalar string cell)
    pub pname: Sexp,
    /// Global value slot
    pub value: Sexp,
    /// Internal builtin, or nil
    pub internal: Sexp,
}

/// Closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureCell {
    /// Formal parameter list
    pub formals: Sexp,
    /// Body expression
    pub body: Sexp,
    /// Defining environment
    pub env: Sexp,
}

/// Environment frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvCell {
    /// Bindings as a tagged pair list
    pub frame: Sexp,
    /// Enclosing environment, or nil
    pub enclos: Sexp,
}

/// Deferred argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromiseCell {
    /// Cached value, or the unbound marker while unforced
    pub value: Sexp,
    /// Unevaluated expression
    pub expr: Sexp,
    /// Evaluation environment
    pub env: Sexp,
}

/// Vector bookkeeping kept in the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VecHeader {
    /// Number of elements
    pub length: usize,
    /// Allocated element count
    pub truelength: usize,
    /// Index of the payload block on the vector heap
    pub block: usize,
}

/// Object record stored in a node cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SexpRec {
    /// The nil object
    Nil,
    /// Interned symbol
    Symbol(SymbolCell),
    /// Data list node
    List(ListCell),
    /// Closure
    Closure(ClosureCell),
    /// Environment
    Env(EnvCell),
    /// Promise
    Promise(PromiseCell),
    /// Call node
    Lang(ListCell),
    /// Special form, by offset into the function table
    Special(usize),
    /// Builtin, by offset into the function table
    Builtin(usize),
    /// Scalar string cell
    Char(VecHeader),
    /// Logical vector
    Logical(VecHeader),
    /// Integer vector
    Integer(VecHeader),
    /// Real vector
    Real(VecHeader),
    /// Complex vector
    Complex(VecHeader),
    /// String vector
    Str(VecHeader),
    /// Dots object
    Dots(ListCell),
    /// "any" marker
    Any,
    /// Generic vector
    Generic(VecHeader),
    /// Expression vector
    Expression(VecHeader),
}

impl SexpRec {
    /// Returns the type tag of this record.
    pub fn sexp_type(&self) -> SexpType {
        match self {
            SexpRec::Nil => SexpType::Nil,
            SexpRec::Symbol(_) => SexpType::Symbol,
            SexpRec::List(_) => SexpType::List,
            SexpRec::Closure(_) => SexpType::Closure,
            SexpRec::Env(_) => SexpType::Env,
            SexpRec::Promise(_) => SexpType::Promise,
            SexpRec::Lang(_) => SexpType::Lang,
            SexpRec::Special(_) => SexpType::Special,
            SexpRec::Builtin(_) => SexpType::Builtin,
            SexpRec::Char(_) => SexpType::Char,
            SexpRec::Logical(_) => SexpType::Logical,
            SexpRec::Integer(_) => SexpType::Integer,
            SexpRec::Real(_) => SexpType::Real,
            SexpRec::Complex(_) => SexpType::Complex,
            SexpRec::Str(_) => SexpType::Str,
            SexpRec::Dots(_) => SexpType::Dots,
            SexpRec::Any => SexpType::Any,
            SexpRec::Generic(_) => SexpType::Generic,
            SexpRec::Expression(_) => SexpType::Expression,
        }
    }

    /// Builds an empty vector record of the given type.
    pub(crate) fn vector(ty: SexpType, header: VecHeader) -> Option<Self> {
        Some(match ty {
            SexpType::Char => SexpRec::Char(header),
            SexpType::Logical => SexpRec::Logical(header),
            SexpType::Integer => SexpRec::Integer(header),
            SexpType::Real => SexpRec::Real(header),
            SexpType::Complex => SexpRec::Complex(header),
            SexpType::Str => SexpRec::Str(header),
            SexpType::Generic => SexpRec::Generic(header),
            SexpType::Expression => SexpRec::Expression(header),
            _ => return None,
        })
    }

    /// Returns the pair-list cell for list-shaped records.
    pub fn list_cell(&self) -> Option<&ListCell> {
        match self {
            SexpRec::List(c) | SexpRec::Lang(c) | SexpRec::Dots(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable access to the pair-list cell.
    pub fn list_cell_mut(&mut self) -> Option<&mut ListCell> {
        match self {
            SexpRec::List(c) | SexpRec::Lang(c) | SexpRec::Dots(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the vector header for vector records.
    pub fn vec_header(&self) -> Option<&VecHeader> {
        match self {
            SexpRec::Char(h)
            | SexpRec::Logical(h)
            | SexpRec::Integer(h)
            | SexpRec::Real(h)
            | SexpRec::Complex(h)
            | SexpRec::Str(h)
            | SexpRec::Generic(h)
            | SexpRec::Expression(h) => Some(h),
            _ => None,
        }
    }

    /// Mutable access to the vector header.
    pub fn vec_header_mut(&mut self) -> Option<&mut VecHeader> {
        match self {
            SexpRec::Char(h)
            | SexpRec::Logical(h)
            | SexpRec::Integer(h)
            | SexpRec::Real(h)
            | SexpRec::Complex(h)
            | SexpRec::Str(h)
            | SexpRec::Generic(h)
            | SexpRec::Expression(h) => Some(h),
            _ => None,
        }
    }

    /// Pushes every object reference held directly by this record.
    ///
    /// Vector element references live on the vector heap and are not
    /// included.
    pub fn push_children(&self, out: &mut Vec<Sexp>) {
        match self {
            SexpRec::Symbol(s) => out.extend([s.pname, s.value, s.internal]),
            SexpRec::List(c) | SexpRec::Lang(c) | SexpRec::Dots(c) => {
                out.extend([c.car, c.cdr, c.tag])
            }
            SexpRec::Closure(c) => out.extend([c.formals, c.body, c.env]),
            SexpRec::Env(e) => out.extend([e.frame, e.enclos]),
            SexpRec::Promise(p) => out.extend([p.value, p.expr, p.env]),
            _ => {}
        }
    }
}

/// A live node: flags plus record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Flag record
    pub info: SxpInfo,
    /// Object record
    pub rec: SexpRec,
}

impl Cell {
    /// Wraps a record with cleared flags.
    pub fn new(rec: SexpRec) -> Self {
        Cell {
            info: SxpInfo::default(),
            rec,
        }
    }
}
