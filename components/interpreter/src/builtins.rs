//! The primitive function table.
//!
//! Primitive objects on the heap carry only an offset into this table; the
//! entry supplies the native function, whether arguments are evaluated, the
//! arity check and the visibility of the result.

use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{RError, Sexp};
use std::collections::HashMap;
use std::fmt;

/// Native implementation of a primitive.
///
/// Called as `cfun(interp, call, op, args, rho)`. For specials `args` is the
/// unevaluated argument list of `call`; for builtins it is the list of
/// evaluated arguments with `...` expanded.
pub type CFun = fn(&mut Interpreter, Sexp, Sexp, Sexp, Sexp) -> EvalResult<Sexp>;

/// Whether arguments are evaluated before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Arguments passed as written
    Special,
    /// Arguments evaluated left to right
    Builtin,
}

/// Visibility of a primitive's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Printed at toplevel
    On,
    /// Not printed at toplevel
    Off,
    /// Decided by the primitive itself
    Dynamic,
}

/// Number of arguments accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many
    Fixed(usize),
    /// Any number
    Variadic,
}

/// Deparsing class of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PPKind {
    /// Ordinary function call
    FunCall,
    /// `if`
    If,
    /// `while`
    While,
    /// `for`
    For,
    /// `repeat`
    Repeat,
    /// `break`
    Break,
    /// `next`
    Next,
    /// `return`
    Return,
    /// `function`
    Function,
    /// `{`
    Curly,
    /// `(`
    Paren,
    /// `<-`, `=`, `<<-`
    Assign,
    /// Infix binary operator
    Binary,
    /// Prefix unary operator
    Unary,
    /// `[[`
    Subset,
}

/// Deparsing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PPInfo {
    /// Syntactic class
    pub kind: PPKind,
    /// Operator precedence
    pub precedence: u8,
    /// True for right-associative operators
    pub right_assoc: bool,
}

impl PPInfo {
    /// A plain function call.
    pub const FUNCALL: PPInfo = PPInfo::new(PPKind::FunCall, 0, false);

    /// Builds an entry.
    pub const fn new(kind: PPKind, precedence: u8, right_assoc: bool) -> Self {
        PPInfo {
            kind,
            precedence,
            right_assoc,
        }
    }
}

/// Operator precedences, lowest first.
pub mod prec {
    /// `<-`, `<<-`
    pub const LEFT: u8 = 1;
    /// `=`
    pub const EQ: u8 = 2;
    /// `!`
    pub const NOT: u8 = 8;
    /// comparisons
    pub const COMPARE: u8 = 9;
    /// `+`, `-`
    pub const SUM: u8 = 10;
    /// `*`, `/`
    pub const PROD: u8 = 11;
    /// `[[`
    pub const SUBSET: u8 = 17;
}

/// One primitive.
#[derive(Clone, Copy)]
pub struct FunEntry {
    /// Print name
    pub name: &'static str,
    /// Native implementation
    pub cfun: CFun,
    /// Variant selector passed through to shared implementations
    pub code: i32,
    /// Argument evaluation mode
    pub eval: EvalMode,
    /// Result visibility
    pub visibility: Visibility,
    /// Accepted argument count
    pub arity: Arity,
    /// Deparsing information
    pub gram: PPInfo,
}

impl FunEntry {
    /// Builds an entry for a function-call-shaped primitive.
    pub fn new(name: &'static str, cfun: CFun, code: i32, eval: EvalMode, arity: Arity) -> Self {
        FunEntry {
            name,
            cfun,
            code,
            eval,
            visibility: Visibility::On,
            arity,
            gram: PPInfo::FUNCALL,
        }
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Sets the deparsing information.
    pub fn with_gram(mut self, gram: PPInfo) -> Self {
        self.gram = gram;
        self
    }

    /// Checks `supplied` against the declared arity.
    pub fn check_arity(&self, supplied: usize) -> Result<(), RError> {
        match self.arity {
            Arity::Fixed(expected) if expected != supplied => Err(RError::ArityMismatch {
                name: self.name.to_string(),
                expected,
                supplied,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for FunEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunEntry")
            .field("name", &self.name)
            .field("code", &self.code)
            .field("eval", &self.eval)
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .field("gram", &self.gram)
            .finish()
    }
}

/// Registry of primitives, addressed by offset.
#[derive(Debug, Default)]
pub struct FunTab {
    entries: Vec<FunEntry>,
    by_name: HashMap<&'static str, usize>,
}

impl FunTab {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` and returns its offset. A later entry with the same name
    /// shadows the earlier one for [`FunTab::lookup`].
    pub fn register(&mut self, entry: FunEntry) -> usize {
        let offset = self.entries.len();
        self.by_name.insert(entry.name, offset);
        self.entries.push(entry);
        offset
    }

    /// Entry at `offset`.
    pub fn get(&self, offset: usize) -> Option<&FunEntry> {
        self.entries.get(offset)
    }

    /// Offset of the entry named `name`.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &FunEntry> {
        self.entries.iter()
    }
}
