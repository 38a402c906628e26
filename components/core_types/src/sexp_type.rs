//! Object type tags.
//!
//! Every object on the heap carries exactly one of these tags. The numeric
//! codes follow the classic S-expression numbering so that images and
//! diagnostics keep their familiar values; the gap at 11 and 12 is where the
//! withdrawn factor types used to live.

use std::fmt;

/// The type tag of a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SexpType {
    /// The nil object
    Nil = 0,
    /// Interned symbol
    Symbol = 1,
    /// Pair-list node (data list)
    List = 2,
    /// Closure
    Closure = 3,
    /// Environment
    Env = 4,
    /// Promise (deferred argument)
    Promise = 5,
    /// Language-call node
    Lang = 6,
    /// Special form (arguments passed unevaluated)
    Special = 7,
    /// Builtin (arguments evaluated eagerly)
    Builtin = 8,
    /// Scalar string cell
    Char = 9,
    /// Logical vector
    Logical = 10,
    /// Integer vector
    Integer = 13,
    /// Real vector
    Real = 14,
    /// Complex vector
    Complex = 15,
    /// String vector
    Str = 16,
    /// Dots (`...`) object
    Dots = 17,
    /// "any" marker used for argument type checks
    Any = 18,
    /// Generic vector
    Generic = 19,
    /// Expression vector
    Expression = 20,
}

impl SexpType {
    /// All tags, in code order.
    pub const ALL: [SexpType; 19] = [
        SexpType::Nil,
        SexpType::Symbol,
        SexpType::List,
        SexpType::Closure,
        SexpType::Env,
        SexpType::Promise,
        SexpType::Lang,
        SexpType::Special,
        SexpType::Builtin,
        SexpType::Char,
        SexpType::Logical,
        SexpType::Integer,
        SexpType::Real,
        SexpType::Complex,
        SexpType::Str,
        SexpType::Dots,
        SexpType::Any,
        SexpType::Generic,
        SexpType::Expression,
    ];

    /// Returns the numeric type code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a tag by numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Returns the user-visible type name (`typeof`).
    pub fn name(self) -> &'static str {
        match self {
            SexpType::Nil => "NULL",
            SexpType::Symbol => "symbol",
            SexpType::List => "pairlist",
            SexpType::Closure => "closure",
            SexpType::Env => "environment",
            SexpType::Promise => "promise",
            SexpType::Lang => "language",
            SexpType::Special => "special",
            SexpType::Builtin => "builtin",
            SexpType::Char => "char",
            SexpType::Logical => "logical",
            SexpType::Integer => "integer",
            SexpType::Real => "double",
            SexpType::Complex => "complex",
            SexpType::Str => "character",
            SexpType::Dots => "...",
            SexpType::Any => "any",
            SexpType::Generic => "list",
            SexpType::Expression => "expression",
        }
    }

    /// Parses a user-visible type name back into a tag.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// True for tags whose payload lives on the vector heap.
    pub fn is_vector(self) -> bool {
        matches!(
            self,
            SexpType::Char
                | SexpType::Logical
                | SexpType::Integer
                | SexpType::Real
                | SexpType::Complex
                | SexpType::Str
                | SexpType::Generic
                | SexpType::Expression
        )
    }

    /// True for the pair-list shaped tags (value, next, tag).
    pub fn is_pairlist(self) -> bool {
        matches!(self, SexpType::List | SexpType::Lang | SexpType::Dots)
    }

    /// True for callable tags.
    pub fn is_function(self) -> bool {
        matches!(self, SexpType::Closure | SexpType::Special | SexpType::Builtin)
    }

    /// True for logical, integer, real and complex vectors.
    pub fn is_numeric_like(self) -> bool {
        matches!(
            self,
            SexpType::Logical | SexpType::Integer | SexpType::Real | SexpType::Complex
        )
    }
}

impl fmt::Display for SexpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
