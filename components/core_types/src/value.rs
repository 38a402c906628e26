//! Object handles and per-object flag records.
//!
//! Objects live in an arena owned by the memory manager. Everything outside
//! the arena refers to them through a [`Sexp`] handle, which is a stable
//! slot index rather than a pointer: a collection may recycle the slot of an
//! unreachable object, but it never moves a live one.

use std::fmt;

/// Handle to a heap object.
///
/// Handles are plain indices. Holding one does not keep the object alive;
/// the collector only sees objects that are reachable from its roots.
///
/// # Examples
///
/// ```
/// use core_types::Sexp;
///
/// assert!(Sexp::NIL.is_nil());
/// assert_ne!(Sexp::NIL, Sexp::UNBOUND);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sexp(u32);

impl Sexp {
    /// The nil object. Always slot 0.
    pub const NIL: Sexp = Sexp(0);
    /// Marker stored in the value slot of symbols with no global binding.
    pub const UNBOUND: Sexp = Sexp(1);
    /// Marker bound to formals for which no argument was supplied.
    pub const MISSING_ARG: Sexp = Sexp(2);

    /// Number of slots reserved for the distinguished objects above.
    pub const RESERVED: usize = 3;

    /// Builds a handle from a slot index.
    pub fn from_index(index: usize) -> Self {
        Sexp(index as u32)
    }

    /// Returns the slot index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the nil handle.
    pub fn is_nil(self) -> bool {
        self == Sexp::NIL
    }
}

impl fmt::Debug for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Sexp::NIL => write!(f, "Sexp(NIL)"),
            Sexp::UNBOUND => write!(f, "Sexp(UNBOUND)"),
            Sexp::MISSING_ARG => write!(f, "Sexp(MISSING_ARG)"),
            Sexp(i) => f.debug_tuple("Sexp").field(&i).finish(),
        }
    }
}

/// Missing value for logical vectors.
pub const NA_LOGICAL: i32 = i32::MIN;
/// Missing value for integer vectors.
pub const NA_INTEGER: i32 = i32::MIN;
/// Missing value for real vectors.
pub const NA_REAL: f64 = f64::NAN;

/// A complex number element of a complex vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part
    pub r: f64,
    /// Imaginary part
    pub i: f64,
}

impl Complex {
    /// Creates a complex number.
    pub fn new(r: f64, i: f64) -> Self {
        Complex { r, i }
    }
}

/// Per-object flag record.
///
/// The type tag is carried by the object record itself; this struct holds
/// only the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SxpInfo {
    /// User-visible "has class" marker
    pub obj: bool,
    /// Sharing indicator: 0 unbound, 1 bound once, 2 possibly shared
    pub named: u8,
    /// General-purpose field (promise seen, binding missing, dots index)
    pub gp: u16,
    /// Collector liveness bit
    pub mark: bool,
    /// Debug bit
    pub debug: bool,
    /// Trace bit
    pub trace: bool,
}

impl SxpInfo {
    /// Highest value the sharing indicator can hold.
    pub const NAMED_MAX: u8 = 2;

    /// Sets the sharing indicator, saturating at [`SxpInfo::NAMED_MAX`].
    pub fn set_named(&mut self, named: u8) {
        self.named = named.min(Self::NAMED_MAX);
    }

    /// True when the object may be reachable from more than one binding.
    pub fn is_shared(&self) -> bool {
        self.named >= Self::NAMED_MAX
    }
}
