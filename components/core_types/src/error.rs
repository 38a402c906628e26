//! Error taxonomy shared by the heap and the evaluator.

use crate::SexpType;
use thiserror::Error;

/// Which heap ran out of space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapKind {
    /// Fixed-size node heap
    Node,
    /// Variable-size vector heap
    Vector,
}

impl std::fmt::Display for HeapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeapKind::Node => write!(f, "cons memory"),
            HeapKind::Vector => write!(f, "vector memory"),
        }
    }
}

/// An error raised by the object core or the evaluator.
///
/// All variants except [`RError::TypeMismatch`] and
/// [`RError::ProtectionStackOverflow`] are recoverable at the language level.
///
/// # Examples
///
/// ```
/// use core_types::{RError, SexpType};
///
/// let err = RError::TypeMismatch { expected: "pairlist", found: SexpType::Real };
/// assert!(err.is_fatal());
/// assert!(!RError::UnboundVariable("x".into()).is_fatal());
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RError {
    /// A typed accessor was used on an object with a different tag
    #[error("internal type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Description of the accepted tag(s)
        expected: &'static str,
        /// Tag actually found
        found: SexpType,
    },

    /// A fixed-arity builtin was called with the wrong number of arguments
    #[error("{supplied} argument(s) passed to '{name}' which requires {expected}")]
    ArityMismatch {
        /// Print name of the builtin
        name: String,
        /// Declared arity
        expected: usize,
        /// Number of arguments supplied
        supplied: usize,
    },

    /// Variable lookup failed
    #[error("object \"{0}\" not found")]
    UnboundVariable(String),

    /// A promise was forced while it was already being forced
    #[error("recursive default argument reference")]
    RecursiveEvaluation,

    /// Allocation failed after collection and growth
    #[error("{0} exhausted")]
    HeapExhausted(HeapKind),

    /// Protect without matching unprotect
    #[error("protect(): stack overflow (limit {0})")]
    ProtectionStackOverflow(usize),

    /// External interrupt observed at a safe point
    #[error("interrupted")]
    Interrupted,

    /// Formal/actual argument matching failed
    #[error("{0}")]
    ArgumentMatch(String),

    /// A formal without default was used but not supplied
    #[error("argument \"{0}\" is missing, with no default")]
    MissingArgument(String),

    /// Call head is not a function
    #[error("attempt to apply non-function: {0}")]
    NotAFunction(String),

    /// No function binding was found for a call head
    #[error("could not find function \"{0}\"")]
    FunctionNotFound(String),

    /// Expression nesting limit reached
    #[error("evaluation nested too deeply: infinite recursion? (limit {0})")]
    EvalDepth(usize),

    /// An argument had an unusable value
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Error signalled by user code
    #[error("{0}")]
    User(String),
}

impl RError {
    /// Builds a user-level error.
    pub fn user(msg: impl Into<String>) -> Self {
        RError::User(msg.into())
    }

    /// Builds an invalid-argument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        RError::InvalidArgument(msg.into())
    }

    /// True for internal invariant violations that no language-level
    /// handler may catch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RError::TypeMismatch { .. } | RError::ProtectionStackOverflow(_)
        )
    }
}
