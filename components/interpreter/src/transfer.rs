//! Non-local control signals.

use crate::context::ContextId;
use core_types::{RError, Sexp};

/// A transfer of control travelling up the native call stack.
///
/// Every frame that receives a transfer not aimed at itself runs its own
/// cleanup and passes the transfer on.
#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    /// Leave the loop owning `target`
    Break {
        /// Loop context
        target: ContextId,
    },
    /// Start the next iteration of the loop owning `target`
    Next {
        /// Loop context
        target: ContextId,
    },
    /// Return `value` from the function owning `target`
    Return {
        /// Function context
        target: ContextId,
        /// Returned value
        value: Sexp,
    },
    /// Error unwinding to the nearest handler or to toplevel
    Error(RError),
}

impl From<RError> for Transfer {
    fn from(err: RError) -> Self {
        Transfer::Error(err)
    }
}

impl Transfer {
    /// The error carried by this transfer. Jumps that reach toplevel without
    /// meeting their target become errors too.
    pub fn into_error(self) -> RError {
        match self {
            Transfer::Error(err) => err,
            Transfer::Break { .. } | Transfer::Next { .. } => {
                RError::user("no loop for break/next, jumping to top level")
            }
            Transfer::Return { .. } => {
                RError::user("no function to return from, jumping to top level")
            }
        }
    }

    /// True for error transfers.
    pub fn is_error(&self) -> bool {
        matches!(self, Transfer::Error(_))
    }
}

/// Result of an evaluation step.
pub type EvalResult<T> = Result<T, Transfer>;
