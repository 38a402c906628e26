//! Interpreter - environments, evaluation and control flow
//!
//! This crate provides the evaluator over the object heap:
//! - Variable lookup through chains of environments
//! - Lazy arguments as promises, forced at most once
//! - Matching of supplied arguments to formals by name, prefix and position
//! - A context stack carrying `break`, `next`, `return` and errors to their
//!   targets, running `on.exit` code on the way out
//! - A table of special forms and builtins
//!
//! # Example
//!
//! ```
//! use interpreter::Interpreter;
//!
//! // Objects built outside evaluation stay rooted while their guards live.
//! let mut interp = Interpreter::new().unwrap();
//! let x = interp.sym("x").unwrap();
//! let ten = interp.num(10.0).unwrap();
//! let _ten = interp.heap().protect(ten).unwrap();
//! let body = interp.lang("+", &[x, ten]).unwrap();
//! let _body = interp.heap().protect(body).unwrap();
//! let f = interp.fn_expr(&[("x", None)], body).unwrap();
//! let _f = interp.heap().protect(f).unwrap();
//! let name = interp.sym("f").unwrap();
//! let define = interp.lang("<-", &[name, f]).unwrap();
//! let _define = interp.heap().protect(define).unwrap();
//! interp.eval_toplevel(define).unwrap();
//!
//! let three = interp.num(3.0).unwrap();
//! let _three = interp.heap().protect(three).unwrap();
//! let call = interp.lang("f", &[three]).unwrap();
//! let _call = interp.heap().protect(call).unwrap();
//! let value = interp.eval_toplevel(call).unwrap();
//! assert_eq!(interp.heap().real(value).unwrap(), &[13.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod arith;
mod assign;
mod base;
mod build;
pub mod builtins;
mod coerce;
pub mod context;
mod envir;
mod eval;
mod match_args;
mod runtime;
mod subset;
pub mod transfer;

// Re-export main types at crate root
pub use builtins::{Arity, CFun, EvalMode, FunEntry, FunTab, PPInfo, PPKind, Visibility};
pub use context::{CallFlag, Context, ContextId, ContextInfo, JumpKind};
pub use envir::ddval;
pub use runtime::{Interpreter, DEFAULT_MAX_DEPTH};
pub use transfer::{EvalResult, Transfer};
