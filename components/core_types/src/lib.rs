//! Core object types and error handling.
//!
//! This crate provides the vocabulary shared by the heap and the evaluator:
//! type tags, object handles, the per-object flag record and the error
//! taxonomy.
//!
//! # Overview
//!
//! - [`SexpType`] - Type tag of every heap object
//! - [`Sexp`] - Stable handle to a heap object
//! - [`SxpInfo`] - Per-object flags (sharing indicator, mark bit, ...)
//! - [`RError`] - Errors raised by the heap and the evaluator
//!
//! # Examples
//!
//! ```
//! use core_types::{RError, Sexp, SexpType};
//!
//! assert!(Sexp::NIL.is_nil());
//! assert_eq!(SexpType::Real.name(), "double");
//!
//! let err = RError::UnboundVariable("x".to_string());
//! assert_eq!(err.to_string(), "object \"x\" not found");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod sexp_type;
mod value;

pub use error::{HeapKind, RError};
pub use sexp_type::SexpType;
pub use value::{Complex, Sexp, SxpInfo, NA_INTEGER, NA_LOGICAL, NA_REAL};
