//! Shorthand constructors for building expressions from native code.
//!
//! There is no parser in this crate, so embedders and tests assemble
//! expression trees directly. Each builder keeps its inputs protected
//! while it allocates.

use crate::match_args::ListBuilder;
use crate::runtime::Interpreter;
use core_types::{RError, Sexp};

impl Interpreter {
    /// The symbol `name`.
    pub fn sym(&mut self, name: &str) -> Result<Sexp, RError> {
        self.heap.install(name)
    }

    /// A length-one real vector.
    pub fn num(&mut self, v: f64) -> Result<Sexp, RError> {
        self.heap.scalar_real(v)
    }

    /// A length-one integer vector.
    pub fn int(&mut self, v: i32) -> Result<Sexp, RError> {
        self.heap.scalar_integer(v)
    }

    /// A length-one string vector.
    pub fn string(&mut self, s: &str) -> Result<Sexp, RError> {
        self.heap.mk_string(s)
    }

    /// The call `fun(args...)`.
    pub fn lang(&mut self, fun: &str, args: &[Sexp]) -> Result<Sexp, RError> {
        let f = self.heap.install(fun)?;
        let named: Vec<(Option<&str>, Sexp)> = args.iter().map(|&a| (None, a)).collect();
        self.lang_named(f, &named)
    }

    /// The call `fun(name = arg, ...)`; `None` leaves an argument untagged.
    pub fn lang_named(&mut self, fun: Sexp, args: &[(Option<&str>, Sexp)]) -> Result<Sexp, RError> {
        let stack = self.heap.protection_stack();
        let top = stack.depth();
        let result = self.build_call(fun, args);
        self.heap.protection_stack().restore(top);
        result
    }

    fn build_call(&mut self, fun: Sexp, args: &[(Option<&str>, Sexp)]) -> Result<Sexp, RError> {
        self.heap.protection_stack().push(fun)?;
        for &(_, a) in args {
            self.heap.protection_stack().push(a)?;
        }
        let mut list = ListBuilder::new(self)?;
        for &(name, a) in args {
            let tag = match name {
                Some(name) => self.heap.install(name)?,
                None => Sexp::NIL,
            };
            list.push(self, a, tag)?;
        }
        self.heap.lcons(fun, list.get())
    }

    /// The expression `function(formals) body`. A formal without a default
    /// gets the missing-argument marker.
    pub fn fn_expr(&mut self, formals: &[(&str, Option<Sexp>)], body: Sexp) -> Result<Sexp, RError> {
        let top = self.heap.protection_stack().depth();
        let result = self.build_fn_expr(formals, body);
        self.heap.protection_stack().restore(top);
        result
    }

    fn build_fn_expr(&mut self, formals: &[(&str, Option<Sexp>)], body: Sexp) -> Result<Sexp, RError> {
        self.heap.protection_stack().push(body)?;
        for &(_, default) in formals {
            if let Some(d) = default {
                self.heap.protection_stack().push(d)?;
            }
        }
        let mut list = ListBuilder::new(self)?;
        for &(name, default) in formals {
            let tag = self.heap.install(name)?;
            list.push(self, default.unwrap_or(Sexp::MISSING_ARG), tag)?;
        }
        let function = self.heap.install("function")?;
        self.heap.lang3(function, list.get(), body)
    }
}
