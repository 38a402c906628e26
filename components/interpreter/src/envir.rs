//! Environments and variable lookup.
//!
//! An environment is a frame (a pair list of bindings tagged with their
//! symbols) and an enclosing environment. Lookup walks the chain outward;
//! past the outermost environment it falls back to the symbol's own value
//! slot, which holds the base bindings.

use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{RError, Sexp, SexpType};

/// Index `n` of a `..n` name, if `name` is one.
pub fn ddval(name: &str) -> Option<usize> {
    name.strip_prefix("..")
        .and_then(|digits| digits.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

impl Interpreter {
    /// The binding cell of `sym` in the frame of `rho`, or nil.
    pub(crate) fn find_binding_in_frame(&self, rho: Sexp, sym: Sexp) -> Result<Sexp, RError> {
        let mut frame = self.heap.frame(rho)?;
        while !frame.is_nil() {
            if self.heap.tag(frame)? == sym {
                return Ok(frame);
            }
            frame = self.heap.cdr(frame)?;
        }
        Ok(Sexp::NIL)
    }

    /// Value of `sym` in the frame of `rho` alone, or the unbound marker.
    pub fn find_var_in_frame(&self, rho: Sexp, sym: Sexp) -> Result<Sexp, RError> {
        let cell = self.find_binding_in_frame(rho, sym)?;
        if cell.is_nil() {
            Ok(Sexp::UNBOUND)
        } else {
            self.heap.car(cell)
        }
    }

    /// Value of `sym` seen from `rho`, or the unbound marker.
    pub fn find_var(&self, sym: Sexp, mut rho: Sexp) -> Result<Sexp, RError> {
        while !rho.is_nil() {
            let value = self.find_var_in_frame(rho, sym)?;
            if value != Sexp::UNBOUND {
                return Ok(value);
            }
            rho = self.heap.enclos(rho)?;
        }
        self.heap.symvalue(sym)
    }

    /// The function bound to `sym` seen from `rho`, skipping bindings of
    /// other types. Promises met on the way are forced.
    pub fn find_fun(&mut self, sym: Sexp, mut rho: Sexp) -> EvalResult<Sexp> {
        while !rho.is_nil() {
            let mut value = self.find_var_in_frame(rho, sym)?;
            if value == Sexp::MISSING_ARG {
                let name = self.heap.symbol_name(sym)?.to_string();
                return Err(RError::MissingArgument(name).into());
            }
            if self.heap.type_of(value) == SexpType::Promise {
                value = self.force_promise(value)?;
            }
            if self.heap.type_of(value).is_function() {
                return Ok(value);
            }
            rho = self.heap.enclos(rho)?;
        }
        let value = self.heap.symvalue(sym)?;
        if self.heap.type_of(value).is_function() {
            Ok(value)
        } else {
            let name = self.heap.symbol_name(sym)?.to_string();
            Err(RError::FunctionNotFound(name).into())
        }
    }

    /// Binds `sym` to `value` in the frame of `rho`, replacing an existing
    /// binding. A nil `rho` sets the symbol's value slot.
    pub fn define_var(&mut self, sym: Sexp, value: Sexp, rho: Sexp) -> Result<(), RError> {
        if rho.is_nil() {
            return self.heap.set_symvalue(sym, value);
        }
        let cell = self.find_binding_in_frame(rho, sym)?;
        if !cell.is_nil() {
            self.heap.set_car(cell, value)?;
            return self.heap.set_gp(cell, 0);
        }
        let frame = self.heap.frame(rho)?;
        let cell = self.heap.cons(value, frame)?;
        self.heap.set_tag(cell, sym)?;
        self.heap.set_frame(rho, cell)
    }

    /// Rebinds `sym` where it is first found from `rho`, or defines it in
    /// the global environment.
    pub fn set_var(&mut self, sym: Sexp, value: Sexp, mut rho: Sexp) -> Result<(), RError> {
        while !rho.is_nil() {
            let cell = self.find_binding_in_frame(rho, sym)?;
            if !cell.is_nil() {
                self.heap.set_car(cell, value)?;
                return self.heap.set_gp(cell, 0);
            }
            rho = self.heap.enclos(rho)?;
        }
        let global = self.global_env();
        self.define_var(sym, value, global)
    }

    /// Removes the binding of `sym` from the frame of `rho`. Returns false
    /// when there was none.
    pub fn unbind_var(&mut self, sym: Sexp, rho: Sexp) -> Result<bool, RError> {
        let mut prev = Sexp::NIL;
        let mut frame = self.heap.frame(rho)?;
        while !frame.is_nil() {
            let next = self.heap.cdr(frame)?;
            if self.heap.tag(frame)? == sym {
                if prev.is_nil() {
                    self.heap.set_frame(rho, next)?;
                } else {
                    self.heap.set_cdr(prev, next)?;
                }
                return Ok(true);
            }
            prev = frame;
            frame = next;
        }
        Ok(false)
    }

    /// Value of the `..n` symbol `sym`: element `n` of the `...` seen from
    /// `rho`.
    pub fn ddfind_var(&self, sym: Sexp, rho: Sexp) -> Result<Sexp, RError> {
        let name = self.heap.symbol_name(sym)?;
        let n = ddval(name).ok_or_else(|| RError::invalid(format!("{} is not a ..n name", name)))?;
        let dots = self.find_var(self.syms.dots, rho)?;
        if dots == Sexp::UNBOUND {
            return Err(RError::user(format!(
                "..{} used in an incorrect context, no ... to look in",
                n
            )));
        }
        if self.heap.type_of(dots) == SexpType::Dots && self.heap.length(dots) >= n {
            self.heap.car(self.heap.nthcdr(dots, n - 1)?)
        } else {
            Err(RError::user(format!(
                "the ... list does not contain {} elements",
                n
            )))
        }
    }
}
