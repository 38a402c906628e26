//! Assignment: `<-`, `<<-` and `=`, including complex assignment through
//! replacement functions such as `x[[i]] <- v` or `attr(x, "a") <- v`.

use crate::builtins::{prec, Arity, EvalMode, FunEntry, PPInfo, PPKind, Visibility};
use crate::match_args::ListBuilder;
use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{RError, Sexp, SexpType};

const LEFTASSIGN: i32 = 1;
const SUPERASSIGN: i32 = 2;
const EQASSIGN: i32 = 3;

pub(crate) fn entries() -> Vec<FunEntry> {
    [("<-", LEFTASSIGN), ("<<-", SUPERASSIGN), ("=", EQASSIGN)]
        .into_iter()
        .map(|(name, code)| {
            let precedence = if code == EQASSIGN { prec::EQ } else { prec::LEFT };
            FunEntry::new(name, do_set, code, EvalMode::Special, Arity::Fixed(2))
                .with_visibility(Visibility::Off)
                .with_gram(PPInfo::new(PPKind::Assign, precedence, true))
        })
        .collect()
}

fn do_set(interp: &mut Interpreter, _call: Sexp, op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let code = interp.entry(op)?.code;
    let mut lhs = interp.heap.car(args)?;
    let rhs = interp.heap.cadr(args)?;
    if interp.heap.type_of(lhs) == SexpType::Str && interp.heap.length(lhs) == 1 {
        let name = interp.strings_of(lhs)?.remove(0).unwrap_or_default();
        lhs = interp.heap.install(&name)?;
    }
    match interp.heap.type_of(lhs) {
        SexpType::Symbol => {
            let value = interp.eval(rhs, rho)?;
            let _value = interp.heap.protect(value)?;
            match interp.heap.named(value) {
                0 => interp.heap.set_named(value, 1),
                1 => interp.heap.set_named(value, 2),
                _ => {}
            }
            if code == SUPERASSIGN {
                let enclos = interp.heap.enclos(rho)?;
                interp.set_var(lhs, value, enclos)?;
            } else {
                interp.define_var(lhs, value, rho)?;
            }
            Ok(value)
        }
        SexpType::Lang => interp.apply_define(code, lhs, rhs, rho),
        _ => Err(RError::invalid("invalid (do_set) left-hand side to assignment").into()),
    }
}

impl Interpreter {
    /// Assigns through the replacement functions named by `lhs`. The
    /// variable at the bottom of `lhs` is rebound to the result, and the
    /// value of `rhs` is returned.
    fn apply_define(&mut self, code: i32, lhs: Sexp, rhs: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        let value = self.eval(rhs, rho)?;
        let _value = self.heap.protect(value)?;
        if self.heap.named(value) == 0 {
            self.heap.set_named(value, 1);
        }
        let tmp = self.syms.tmp;
        self.define_var(tmp, Sexp::NIL, rho)?;
        let result = self.assign_through(code, lhs, value, rho);
        self.unbind_var(tmp, rho)?;
        result?;
        Ok(value)
    }

    fn assign_through(&mut self, code: i32, mut expr: Sexp, value: Sexp, rho: Sexp) -> EvalResult<()> {
        let lookup_env = if code == SUPERASSIGN {
            self.heap.enclos(rho)?
        } else {
            rho
        };
        let target = self.heap.cadr(expr)?;
        let chain = self.eval_chain(target, rho, lookup_env)?;
        let _chain = self.heap.protect(chain)?;

        let mut chain = chain;
        let mut result = self.heap.protect(value)?;
        loop {
            let afun = self.assign_function(self.heap.car(expr)?)?;
            let current = self.heap.car(chain)?;
            self.define_var(self.syms.tmp, current, rho)?;
            let replacement = self.replacement_call(afun, expr, result.get())?;
            let _replacement = self.heap.protect(replacement)?;
            let updated = self.eval(replacement, rho)?;
            result.replace(updated);
            chain = self.heap.cdr(chain)?;
            let inner = self.heap.cadr(expr)?;
            if self.heap.type_of(inner) != SexpType::Lang {
                break;
            }
            expr = inner;
        }

        let var = chain;
        if code == SUPERASSIGN {
            self.set_var(var, result.get(), lookup_env)?;
        } else {
            self.define_var(var, result.get(), rho)?;
        }
        Ok(())
    }

    /// Evaluates the getters of an assignment target from the inside out.
    /// The result lists their values, outermost first, and ends in the
    /// variable symbol instead of nil.
    fn eval_chain(&mut self, expr: Sexp, rho: Sexp, lookup_env: Sexp) -> EvalResult<Sexp> {
        match self.heap.type_of(expr) {
            SexpType::Symbol => {
                let value = self.eval(expr, lookup_env)?;
                let value = self.unshared(value)?;
                Ok(self.heap.cons(value, expr)?)
            }
            SexpType::Lang => {
                let inner = self.eval_chain(self.heap.cadr(expr)?, rho, lookup_env)?;
                let _inner = self.heap.protect(inner)?;
                let current = self.heap.car(inner)?;
                self.define_var(self.syms.tmp, current, rho)?;
                let rest = self.heap.lcons(self.syms.tmp, self.heap.cddr(expr)?)?;
                let getter = self.heap.lcons(self.heap.car(expr)?, rest)?;
                let _getter = self.heap.protect(getter)?;
                let value = self.eval(getter, rho)?;
                let value = self.unshared(value)?;
                Ok(self.heap.cons(value, inner)?)
            }
            _ => Err(RError::invalid("target of assignment expands to non-language object").into()),
        }
    }

    fn unshared(&mut self, x: Sexp) -> Result<Sexp, RError> {
        crate::base::unshared(self, x)
    }

    /// The `f<-` symbol for getter `fun`.
    fn assign_function(&mut self, fun: Sexp) -> EvalResult<Sexp> {
        let name = match self.heap.type_of(fun) {
            SexpType::Symbol => self.heap.symbol_name(fun)?.to_string(),
            SexpType::Str if self.heap.length(fun) == 1 => {
                self.strings_of(fun)?.remove(0).unwrap_or_default()
            }
            _ => return Err(RError::invalid("invalid function in complex assignment").into()),
        };
        Ok(self.heap.install(&format!("{}<-", name))?)
    }

    /// `afun(*tmp*, <extra args of getter>, value = value)`.
    fn replacement_call(&mut self, afun: Sexp, getter: Sexp, value: Sexp) -> Result<Sexp, RError> {
        let value = match self.heap.type_of(value) {
            SexpType::Symbol | SexpType::Lang | SexpType::Promise => self.heap.mk_quote(value)?,
            _ => value,
        };
        let _value = self.heap.protect(value)?;
        let (tmp, value_sym) = (self.syms.tmp, self.syms.value);
        let mut args = ListBuilder::new(self)?;
        args.push(self, tmp, Sexp::NIL)?;
        for cell in self.cells(self.heap.cddr(getter)?)? {
            let (arg, tag) = (self.heap.car(cell)?, self.heap.tag(cell)?);
            args.push(self, arg, tag)?;
        }
        args.push(self, value, value_sym)?;
        self.heap.lcons(afun, args.get())
    }
}
