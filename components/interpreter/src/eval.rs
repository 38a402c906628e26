//! The evaluator.
//!
//! `eval` dispatches on the type of the expression. Symbols are looked up,
//! promises are forced, calls are applied; everything else evaluates to
//! itself. Calls dispatch on the type of the function: specials receive
//! their arguments unevaluated, builtins receive them evaluated, and
//! closures receive promises matched to their formals in a fresh
//! environment.

use crate::builtins::Visibility;
use crate::context::{CallFlag, ContextInfo};
use crate::envir::ddval;
use crate::match_args::ListBuilder;
use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{RError, Sexp, SexpType};

impl Interpreter {
    /// Evaluates `e` in environment `rho`.
    pub fn eval(&mut self, e: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        self.visible = true;
        match self.heap.type_of(e) {
            SexpType::Symbol => self.eval_symbol(e, rho),
            SexpType::Promise => self.nested(|interp| interp.force_promise(e)),
            SexpType::Lang => self.nested(|interp| interp.eval_call(e, rho)),
            _ => Ok(e),
        }
    }

    fn nested<F>(&mut self, f: F) -> EvalResult<Sexp>
    where
        F: FnOnce(&mut Interpreter) -> EvalResult<Sexp>,
    {
        if self.eval_depth >= self.max_depth() {
            return Err(RError::EvalDepth(self.max_depth()).into());
        }
        self.eval_depth += 1;
        let result = f(self);
        self.eval_depth -= 1;
        result
    }

    fn eval_symbol(&mut self, e: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        if e == Sexp::MISSING_ARG {
            return Ok(e);
        }
        if e == self.syms.dots {
            return Err(RError::user("'...' used in an incorrect context").into());
        }
        let mut value = self.find_var(e, rho)?;
        if value == Sexp::UNBOUND {
            let name = self.heap.symbol_name(e)?;
            if ddval(name).is_some() {
                value = self.ddfind_var(e, rho)?;
            } else {
                return Err(RError::UnboundVariable(name.to_string()).into());
            }
        }
        if value == Sexp::MISSING_ARG {
            let name = self.heap.symbol_name(e)?.to_string();
            return Err(RError::MissingArgument(name).into());
        }
        if self.heap.type_of(value) == SexpType::Promise {
            let forced = self.force_promise(value)?;
            self.heap.set_named(forced, 2);
            return Ok(forced);
        }
        if !value.is_nil() && self.heap.named(value) == 0 {
            self.heap.set_named(value, 1);
        }
        Ok(value)
    }

    /// Value of promise `p`, evaluating its expression on first use.
    pub fn force_promise(&mut self, p: Sexp) -> EvalResult<Sexp> {
        let value = self.heap.prvalue(p)?;
        if value != Sexp::UNBOUND {
            return Ok(value);
        }
        if self.heap.prseen(p) {
            return Err(RError::RecursiveEvaluation.into());
        }
        self.heap.set_prseen(p, true)?;
        let (expr, env) = (self.heap.prexpr(p)?, self.heap.prenv(p)?);
        let result = self.eval(expr, env);
        self.heap.set_prseen(p, false)?;
        let value = result?;
        self.heap.set_prvalue(p, value)?;
        Ok(value)
    }

    fn eval_call(&mut self, e: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        let head = self.heap.car(e)?;
        let op = if self.heap.type_of(head) == SexpType::Symbol {
            self.find_fun(head, rho)?
        } else {
            self.eval(head, rho)?
        };
        let _op = self.heap.protect(op)?;
        let args = self.heap.cdr(e)?;
        self.check_interrupt()?;
        match self.heap.type_of(op) {
            ty @ (SexpType::Special | SexpType::Builtin) => {
                let entry = self.entry(op)?;
                let guard;
                let args = if ty == SexpType::Builtin {
                    let evaluated = self.eval_list(args, rho)?;
                    guard = self.heap.protect(evaluated)?;
                    guard.get()
                } else {
                    args
                };
                entry.check_arity(self.heap.length(args))?;
                self.visible = entry.visibility != Visibility::Off;
                let value = (entry.cfun)(self, e, op, args, rho)?;
                if entry.visibility != Visibility::Dynamic {
                    self.visible = entry.visibility == Visibility::On;
                }
                Ok(value)
            }
            SexpType::Closure => {
                let promargs = self.promise_args(args, rho)?;
                let _promargs = self.heap.protect(promargs)?;
                self.apply_closure(e, op, promargs, rho)
            }
            ty => Err(RError::NotAFunction(format!("object of type '{}'", ty)).into()),
        }
    }

    /// The values of `...` seen from `rho` as (value, tag) pairs.
    fn dots_elements(&self, rho: Sexp) -> EvalResult<Vec<(Sexp, Sexp)>> {
        let dots = self.find_var(self.syms.dots, rho)?;
        match self.heap.type_of(dots) {
            SexpType::Dots => {
                let mut out = Vec::new();
                for cell in self.cells(dots)? {
                    out.push((self.heap.car(cell)?, self.heap.tag(cell)?));
                }
                Ok(out)
            }
            _ if dots == Sexp::MISSING_ARG || dots.is_nil() => Ok(Vec::new()),
            _ => Err(RError::user("'...' used in an incorrect context").into()),
        }
    }

    /// Evaluates each element of `args` in `rho`, expanding `...`.
    pub fn eval_list(&mut self, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        let mut out = ListBuilder::new(self)?;
        let mut position = 0;
        for cell in self.cells(args)? {
            let arg = self.heap.car(cell)?;
            position += 1;
            if arg == self.syms.dots {
                for (value, tag) in self.dots_elements(rho)? {
                    let value = self.eval(value, rho)?;
                    out.push(self, value, tag)?;
                }
            } else if arg == Sexp::MISSING_ARG {
                return Err(RError::invalid(format!("argument {} is empty", position)).into());
            } else {
                let value = self.eval(arg, rho)?;
                let tag = self.heap.tag(cell)?;
                out.push(self, value, tag)?;
            }
        }
        Ok(out.get())
    }

    /// Wraps each element of `args` in a promise over `rho`, splicing in the
    /// elements of `...` as they are.
    pub fn promise_args(&mut self, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        let mut out = ListBuilder::new(self)?;
        for cell in self.cells(args)? {
            let arg = self.heap.car(cell)?;
            if arg == self.syms.dots {
                for (value, tag) in self.dots_elements(rho)? {
                    out.push(self, value, tag)?;
                }
                continue;
            }
            let tag = self.heap.tag(cell)?;
            let value = if arg == Sexp::MISSING_ARG {
                arg
            } else {
                self.heap.mk_promise(arg, rho)?
            };
            out.push(self, value, tag)?;
        }
        Ok(out.get())
    }

    /// Applies closure `op` to the promise list `arglist` for `call`, made
    /// from environment `rho`.
    pub fn apply_closure(&mut self, call: Sexp, op: Sexp, arglist: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        let formals = self.heap.formals(op)?;
        let body = self.heap.body(op)?;
        let savedrho = self.heap.cloenv(op)?;

        let actuals = self.match_args(formals, arglist)?;
        let _actuals = self.heap.protect(actuals)?;
        let newrho = self.heap.new_env(actuals, savedrho)?;
        let _newrho = self.heap.protect(newrho)?;

        let (mut f, mut a) = (formals, actuals);
        while !f.is_nil() {
            if self.heap.car(a)? == Sexp::MISSING_ARG {
                let default = self.heap.car(f)?;
                if default != Sexp::MISSING_ARG {
                    let promise = self.heap.mk_promise(default, newrho)?;
                    self.heap.set_car(a, promise)?;
                }
                self.heap.set_gp(a, 1)?;
            }
            f = self.heap.cdr(f)?;
            a = self.heap.cdr(a)?;
        }

        let info = ContextInfo {
            call,
            cloenv: newrho,
            sysparent: rho,
            promargs: arglist,
        };
        self.with_context(CallFlag::RETURN, info, |interp, _| interp.eval(body, newrho))
    }

    /// Evaluates the expressions of `list` in order and returns the last
    /// value, or nil.
    pub fn eval_seq(&mut self, list: Sexp, rho: Sexp) -> EvalResult<Sexp> {
        let mut value = Sexp::NIL;
        for cell in self.cells(list)? {
            let expr = self.heap.car(cell)?;
            value = self.eval(expr, rho)?;
        }
        Ok(value)
    }
}
