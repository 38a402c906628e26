//! Integration test suite for the interpreter workspace
//!
//! This crate drives whole programs through the heap and the evaluator
//! together, including under collector torture and on small heaps.

use core_types::{RError, Sexp};
use interpreter::Interpreter;
use memory_manager::MemoryConfig;

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use interpreter;
    pub use memory_manager;
}

/// An interpreter session with expression builders.
///
/// Builders panic on failure; they are meant for tests.
pub struct Session {
    /// The interpreter being driven
    pub interp: Interpreter,
}

impl Session {
    /// A session over the default heap.
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    /// A session over a heap built from `config`.
    pub fn with_config(config: MemoryConfig) -> Self {
        Session {
            interp: Interpreter::with_config(config).expect("interpreter"),
        }
    }

    /// The symbol `name`.
    pub fn sym(&mut self, name: &str) -> Sexp {
        self.interp.sym(name).expect("symbol")
    }

    /// A length-one real vector.
    pub fn num(&mut self, v: f64) -> Sexp {
        self.interp.num(v).expect("real")
    }

    /// A length-one integer vector.
    pub fn int(&mut self, v: i32) -> Sexp {
        self.interp.int(v).expect("integer")
    }

    /// A length-one string vector.
    pub fn string(&mut self, s: &str) -> Sexp {
        self.interp.string(s).expect("string")
    }

    /// A length-one logical vector.
    pub fn lgl(&mut self, v: bool) -> Sexp {
        self.interp
            .heap_mut()
            .scalar_logical(i32::from(v))
            .expect("logical")
    }

    /// The call `fun(args...)`.
    pub fn call(&mut self, fun: &str, args: &[Sexp]) -> Sexp {
        self.interp.lang(fun, args).expect("call")
    }

    /// The call `fun(name = arg, ...)`.
    pub fn call_named(&mut self, fun: &str, args: &[(Option<&str>, Sexp)]) -> Sexp {
        let f = self.sym(fun);
        self.interp.lang_named(f, args).expect("call")
    }

    /// `{ exprs... }`
    pub fn block(&mut self, exprs: &[Sexp]) -> Sexp {
        self.call("{", exprs)
    }

    /// `name <- value`
    pub fn set(&mut self, name: &str, value: Sexp) -> Sexp {
        let s = self.sym(name);
        self.call("<-", &[s, value])
    }

    /// `name <<- value`
    pub fn set_super(&mut self, name: &str, value: Sexp) -> Sexp {
        let s = self.sym(name);
        self.call("<<-", &[s, value])
    }

    /// `function(formals) body`
    pub fn func(&mut self, formals: &[(&str, Option<Sexp>)], body: Sexp) -> Sexp {
        self.interp.fn_expr(formals, body).expect("function")
    }

    /// Evaluates `name <- function(formals) body` at top level.
    pub fn define(&mut self, name: &str, formals: &[(&str, Option<Sexp>)], body: Sexp) {
        let f = self.func(formals, body);
        let e = self.set(name, f);
        self.run(e).expect("definition");
    }

    /// Evaluates `e` at top level.
    pub fn run(&mut self, e: Sexp) -> Result<Sexp, RError> {
        self.interp.eval_toplevel(e)
    }

    /// Value of global variable `name`.
    pub fn get(&mut self, name: &str) -> Sexp {
        let s = self.sym(name);
        self.run(s).expect("variable")
    }

    /// Elements of real vector `x`.
    pub fn reals(&self, x: Sexp) -> Vec<f64> {
        self.interp.heap().real(x).expect("real vector").to_vec()
    }

    /// Elements of integer vector `x`.
    pub fn ints(&self, x: Sexp) -> Vec<i32> {
        self.interp.heap().integer(x).expect("integer vector").to_vec()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
