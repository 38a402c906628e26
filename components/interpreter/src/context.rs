//! The context stack.
//!
//! A context is pushed for every closure call, loop, toplevel evaluation and
//! native cleanup region. It records what `break`, `next` and `return` need
//! to find their target, the on-exit code to run while unwinding, and the
//! protection-stack watermark to restore when it is popped.
//!
//! Unwinding is ordinary `Result` propagation: each [`Interpreter::with_context`]
//! frame sees the [`Transfer`] pass through, runs its exit code, restores the
//! watermark and either consumes the transfer (when it is the target) or
//! hands it on.

use crate::runtime::Interpreter;
use crate::transfer::{EvalResult, Transfer};
use core_types::{RError, Sexp, SexpType};
use std::fmt;
use tracing::trace;

/// Index of a context on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub usize);

/// Kind of a context, as a bit set.
///
/// `LOOP` is the union of `NEXT` and `BREAK`; a mask matches a context when
/// the two share a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallFlag(u8);

impl CallFlag {
    /// Toplevel and error-handler boundaries
    pub const TOPLEVEL: CallFlag = CallFlag(0);
    /// Target of `next`
    pub const NEXT: CallFlag = CallFlag(1);
    /// Target of `break`
    pub const BREAK: CallFlag = CallFlag(2);
    /// Loop body, target of both `break` and `next`
    pub const LOOP: CallFlag = CallFlag(3);
    /// Closure call, target of `return`
    pub const RETURN: CallFlag = CallFlag(4);
    /// Native cleanup region
    pub const CCODE: CallFlag = CallFlag(8);
    /// Browser frame
    pub const BROWSER: CallFlag = CallFlag(12);
    /// Generic dispatch frame
    pub const GENERIC: CallFlag = CallFlag(16);

    /// Raw flag bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when the two flags share a bit.
    pub fn intersects(self, mask: CallFlag) -> bool {
        self.0 & mask.0 != 0
    }
}

impl fmt::Display for CallFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            CallFlag::TOPLEVEL => "toplevel",
            CallFlag::NEXT => "next",
            CallFlag::BREAK => "break",
            CallFlag::LOOP => "loop",
            CallFlag::RETURN => "function",
            CallFlag::CCODE => "ccode",
            CallFlag::BROWSER => "browser",
            CallFlag::GENERIC => "generic",
            CallFlag(bits) => return write!(f, "flag({})", bits),
        };
        f.write_str(name)
    }
}

/// Objects recorded by a new context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextInfo {
    /// The call being evaluated
    pub call: Sexp,
    /// Environment the context evaluates in
    pub cloenv: Sexp,
    /// Environment the call was made from
    pub sysparent: Sexp,
    /// Promise arguments of a closure call
    pub promargs: Sexp,
}

impl ContextInfo {
    /// Info for a context that only needs an environment.
    pub fn in_env(rho: Sexp) -> Self {
        ContextInfo {
            call: Sexp::NIL,
            cloenv: rho,
            sysparent: rho,
            promargs: Sexp::NIL,
        }
    }
}

/// Native thunk run once when its context is popped.
pub type NativeCleanup = Box<dyn FnOnce(&mut Interpreter)>;

/// One entry of the context stack.
pub struct Context {
    /// Context kind
    pub callflag: CallFlag,
    /// Protection-stack depth when the context was pushed
    pub cstacktop: usize,
    /// The call being evaluated
    pub call: Sexp,
    /// Evaluation environment
    pub cloenv: Sexp,
    /// Caller environment
    pub sysparent: Sexp,
    /// Promise arguments
    pub promargs: Sexp,
    /// Interpreted on-exit code, or nil
    pub conexit: Sexp,
    cend: Option<NativeCleanup>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("callflag", &self.callflag)
            .field("cstacktop", &self.cstacktop)
            .field("call", &self.call)
            .field("cloenv", &self.cloenv)
            .field("sysparent", &self.sysparent)
            .field("promargs", &self.promargs)
            .field("conexit", &self.conexit)
            .field("cend", &self.cend.is_some())
            .finish()
    }
}

/// Kinds of jump `jump_to` can build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpKind {
    /// Leave a loop
    Break,
    /// Next loop iteration
    Next,
    /// Return a value from a function
    Return(Sexp),
}

impl Interpreter {
    /// Pushes a context and roots the objects it records.
    pub fn begin_context(&mut self, flag: CallFlag, info: ContextInfo) -> EvalResult<ContextId> {
        let stack = self.heap.protection_stack().clone();
        let cstacktop = stack.depth();
        for obj in [info.call, info.cloenv, info.sysparent, info.promargs] {
            if let Err(e) = stack.push(obj) {
                stack.restore(cstacktop);
                return Err(e.into());
            }
        }
        let id = ContextId(self.contexts.len());
        self.contexts.push(Context {
            callflag: flag,
            cstacktop,
            call: info.call,
            cloenv: info.cloenv,
            sysparent: info.sysparent,
            promargs: info.promargs,
            conexit: Sexp::NIL,
            cend: None,
        });
        trace!(context = id.0, flag = %flag, cstacktop, "begin context");
        Ok(id)
    }

    /// Runs `body` inside a new context and pops it afterwards.
    ///
    /// The native cleanup and then the on-exit code of the context run
    /// exactly once whatever the outcome of `body`. A `return` aimed at this
    /// context becomes its value; any other transfer continues upward after
    /// the protection stack is restored to its depth at entry.
    pub fn with_context<F>(&mut self, flag: CallFlag, info: ContextInfo, body: F) -> EvalResult<Sexp>
    where
        F: FnOnce(&mut Interpreter, ContextId) -> EvalResult<Sexp>,
    {
        let id = self.begin_context(flag, info)?;
        let outcome = body(self, id);
        self.end_context(id, outcome)
    }

    fn end_context(&mut self, id: ContextId, mut outcome: EvalResult<Sexp>) -> EvalResult<Sexp> {
        let held = match &outcome {
            Ok(v) | Err(Transfer::Return { value: v, .. }) => *v,
            Err(_) => Sexp::NIL,
        };
        // above the watermark, so restore() below releases it
        if let Err(e) = self.heap.protection_stack().push(held) {
            outcome = Err(e.into());
        }

        let (cend, conexit, cloenv) = match self.contexts.get_mut(id.0) {
            Some(ctx) => (
                ctx.cend.take(),
                std::mem::replace(&mut ctx.conexit, Sexp::NIL),
                ctx.cloenv,
            ),
            None => (None, Sexp::NIL, Sexp::NIL),
        };
        if let Some(cleanup) = cend {
            cleanup(self);
        }
        if !conexit.is_nil() {
            trace!(context = id.0, "running on.exit code");
            let saved = self.visible;
            match self.eval(conexit, cloenv) {
                Ok(_) => {}
                Err(Transfer::Return { target, value }) if target == id => outcome = Ok(value),
                Err(t) => outcome = Err(t),
            }
            self.visible = saved;
        }

        if let Some(ctx) = self.contexts.get(id.0) {
            self.heap.protection_stack().restore(ctx.cstacktop);
        }
        self.contexts.truncate(id.0);
        trace!(context = id.0, "end context");

        match outcome {
            Err(Transfer::Return { target, value }) if target == id => Ok(value),
            other => other,
        }
    }

    /// Builds the transfer for a jump to `target`.
    pub fn jump_to(&self, kind: JumpKind, target: ContextId) -> Transfer {
        trace!(target = target.0, ?kind, "jump");
        match kind {
            JumpKind::Break => Transfer::Break { target },
            JumpKind::Next => Transfer::Next { target },
            JumpKind::Return(value) => Transfer::Return { target, value },
        }
    }

    /// Innermost context whose flag intersects `mask` and whose environment
    /// is `rho`.
    pub fn find_context(&self, mask: CallFlag, rho: Sexp) -> EvalResult<ContextId> {
        self.contexts
            .iter()
            .rposition(|c| c.callflag.intersects(mask) && c.cloenv == rho)
            .map(ContextId)
            .ok_or_else(|| {
                if mask.intersects(CallFlag::LOOP) {
                    RError::user("no loop for break/next, jumping to top level").into()
                } else {
                    RError::user("no function to return from, jumping to top level").into()
                }
            })
    }

    /// Runs `body` in a native cleanup context; `cleanup` runs on every exit.
    pub fn with_cleanup<C, F>(&mut self, cleanup: C, body: F) -> EvalResult<Sexp>
    where
        C: FnOnce(&mut Interpreter) + 'static,
        F: FnOnce(&mut Interpreter) -> EvalResult<Sexp>,
    {
        let rho = self.global_env();
        self.with_context(CallFlag::CCODE, ContextInfo::in_env(rho), |interp, id| {
            if let Some(ctx) = interp.contexts.get_mut(id.0) {
                ctx.cend = Some(Box::new(cleanup));
            }
            body(interp)
        })
    }

    /// Registers `expr` as on-exit code of the innermost function context
    /// evaluating in `rho`, replacing it or, with `add`, appending to it.
    pub(crate) fn set_on_exit(&mut self, rho: Sexp, expr: Sexp, add: bool) -> EvalResult<()> {
        let Some(index) = self
            .contexts
            .iter()
            .rposition(|c| c.callflag.intersects(CallFlag::RETURN) && c.cloenv == rho)
        else {
            return Ok(());
        };
        let old = self.contexts[index].conexit;
        let code = if !add || old.is_nil() {
            expr
        } else if expr.is_nil() {
            old
        } else {
            self.append_exit_code(old, expr)?
        };
        // rooted until the enclosing context's watermark is restored
        self.heap.protection_stack().push(code)?;
        self.contexts[index].conexit = code;
        Ok(())
    }

    /// `{ old; expr }`, flattening `old` when it already is a brace block.
    fn append_exit_code(&mut self, old: Sexp, expr: Sexp) -> EvalResult<Sexp> {
        let _expr = self.heap.protect(expr)?;
        let brace = self.heap.install("{")?;
        let tail = self.heap.list1(expr)?;
        let _tail = self.heap.protect(tail)?;
        if self.heap.type_of(old) == SexpType::Lang && self.heap.car(old)? == brace {
            let block = self.heap.duplicate(old)?;
            let mut last = block;
            while !self.heap.cdr(last)?.is_nil() {
                last = self.heap.cdr(last)?;
            }
            self.heap.set_cdr(last, tail)?;
            Ok(block)
        } else {
            let items = self.heap.cons(old, tail)?;
            Ok(self.heap.lcons(brace, items)?)
        }
    }

    /// Number of contexts on the stack.
    pub fn context_depth(&self) -> usize {
        self.contexts.len()
    }

    /// Call of the `n`-th function context counting from the innermost
    /// (`n == 0`), or nil.
    pub fn context_call(&self, n: usize) -> Sexp {
        self.contexts
            .iter()
            .rev()
            .filter(|c| c.callflag.intersects(CallFlag::RETURN))
            .nth(n)
            .map_or(Sexp::NIL, |c| c.call)
    }

    /// The context stack, innermost last.
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }
}
