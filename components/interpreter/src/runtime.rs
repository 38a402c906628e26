//! The interpreter state.

use crate::builtins::{EvalMode, FunEntry, FunTab};
use crate::context::{CallFlag, Context, ContextInfo};
use crate::transfer::EvalResult;
use core_types::{RError, Sexp, SexpType};
use memory_manager::{Heap, MemoryConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default limit on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Symbols the evaluator refers to by identity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommonSymbols {
    pub dots: Sexp,
    pub tmp: Sexp,
    pub brace: Sexp,
    pub value: Sexp,
    pub names: Sexp,
}

impl CommonSymbols {
    fn install(heap: &mut Heap) -> Result<Self, RError> {
        Ok(CommonSymbols {
            dots: heap.install("...")?,
            tmp: heap.install("*tmp*")?,
            brace: heap.install("{")?,
            value: heap.install("value")?,
            names: heap.install("names")?,
        })
    }
}

/// A tree-walking evaluator over one heap.
///
/// # Examples
///
/// ```
/// use interpreter::Interpreter;
///
/// let mut interp = Interpreter::new().unwrap();
/// let one = interp.int(1).unwrap();
/// let _one = interp.heap().protect(one).unwrap();
/// let two = interp.int(2).unwrap();
/// let _two = interp.heap().protect(two).unwrap();
/// let sum = interp.lang("+", &[one, two]).unwrap();
/// let _sum = interp.heap().protect(sum).unwrap();
/// let value = interp.eval_toplevel(sum).unwrap();
/// assert_eq!(interp.heap().integer(value).unwrap(), &[3]);
/// ```
#[derive(Debug)]
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) contexts: Vec<Context>,
    pub(crate) builtins: FunTab,
    pub(crate) syms: CommonSymbols,
    pub(crate) eval_depth: usize,
    pub(crate) visible: bool,
    interrupt: Arc<AtomicBool>,
    max_depth: usize,
}

impl Interpreter {
    /// Interpreter with the default heap sizes.
    pub fn new() -> Result<Self, RError> {
        Self::with_config(MemoryConfig::default())
    }

    /// Interpreter over a heap built from `config`, with the base
    /// functions installed.
    pub fn with_config(config: MemoryConfig) -> Result<Self, RError> {
        let mut heap = Heap::new(config)?;
        let syms = CommonSymbols::install(&mut heap)?;
        let mut interp = Interpreter {
            heap,
            contexts: Vec::new(),
            builtins: FunTab::new(),
            syms,
            eval_depth: 0,
            visible: true,
            interrupt: Arc::new(AtomicBool::new(false)),
            max_depth: DEFAULT_MAX_DEPTH,
        };
        let entries = crate::base::entries()
            .into_iter()
            .chain(crate::assign::entries())
            .chain(crate::arith::entries())
            .chain(crate::subset::entries());
        for entry in entries {
            interp.register_builtin(entry)?;
        }
        debug!(primitives = interp.builtins.len(), "interpreter ready");
        Ok(interp)
    }

    /// Sets the expression nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expression nesting limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The heap, mutably.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// The global environment.
    pub fn global_env(&self) -> Sexp {
        self.heap.global_env()
    }

    /// The primitive table.
    pub fn builtins(&self) -> &FunTab {
        &self.builtins
    }

    /// Whether the last toplevel value should be printed.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Flag another thread may set to interrupt evaluation.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Consumes a pending interrupt.
    pub(crate) fn check_interrupt(&self) -> EvalResult<()> {
        if self.interrupt.swap(false, Ordering::SeqCst) {
            return Err(RError::Interrupted.into());
        }
        Ok(())
    }

    /// Adds a primitive and binds it in the base namespace (the symbol's
    /// value slot). Returns the primitive object.
    pub fn register_builtin(&mut self, entry: FunEntry) -> Result<Sexp, RError> {
        let ty = match entry.eval {
            EvalMode::Special => SexpType::Special,
            EvalMode::Builtin => SexpType::Builtin,
        };
        let name = entry.name;
        let offset = self.builtins.register(entry);
        let prim = self.heap.mk_primitive(ty, offset)?;
        let _prim = self.heap.protect(prim)?;
        let sym = self.heap.install(name)?;
        self.heap.set_symvalue(sym, prim)?;
        Ok(prim)
    }

    /// The table entry of primitive `op`.
    pub(crate) fn entry(&self, op: Sexp) -> Result<FunEntry, RError> {
        let offset = self.heap.prim_offset(op)?;
        self.builtins
            .get(offset)
            .copied()
            .ok_or_else(|| RError::invalid(format!("unknown primitive offset {}", offset)))
    }

    /// Evaluates `expr` in the global environment under a toplevel context.
    ///
    /// Errors, and jumps that found no target, are reported and returned.
    pub fn eval_toplevel(&mut self, expr: Sexp) -> Result<Sexp, RError> {
        let _expr = self.heap.protect(expr)?;
        let rho = self.global_env();
        let result = self.with_context(CallFlag::TOPLEVEL, ContextInfo::in_env(rho), |interp, _| {
            interp.eval(expr, rho)
        });
        result.map_err(|t| {
            let err = t.into_error();
            warn!(error = %err, fatal = err.is_fatal(), "error at toplevel");
            err
        })
    }

    /// Runs a full collection.
    pub fn gc(&mut self) -> memory_manager::GcStats {
        self.heap.collect()
    }
}
