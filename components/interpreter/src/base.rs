//! Control-flow specials and the small builtins around them.

use crate::builtins::{prec, Arity, EvalMode, FunEntry, PPInfo, PPKind, Visibility};
use crate::coerce::is_atomic;
use crate::context::{CallFlag, ContextInfo, JumpKind};
use crate::runtime::Interpreter;
use crate::transfer::{EvalResult, Transfer};
use core_types::{RError, Sexp, SexpType};
use tracing::warn;

pub(crate) fn entries() -> Vec<FunEntry> {
    use EvalMode::{Builtin, Special};
    let gram = |kind| PPInfo::new(kind, 0, false);
    vec![
        FunEntry::new("quote", do_quote, 0, Special, Arity::Fixed(1)),
        FunEntry::new("if", do_if, 0, Special, Arity::Variadic)
            .with_visibility(Visibility::Dynamic)
            .with_gram(gram(PPKind::If)),
        FunEntry::new("{", do_begin, 0, Special, Arity::Variadic)
            .with_visibility(Visibility::Dynamic)
            .with_gram(gram(PPKind::Curly)),
        FunEntry::new("(", do_paren, 0, Builtin, Arity::Fixed(1)).with_gram(gram(PPKind::Paren)),
        FunEntry::new("function", do_function, 0, Special, Arity::Fixed(2))
            .with_gram(gram(PPKind::Function)),
        FunEntry::new("while", do_while, 0, Special, Arity::Fixed(2))
            .with_visibility(Visibility::Off)
            .with_gram(gram(PPKind::While)),
        FunEntry::new("repeat", do_repeat, 0, Special, Arity::Fixed(1))
            .with_visibility(Visibility::Off)
            .with_gram(gram(PPKind::Repeat)),
        FunEntry::new("for", do_for, 0, Special, Arity::Fixed(3))
            .with_visibility(Visibility::Off)
            .with_gram(gram(PPKind::For)),
        FunEntry::new("break", do_break, 0, Special, Arity::Fixed(0)).with_gram(gram(PPKind::Break)),
        FunEntry::new("next", do_next, 0, Special, Arity::Fixed(0)).with_gram(gram(PPKind::Next)),
        FunEntry::new("return", do_return, 0, Special, Arity::Variadic).with_gram(gram(PPKind::Return)),
        FunEntry::new("on.exit", do_on_exit, 0, Special, Arity::Variadic)
            .with_visibility(Visibility::Off),
        FunEntry::new("missing", do_missing, 0, Special, Arity::Fixed(1)),
        FunEntry::new("try", do_try, 0, Special, Arity::Variadic).with_visibility(Visibility::Dynamic),
        FunEntry::new("invisible", do_invisible, 0, Builtin, Arity::Variadic)
            .with_visibility(Visibility::Off),
        FunEntry::new("stop", do_stop, 0, Builtin, Arity::Variadic),
        FunEntry::new("gc", do_gc, 0, Builtin, Arity::Fixed(0)),
        FunEntry::new("environment", do_environment, 0, Builtin, Arity::Variadic),
        FunEntry::new("attr", do_attr, 0, Builtin, Arity::Fixed(2)),
        FunEntry::new("attr<-", do_attrgets, 0, Builtin, Arity::Fixed(3))
            .with_gram(PPInfo::new(PPKind::Assign, prec::LEFT, true)),
        FunEntry::new("class", do_class, 0, Builtin, Arity::Fixed(1)),
        FunEntry::new("class<-", do_classgets, 0, Builtin, Arity::Fixed(2))
            .with_gram(PPInfo::new(PPKind::Assign, prec::LEFT, true)),
    ]
}

impl Interpreter {
    /// Matches `args` to `names` by exact tag, then by position. Absent
    /// arguments come back as the missing-argument marker.
    pub(crate) fn match_simple(&self, args: Sexp, names: &[&str]) -> EvalResult<Vec<Sexp>> {
        let mut out = vec![Sexp::MISSING_ARG; names.len()];
        let mut taken = vec![false; names.len()];
        let mut positional = Vec::new();
        for cell in self.cells(args)? {
            let (value, tag) = (self.heap.car(cell)?, self.heap.tag(cell)?);
            if tag.is_nil() {
                positional.push(value);
                continue;
            }
            let name = self.heap.symbol_name(tag)?;
            match names.iter().position(|n| *n == name) {
                Some(i) if !taken[i] => {
                    out[i] = value;
                    taken[i] = true;
                }
                _ => {
                    return Err(RError::ArgumentMatch(format!("unused argument(s) ({})", name)).into())
                }
            }
        }
        let mut slots = (0..names.len()).filter(|&i| !taken[i]);
        for value in positional {
            let i = slots
                .next()
                .ok_or_else(|| RError::ArgumentMatch("unused argument(s)".to_string()))?;
            out[i] = value;
        }
        Ok(out)
    }

    /// Evaluates `expr` in `rho`, turning a recoverable error into a string
    /// of class `"try-error"` holding its message.
    pub fn try_eval(&mut self, expr: Sexp, rho: Sexp, silent: bool) -> EvalResult<Sexp> {
        let result = self.with_context(CallFlag::TOPLEVEL, ContextInfo::in_env(rho), |interp, _| {
            interp.eval(expr, rho)
        });
        match result {
            Err(Transfer::Error(err)) if !err.is_fatal() => {
                if !silent {
                    warn!(error = %err, "error caught by try");
                }
                let value = self.heap.mk_string(&format!("Error : {}\n", err))?;
                let _value = self.heap.protect(value)?;
                let class = self.heap.mk_string("try-error")?;
                let class_sym = self.heap.install("class")?;
                self.heap.set_attrib(value, class_sym, class)?;
                self.visible = false;
                Ok(value)
            }
            other => other,
        }
    }

    /// Runs `body` once per iteration inside a loop context, stopping when
    /// `step` returns false or a `break` for this loop arrives.
    fn run_loop<S>(&mut self, rho: Sexp, body: Sexp, mut step: S) -> EvalResult<Sexp>
    where
        S: FnMut(&mut Interpreter) -> EvalResult<bool>,
    {
        self.with_context(CallFlag::LOOP, ContextInfo::in_env(rho), |interp, id| {
            loop {
                interp.check_interrupt()?;
                if !step(interp)? {
                    break;
                }
                match interp.eval(body, rho) {
                    Ok(_) => {}
                    Err(Transfer::Break { target }) if target == id => break,
                    Err(Transfer::Next { target }) if target == id => continue,
                    Err(t) => return Err(t),
                }
            }
            Ok(Sexp::NIL)
        })?;
        self.visible = false;
        Ok(Sexp::NIL)
    }

    /// `missing(sym)` seen from `rho`.
    fn is_missing_arg(&mut self, sym: Sexp, rho: Sexp) -> EvalResult<bool> {
        let cell = self.find_binding_in_frame(rho, sym)?;
        if cell.is_nil() {
            return Err(RError::invalid("'missing' can only be used for arguments").into());
        }
        if self.heap.gp(cell) != 0 {
            return Ok(true);
        }
        let value = self.heap.car(cell)?;
        if value == Sexp::MISSING_ARG {
            return Ok(true);
        }
        if self.heap.type_of(value) == SexpType::Promise
            && self.heap.prvalue(value)? == Sexp::UNBOUND
        {
            let expr = self.heap.prexpr(value)?;
            let env = self.heap.prenv(value)?;
            if self.heap.type_of(expr) == SexpType::Symbol
                && !env.is_nil()
                && !self.find_binding_in_frame(env, expr)?.is_nil()
            {
                return self.is_missing_arg(expr, env);
            }
        }
        Ok(false)
    }
}

fn do_quote(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    Ok(interp.heap.car(args)?)
}

fn do_if(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let n = interp.heap.length(args);
    if !(2..=3).contains(&n) {
        return Err(RError::invalid("malformed if statement").into());
    }
    let cond = interp.heap.car(args)?;
    let cond = interp.eval(cond, rho)?;
    if interp.as_condition(cond)? {
        let yes = interp.heap.cadr(args)?;
        interp.eval(yes, rho)
    } else if n == 3 {
        let no = interp.heap.caddr(args)?;
        interp.eval(no, rho)
    } else {
        interp.visible = false;
        Ok(Sexp::NIL)
    }
}

fn do_begin(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let value = interp.eval_seq(args, rho)?;
    if args.is_nil() {
        interp.visible = true;
    }
    Ok(value)
}

fn do_paren(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    Ok(interp.heap.car(args)?)
}

fn do_function(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let formals = interp.heap.car(args)?;
    let mut f = formals;
    while !f.is_nil() {
        if interp.heap.type_of(interp.heap.tag(f)?) != SexpType::Symbol {
            return Err(RError::invalid("invalid formal argument list for \"function\"").into());
        }
        f = interp.heap.cdr(f)?;
    }
    let body = interp.heap.cadr(args)?;
    Ok(interp.heap.mk_closure(formals, body, rho)?)
}

fn do_while(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let cond = interp.heap.car(args)?;
    let body = interp.heap.cadr(args)?;
    interp.run_loop(rho, body, |interp| {
        let value = interp.eval(cond, rho)?;
        Ok(interp.as_condition(value)?)
    })
}

fn do_repeat(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let body = interp.heap.car(args)?;
    interp.run_loop(rho, body, |_| Ok(true))
}

fn do_for(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let sym = interp.heap.car(args)?;
    if interp.heap.type_of(sym) != SexpType::Symbol {
        return Err(RError::invalid("non-symbol loop variable").into());
    }
    let seq = interp.heap.cadr(args)?;
    let seq = interp.eval(seq, rho)?;
    let _seq = interp.heap.protect(seq)?;
    let seq = match interp.heap.type_of(seq) {
        SexpType::List | SexpType::Lang | SexpType::Dots => interp.coerce_vector(seq, SexpType::Generic)?,
        _ => seq,
    };
    let _list = interp.heap.protect(seq)?;
    let body = interp.heap.caddr(args)?;
    let n = match interp.heap.type_of(seq) {
        SexpType::Nil => 0,
        ty if ty.is_vector() && ty != SexpType::Char => interp.heap.length(seq),
        _ => return Err(RError::invalid("invalid for() loop sequence").into()),
    };
    let mut i = 0;
    interp.run_loop(rho, body, move |interp| {
        if i >= n {
            return Ok(false);
        }
        let value = interp.element(seq, i)?;
        if !is_atomic(interp.heap.type_of(seq)) {
            interp.heap.set_named(value, 2);
        }
        i += 1;
        interp.define_var(sym, value, rho)?;
        Ok(true)
    })
}

fn do_break(interp: &mut Interpreter, _call: Sexp, _op: Sexp, _args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let target = interp.find_context(CallFlag::LOOP, rho)?;
    Err(interp.jump_to(JumpKind::Break, target))
}

fn do_next(interp: &mut Interpreter, _call: Sexp, _op: Sexp, _args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let target = interp.find_context(CallFlag::LOOP, rho)?;
    Err(interp.jump_to(JumpKind::Next, target))
}

fn do_return(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let value = match interp.heap.length(args) {
        0 => Sexp::NIL,
        1 => {
            let expr = interp.heap.car(args)?;
            interp.eval(expr, rho)?
        }
        _ => return Err(RError::user("multi-argument returns are not permitted").into()),
    };
    let target = interp.find_context(CallFlag::RETURN, rho)?;
    Err(interp.jump_to(JumpKind::Return(value), target))
}

fn do_on_exit(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let matched = interp.match_simple(args, &["expr", "add"])?;
    let expr = match matched[0] {
        Sexp::MISSING_ARG => Sexp::NIL,
        e => e,
    };
    let add = match matched[1] {
        Sexp::MISSING_ARG => false,
        e => {
            let value = interp.eval(e, rho)?;
            interp.as_condition(value)?
        }
    };
    interp.set_on_exit(rho, expr, add)?;
    Ok(Sexp::NIL)
}

fn do_missing(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let arg = interp.heap.car(args)?;
    let sym = match interp.heap.type_of(arg) {
        SexpType::Symbol => arg,
        SexpType::Str if interp.heap.length(arg) == 1 => {
            let name = interp.strings_of(arg)?.remove(0).unwrap_or_default();
            interp.heap.install(&name)?
        }
        _ => return Err(RError::invalid("invalid use of 'missing'").into()),
    };
    let missing = interp.is_missing_arg(sym, rho)?;
    Ok(interp.heap.scalar_logical(i32::from(missing))?)
}

fn do_try(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let matched = interp.match_simple(args, &["expr", "silent"])?;
    let silent = match matched[1] {
        Sexp::MISSING_ARG => false,
        e => {
            let value = interp.eval(e, rho)?;
            interp.as_condition(value)?
        }
    };
    interp.try_eval(matched[0], rho, silent)
}

fn do_invisible(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    Ok(interp.heap.car(args)?)
}

fn do_stop(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let mut msg = String::new();
    for value in interp.heap.list_to_vec(args)? {
        for s in interp.strings_of(value)? {
            msg.push_str(s.as_deref().unwrap_or("NA"));
        }
    }
    Err(RError::User(msg).into())
}

fn do_gc(interp: &mut Interpreter, _call: Sexp, _op: Sexp, _args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let stats = interp.gc();
    let out = interp.heap.alloc_vector(SexpType::Integer, 2)?;
    let clamp = |v: usize| i32::try_from(v).unwrap_or(i32::MAX);
    let counts = [
        clamp(stats.node_capacity - stats.nodes_in_use),
        clamp(stats.vector_capacity - stats.vector_in_use),
    ];
    interp.heap.integer_mut(out)?.copy_from_slice(&counts);
    Ok(out)
}

fn do_environment(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, rho: Sexp) -> EvalResult<Sexp> {
    let fun = interp.heap.car(args)?;
    match interp.heap.type_of(fun) {
        SexpType::Nil => Ok(rho),
        SexpType::Closure => Ok(interp.heap.cloenv(fun)?),
        _ => Ok(Sexp::NIL),
    }
}

fn attr_name(interp: &mut Interpreter, which: Sexp) -> EvalResult<Sexp> {
    match interp.strings_of(which) {
        Ok(names) if interp.heap.type_of(which) == SexpType::Str && names.len() == 1 => {
            let name = names.into_iter().next().flatten().unwrap_or_default();
            Ok(interp.heap.install(&name)?)
        }
        _ => Err(RError::invalid("exactly one attribute 'which' must be given").into()),
    }
}

fn do_attr(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let which = interp.heap.cadr(args)?;
    let name = attr_name(interp, which)?;
    Ok(interp.heap.get_attrib(x, name)?)
}

/// `x` itself, or a copy when it is shared.
pub(crate) fn unshared(interp: &mut Interpreter, x: Sexp) -> Result<Sexp, RError> {
    if interp.heap.named(x) == 2 {
        interp.heap.duplicate(x)
    } else {
        Ok(x)
    }
}

fn do_attrgets(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let which = interp.heap.cadr(args)?;
    let value = interp.heap.caddr(args)?;
    let name = attr_name(interp, which)?;
    let x = unshared(interp, x)?;
    let _x = interp.heap.protect(x)?;
    let value = if name == interp.syms.names && !value.is_nil() {
        names_for(interp, x, value)?
    } else {
        value
    };
    let _value = interp.heap.protect(value)?;
    interp.heap.set_attrib(x, name, value)?;
    Ok(x)
}

/// `value` as a names attribute for `x`: a character vector no longer than
/// `x`, padded with NA.
fn names_for(interp: &mut Interpreter, x: Sexp, value: Sexp) -> EvalResult<Sexp> {
    let (n, supplied) = (interp.heap.length(x), interp.heap.length(value));
    if supplied > n {
        return Err(RError::invalid(format!(
            "'names' attribute [{}] must be the same length as the vector [{}]",
            supplied, n
        ))
        .into());
    }
    if supplied == n && interp.heap.type_of(value) == SexpType::Str {
        return Ok(value);
    }
    let mut names = interp.strings_of(value)?;
    names.resize(n, None);
    Ok(interp.mk_strings(&names)?)
}

fn do_class(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let class = interp.heap.install("class")?;
    Ok(interp.heap.get_attrib(x, class)?)
}

fn do_classgets(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let value = interp.heap.cadr(args)?;
    if !value.is_nil() && interp.heap.type_of(value) != SexpType::Str {
        return Err(RError::invalid("attempt to set invalid 'class' attribute").into());
    }
    let x = unshared(interp, x)?;
    let _x = interp.heap.protect(x)?;
    let class = interp.heap.install("class")?;
    interp.heap.set_attrib(x, class, value)?;
    Ok(x)
}
