//! Vector construction and single-element access: `c`, `list`, `length`,
//! `[[` and `[[<-`.

use crate::base::unshared;
use crate::builtins::{prec, Arity, EvalMode, FunEntry, PPInfo, PPKind};
use crate::coerce::{is_atomic, type_rank};
use crate::runtime::Interpreter;
use crate::transfer::EvalResult;
use core_types::{RError, Sexp, SexpType, NA_INTEGER};

pub(crate) fn entries() -> Vec<FunEntry> {
    use EvalMode::Builtin;
    vec![
        FunEntry::new("c", do_c, 0, Builtin, Arity::Variadic),
        FunEntry::new("list", do_list, 0, Builtin, Arity::Variadic),
        FunEntry::new("length", do_length, 0, Builtin, Arity::Fixed(1)),
        FunEntry::new("[[", do_subset2, 0, Builtin, Arity::Fixed(2))
            .with_gram(PPInfo::new(PPKind::Subset, prec::SUBSET, false)),
        FunEntry::new("[[<-", do_subassign2, 0, Builtin, Arity::Fixed(3))
            .with_gram(PPInfo::new(PPKind::Subset, prec::SUBSET, false)),
    ]
}

/// Largest real subscript accepted (2^52).
const MAX_SUBSCRIPT: f64 = 4_503_599_627_370_496.0;

fn subscript_out_of_bounds() -> RError {
    RError::invalid("subscript out of bounds")
}

/// Number of elements `x` contributes when flattened into a vector.
fn flat_length(interp: &Interpreter, x: Sexp) -> usize {
    let ty = interp.heap.type_of(x);
    if ty == SexpType::Nil {
        0
    } else if ty.is_vector() || ty.is_pairlist() {
        interp.heap.length(x)
    } else {
        1
    }
}

impl Interpreter {
    /// Element names of `x`: tags for pair lists, the names attribute
    /// otherwise. `None` when `x` has neither. A names attribute of the
    /// wrong length is padded with empty names or cut to the length of `x`.
    fn names_of(&self, x: Sexp) -> Result<Option<Vec<Option<String>>>, RError> {
        if self.heap.type_of(x).is_pairlist() {
            let mut out = Vec::new();
            let mut any = false;
            for cell in self.cells(x)? {
                let tag = self.heap.tag(cell)?;
                if tag.is_nil() {
                    out.push(Some(String::new()));
                } else {
                    any = true;
                    out.push(Some(self.heap.symbol_name(tag)?.to_string()));
                }
            }
            return Ok(any.then_some(out));
        }
        let names = self.heap.get_attrib(x, self.syms.names)?;
        if names.is_nil() {
            return Ok(None);
        }
        let mut names = self.strings_of(names)?;
        names.resize(self.heap.length(x), Some(String::new()));
        Ok(Some(names))
    }

    /// Zero-based position selected by the `[[` subscript `idx` in `x` of
    /// length `n`. A string not among the names resolves to `n`.
    fn subscript(&self, x: Sexp, idx: Sexp, n: usize) -> Result<usize, RError> {
        match self.heap.length(idx) {
            1 => {}
            0 => return Err(RError::invalid("attempt to select less than one element")),
            _ => return Err(RError::invalid("attempt to select more than one element")),
        }
        match self.heap.type_of(idx) {
            SexpType::Integer | SexpType::Logical => {
                let i = self.integers_of(idx)?[0];
                if i == NA_INTEGER || i < 1 {
                    return Err(subscript_out_of_bounds());
                }
                Ok(i as usize - 1)
            }
            SexpType::Real => {
                let v = self.heap.real(idx)?[0];
                if v.is_nan() || v < 1.0 || v > MAX_SUBSCRIPT {
                    return Err(subscript_out_of_bounds());
                }
                Ok(v as usize - 1)
            }
            SexpType::Str => {
                let wanted = self.strings_of(idx)?.remove(0);
                let names = self.names_of(x)?.unwrap_or_default();
                Ok(wanted
                    .and_then(|w| names.iter().position(|nm| nm.as_deref() == Some(w.as_str())))
                    .unwrap_or(n))
            }
            ty => Err(RError::invalid(format!("invalid subscript type '{}'", ty))),
        }
    }

    /// Copy of vector `x` lengthened to `len`, padded with NA or nil. Names
    /// are padded with empty strings.
    fn grow_vector(&mut self, x: Sexp, len: usize) -> Result<Sexp, RError> {
        let n = self.heap.length(x);
        let out = self.heap.alloc_vector(self.heap.type_of(x), len)?;
        let _out = self.heap.protect(out)?;
        self.copy_elements(out, 0, x)?;
        self.fill_na(out, n)?;
        if let Some(mut names) = self.names_of(x)? {
            names.resize(len, Some(String::new()));
            let names = self.mk_strings(&names)?;
            self.heap.set_attrib(out, self.syms.names, names)?;
        }
        Ok(out)
    }

    /// Sets the name of element `pos` of `x`, creating the names attribute
    /// if needed.
    fn set_element_name(&mut self, x: Sexp, pos: usize, name: &str) -> Result<(), RError> {
        let n = self.heap.length(x);
        let mut names = self
            .names_of(x)?
            .unwrap_or_else(|| vec![Some(String::new()); n]);
        if let Some(slot) = names.get_mut(pos) {
            *slot = Some(name.to_string());
        }
        let names = self.mk_strings(&names)?;
        self.heap.set_attrib(x, self.syms.names, names)
    }

    /// `x` without element `pos`.
    fn delete_element(&mut self, x: Sexp, pos: usize) -> Result<Sexp, RError> {
        let n = self.heap.length(x);
        if pos >= n {
            return Ok(x);
        }
        let out = self.heap.alloc_vector(self.heap.type_of(x), n - 1)?;
        let _out = self.heap.protect(out)?;
        let kept: Vec<Sexp> = self
            .heap
            .refs(x)?
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| (i != pos).then_some(e))
            .collect();
        for (i, e) in kept.into_iter().enumerate() {
            self.heap.set_vector_elt(out, i, e)?;
        }
        if let Some(mut names) = self.names_of(x)? {
            names.remove(pos);
            let names = self.mk_strings(&names)?;
            self.heap.set_attrib(out, self.syms.names, names)?;
        }
        Ok(out)
    }
}

fn do_c(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let items: Vec<(Sexp, Sexp)> = interp
        .cells(args)?
        .into_iter()
        .map(|cell| Ok((interp.heap.car(cell)?, interp.heap.tag(cell)?)))
        .collect::<Result<_, RError>>()?;

    let mut rank = 0;
    let mut total = 0;
    let mut want_names = false;
    for &(value, tag) in &items {
        let ty = interp.heap.type_of(value);
        let r = match type_rank(ty) {
            Some(r) if !ty.is_pairlist() || ty == SexpType::List => r,
            _ => 6,
        };
        rank = rank.max(r);
        total += flat_length(interp, value);
        want_names |= !tag.is_nil() || interp.names_of(value)?.is_some();
    }
    let ty = match rank {
        0 => return Ok(Sexp::NIL),
        1 => SexpType::Logical,
        2 => SexpType::Integer,
        3 => SexpType::Real,
        4 => SexpType::Complex,
        5 => SexpType::Str,
        6 => SexpType::Generic,
        _ => SexpType::Expression,
    };

    let out = interp.heap.alloc_vector(ty, total)?;
    let _out = interp.heap.protect(out)?;
    let mut names = Vec::with_capacity(total);
    let mut at = 0;
    for (value, tag) in items {
        let len = flat_length(interp, value);
        if is_atomic(ty) {
            let part = interp.coerce_vector(value, ty)?;
            let _part = interp.heap.protect(part)?;
            interp.copy_elements(out, at, part)?;
        } else {
            let vty = interp.heap.type_of(value);
            for i in 0..len {
                let elt = if vty.is_vector() || vty.is_pairlist() {
                    interp.element(value, i)?
                } else {
                    value
                };
                interp.heap.set_named(elt, 2);
                interp.heap.set_vector_elt(out, at + i, elt)?;
            }
        }
        if want_names {
            let prefix = if tag.is_nil() {
                None
            } else {
                Some(interp.heap.symbol_name(tag)?.to_string())
            };
            let inner = interp.names_of(value)?;
            for i in 0..len {
                let inner = inner.as_ref().and_then(|v| v.get(i).cloned().flatten()).unwrap_or_default();
                names.push(Some(match &prefix {
                    None => inner,
                    Some(p) if len == 1 => p.clone(),
                    Some(p) if inner.is_empty() => format!("{}{}", p, i + 1),
                    Some(p) => format!("{}.{}", p, inner),
                }));
            }
        }
        at += len;
    }
    if want_names {
        let names = interp.mk_strings(&names)?;
        interp.heap.set_attrib(out, interp.syms.names, names)?;
    }
    Ok(out)
}

fn do_list(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let cells = interp.cells(args)?;
    let out = interp.heap.alloc_vector(SexpType::Generic, cells.len())?;
    let _out = interp.heap.protect(out)?;
    let mut names = Vec::with_capacity(cells.len());
    let mut any_tag = false;
    for (i, cell) in cells.into_iter().enumerate() {
        let value = interp.heap.car(cell)?;
        interp.heap.set_named(value, 2);
        interp.heap.set_vector_elt(out, i, value)?;
        let tag = interp.heap.tag(cell)?;
        if tag.is_nil() {
            names.push(Some(String::new()));
        } else {
            any_tag = true;
            names.push(Some(interp.heap.symbol_name(tag)?.to_string()));
        }
    }
    if any_tag {
        let names = interp.mk_strings(&names)?;
        interp.heap.set_attrib(out, interp.syms.names, names)?;
    }
    Ok(out)
}

fn do_length(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let n = i32::try_from(interp.heap.length(x)).unwrap_or(NA_INTEGER);
    Ok(interp.heap.scalar_integer(n)?)
}

fn do_subset2(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let idx = interp.heap.cadr(args)?;
    let ty = interp.heap.type_of(x);
    match ty {
        SexpType::Nil => return Ok(Sexp::NIL),
        SexpType::Env => {
            if interp.heap.type_of(idx) != SexpType::Str || interp.heap.length(idx) != 1 {
                return Err(RError::invalid("wrong args for environment subassignment").into());
            }
            let name = interp.strings_of(idx)?.remove(0).unwrap_or_default();
            let sym = interp.heap.install(&name)?;
            let value = interp.find_var_in_frame(x, sym)?;
            return match value {
                Sexp::UNBOUND => Ok(Sexp::NIL),
                v if interp.heap.type_of(v) == SexpType::Promise => interp.force_promise(v),
                v => Ok(v),
            };
        }
        t if t.is_vector() || t.is_pairlist() => {}
        t => {
            return Err(RError::invalid(format!("object of type '{}' is not subsettable", t)).into())
        }
    }
    let n = interp.heap.length(x);
    let pos = interp.subscript(x, idx, n)?;
    if pos >= n {
        return Err(subscript_out_of_bounds().into());
    }
    let value = interp.element(x, pos)?;
    if !is_atomic(ty) {
        interp.heap.set_named(value, 2);
    }
    Ok(value)
}

fn do_subassign2(interp: &mut Interpreter, _call: Sexp, _op: Sexp, args: Sexp, _rho: Sexp) -> EvalResult<Sexp> {
    let x = interp.heap.car(args)?;
    let idx = interp.heap.cadr(args)?;
    let value = interp.heap.caddr(args)?;

    if interp.heap.type_of(x) == SexpType::Env {
        if interp.heap.type_of(idx) != SexpType::Str || interp.heap.length(idx) != 1 {
            return Err(RError::invalid("wrong args for environment subassignment").into());
        }
        let name = interp.strings_of(idx)?.remove(0).unwrap_or_default();
        let sym = interp.heap.install(&name)?;
        interp.define_var(sym, value, x)?;
        return Ok(x);
    }

    let vty = interp.heap.type_of(value);
    let mut x = match interp.heap.type_of(x) {
        SexpType::Nil => {
            if value.is_nil() {
                return Ok(Sexp::NIL);
            }
            let ty = if is_atomic(vty) && interp.heap.length(value) == 1 {
                vty
            } else {
                SexpType::Generic
            };
            interp.heap.alloc_vector(ty, 0)?
        }
        t if t.is_pairlist() => interp.coerce_vector(x, SexpType::Generic)?,
        t if is_atomic(t) || t == SexpType::Generic || t == SexpType::Expression => unshared(interp, x)?,
        t => {
            return Err(RError::invalid(format!("object of type '{}' is not subsettable", t)).into())
        }
    };
    let mut guard = interp.heap.protect(x)?;

    let n = interp.heap.length(x);
    let pos = interp.subscript(x, idx, n)?;
    let new_name = if pos >= n && interp.heap.type_of(idx) == SexpType::Str {
        interp.strings_of(idx)?.remove(0)
    } else {
        None
    };

    if is_atomic(interp.heap.type_of(x)) {
        if !is_atomic(vty) && !value.is_nil() {
            x = interp.coerce_vector(x, SexpType::Generic)?;
            guard.replace(x);
        } else {
            match interp.heap.length(value) {
                0 => return Err(RError::invalid("replacement has length zero").into()),
                1 => {}
                _ => {
                    return Err(RError::invalid("more elements supplied than there are to replace").into())
                }
            }
        }
    }

    let xty = interp.heap.type_of(x);
    if is_atomic(xty) {
        let ty = match (type_rank(xty), type_rank(vty)) {
            (Some(a), Some(b)) if b > a => vty,
            _ => xty,
        };
        if ty != xty {
            let coerced = interp.coerce_vector(x, ty)?;
            interp.heap.copy_most_attrib(x, coerced)?;
            x = coerced;
            guard.replace(x);
        }
        if pos >= n {
            x = interp.grow_vector(x, pos + 1)?;
            guard.replace(x);
        }
        let value = interp.coerce_vector(value, ty)?;
        let _value = interp.heap.protect(value)?;
        interp.copy_elements(x, pos, value)?;
    } else if value.is_nil() {
        x = interp.delete_element(x, pos)?;
        guard.replace(x);
        return Ok(x);
    } else {
        if pos >= n {
            x = interp.grow_vector(x, pos + 1)?;
            guard.replace(x);
        }
        interp.heap.set_named(value, 2);
        interp.heap.set_vector_elt(x, pos, value)?;
    }
    if let Some(name) = new_name {
        interp.set_element_name(x, pos, &name)?;
    }
    Ok(x)
}
